//! Recursive descent parser for Go.
//!
//! Produces a typed [`ast::File`] plus the syntax errors met on the way.
//! The parser never gives up: on unexpected input it records an error,
//! skips to a recovery token and carries on, so callers always receive a
//! best-effort tree.

mod decl;
mod expr;
mod stmt;

use text_size::{TextRange, TextSize};

use super::ast::{self, Ident};
use super::lexer::{Lexer, Token, TokenKind};

/// Parse result containing the tree and any errors
#[derive(Debug, Clone)]
pub struct Parse {
    pub file: ast::File,
    pub errors: Vec<SyntaxError>,
}

impl Parse {
    /// Check if parsing succeeded without errors
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A syntax error with location and message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

/// Parse a whole Go source file.
pub fn parse(input: &str) -> Parse {
    let mut parser = Parser::new(input, Mode::Full);
    let file = parser.parse_file();
    parser.finish(file)
}

/// Parse only the package clause and the import declarations.
pub fn parse_imports(input: &str) -> Parse {
    let mut parser = Parser::new(input, Mode::ImportsOnly);
    let file = parser.parse_file();
    parser.finish(file)
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Mode {
    Full,
    ImportsOnly,
}

/// The parser state
struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    /// End of the last consumed token, implicit semicolons excluded.
    prev_end: TextSize,
    errors: Vec<SyntaxError>,
    /// Nesting level of parentheses/brackets; -1 inside control clauses,
    /// where `T {` opens a block instead of a composite literal.
    expr_lev: i32,
    mode: Mode,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, mode: Mode) -> Self {
        let mut tokens: Vec<Token> = Lexer::new(source).collect();
        tokens.push(Token {
            kind: TokenKind::Eof,
            range: TextRange::empty(TextSize::of(source)),
        });
        Self {
            source,
            tokens,
            pos: 0,
            prev_end: TextSize::from(0),
            errors: Vec::new(),
            expr_lev: 0,
            mode,
        }
    }

    fn finish(self, file: ast::File) -> Parse {
        Parse {
            file,
            errors: self.errors,
        }
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> Token {
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    fn nth(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn at_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.kind())
    }

    fn at_eof(&self) -> bool {
        self.at(TokenKind::Eof)
    }

    fn start(&self) -> TextSize {
        self.current().range.start()
    }

    fn text(&self, token: Token) -> &'a str {
        &self.source[token.range]
    }

    fn range_from(&self, start: TextSize) -> TextRange {
        TextRange::new(start, self.prev_end.max(start))
    }

    // =========================================================================
    // Token consumption
    // =========================================================================

    fn bump(&mut self) -> Token {
        let token = self.current();
        if token.kind != TokenKind::Eof {
            if !token.is_implicit_semicolon() {
                self.prev_end = token.range.end();
            }
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.error(format!("expected {}", describe(kind)));
            false
        }
    }

    /// Statement terminator; optional before a closing `)` or `}`.
    fn expect_semi(&mut self) {
        if self.at_any(&[TokenKind::RParen, TokenKind::RBrace, TokenKind::Eof]) {
            return;
        }
        if self.eat(TokenKind::Semicolon) {
            return;
        }
        self.error_recover(
            "expected ';' or newline",
            &[TokenKind::Semicolon, TokenKind::RBrace],
        );
        self.eat(TokenKind::Semicolon);
    }

    /// Consume an identifier, or report and return a blank placeholder.
    fn ident(&mut self) -> Ident {
        if self.at(TokenKind::Ident) {
            let token = self.bump();
            return Ident::new(self.text(token), token.range);
        }
        self.error("expected identifier");
        Ident::new("_", TextRange::empty(self.start()))
    }

    fn ident_list(&mut self) -> Vec<Ident> {
        let mut idents = vec![self.ident()];
        while self.eat(TokenKind::Comma) {
            idents.push(self.ident());
        }
        idents
    }

    /// Skip one token when a list element made no progress.
    fn ensure_progress(&mut self, before: usize) {
        if self.pos == before && !self.at_eof() {
            self.bump();
        }
    }

    // =========================================================================
    // Error handling
    // =========================================================================

    fn error(&mut self, message: impl Into<String>) {
        let token = self.current();
        let found = match token.kind {
            TokenKind::Eof => "EOF".to_string(),
            _ if token.is_implicit_semicolon() => "newline".to_string(),
            _ => format!("'{}'", self.text(token)),
        };
        let message = format!("{}, found {}", message.into(), found);
        self.errors.push(SyntaxError::new(message, token.range));
    }

    fn error_recover(&mut self, message: impl Into<String>, recovery: &[TokenKind]) {
        self.error(message);
        while !self.at_eof() && !self.at_any(recovery) {
            self.bump();
        }
    }
}

fn describe(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::LParen => "'('",
        TokenKind::RParen => "')'",
        TokenKind::LBrack => "'['",
        TokenKind::RBrack => "']'",
        TokenKind::LBrace => "'{'",
        TokenKind::RBrace => "'}'",
        TokenKind::Colon => "':'",
        TokenKind::Semicolon => "';'",
        TokenKind::Comma => "','",
        TokenKind::Chan => "'chan'",
        TokenKind::Default => "'default'",
        TokenKind::Ident => "identifier",
        TokenKind::String => "string literal",
        _ => "token",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::ast::{Decl, ExprKind, GenKind, Spec, StmtKind};

    fn parse_ok(source: &str) -> ast::File {
        let parse = parse(source);
        assert!(parse.ok(), "unexpected errors: {:?}", parse.errors);
        parse.file
    }

    fn func_body(file: &ast::File, name: &str) -> Vec<ast::Stmt> {
        file.decls
            .iter()
            .find_map(|d| match d {
                Decl::Func(f) if f.name.name == name => f.body.clone(),
                _ => None,
            })
            .map(|b| b.stmts)
            .unwrap_or_default()
    }

    #[test]
    fn test_package_and_imports() {
        let file = parse_ok(
            "package main\n\nimport (\n\t\"fmt\"\n\tj \"encoding/json\"\n\t. \"strings\"\n)\n",
        );
        assert_eq!(file.package.as_ref().map(|p| p.name.as_str()), Some("main"));
        assert_eq!(file.imports.len(), 3);
        assert_eq!(file.imports[1].path_value().as_deref(), Some("encoding/json"));
        assert_eq!(
            file.imports[1].name.as_ref().map(|n| n.name.as_str()),
            Some("j")
        );
        assert_eq!(
            file.imports[2].name.as_ref().map(|n| n.name.as_str()),
            Some(".")
        );
    }

    #[test]
    fn test_import_spec_range_covers_alias_and_path() {
        let source = "package p\nimport j \"encoding/json\"\n";
        let file = parse_ok(source);
        let spec = &file.imports[0];
        assert_eq!(&source[spec.range], "j \"encoding/json\"");
    }

    #[test]
    fn test_imports_only_mode_stops_early() {
        let parse = parse_imports("package p\nimport \"os\"\nfunc (\n");
        assert!(parse.ok());
        assert_eq!(parse.file.imports.len(), 1);
        assert!(parse.file.decls.is_empty());
    }

    #[test]
    fn test_const_group_records_iota() {
        let file = parse_ok("package p\nconst (\n\tA = iota\n\tB\n\tC\n)\n");
        let Decl::Gen(decl) = &file.decls[0] else {
            panic!("expected gen decl");
        };
        assert_eq!(decl.kind, GenKind::Const);
        let iotas: Vec<u64> = decl
            .specs
            .iter()
            .map(|s| match s {
                Spec::Value(v) => v.iota,
                Spec::Type(_) => u64::MAX,
            })
            .collect();
        assert_eq!(iotas, vec![0, 1, 2]);
    }

    #[test]
    fn test_struct_with_embedded_and_tags() {
        let file = parse_ok(
            "package p\ntype S struct {\n\tio.Reader\n\t*Base\n\tA, B int `json:\"a\"`\n}\n",
        );
        let Decl::Gen(decl) = &file.decls[0] else {
            panic!("expected gen decl");
        };
        let Spec::Type(spec) = &decl.specs[0] else {
            panic!("expected type spec");
        };
        let ExprKind::StructType(fields) = &spec.ty.kind else {
            panic!("expected struct");
        };
        assert_eq!(fields.fields.len(), 3);
        assert!(fields.fields[0].names.is_empty());
        assert!(matches!(fields.fields[1].ty.kind, ExprKind::Star(_)));
        assert_eq!(fields.fields[2].names.len(), 2);
        assert!(fields.fields[2].tag.is_some());
    }

    #[test]
    fn test_interface_methods_and_embeds() {
        let file = parse_ok("package p\ntype J interface {\n\tI\n\tN(x int) error\n}\n");
        let Decl::Gen(decl) = &file.decls[0] else {
            panic!("expected gen decl");
        };
        let Spec::Type(spec) = &decl.specs[0] else {
            panic!("expected type spec");
        };
        let ExprKind::InterfaceType(elems) = &spec.ty.kind else {
            panic!("expected interface");
        };
        assert!(elems.fields[0].names.is_empty());
        assert_eq!(elems.fields[1].names[0].name, "N");
    }

    #[test]
    fn test_grouped_parameters() {
        let file = parse_ok("package p\nfunc f(a, b int, c ...string) (n int, err error) {}\n");
        let Decl::Func(func) = &file.decls[0] else {
            panic!("expected func");
        };
        assert_eq!(func.ty.params.fields.len(), 2);
        assert_eq!(func.ty.params.fields[0].names.len(), 2);
        assert!(matches!(func.ty.params.fields[1].ty.kind, ExprKind::Ellipsis(_)));
        assert_eq!(func.ty.results.len(), 2);
    }

    #[test]
    fn test_unnamed_parameters() {
        let file = parse_ok("package p\nfunc f(int, string) bool\n");
        let Decl::Func(func) = &file.decls[0] else {
            panic!("expected func");
        };
        assert_eq!(func.ty.params.fields.len(), 2);
        assert!(func.ty.params.fields.iter().all(|f| f.names.is_empty()));
        assert!(func.body.is_none());
    }

    #[test]
    fn test_method_receiver() {
        let file = parse_ok("package p\nfunc (t *T) Get() int { return t.x }\n");
        let Decl::Func(func) = &file.decls[0] else {
            panic!("expected func");
        };
        let recv = func.recv.as_ref().map(|r| r.fields.len());
        assert_eq!(recv, Some(1));
        assert_eq!(func.name.name, "Get");
    }

    #[test]
    fn test_composite_literal_not_in_if_header() {
        let file = parse_ok(
            "package p\nfunc f() {\n\tif x == y {\n\t}\n\tv := T{A: 1}\n\t_ = v\n}\n",
        );
        let body = func_body(&file, "f");
        assert!(matches!(body[0].kind, StmtKind::If { .. }));
        let StmtKind::Assign { rhs, .. } = &body[1].kind else {
            panic!("expected assignment");
        };
        assert!(matches!(rhs[0].kind, ExprKind::CompositeLit { .. }));
    }

    #[test]
    fn test_for_forms() {
        let file = parse_ok(
            "package p\nfunc f() {\n\tfor {}\n\tfor i := 0; i < 3; i++ {}\n\tfor k, v := range m {}\n\tfor range ch {}\n\tfor x < 3 {}\n}\n",
        );
        let body = func_body(&file, "f");
        assert_eq!(body.len(), 5);
        assert!(matches!(body[1].kind, StmtKind::For { .. }));
        assert!(matches!(body[2].kind, StmtKind::Range { define: true, .. }));
        assert!(matches!(body[3].kind, StmtKind::Range { key: None, .. }));
        assert!(matches!(body[4].kind, StmtKind::For { cond: Some(_), .. }));
    }

    #[test]
    fn test_type_switch() {
        let file = parse_ok(
            "package p\nfunc f(x any) {\n\tswitch v := x.(type) {\n\tcase int, *T:\n\t\t_ = v\n\tdefault:\n\t}\n}\n",
        );
        let body = func_body(&file, "f");
        let StmtKind::TypeSwitch {
            binding, clauses, ..
        } = &body[0].kind
        else {
            panic!("expected type switch");
        };
        assert_eq!(binding.as_ref().map(|b| b.name.as_str()), Some("v"));
        assert_eq!(clauses.len(), 2);
        assert!(clauses[1].list.is_none());
    }

    #[test]
    fn test_select_and_labels() {
        let file = parse_ok(
            "package p\nfunc f() {\nLoop:\n\tfor {\n\t\tselect {\n\t\tcase v := <-ch:\n\t\t\t_ = v\n\t\tcase ch <- 1:\n\t\tdefault:\n\t\t\tbreak Loop\n\t\t}\n\t}\n}\n",
        );
        let body = func_body(&file, "f");
        let StmtKind::Labeled { label, .. } = &body[0].kind else {
            panic!("expected labeled statement");
        };
        assert_eq!(label.name, "Loop");
    }

    #[test]
    fn test_func_literal_and_call_chain() {
        let file = parse_ok(
            "package p\nfunc f() {\n\tgo func(n int) {\n\t\tfmt.Println(n)\n\t}(1)\n\tdefer x.y.z(a...)\n}\n",
        );
        let body = func_body(&file, "f");
        assert!(matches!(body[0].kind, StmtKind::Go(_)));
        let StmtKind::Defer(call) = &body[1].kind else {
            panic!("expected defer");
        };
        assert!(matches!(call.kind, ExprKind::Call { ellipsis: true, .. }));
    }

    #[test]
    fn test_recovers_from_bad_declaration() {
        let parse = parse("package p\n)))\nfunc ok() {}\n");
        assert!(!parse.ok());
        assert!(
            parse
                .file
                .decls
                .iter()
                .any(|d| matches!(d, Decl::Func(f) if f.name.name == "ok"))
        );
    }

    #[test]
    fn test_recovers_inside_function_body() {
        let parse = parse("package p\nfunc f() {\n\tx := \n\ty := 2\n}\nfunc g() {}\n");
        assert!(!parse.ok());
        assert!(
            parse
                .file
                .decls
                .iter()
                .any(|d| matches!(d, Decl::Func(f) if f.name.name == "g"))
        );
    }

    #[test]
    fn test_missing_package_clause() {
        let parse = parse("func f() {}\n");
        assert!(!parse.ok());
        assert!(parse.file.package.is_none());
        assert_eq!(parse.file.decls.len(), 1);
    }

    #[test]
    fn test_selector_ident_ranges() {
        let source = "package p\nvar _ = json.Marshal\n";
        let file = parse_ok(source);
        let Decl::Gen(decl) = &file.decls[0] else {
            panic!("expected gen decl");
        };
        let Spec::Value(spec) = &decl.specs[0] else {
            panic!("expected value spec");
        };
        let ExprKind::Selector { sel, .. } = &spec.values[0].kind else {
            panic!("expected selector");
        };
        assert_eq!(&source[sel.range], "Marshal");
    }
}
