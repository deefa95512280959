//! Logos-based lexer for Go source.
//!
//! The raw logos tokens keep newlines and comments; [`Lexer`] turns them into
//! the significant token stream the parser consumes, inserting the implicit
//! semicolons the Go grammar relies on.

use logos::Logos;
use text_size::{TextRange, TextSize};

/// Token kinds seen by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ident,
    Int,
    Float,
    Imag,
    Char,
    String,

    // keywords
    Break,
    Case,
    Chan,
    Const,
    Continue,
    Default,
    Defer,
    Else,
    Fallthrough,
    For,
    Func,
    Go,
    Goto,
    If,
    Import,
    Interface,
    Map,
    Package,
    Range,
    Return,
    Select,
    Struct,
    Switch,
    Type,
    Var,

    // operators and punctuation
    Add,
    Sub,
    Mul,
    Quo,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
    AddAssign,
    SubAssign,
    MulAssign,
    QuoAssign,
    RemAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign,
    AndNotAssign,
    LAnd,
    LOr,
    Arrow,
    Inc,
    Dec,
    Eql,
    Lss,
    Gtr,
    Assign,
    Not,
    Neq,
    Leq,
    Geq,
    Define,
    Ellipsis,
    LParen,
    LBrack,
    LBrace,
    Comma,
    Period,
    RParen,
    RBrack,
    RBrace,
    Semicolon,
    Colon,
    Tilde,

    /// Unrecognised input.
    Illegal,
    Eof,
}

impl TokenKind {
    /// Whether a newline after this token ends the statement.
    fn ends_statement(self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::Imag
                | TokenKind::Char
                | TokenKind::String
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Fallthrough
                | TokenKind::Return
                | TokenKind::Inc
                | TokenKind::Dec
                | TokenKind::RParen
                | TokenKind::RBrack
                | TokenKind::RBrace
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Int | TokenKind::Float | TokenKind::Imag | TokenKind::Char | TokenKind::String
        )
    }
}

/// A significant token: kind plus its range in the source.
///
/// Implicit semicolons have an empty range placed at the newline (or at the
/// end of input) that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
}

impl Token {
    pub fn text(self, source: &str) -> &str {
        &source[self.range]
    }

    pub fn is_implicit_semicolon(self) -> bool {
        self.kind == TokenKind::Semicolon && self.range.is_empty()
    }
}

/// Lexer yielding significant tokens with automatic semicolons.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, RawToken>,
    last: Option<TokenKind>,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: RawToken::lexer(input),
            last: None,
            done: false,
        }
    }

    fn emit(&mut self, token: Token) -> Option<Token> {
        self.last = Some(token.kind);
        Some(token)
    }

    fn auto_semicolon(&mut self, at: TextSize) -> Option<Token> {
        let token = Token {
            kind: TokenKind::Semicolon,
            range: TextRange::empty(at),
        };
        self.emit(token)
    }

    fn needs_semicolon(&self) -> bool {
        self.last.is_some_and(TokenKind::ends_statement)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if self.done {
                return None;
            }
            let Some(raw) = self.inner.next() else {
                self.done = true;
                let end = TextSize::of(self.inner.source());
                if self.needs_semicolon() {
                    return self.auto_semicolon(end);
                }
                return None;
            };
            let span = self.inner.span();
            let range = TextRange::new((span.start as u32).into(), (span.end as u32).into());
            let kind = match raw {
                Ok(RawToken::Newline) => {
                    if self.needs_semicolon() {
                        return self.auto_semicolon(range.start());
                    }
                    continue;
                }
                Ok(RawToken::LineComment) => continue,
                Ok(RawToken::BlockComment) => {
                    if self.inner.slice().contains('\n') && self.needs_semicolon() {
                        return self.auto_semicolon(range.start());
                    }
                    continue;
                }
                Ok(raw) => raw.kind(),
                Err(()) => TokenKind::Illegal,
            };
            return self.emit(Token { kind, range });
        }
    }
}

/// Tokenize an entire string into a Vec
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).collect()
}

/// Skip to the end of a `/* */` comment. Unterminated comments run to the
/// end of input and lex as an error.
fn block_comment(lex: &mut logos::Lexer<RawToken>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

/// Raw logos tokens, trivia included.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\f]+")]
enum RawToken {
    #[token("\n")]
    Newline,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment,

    #[token("break")]
    Break,
    #[token("case")]
    Case,
    #[token("chan")]
    Chan,
    #[token("const")]
    Const,
    #[token("continue")]
    Continue,
    #[token("default")]
    Default,
    #[token("defer")]
    Defer,
    #[token("else")]
    Else,
    #[token("fallthrough")]
    Fallthrough,
    #[token("for")]
    For,
    #[token("func")]
    Func,
    #[token("go")]
    Go,
    #[token("goto")]
    Goto,
    #[token("if")]
    If,
    #[token("import")]
    Import,
    #[token("interface")]
    Interface,
    #[token("map")]
    Map,
    #[token("package")]
    Package,
    #[token("range")]
    Range,
    #[token("return")]
    Return,
    #[token("select")]
    Select,
    #[token("struct")]
    Struct,
    #[token("switch")]
    Switch,
    #[token("type")]
    Type,
    #[token("var")]
    Var,

    #[regex(r"[\p{L}_][\p{L}\p{Nd}_]*")]
    Ident,

    #[regex(r"[0-9][0-9_]*|0[xX][0-9a-fA-F_]+|0[bB][01_]+|0[oO][0-7_]+")]
    Int,

    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9_]+)?|\.[0-9][0-9_]*([eE][+-]?[0-9_]+)?|[0-9][0-9_]*[eE][+-]?[0-9_]+")]
    Float,

    #[regex(r"([0-9][0-9_]*|[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9_]+)?)i")]
    Imag,

    #[regex(r"'([^'\\\n]|\\[^\n])+'")]
    Char,

    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    #[regex(r"`[^`]*`")]
    String,

    #[token("+")]
    Add,
    #[token("-")]
    Sub,
    #[token("*")]
    Mul,
    #[token("/")]
    Quo,
    #[token("%")]
    Rem,
    #[token("&")]
    And,
    #[token("|")]
    Or,
    #[token("^")]
    Xor,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("&^")]
    AndNot,
    #[token("+=")]
    AddAssign,
    #[token("-=")]
    SubAssign,
    #[token("*=")]
    MulAssign,
    #[token("/=")]
    QuoAssign,
    #[token("%=")]
    RemAssign,
    #[token("&=")]
    AndAssign,
    #[token("|=")]
    OrAssign,
    #[token("^=")]
    XorAssign,
    #[token("<<=")]
    ShlAssign,
    #[token(">>=")]
    ShrAssign,
    #[token("&^=")]
    AndNotAssign,
    #[token("&&")]
    LAnd,
    #[token("||")]
    LOr,
    #[token("<-")]
    Arrow,
    #[token("++")]
    Inc,
    #[token("--")]
    Dec,
    #[token("==")]
    Eql,
    #[token("<")]
    Lss,
    #[token(">")]
    Gtr,
    #[token("=")]
    Assign,
    #[token("!")]
    Not,
    #[token("!=")]
    Neq,
    #[token("<=")]
    Leq,
    #[token(">=")]
    Geq,
    #[token(":=")]
    Define,
    #[token("...")]
    Ellipsis,
    #[token("(")]
    LParen,
    #[token("[")]
    LBrack,
    #[token("{")]
    LBrace,
    #[token(",")]
    Comma,
    #[token(".")]
    Period,
    #[token(")")]
    RParen,
    #[token("]")]
    RBrack,
    #[token("}")]
    RBrace,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("~")]
    Tilde,
}

impl RawToken {
    fn kind(self) -> TokenKind {
        use RawToken as R;
        use TokenKind as K;
        match self {
            R::Newline | R::LineComment | R::BlockComment => K::Illegal,
            R::Break => K::Break,
            R::Case => K::Case,
            R::Chan => K::Chan,
            R::Const => K::Const,
            R::Continue => K::Continue,
            R::Default => K::Default,
            R::Defer => K::Defer,
            R::Else => K::Else,
            R::Fallthrough => K::Fallthrough,
            R::For => K::For,
            R::Func => K::Func,
            R::Go => K::Go,
            R::Goto => K::Goto,
            R::If => K::If,
            R::Import => K::Import,
            R::Interface => K::Interface,
            R::Map => K::Map,
            R::Package => K::Package,
            R::Range => K::Range,
            R::Return => K::Return,
            R::Select => K::Select,
            R::Struct => K::Struct,
            R::Switch => K::Switch,
            R::Type => K::Type,
            R::Var => K::Var,
            R::Ident => K::Ident,
            R::Int => K::Int,
            R::Float => K::Float,
            R::Imag => K::Imag,
            R::Char => K::Char,
            R::String => K::String,
            R::Add => K::Add,
            R::Sub => K::Sub,
            R::Mul => K::Mul,
            R::Quo => K::Quo,
            R::Rem => K::Rem,
            R::And => K::And,
            R::Or => K::Or,
            R::Xor => K::Xor,
            R::Shl => K::Shl,
            R::Shr => K::Shr,
            R::AndNot => K::AndNot,
            R::AddAssign => K::AddAssign,
            R::SubAssign => K::SubAssign,
            R::MulAssign => K::MulAssign,
            R::QuoAssign => K::QuoAssign,
            R::RemAssign => K::RemAssign,
            R::AndAssign => K::AndAssign,
            R::OrAssign => K::OrAssign,
            R::XorAssign => K::XorAssign,
            R::ShlAssign => K::ShlAssign,
            R::ShrAssign => K::ShrAssign,
            R::AndNotAssign => K::AndNotAssign,
            R::LAnd => K::LAnd,
            R::LOr => K::LOr,
            R::Arrow => K::Arrow,
            R::Inc => K::Inc,
            R::Dec => K::Dec,
            R::Eql => K::Eql,
            R::Lss => K::Lss,
            R::Gtr => K::Gtr,
            R::Assign => K::Assign,
            R::Not => K::Not,
            R::Neq => K::Neq,
            R::Leq => K::Leq,
            R::Geq => K::Geq,
            R::Define => K::Define,
            R::Ellipsis => K::Ellipsis,
            R::LParen => K::LParen,
            R::LBrack => K::LBrack,
            R::LBrace => K::LBrace,
            R::Comma => K::Comma,
            R::Period => K::Period,
            R::RParen => K::RParen,
            R::RBrack => K::RBrack,
            R::RBrace => K::RBrace,
            R::Semicolon => K::Semicolon,
            R::Colon => K::Colon,
            R::Tilde => K::Tilde,
        }
    }
}

/// Scan just far enough to find the package clause name.
///
/// Used by the package locator to split test files by package without
/// parsing whole files.
pub fn package_name(source: &str) -> Option<&str> {
    let mut tokens = Lexer::new(source);
    let first = tokens.next()?;
    if first.kind != TokenKind::Package {
        return None;
    }
    let name = tokens.next()?;
    (name.kind == TokenKind::Ident).then(|| name.text(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_and_idents() {
        assert_eq!(
            kinds("package main"),
            vec![TokenKind::Package, TokenKind::Ident, TokenKind::Semicolon]
        );
        assert_eq!(kinds("funcs"), vec![TokenKind::Ident, TokenKind::Semicolon]);
    }

    #[test]
    fn test_semicolon_insertion_after_newline() {
        let toks = tokenize("x := 1\ny++\n");
        let semis: Vec<_> = toks
            .iter()
            .filter(|t| t.kind == TokenKind::Semicolon)
            .collect();
        assert_eq!(semis.len(), 2);
        assert!(semis.iter().all(|t| t.is_implicit_semicolon()));
    }

    #[test]
    fn test_no_semicolon_after_operator() {
        assert_eq!(
            kinds("a +\nb"),
            vec![
                TokenKind::Ident,
                TokenKind::Add,
                TokenKind::Ident,
                TokenKind::Semicolon
            ]
        );
    }

    #[test]
    fn test_comments_are_trivia() {
        assert_eq!(
            kinds("a // trailing\n/* block */ b"),
            vec![
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::Semicolon
            ]
        );
    }

    #[test]
    fn test_block_comment_shapes() {
        for source in ["/**/ b", "/* a ** b */ b", "/* ends in stars **/ b", "/* x */ /* y */ b"] {
            assert_eq!(kinds(source), vec![TokenKind::Ident, TokenKind::Semicolon], "{source}");
        }
    }

    #[test]
    fn test_multiline_block_comment_inserts_semicolon() {
        assert_eq!(
            kinds("a /* one\ntwo */ b"),
            vec![
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::Semicolon
            ]
        );
    }

    #[test]
    fn test_unterminated_block_comment_is_illegal() {
        assert_eq!(kinds("a /* open"), vec![TokenKind::Ident, TokenKind::Illegal]);
    }

    #[test]
    fn test_literals() {
        let source = r#"42 0x1F 3.14 1e9 2i 'a' "s\"q" `raw`"#;
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Int,
                TokenKind::Int,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Imag,
                TokenKind::Char,
                TokenKind::String,
                TokenKind::String,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(
            kinds("a &^= b <- c ... :="),
            vec![
                TokenKind::Ident,
                TokenKind::AndNotAssign,
                TokenKind::Ident,
                TokenKind::Arrow,
                TokenKind::Ident,
                TokenKind::Ellipsis,
                TokenKind::Define,
            ]
        );
    }

    #[test]
    fn test_token_ranges() {
        let source = "import \"fmt\"";
        let toks = tokenize(source);
        assert_eq!(toks[1].text(source), "\"fmt\"");
        assert_eq!(u32::from(toks[1].range.start()), 7);
    }

    #[test]
    fn test_package_name_scan() {
        assert_eq!(package_name("// doc\npackage foo_test\n"), Some("foo_test"));
        assert_eq!(package_name("func main() {}"), None);
    }
}
