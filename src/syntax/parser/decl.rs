//! File-level parsing: package clause, imports and declarations.

use text_size::{TextRange, TextSize};

use super::expr::ident_expr;
use super::{Mode, Parser};
use crate::syntax::ast::{
    BasicLit, Decl, Expr, ExprKind, Field, FieldList, FuncDecl, FuncType, GenDecl, GenKind,
    Ident, ImportSpec, Spec, TypeSpec, ValueSpec,
};
use crate::syntax::lexer::TokenKind;

const DECL_START: &[TokenKind] = &[
    TokenKind::Const,
    TokenKind::Var,
    TokenKind::Type,
    TokenKind::Func,
    TokenKind::Import,
];

/// A parameter list entry before names and types are grouped.
enum ParamEntry {
    Named(Ident, Expr),
    Bare(Expr),
}

impl Parser<'_> {
    pub(super) fn parse_file(&mut self) -> crate::syntax::ast::File {
        let package = if self.eat(TokenKind::Package) {
            let name = self.ident();
            self.expect_semi();
            Some(name)
        } else {
            self.error("expected 'package'");
            None
        };

        let mut imports = Vec::new();
        while self.at(TokenKind::Import) {
            self.import_decl(&mut imports);
        }

        let mut decls = Vec::new();
        if self.mode == Mode::Full {
            while !self.at_eof() {
                if self.at(TokenKind::Import) {
                    self.error("imports must appear before other declarations");
                    self.import_decl(&mut imports);
                    continue;
                }
                decls.push(self.decl());
            }
        }

        crate::syntax::ast::File {
            package,
            imports,
            decls,
            range: TextRange::up_to(TextSize::of(self.source)),
        }
    }

    fn import_decl(&mut self, imports: &mut Vec<ImportSpec>) {
        self.bump();
        if self.eat(TokenKind::LParen) {
            while !self.at(TokenKind::RParen) && !self.at_eof() {
                let before = self.pos;
                if let Some(spec) = self.import_spec() {
                    imports.push(spec);
                }
                self.expect_semi();
                self.ensure_progress(before);
            }
            self.expect(TokenKind::RParen);
        } else if let Some(spec) = self.import_spec() {
            imports.push(spec);
        }
        self.expect_semi();
    }

    fn import_spec(&mut self) -> Option<ImportSpec> {
        let start = self.start();
        let name = match self.kind() {
            TokenKind::Ident => Some(self.ident()),
            TokenKind::Period => {
                let token = self.bump();
                Some(Ident::new(".", token.range))
            }
            _ => None,
        };
        if !self.at(TokenKind::String) {
            self.error_recover(
                "expected import path",
                &[TokenKind::Semicolon, TokenKind::RParen],
            );
            return None;
        }
        let token = self.bump();
        let path = BasicLit {
            kind: TokenKind::String,
            value: self.text(token).into(),
            range: token.range,
        };
        Some(ImportSpec {
            name,
            path,
            range: self.range_from(start),
        })
    }

    fn decl(&mut self) -> Decl {
        match self.kind() {
            TokenKind::Const => Decl::Gen(self.gen_decl(GenKind::Const)),
            TokenKind::Var => Decl::Gen(self.gen_decl(GenKind::Var)),
            TokenKind::Type => Decl::Gen(self.gen_decl(GenKind::Type)),
            TokenKind::Func => Decl::Func(self.func_decl()),
            _ => {
                let start = self.start();
                self.error_recover("expected declaration", DECL_START);
                Decl::Bad(self.range_from(start))
            }
        }
    }

    /// `const`, `var` or `type`, single or grouped; consumes the terminator.
    pub(super) fn gen_decl(&mut self, kind: GenKind) -> GenDecl {
        let start = self.start();
        self.bump();
        let mut specs = Vec::new();
        if self.eat(TokenKind::LParen) {
            let mut iota = 0;
            while !self.at(TokenKind::RParen) && !self.at_eof() {
                let before = self.pos;
                specs.push(self.spec(kind, iota));
                self.expect_semi();
                self.ensure_progress(before);
                iota += 1;
            }
            self.expect(TokenKind::RParen);
        } else {
            specs.push(self.spec(kind, 0));
        }
        let range = self.range_from(start);
        self.expect_semi();
        GenDecl { kind, specs, range }
    }

    fn spec(&mut self, kind: GenKind, iota: u64) -> Spec {
        let start = self.start();
        if kind == GenKind::Type {
            let name = self.ident();
            if self.at(TokenKind::LBrack)
                && self.nth(1) == TokenKind::Ident
                && matches!(
                    self.nth(2),
                    TokenKind::Ident | TokenKind::Comma | TokenKind::Interface | TokenKind::Tilde
                )
            {
                self.skip_type_params();
            }
            let alias = self.eat(TokenKind::Assign);
            let ty = self.parse_type();
            return Spec::Type(TypeSpec {
                name,
                alias,
                ty,
                range: self.range_from(start),
            });
        }

        let names = self.ident_list();
        let ty = if self.at_any(&[
            TokenKind::Assign,
            TokenKind::Semicolon,
            TokenKind::RParen,
        ]) {
            None
        } else {
            Some(self.parse_type())
        };
        let values = if self.eat(TokenKind::Assign) {
            self.expr_list()
        } else {
            Vec::new()
        };
        Spec::Value(ValueSpec {
            names,
            ty,
            values,
            iota,
            range: self.range_from(start),
        })
    }

    fn func_decl(&mut self) -> FuncDecl {
        let start = self.start();
        self.bump();
        let recv = self.at(TokenKind::LParen).then(|| self.parameters());
        let name = self.ident();
        if self.at(TokenKind::LBrack) {
            self.skip_type_params();
        }
        let ty = self.signature(self.start());
        let body = if self.at(TokenKind::LBrace) {
            let lev = std::mem::replace(&mut self.expr_lev, 0);
            let body = self.block();
            self.expr_lev = lev;
            Some(body)
        } else {
            None
        };
        let range = self.range_from(start);
        self.expect_semi();
        FuncDecl {
            recv,
            name,
            ty,
            body,
            range,
        }
    }

    /// Type parameter lists are reported and skipped.
    fn skip_type_params(&mut self) {
        self.error("type parameters are not supported");
        let mut depth = 0usize;
        while !self.at_eof() {
            match self.bump().kind {
                TokenKind::LBrack => depth += 1,
                TokenKind::RBrack => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    /// Parameters and optional results; `start` is where the signature
    /// began (the `func` keyword for literals and types).
    pub(super) fn signature(&mut self, start: TextSize) -> FuncType {
        let params = self.parameters();
        let results = if self.at(TokenKind::LParen) {
            self.parameters()
        } else if self.at_type_start() {
            let ty = self.parse_type();
            let range = ty.range;
            FieldList {
                fields: vec![Field {
                    names: Vec::new(),
                    ty,
                    tag: None,
                    range,
                }],
                range,
            }
        } else {
            FieldList {
                fields: Vec::new(),
                range: TextRange::empty(self.prev_end),
            }
        };
        FuncType {
            params,
            results,
            range: self.range_from(start),
        }
    }

    /// A parenthesised parameter list with Go's name grouping rules.
    pub(super) fn parameters(&mut self) -> FieldList {
        let start = self.start();
        if !self.expect(TokenKind::LParen) {
            return FieldList {
                fields: Vec::new(),
                range: TextRange::empty(start),
            };
        }
        self.expr_lev += 1;
        let mut entries = Vec::new();
        while !self.at(TokenKind::RParen) && !self.at_eof() {
            let before = self.pos;
            entries.push(self.param_entry());
            if self.pos == before {
                self.error_recover(
                    "expected parameter",
                    &[TokenKind::Comma, TokenKind::RParen],
                );
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expr_lev -= 1;
        self.expect(TokenKind::RParen);
        FieldList {
            fields: self.group_params(entries),
            range: self.range_from(start),
        }
    }

    fn param_entry(&mut self) -> ParamEntry {
        if self.at(TokenKind::Ident) {
            let next = self.nth(1);
            if next == TokenKind::Period {
                return ParamEntry::Bare(self.parse_type());
            }
            let name = self.ident();
            if !matches!(next, TokenKind::Comma | TokenKind::RParen) && self.at_type_start() {
                let ty = self.parse_type();
                return ParamEntry::Named(name, ty);
            }
            return ParamEntry::Bare(ident_expr(name));
        }
        ParamEntry::Bare(self.parse_type())
    }

    /// `a, b int` groups bare identifiers with the next named entry; a list
    /// without any named entry is a list of types.
    fn group_params(&mut self, entries: Vec<ParamEntry>) -> Vec<Field> {
        let named = entries
            .iter()
            .any(|e| matches!(e, ParamEntry::Named(..)));
        if !named {
            return entries
                .into_iter()
                .map(|entry| {
                    let ty = match entry {
                        ParamEntry::Bare(ty) | ParamEntry::Named(_, ty) => ty,
                    };
                    let range = ty.range;
                    Field {
                        names: Vec::new(),
                        ty,
                        tag: None,
                        range,
                    }
                })
                .collect();
        }

        let mut fields = Vec::new();
        let mut pending: Vec<Ident> = Vec::new();
        for entry in entries {
            match entry {
                ParamEntry::Bare(expr) => match expr.kind {
                    ExprKind::Ident(ident) => pending.push(ident),
                    _ => self.errors.push(super::SyntaxError::new(
                        "mixed named and unnamed parameters",
                        expr.range,
                    )),
                },
                ParamEntry::Named(name, ty) => {
                    pending.push(name);
                    let start = pending[0].range.start();
                    let range = TextRange::new(start, ty.range.end().max(start));
                    fields.push(Field {
                        names: std::mem::take(&mut pending),
                        ty,
                        tag: None,
                        range,
                    });
                }
            }
        }
        if let Some(last) = pending.last() {
            self.errors.push(super::SyntaxError::new(
                "missing parameter type",
                last.range,
            ));
        }
        fields
    }
}
