//! Expressions and type expressions.

use text_size::{TextRange, TextSize};

use super::Parser;
use crate::syntax::ast::{BasicLit, ChanDir, Expr, ExprKind, Field, FieldList, Ident};
use crate::syntax::lexer::TokenKind;

/// Binary operator precedence, 0 for non-operators.
fn precedence(kind: TokenKind) -> u8 {
    match kind {
        TokenKind::LOr => 1,
        TokenKind::LAnd => 2,
        TokenKind::Eql
        | TokenKind::Neq
        | TokenKind::Lss
        | TokenKind::Leq
        | TokenKind::Gtr
        | TokenKind::Geq => 3,
        TokenKind::Add | TokenKind::Sub | TokenKind::Or | TokenKind::Xor => 4,
        TokenKind::Mul
        | TokenKind::Quo
        | TokenKind::Rem
        | TokenKind::Shl
        | TokenKind::Shr
        | TokenKind::And
        | TokenKind::AndNot => 5,
        _ => 0,
    }
}

fn is_type_name(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Ident(_) => true,
        ExprKind::Selector { x, .. } => matches!(x.kind, ExprKind::Ident(_)),
        _ => false,
    }
}

fn is_literal_type(expr: &Expr) -> bool {
    is_type_name(expr)
        || matches!(
            expr.kind,
            ExprKind::ArrayType { .. } | ExprKind::StructType(_) | ExprKind::MapType { .. }
        )
}

impl Parser<'_> {
    pub(super) fn at_type_start(&self) -> bool {
        self.at_any(&[
            TokenKind::Ident,
            TokenKind::LBrack,
            TokenKind::Struct,
            TokenKind::Mul,
            TokenKind::Func,
            TokenKind::Interface,
            TokenKind::Map,
            TokenKind::Chan,
            TokenKind::LParen,
            TokenKind::Arrow,
            TokenKind::Ellipsis,
        ])
    }

    // =========================================================================
    // Types
    // =========================================================================

    pub(super) fn parse_type(&mut self) -> Expr {
        let start = self.start();
        match self.kind() {
            TokenKind::Ident => self.type_name(),
            TokenKind::LBrack => self.array_type(),
            TokenKind::Struct => self.struct_type(),
            TokenKind::Interface => self.interface_type(),
            TokenKind::Map => self.map_type(),
            TokenKind::Chan | TokenKind::Arrow => self.chan_type(),
            TokenKind::Mul => {
                self.bump();
                let elem = self.parse_type();
                Expr::new(ExprKind::Star(Box::new(elem)), self.range_from(start))
            }
            TokenKind::Func => {
                self.bump();
                let sig = self.signature(start);
                let range = sig.range;
                Expr::new(ExprKind::FuncType(sig), range)
            }
            TokenKind::Ellipsis => {
                self.bump();
                let elem = self.parse_type();
                Expr::new(
                    ExprKind::Ellipsis(Some(Box::new(elem))),
                    self.range_from(start),
                )
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_type();
                self.expect(TokenKind::RParen);
                Expr::new(ExprKind::Paren(Box::new(inner)), self.range_from(start))
            }
            _ => {
                self.error("expected type");
                Expr::bad(TextRange::empty(start))
            }
        }
    }

    /// `T` or `pkg.T`.
    fn type_name(&mut self) -> Expr {
        let x = ident_expr(self.ident());
        let range = x.range;
        if self.at(TokenKind::Period) && self.nth(1) == TokenKind::Ident {
            self.bump();
            let sel = self.ident();
            let range = TextRange::new(range.start(), sel.range.end());
            return Expr::new(
                ExprKind::Selector {
                    x: Box::new(x),
                    sel,
                },
                range,
            );
        }
        x
    }

    fn array_type(&mut self) -> Expr {
        let start = self.start();
        self.bump();
        let len = if self.eat(TokenKind::RBrack) {
            None
        } else {
            let len = if self.at(TokenKind::Ellipsis) && self.nth(1) == TokenKind::RBrack {
                let token = self.bump();
                Expr::new(ExprKind::Ellipsis(None), token.range)
            } else {
                self.expr_lev += 1;
                let len = self.parse_expr();
                self.expr_lev -= 1;
                len
            };
            self.expect(TokenKind::RBrack);
            Some(Box::new(len))
        };
        let elem = self.parse_type();
        Expr::new(
            ExprKind::ArrayType {
                len,
                elem: Box::new(elem),
            },
            self.range_from(start),
        )
    }

    fn map_type(&mut self) -> Expr {
        let start = self.start();
        self.bump();
        self.expect(TokenKind::LBrack);
        let key = self.parse_type();
        self.expect(TokenKind::RBrack);
        let value = self.parse_type();
        Expr::new(
            ExprKind::MapType {
                key: Box::new(key),
                value: Box::new(value),
            },
            self.range_from(start),
        )
    }

    fn chan_type(&mut self) -> Expr {
        let start = self.start();
        let dir = if self.eat(TokenKind::Arrow) {
            self.expect(TokenKind::Chan);
            ChanDir::Recv
        } else {
            self.bump();
            if self.eat(TokenKind::Arrow) {
                ChanDir::Send
            } else {
                ChanDir::Both
            }
        };
        let value = self.parse_type();
        Expr::new(
            ExprKind::ChanType {
                dir,
                value: Box::new(value),
            },
            self.range_from(start),
        )
    }

    fn struct_type(&mut self) -> Expr {
        let start = self.start();
        self.bump();
        let list_start = self.start();
        let mut fields = Vec::new();
        if self.expect(TokenKind::LBrace) {
            while !self.at(TokenKind::RBrace) && !self.at_eof() {
                let before = self.pos;
                if let Some(field) = self.field_decl() {
                    fields.push(field);
                }
                self.expect_semi();
                self.ensure_progress(before);
            }
            self.expect(TokenKind::RBrace);
        }
        let list = FieldList {
            fields,
            range: self.range_from(list_start),
        };
        Expr::new(ExprKind::StructType(list), self.range_from(start))
    }

    fn field_decl(&mut self) -> Option<Field> {
        let start = self.start();
        let (names, ty) = match self.kind() {
            TokenKind::Mul => {
                self.bump();
                let name = self.type_name();
                let ty = Expr::new(ExprKind::Star(Box::new(name)), self.range_from(start));
                (Vec::new(), ty)
            }
            TokenKind::Ident
                if matches!(
                    self.nth(1),
                    TokenKind::Period | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::String
                ) =>
            {
                (Vec::new(), self.type_name())
            }
            TokenKind::Ident => {
                let names = self.ident_list();
                (names, self.parse_type())
            }
            _ => {
                self.error_recover(
                    "expected field name or embedded type",
                    &[TokenKind::Semicolon, TokenKind::RBrace],
                );
                return None;
            }
        };
        let tag = self.at(TokenKind::String).then(|| {
            let token = self.bump();
            BasicLit {
                kind: TokenKind::String,
                value: self.text(token).into(),
                range: token.range,
            }
        });
        Some(Field {
            names,
            ty,
            tag,
            range: self.range_from(start),
        })
    }

    fn interface_type(&mut self) -> Expr {
        let start = self.start();
        self.bump();
        let list_start = self.start();
        let mut fields = Vec::new();
        if self.expect(TokenKind::LBrace) {
            while !self.at(TokenKind::RBrace) && !self.at_eof() {
                let before = self.pos;
                let elem_start = self.start();
                if self.at(TokenKind::Ident) && self.nth(1) == TokenKind::LParen {
                    let name = self.ident();
                    let sig = self.signature(self.start());
                    let range = sig.range;
                    fields.push(Field {
                        names: vec![name],
                        ty: Expr::new(ExprKind::FuncType(sig), range),
                        tag: None,
                        range: self.range_from(elem_start),
                    });
                } else if self.at(TokenKind::Ident) {
                    let ty = self.type_name();
                    fields.push(Field {
                        names: Vec::new(),
                        ty,
                        tag: None,
                        range: self.range_from(elem_start),
                    });
                }
                if self.at(TokenKind::Or) || self.at(TokenKind::Tilde) || self.pos == before {
                    self.error_recover(
                        "type constraints are not supported",
                        &[TokenKind::Semicolon, TokenKind::RBrace],
                    );
                }
                self.expect_semi();
                self.ensure_progress(before);
            }
            self.expect(TokenKind::RBrace);
        }
        let list = FieldList {
            fields,
            range: self.range_from(list_start),
        };
        Expr::new(ExprKind::InterfaceType(list), self.range_from(start))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub(super) fn expr_list(&mut self) -> Vec<Expr> {
        let mut list = vec![self.parse_expr()];
        while self.eat(TokenKind::Comma) {
            list.push(self.parse_expr());
        }
        list
    }

    pub(super) fn parse_expr(&mut self) -> Expr {
        self.binary_expr(1)
    }

    fn binary_expr(&mut self, min_prec: u8) -> Expr {
        let start = self.start();
        let mut x = self.unary_expr();
        loop {
            let op = self.kind();
            let prec = precedence(op);
            if prec < min_prec {
                return x;
            }
            self.bump();
            let y = self.binary_expr(prec + 1);
            x = Expr::new(
                ExprKind::Binary {
                    op,
                    x: Box::new(x),
                    y: Box::new(y),
                },
                self.range_from(start),
            );
        }
    }

    fn unary_expr(&mut self) -> Expr {
        let start = self.start();
        match self.kind() {
            TokenKind::Add
            | TokenKind::Sub
            | TokenKind::Not
            | TokenKind::Xor
            | TokenKind::And
            | TokenKind::Tilde => {
                let op = self.bump().kind;
                let x = self.unary_expr();
                Expr::new(
                    ExprKind::Unary {
                        op,
                        x: Box::new(x),
                    },
                    self.range_from(start),
                )
            }
            TokenKind::Arrow if self.nth(1) == TokenKind::Chan => self.chan_type(),
            TokenKind::Arrow => {
                self.bump();
                let x = self.unary_expr();
                Expr::new(
                    ExprKind::Unary {
                        op: TokenKind::Arrow,
                        x: Box::new(x),
                    },
                    self.range_from(start),
                )
            }
            TokenKind::Mul => {
                self.bump();
                let x = self.unary_expr();
                Expr::new(ExprKind::Star(Box::new(x)), self.range_from(start))
            }
            _ => self.primary_expr(),
        }
    }

    fn primary_expr(&mut self) -> Expr {
        let start = self.start();
        let mut x = self.operand();
        loop {
            match self.kind() {
                TokenKind::Period => {
                    self.bump();
                    match self.kind() {
                        TokenKind::Ident => {
                            let sel = self.ident();
                            x = Expr::new(
                                ExprKind::Selector {
                                    x: Box::new(x),
                                    sel,
                                },
                                self.range_from(start),
                            );
                        }
                        TokenKind::LParen => {
                            self.bump();
                            let ty = if self.eat(TokenKind::Type) {
                                None
                            } else {
                                Some(Box::new(self.parse_type()))
                            };
                            self.expect(TokenKind::RParen);
                            x = Expr::new(
                                ExprKind::TypeAssert { x: Box::new(x), ty },
                                self.range_from(start),
                            );
                        }
                        _ => {
                            self.error("expected selector or type assertion");
                            return x;
                        }
                    }
                }
                TokenKind::LBrack => x = self.index_or_slice(start, x),
                TokenKind::LParen => x = self.call(start, x),
                TokenKind::LBrace
                    if is_literal_type(&x) && (self.expr_lev >= 0 || !is_type_name(&x)) =>
                {
                    x = self.composite_lit(start, Some(x));
                }
                _ => return x,
            }
        }
    }

    fn operand(&mut self) -> Expr {
        let start = self.start();
        match self.kind() {
            TokenKind::Ident => {
                let ident = self.ident();
                ident_expr(ident)
            }
            kind if kind.is_literal() => {
                let token = self.bump();
                Expr::new(
                    ExprKind::BasicLit(BasicLit {
                        kind,
                        value: self.text(token).into(),
                        range: token.range,
                    }),
                    token.range,
                )
            }
            TokenKind::LParen => {
                self.bump();
                self.expr_lev += 1;
                let inner = self.parse_expr();
                self.expr_lev -= 1;
                self.expect(TokenKind::RParen);
                Expr::new(ExprKind::Paren(Box::new(inner)), self.range_from(start))
            }
            TokenKind::Func => {
                self.bump();
                let sig = self.signature(start);
                if self.at(TokenKind::LBrace) {
                    self.expr_lev += 1;
                    let body = self.block();
                    self.expr_lev -= 1;
                    Expr::new(ExprKind::FuncLit { ty: sig, body }, self.range_from(start))
                } else {
                    let range = sig.range;
                    Expr::new(ExprKind::FuncType(sig), range)
                }
            }
            TokenKind::LBrack
            | TokenKind::Struct
            | TokenKind::Map
            | TokenKind::Chan
            | TokenKind::Interface => self.parse_type(),
            _ => {
                self.error("expected expression");
                if !self.at_any(&[
                    TokenKind::RParen,
                    TokenKind::RBrack,
                    TokenKind::RBrace,
                    TokenKind::Semicolon,
                    TokenKind::Comma,
                    TokenKind::Colon,
                    TokenKind::LBrace,
                    TokenKind::Eof,
                ]) {
                    self.bump();
                }
                Expr::bad(self.range_from(start))
            }
        }
    }

    fn index_or_slice(&mut self, start: TextSize, x: Expr) -> Expr {
        self.bump();
        self.expr_lev += 1;
        let mut parts: [Option<Box<Expr>>; 3] = [None, None, None];
        if !self.at(TokenKind::Colon) {
            parts[0] = Some(Box::new(self.parse_expr()));
        }
        let mut colons = 0;
        while colons < 2 && self.eat(TokenKind::Colon) {
            colons += 1;
            if !self.at(TokenKind::Colon) && !self.at(TokenKind::RBrack) {
                parts[colons] = Some(Box::new(self.parse_expr()));
            }
        }
        self.expr_lev -= 1;
        self.expect(TokenKind::RBrack);
        let [lo, hi, max] = parts;
        let kind = if colons > 0 {
            ExprKind::Slice {
                x: Box::new(x),
                lo,
                hi,
                max,
            }
        } else {
            let index = lo.unwrap_or_else(|| Box::new(Expr::bad(TextRange::empty(self.prev_end))));
            ExprKind::Index {
                x: Box::new(x),
                index,
            }
        };
        Expr::new(kind, self.range_from(start))
    }

    fn call(&mut self, start: TextSize, fun: Expr) -> Expr {
        self.bump();
        self.expr_lev += 1;
        let mut args = Vec::new();
        let mut ellipsis = false;
        while !self.at(TokenKind::RParen) && !self.at_eof() {
            args.push(self.parse_expr());
            ellipsis = self.eat(TokenKind::Ellipsis);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expr_lev -= 1;
        if !self.eat(TokenKind::RParen) {
            self.error_recover(
                "expected ')'",
                &[TokenKind::RParen, TokenKind::Semicolon, TokenKind::RBrace],
            );
            self.eat(TokenKind::RParen);
        }
        Expr::new(
            ExprKind::Call {
                fun: Box::new(fun),
                args,
                ellipsis,
            },
            self.range_from(start),
        )
    }

    pub(super) fn composite_lit(&mut self, start: TextSize, ty: Option<Expr>) -> Expr {
        self.bump();
        self.expr_lev += 1;
        let mut elts = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at_eof() {
            let before = self.pos;
            elts.push(self.element());
            if self.pos == before {
                break;
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expr_lev -= 1;
        if !self.eat(TokenKind::RBrace) {
            self.error_recover("expected '}'", &[TokenKind::RBrace]);
            self.eat(TokenKind::RBrace);
        }
        Expr::new(
            ExprKind::CompositeLit {
                ty: ty.map(Box::new),
                elts,
            },
            self.range_from(start),
        )
    }

    fn element(&mut self) -> Expr {
        let start = self.start();
        let key = self.element_value();
        if self.eat(TokenKind::Colon) {
            let value = self.element_value();
            return Expr::new(
                ExprKind::KeyValue {
                    key: Box::new(key),
                    value: Box::new(value),
                },
                self.range_from(start),
            );
        }
        key
    }

    /// An element, where a bare `{...}` is a literal of the elided type.
    fn element_value(&mut self) -> Expr {
        if self.at(TokenKind::LBrace) {
            let start = self.start();
            return self.composite_lit(start, None);
        }
        self.parse_expr()
    }
}

/// Build an identifier expression.
pub(super) fn ident_expr(ident: Ident) -> Expr {
    let range = ident.range;
    Expr::new(ExprKind::Ident(ident), range)
}
