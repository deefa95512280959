//! Statements and blocks.

use text_size::{TextRange, TextSize};

use super::Parser;
use crate::syntax::ast::{
    Block, BranchKind, CaseClause, CommClause, Expr, ExprKind, GenKind, Stmt, StmtKind,
};
use crate::syntax::lexer::TokenKind;

#[derive(Copy, Clone, PartialEq, Eq)]
enum SimpleMode {
    Basic,
    LabelOk,
}

impl Parser<'_> {
    pub(super) fn block(&mut self) -> Block {
        let start = self.start();
        self.expect(TokenKind::LBrace);
        let stmts = self.stmt_list();
        if !self.eat(TokenKind::RBrace) {
            self.error("expected '}'");
        }
        Block {
            stmts,
            range: self.range_from(start),
        }
    }

    fn stmt_list(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while !self.at_any(&[
            TokenKind::Case,
            TokenKind::Default,
            TokenKind::RBrace,
            TokenKind::Eof,
        ]) {
            let before = self.pos;
            let stmt = self.stmt();
            if !matches!(stmt.kind, StmtKind::Empty) {
                stmts.push(stmt);
            }
            self.ensure_progress(before);
        }
        stmts
    }

    fn stmt(&mut self) -> Stmt {
        let start = self.start();
        let kind = match self.kind() {
            TokenKind::Const => return self.decl_stmt(GenKind::Const),
            TokenKind::Var => return self.decl_stmt(GenKind::Var),
            TokenKind::Type => return self.decl_stmt(GenKind::Type),
            TokenKind::Go | TokenKind::Defer => {
                let keyword = self.bump().kind;
                let call = self.parse_expr();
                if !matches!(call.unparen().kind, ExprKind::Call { .. }) {
                    self.errors.push(super::SyntaxError::new(
                        "expression in go/defer must be function call",
                        call.range,
                    ));
                }
                if keyword == TokenKind::Go {
                    StmtKind::Go(call)
                } else {
                    StmtKind::Defer(call)
                }
            }
            TokenKind::Return => {
                self.bump();
                let results = if self.at(TokenKind::Semicolon) || self.at(TokenKind::RBrace) {
                    Vec::new()
                } else {
                    self.expr_list()
                };
                StmtKind::Return(results)
            }
            TokenKind::Break | TokenKind::Continue | TokenKind::Goto | TokenKind::Fallthrough => {
                let kind = match self.bump().kind {
                    TokenKind::Break => BranchKind::Break,
                    TokenKind::Continue => BranchKind::Continue,
                    TokenKind::Goto => BranchKind::Goto,
                    _ => BranchKind::Fallthrough,
                };
                let label = (kind != BranchKind::Fallthrough && self.at(TokenKind::Ident))
                    .then(|| self.ident());
                StmtKind::Branch { kind, label }
            }
            TokenKind::LBrace => StmtKind::Block(self.block()),
            TokenKind::If => return self.terminated(start, |p| p.if_stmt()),
            TokenKind::Switch => return self.terminated(start, |p| p.switch_stmt()),
            TokenKind::Select => return self.terminated(start, |p| p.select_stmt()),
            TokenKind::For => return self.terminated(start, |p| p.for_stmt()),
            TokenKind::Semicolon => {
                self.bump();
                return Stmt::new(StmtKind::Empty, self.range_from(start));
            }
            TokenKind::Ident
            | TokenKind::Int
            | TokenKind::Float
            | TokenKind::Imag
            | TokenKind::Char
            | TokenKind::String
            | TokenKind::Func
            | TokenKind::LParen
            | TokenKind::LBrack
            | TokenKind::Struct
            | TokenKind::Map
            | TokenKind::Chan
            | TokenKind::Interface
            | TokenKind::Add
            | TokenKind::Sub
            | TokenKind::Mul
            | TokenKind::And
            | TokenKind::Xor
            | TokenKind::Arrow
            | TokenKind::Not => {
                let stmt = self.simple_stmt(SimpleMode::LabelOk);
                if matches!(stmt.kind, StmtKind::Labeled { .. }) {
                    return stmt;
                }
                stmt.kind
            }
            _ => {
                self.error_recover(
                    "expected statement",
                    &[TokenKind::Semicolon, TokenKind::RBrace],
                );
                self.eat(TokenKind::Semicolon);
                return Stmt::new(StmtKind::Bad, self.range_from(start));
            }
        };
        let range = self.range_from(start);
        self.expect_semi();
        Stmt::new(kind, range)
    }

    fn terminated(&mut self, start: TextSize, parse: impl FnOnce(&mut Self) -> StmtKind) -> Stmt {
        let kind = parse(self);
        let range = self.range_from(start);
        self.expect_semi();
        Stmt::new(kind, range)
    }

    fn decl_stmt(&mut self, kind: GenKind) -> Stmt {
        let decl = self.gen_decl(kind);
        let range = decl.range;
        Stmt::new(StmtKind::Decl(decl), range)
    }

    fn simple_stmt(&mut self, mode: SimpleMode) -> Stmt {
        let start = self.start();
        let lhs = self.expr_list();
        self.simple_stmt_rest(start, lhs, mode)
    }

    fn simple_stmt_rest(&mut self, start: TextSize, mut lhs: Vec<Expr>, mode: SimpleMode) -> Stmt {
        let kind = match self.kind() {
            TokenKind::Define
            | TokenKind::Assign
            | TokenKind::AddAssign
            | TokenKind::SubAssign
            | TokenKind::MulAssign
            | TokenKind::QuoAssign
            | TokenKind::RemAssign
            | TokenKind::AndAssign
            | TokenKind::OrAssign
            | TokenKind::XorAssign
            | TokenKind::ShlAssign
            | TokenKind::ShrAssign
            | TokenKind::AndNotAssign => {
                let tok = self.bump().kind;
                let rhs = self.expr_list();
                StmtKind::Assign { lhs, tok, rhs }
            }
            TokenKind::Colon
                if mode == SimpleMode::LabelOk
                    && lhs.len() == 1
                    && matches!(lhs[0].kind, ExprKind::Ident(_)) =>
            {
                self.bump();
                let Some(ExprKind::Ident(label)) = lhs.pop().map(|e| e.kind) else {
                    return Stmt::new(StmtKind::Bad, self.range_from(start));
                };
                let stmt = if self.at(TokenKind::RBrace) {
                    Stmt::new(StmtKind::Empty, TextRange::empty(self.start()))
                } else {
                    self.stmt()
                };
                return Stmt::new(
                    StmtKind::Labeled {
                        label,
                        stmt: Box::new(stmt),
                    },
                    self.range_from(start),
                );
            }
            TokenKind::Arrow => {
                self.bump();
                let value = self.parse_expr();
                let chan = self.single(lhs);
                StmtKind::Send { chan, value }
            }
            TokenKind::Inc | TokenKind::Dec => {
                let inc = self.bump().kind == TokenKind::Inc;
                let x = self.single(lhs);
                StmtKind::IncDec { x, inc }
            }
            _ => StmtKind::Expr(self.single(lhs)),
        };
        Stmt::new(kind, self.range_from(start))
    }

    /// The only expression of a list that must hold exactly one.
    fn single(&mut self, mut list: Vec<Expr>) -> Expr {
        if list.len() > 1 {
            let range = list[1].range;
            self.errors.push(super::SyntaxError::new(
                "expected 1 expression",
                range,
            ));
        }
        list.truncate(1);
        list.pop()
            .unwrap_or_else(|| Expr::bad(TextRange::empty(self.prev_end)))
    }

    /// Control clause header parsing with composite literals disabled.
    fn with_control_clause<T>(&mut self, parse: impl FnOnce(&mut Self) -> T) -> T {
        let lev = std::mem::replace(&mut self.expr_lev, -1);
        let value = parse(self);
        self.expr_lev = lev;
        value
    }

    fn if_stmt(&mut self) -> StmtKind {
        self.bump();
        let (init, cond) = self.with_control_clause(|p| {
            if p.at(TokenKind::LBrace) {
                p.error("missing condition in if statement");
                return (None, Expr::bad(TextRange::empty(p.start())));
            }
            let init = (!p.at(TokenKind::Semicolon)).then(|| p.simple_stmt(SimpleMode::Basic));
            if p.eat(TokenKind::Semicolon) {
                let cond = if p.at(TokenKind::LBrace) {
                    p.error("missing condition in if statement");
                    Expr::bad(TextRange::empty(p.start()))
                } else {
                    p.parse_expr()
                };
                return (init.map(Box::new), cond);
            }
            match init.map(|s| s.kind) {
                Some(StmtKind::Expr(cond)) => (None, cond),
                _ => {
                    p.error("expected condition in if statement");
                    (None, Expr::bad(TextRange::empty(p.start())))
                }
            }
        });
        let then = self.block();
        let els = if self.eat(TokenKind::Else) {
            let start = self.start();
            match self.kind() {
                TokenKind::If => {
                    let kind = self.if_stmt();
                    Some(Box::new(Stmt::new(kind, self.range_from(start))))
                }
                TokenKind::LBrace => {
                    let block = self.block();
                    let range = block.range;
                    Some(Box::new(Stmt::new(StmtKind::Block(block), range)))
                }
                _ => {
                    self.error("expected if statement or block");
                    None
                }
            }
        } else {
            None
        };
        StmtKind::If {
            init,
            cond,
            then,
            els,
        }
    }

    fn switch_stmt(&mut self) -> StmtKind {
        self.bump();
        let (init, tag) = self.with_control_clause(|p| {
            let mut init = None;
            let mut tag = None;
            if !p.at(TokenKind::LBrace) {
                if !p.at(TokenKind::Semicolon) {
                    tag = Some(p.simple_stmt(SimpleMode::Basic));
                }
                if p.eat(TokenKind::Semicolon) {
                    init = tag.take();
                    if !p.at(TokenKind::LBrace) {
                        tag = Some(p.simple_stmt(SimpleMode::Basic));
                    }
                }
            }
            (init.map(Box::new), tag)
        });

        let guard = match tag.as_ref().map(|s| &s.kind) {
            Some(StmtKind::Assign { lhs, tok, rhs })
                if *tok == TokenKind::Define
                    && lhs.len() == 1
                    && rhs.len() == 1
                    && is_type_switch_guard(&rhs[0]) =>
            {
                Some((lhs[0].as_ident().cloned(), rhs[0].clone()))
            }
            Some(StmtKind::Expr(x)) if is_type_switch_guard(x) => Some((None, x.clone())),
            _ => None,
        };

        let clauses = self.case_body(guard.is_some());
        match guard {
            Some((binding, guard)) => {
                let x = match guard.kind {
                    ExprKind::TypeAssert { x, .. } => *x,
                    _ => guard,
                };
                StmtKind::TypeSwitch {
                    init,
                    binding,
                    x,
                    clauses,
                }
            }
            None => {
                let tag = match tag.map(|s| s.kind) {
                    Some(StmtKind::Expr(x)) => Some(x),
                    Some(_) => {
                        self.error("switch expression must be an expression");
                        None
                    }
                    None => None,
                };
                StmtKind::Switch { init, tag, clauses }
            }
        }
    }

    fn case_body(&mut self, type_switch: bool) -> Vec<CaseClause> {
        let mut clauses = Vec::new();
        if !self.expect(TokenKind::LBrace) {
            return clauses;
        }
        while self.at(TokenKind::Case) || self.at(TokenKind::Default) {
            let start = self.start();
            let list = if self.eat(TokenKind::Case) {
                Some(if type_switch {
                    self.type_list()
                } else {
                    self.expr_list()
                })
            } else {
                self.bump();
                None
            };
            self.expect(TokenKind::Colon);
            let body = self.stmt_list();
            clauses.push(CaseClause {
                list,
                body,
                range: self.range_from(start),
            });
        }
        if !self.eat(TokenKind::RBrace) {
            self.error_recover("expected '}'", &[TokenKind::RBrace]);
            self.eat(TokenKind::RBrace);
        }
        clauses
    }

    fn type_list(&mut self) -> Vec<Expr> {
        let mut list = vec![self.parse_type()];
        while self.eat(TokenKind::Comma) {
            list.push(self.parse_type());
        }
        list
    }

    fn select_stmt(&mut self) -> StmtKind {
        self.bump();
        let mut clauses = Vec::new();
        if !self.expect(TokenKind::LBrace) {
            return StmtKind::Select(clauses);
        }
        while self.at(TokenKind::Case) || self.at(TokenKind::Default) {
            let start = self.start();
            let comm = if self.eat(TokenKind::Case) {
                Some(Box::new(self.simple_stmt(SimpleMode::Basic)))
            } else {
                self.bump();
                None
            };
            self.expect(TokenKind::Colon);
            let body = self.stmt_list();
            clauses.push(CommClause {
                comm,
                body,
                range: self.range_from(start),
            });
        }
        if !self.eat(TokenKind::RBrace) {
            self.error_recover("expected '}'", &[TokenKind::RBrace]);
            self.eat(TokenKind::RBrace);
        }
        StmtKind::Select(clauses)
    }

    fn for_stmt(&mut self) -> StmtKind {
        self.bump();
        enum Header {
            Loop {
                init: Option<Box<Stmt>>,
                cond: Option<Expr>,
                post: Option<Box<Stmt>>,
            },
            Range {
                key: Option<Expr>,
                value: Option<Expr>,
                define: bool,
                x: Expr,
            },
        }

        let header = self.with_control_clause(|p| {
            if p.at(TokenKind::LBrace) {
                return Header::Loop {
                    init: None,
                    cond: None,
                    post: None,
                };
            }
            if p.eat(TokenKind::Range) {
                return Header::Range {
                    key: None,
                    value: None,
                    define: false,
                    x: p.parse_expr(),
                };
            }

            let mut s2 = None;
            if !p.at(TokenKind::Semicolon) {
                let start = p.start();
                let lhs = p.expr_list();
                if p.at_any(&[TokenKind::Define, TokenKind::Assign]) && p.nth(1) == TokenKind::Range
                {
                    let define = p.bump().kind == TokenKind::Define;
                    p.bump();
                    let x = p.parse_expr();
                    let mut lhs = lhs.into_iter();
                    return Header::Range {
                        key: lhs.next(),
                        value: lhs.next(),
                        define,
                        x,
                    };
                }
                s2 = Some(p.simple_stmt_rest(start, lhs, SimpleMode::Basic));
            }

            if p.eat(TokenKind::Semicolon) {
                let init = s2.map(Box::new);
                let cond = (!p.at(TokenKind::Semicolon)).then(|| p.parse_expr());
                p.expect(TokenKind::Semicolon);
                let post = (!p.at(TokenKind::LBrace))
                    .then(|| Box::new(p.simple_stmt(SimpleMode::Basic)));
                return Header::Loop { init, cond, post };
            }

            let cond = match s2.map(|s| s.kind) {
                Some(StmtKind::Expr(cond)) => Some(cond),
                Some(_) => {
                    p.error("expected for loop condition");
                    None
                }
                None => None,
            };
            Header::Loop {
                init: None,
                cond,
                post: None,
            }
        });

        let body = self.block();
        match header {
            Header::Loop { init, cond, post } => StmtKind::For {
                init,
                cond,
                post,
                body,
            },
            Header::Range {
                key,
                value,
                define,
                x,
            } => StmtKind::Range {
                key,
                value,
                define,
                x,
                body,
            },
        }
    }
}

fn is_type_switch_guard(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::TypeAssert { ty: None, .. })
}
