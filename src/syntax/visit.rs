//! Read-only traversal of the syntax tree.

use super::ast::{Block, Decl, Expr, ExprKind, FieldList, File, FuncType, Spec, Stmt, StmtKind};

/// Receives every expression of a tree in source order.
///
/// Returning `false` from [`Visitor::visit_expr`] skips the children of
/// that expression.
pub trait Visitor {
    fn visit_expr(&mut self, expr: &Expr) -> bool;
}

impl<F: FnMut(&Expr) -> bool> Visitor for F {
    fn visit_expr(&mut self, expr: &Expr) -> bool {
        self(expr)
    }
}

pub fn walk_file(v: &mut impl Visitor, file: &File) {
    for decl in &file.decls {
        match decl {
            Decl::Gen(gen_decl) => {
                for spec in &gen_decl.specs {
                    walk_spec(v, spec);
                }
            }
            Decl::Func(func) => {
                if let Some(recv) = &func.recv {
                    walk_fields(v, recv);
                }
                walk_func_type(v, &func.ty);
                if let Some(body) = &func.body {
                    walk_block(v, body);
                }
            }
            Decl::Bad(_) => {}
        }
    }
}

fn walk_spec(v: &mut impl Visitor, spec: &Spec) {
    match spec {
        Spec::Value(value) => {
            if let Some(ty) = &value.ty {
                walk_expr(v, ty);
            }
            for expr in &value.values {
                walk_expr(v, expr);
            }
        }
        Spec::Type(ty) => walk_expr(v, &ty.ty),
    }
}

fn walk_fields(v: &mut impl Visitor, list: &FieldList) {
    for field in &list.fields {
        walk_expr(v, &field.ty);
    }
}

fn walk_func_type(v: &mut impl Visitor, ty: &FuncType) {
    walk_fields(v, &ty.params);
    walk_fields(v, &ty.results);
}

pub fn walk_expr(v: &mut impl Visitor, expr: &Expr) {
    if !v.visit_expr(expr) {
        return;
    }
    match &expr.kind {
        ExprKind::Ident(_) | ExprKind::BasicLit(_) | ExprKind::Bad => {}
        ExprKind::CompositeLit { ty, elts } => {
            if let Some(ty) = ty {
                walk_expr(v, ty);
            }
            for elt in elts {
                walk_expr(v, elt);
            }
        }
        ExprKind::FuncLit { ty, body } => {
            walk_func_type(v, ty);
            walk_block(v, body);
        }
        ExprKind::Paren(x) | ExprKind::Star(x) => walk_expr(v, x),
        ExprKind::Selector { x, .. } => walk_expr(v, x),
        ExprKind::Index { x, index } => {
            walk_expr(v, x);
            walk_expr(v, index);
        }
        ExprKind::Slice { x, lo, hi, max } => {
            walk_expr(v, x);
            for part in [lo, hi, max].into_iter().flatten() {
                walk_expr(v, part);
            }
        }
        ExprKind::TypeAssert { x, ty } => {
            walk_expr(v, x);
            if let Some(ty) = ty {
                walk_expr(v, ty);
            }
        }
        ExprKind::Call { fun, args, .. } => {
            walk_expr(v, fun);
            for arg in args {
                walk_expr(v, arg);
            }
        }
        ExprKind::Unary { x, .. } => walk_expr(v, x),
        ExprKind::Binary { x, y, .. } => {
            walk_expr(v, x);
            walk_expr(v, y);
        }
        ExprKind::KeyValue { key, value } => {
            walk_expr(v, key);
            walk_expr(v, value);
        }
        ExprKind::ArrayType { len, elem } => {
            if let Some(len) = len {
                walk_expr(v, len);
            }
            walk_expr(v, elem);
        }
        ExprKind::StructType(fields) | ExprKind::InterfaceType(fields) => walk_fields(v, fields),
        ExprKind::FuncType(ty) => walk_func_type(v, ty),
        ExprKind::MapType { key, value } => {
            walk_expr(v, key);
            walk_expr(v, value);
        }
        ExprKind::ChanType { value, .. } => walk_expr(v, value),
        ExprKind::Ellipsis(elem) => {
            if let Some(elem) = elem {
                walk_expr(v, elem);
            }
        }
    }
}

pub fn walk_block(v: &mut impl Visitor, block: &Block) {
    for stmt in &block.stmts {
        walk_stmt(v, stmt);
    }
}

pub fn walk_stmt(v: &mut impl Visitor, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Decl(decl) => {
            for spec in &decl.specs {
                walk_spec(v, spec);
            }
        }
        StmtKind::Labeled { stmt, .. } => walk_stmt(v, stmt),
        StmtKind::Expr(x) | StmtKind::Go(x) | StmtKind::Defer(x) => walk_expr(v, x),
        StmtKind::Send { chan, value } => {
            walk_expr(v, chan);
            walk_expr(v, value);
        }
        StmtKind::IncDec { x, .. } => walk_expr(v, x),
        StmtKind::Assign { lhs, rhs, .. } => {
            for expr in lhs.iter().chain(rhs) {
                walk_expr(v, expr);
            }
        }
        StmtKind::Return(results) => {
            for expr in results {
                walk_expr(v, expr);
            }
        }
        StmtKind::Block(block) => walk_block(v, block),
        StmtKind::If {
            init,
            cond,
            then,
            els,
        } => {
            if let Some(init) = init {
                walk_stmt(v, init);
            }
            walk_expr(v, cond);
            walk_block(v, then);
            if let Some(els) = els {
                walk_stmt(v, els);
            }
        }
        StmtKind::Switch { init, tag, clauses } => {
            if let Some(init) = init {
                walk_stmt(v, init);
            }
            if let Some(tag) = tag {
                walk_expr(v, tag);
            }
            for clause in clauses {
                for expr in clause.list.iter().flatten() {
                    walk_expr(v, expr);
                }
                for stmt in &clause.body {
                    walk_stmt(v, stmt);
                }
            }
        }
        StmtKind::TypeSwitch {
            init, x, clauses, ..
        } => {
            if let Some(init) = init {
                walk_stmt(v, init);
            }
            walk_expr(v, x);
            for clause in clauses {
                for expr in clause.list.iter().flatten() {
                    walk_expr(v, expr);
                }
                for stmt in &clause.body {
                    walk_stmt(v, stmt);
                }
            }
        }
        StmtKind::Select(clauses) => {
            for clause in clauses {
                if let Some(comm) = &clause.comm {
                    walk_stmt(v, comm);
                }
                for stmt in &clause.body {
                    walk_stmt(v, stmt);
                }
            }
        }
        StmtKind::For {
            init,
            cond,
            post,
            body,
        } => {
            if let Some(init) = init {
                walk_stmt(v, init);
            }
            if let Some(cond) = cond {
                walk_expr(v, cond);
            }
            if let Some(post) = post {
                walk_stmt(v, post);
            }
            walk_block(v, body);
        }
        StmtKind::Range {
            key,
            value,
            x,
            body,
            ..
        } => {
            for expr in [key, value].into_iter().flatten() {
                walk_expr(v, expr);
            }
            walk_expr(v, x);
            walk_block(v, body);
        }
        StmtKind::Branch { .. } | StmtKind::Empty | StmtKind::Bad => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    #[test]
    fn test_walk_visits_nested_calls() {
        let parse = parse("package p\nfunc f() {\n\tg(h(1), func() { k() })\n}\n");
        let mut calls = Vec::new();
        walk_file(
            &mut |expr: &Expr| {
                if let ExprKind::Call { fun, .. } = &expr.kind {
                    if let Some(ident) = fun.as_ident() {
                        calls.push(ident.name.to_string());
                    }
                }
                true
            },
            &parse.file,
        );
        assert_eq!(calls, vec!["g", "h", "k"]);
    }

    #[test]
    fn test_walk_can_prune() {
        let parse = parse("package p\nvar x = a(b(c()))\n");
        let mut seen = 0;
        walk_file(
            &mut |_: &Expr| {
                seen += 1;
                false
            },
            &parse.file,
        );
        assert_eq!(seen, 1);
    }
}
