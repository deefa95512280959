//! Statements and function bodies.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::{Checker, ScopeId};
use crate::hir::ids::{SymbolId, TypeId};
use crate::hir::symbols::{ConstValue, SymbolClass};
use crate::hir::types::{BasicKind, Type};
use crate::syntax::ast::{
    Block, CaseClause, Decl, Expr, ExprKind, GenDecl, GenKind, Ident, Spec, Stmt,
    StmtKind,
};
use crate::syntax::lexer::TokenKind;

impl Checker<'_> {
    pub(super) fn func_body(&mut self, id: SymbolId, file: usize, decl: usize) {
        self.cur_file = file;
        let source = self.files[file].clone();
        let Decl::Func(func) = &source.ast().decls[decl] else {
            return;
        };
        let (Some(body), Some(&scope)) = (&func.body, self.func_scopes.get(&id)) else {
            return;
        };
        self.body(scope, body);
    }

    /// Check a function body whose parameters are declared in `scope`.
    pub(super) fn body(&mut self, scope: ScopeId, body: &Block) {
        let mut labels = FxHashMap::default();
        self.collect_labels(&body.stmts, &mut labels);
        self.labels.push(labels);
        self.stmts(scope, &body.stmts);
        self.labels.pop();
    }

    fn block(&mut self, parent: ScopeId, block: &Block) {
        let scope = self.new_scope(Some(parent));
        self.stmts(scope, &block.stmts);
    }

    fn stmts(&mut self, scope: ScopeId, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(scope, stmt);
        }
    }

    fn stmt(&mut self, scope: ScopeId, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Decl(gen_decl) => self.local_decl(scope, gen_decl),
            StmtKind::Labeled { label, stmt } => {
                let found = self
                    .labels
                    .last()
                    .and_then(|labels| labels.get(&label.name))
                    .copied();
                if let Some(found) = found {
                    self.record_def(label, found);
                }
                self.stmt(scope, stmt);
            }
            StmtKind::Expr(expr) | StmtKind::Go(expr) | StmtKind::Defer(expr) => {
                self.expr(scope, expr, None);
            }
            StmtKind::Send { chan, value } => {
                self.expr(scope, chan, None);
                self.expr(scope, value, None);
            }
            StmtKind::IncDec { x, .. } => {
                self.expr(scope, x, None);
            }
            StmtKind::Assign { lhs, tok, rhs } => {
                if *tok == TokenKind::Define {
                    self.short_var_decl(scope, stmt, lhs, rhs);
                } else {
                    self.expr_list(scope, rhs, lhs.len(), None);
                    self.assign_lhs(scope, lhs);
                }
            }
            StmtKind::Return(results) => self.exprs(scope, results),
            StmtKind::Branch { label, .. } => {
                let Some(label) = label else {
                    return;
                };
                let found = self
                    .labels
                    .last()
                    .and_then(|labels| labels.get(&label.name))
                    .copied();
                match found {
                    Some(found) => self.record_use(label, found),
                    None => {
                        let span = self.span(label.range);
                        self.diags
                            .undefined(span, &format!("label {}", label.name));
                    }
                }
            }
            StmtKind::Block(block) => self.block(scope, block),
            StmtKind::If {
                init,
                cond,
                then,
                els,
            } => {
                let scope = self.new_scope(Some(scope));
                if let Some(init) = init {
                    self.stmt(scope, init);
                }
                self.expr(scope, cond, None);
                self.block(scope, then);
                if let Some(els) = els {
                    self.stmt(scope, els);
                }
            }
            StmtKind::Switch { init, tag, clauses } => {
                let scope = self.new_scope(Some(scope));
                if let Some(init) = init {
                    self.stmt(scope, init);
                }
                if let Some(tag) = tag {
                    self.expr(scope, tag, None);
                }
                for clause in clauses {
                    if let Some(list) = &clause.list {
                        self.exprs(scope, list);
                    }
                    let clause_scope = self.new_scope(Some(scope));
                    self.stmts(clause_scope, &clause.body);
                }
            }
            StmtKind::TypeSwitch {
                init,
                binding,
                x,
                clauses,
            } => {
                let scope = self.new_scope(Some(scope));
                if let Some(init) = init {
                    self.stmt(scope, init);
                }
                let guarded = match &x.unparen().kind {
                    ExprKind::TypeAssert { x, ty: None } => x.as_ref(),
                    _ => x,
                };
                let operand = self.expr(scope, guarded, None);
                for clause in clauses {
                    self.type_clause(scope, binding.as_ref(), operand.ty, clause);
                }
            }
            StmtKind::Select(clauses) => {
                for clause in clauses {
                    let scope = self.new_scope(Some(scope));
                    if let Some(comm) = &clause.comm {
                        self.stmt(scope, comm);
                    }
                    self.stmts(scope, &clause.body);
                }
            }
            StmtKind::For {
                init,
                cond,
                post,
                body,
            } => {
                let scope = self.new_scope(Some(scope));
                if let Some(init) = init {
                    self.stmt(scope, init);
                }
                if let Some(cond) = cond {
                    self.expr(scope, cond, None);
                }
                if let Some(post) = post {
                    self.stmt(scope, post);
                }
                self.block(scope, body);
            }
            StmtKind::Range {
                key,
                value,
                define,
                x,
                body,
            } => {
                let scope = self.new_scope(Some(scope));
                let operand = self.expr(scope, x, None);
                let (key_ty, value_ty) = self.range_types(operand.ty);
                if *define {
                    let mut declared = Vec::new();
                    for (expr, ty) in [(key, key_ty), (value, value_ty)] {
                        let Some(expr) = expr else { continue };
                        let Some(ident) = expr.as_ident() else {
                            let span = self.span(expr.range);
                            self.diags
                                .invalid_operand(span, "non-name on left side of :=");
                            continue;
                        };
                        let var = self.new_var(Some(ident), ty);
                        self.record_def(ident, var);
                        declared.push((ident, var));
                    }
                    for (ident, var) in declared {
                        self.declare(scope, ident, var);
                    }
                } else {
                    let lhs: Vec<Expr> = [key, value].into_iter().flatten().cloned().collect();
                    self.assign_lhs(scope, &lhs);
                }
                self.block(scope, body);
            }
            StmtKind::Empty | StmtKind::Bad => {}
        }
    }

    /// Left-hand sides of a plain assignment; `_` is always allowed.
    fn assign_lhs(&mut self, scope: ScopeId, lhs: &[Expr]) {
        for expr in lhs {
            if expr.as_ident().is_some_and(|ident| ident.is_blank()) {
                continue;
            }
            self.expr(scope, expr, None);
        }
    }

    fn short_var_decl(&mut self, scope: ScopeId, stmt: &Stmt, lhs: &[Expr], rhs: &[Expr]) {
        let types = self.expr_list(scope, rhs, lhs.len(), None);
        let mut declared = Vec::new();
        let mut any_new = false;
        for (expr, ty) in lhs.iter().zip(types) {
            let Some(ident) = expr.as_ident() else {
                self.expr(scope, expr, None);
                let span = self.span(expr.range);
                self.diags
                    .invalid_operand(span, "non-name on left side of :=");
                continue;
            };
            let existing = self.scopes[scope.0 as usize].names.get(&ident.name).copied();
            match existing {
                Some(existing) if !ident.is_blank() => self.record_use(ident, existing),
                _ => {
                    let ty = self.default_type(ty);
                    let var = self.new_var(Some(ident), ty);
                    self.record_def(ident, var);
                    any_new |= !ident.is_blank();
                    declared.push((ident, var));
                }
            }
        }
        for (ident, var) in declared {
            self.declare(scope, ident, var);
        }
        if !any_new {
            let span = self.span(stmt.range);
            self.diags
                .invalid_operand(span, "no new variables on left side of :=");
        }
    }

    /// One clause of a type switch. The bound variable gets a fresh
    /// implicit object per clause, typed by the clause's single type if
    /// there is one.
    fn type_clause(
        &mut self,
        scope: ScopeId,
        binding: Option<&Ident>,
        guarded: TypeId,
        clause: &CaseClause,
    ) {
        let mut types = Vec::new();
        for expr in clause.list.iter().flatten() {
            if expr.as_ident().is_some_and(|ident| ident.name == "nil") {
                self.expr(scope, expr, None);
                types.push(None);
            } else {
                types.push(Some(self.typexpr(scope, expr, None)));
            }
        }
        let clause_scope = self.new_scope(Some(scope));
        if let Some(binding) = binding {
            let ty = match types.as_slice() {
                [Some(single)] => *single,
                _ => guarded,
            };
            let var = self.new_var(Some(binding), ty);
            let span = self.span(clause.range);
            self.info.record_implicit(span, var);
            self.declare(clause_scope, binding, var);
        }
        self.stmts(clause_scope, &clause.body);
    }

    /// Key and value types produced by ranging over `ty`.
    fn range_types(&mut self, ty: TypeId) -> (TypeId, TypeId) {
        let invalid = self.invalid();
        let int = self.db().basic(BasicKind::Int);
        let under = self.db().underlying(ty);
        match self.db().ty(under).clone() {
            Type::Basic(kind) if kind.is_string() => (int, self.db().basic(BasicKind::Rune)),
            Type::Basic(
                BasicKind::Int
                | BasicKind::Int8
                | BasicKind::Int16
                | BasicKind::Int32
                | BasicKind::Int64
                | BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
                | BasicKind::UntypedInt,
            ) => (self.default_type(ty), invalid),
            Type::Array { elem, .. } | Type::Slice(elem) => (int, elem),
            Type::Pointer(target) => match self.db().ty(self.db().underlying(target)) {
                Type::Array { elem, .. } => (int, *elem),
                _ => (invalid, invalid),
            },
            Type::Map { key, value } => (key, value),
            Type::Chan { elem, .. } => (elem, invalid),
            _ => (invalid, invalid),
        }
    }

    // ========================================================================
    // LOCAL DECLARATIONS
    // ========================================================================

    fn local_decl(&mut self, scope: ScopeId, gen_decl: &GenDecl) {
        match gen_decl.kind {
            GenKind::Const => {
                let saved = self.iota.take();
                let mut src = None;
                for spec in &gen_decl.specs {
                    let Spec::Value(vs) = spec else { continue };
                    if vs.ty.is_some() || !vs.values.is_empty() {
                        src = Some(vs);
                    }
                    let from = src.unwrap_or(vs);
                    self.iota = Some(ConstValue::Int(vs.iota as i64));
                    let consts: Vec<_> = (0..vs.names.len())
                        .map(|index| self.const_value(scope, from, index))
                        .collect();
                    let mut declared = Vec::new();
                    for (name, (ty, value)) in vs.names.iter().zip(consts) {
                        let id = self.new_symbol(name, SymbolClass::Const { value }, ty, false);
                        self.record_def(name, id);
                        declared.push((name, id));
                    }
                    for (name, id) in declared {
                        self.declare(scope, name, id);
                    }
                }
                self.iota = saved;
            }
            GenKind::Var => {
                for spec in &gen_decl.specs {
                    let Spec::Value(vs) = spec else { continue };
                    let types = self.value_types(scope, vs);
                    let mut declared = Vec::new();
                    for (name, ty) in vs.names.iter().zip(types) {
                        let var = self.new_var(Some(name), ty);
                        self.record_def(name, var);
                        declared.push((name, var));
                    }
                    for (name, var) in declared {
                        self.declare(scope, name, var);
                    }
                }
            }
            GenKind::Type => {
                for spec in &gen_decl.specs {
                    let Spec::Type(ts) = spec else { continue };
                    let invalid = self.invalid();
                    let id = self.new_symbol(&ts.name, SymbolClass::TypeName, invalid, false);
                    self.record_def(&ts.name, id);
                    self.declare(scope, &ts.name, id);
                    if ts.alias {
                        let ty = self.typexpr(scope, &ts.ty, None);
                        self.db_mut().symbol_mut(id).ty = ty;
                    } else {
                        let named = self.new_named(id);
                        self.db_mut().symbol_mut(id).ty = named;
                        self.named_type(scope, &ts.name, named, &ts.ty);
                    }
                }
            }
        }
    }

    // ========================================================================
    // LABELS
    // ========================================================================

    /// Labels are function-scoped: declare every label of a body up front.
    fn collect_labels(&mut self, stmts: &[Stmt], labels: &mut FxHashMap<SmolStr, SymbolId>) {
        for stmt in stmts {
            self.collect_label(stmt, labels);
        }
    }

    fn collect_label(&mut self, stmt: &Stmt, labels: &mut FxHashMap<SmolStr, SymbolId>) {
        match &stmt.kind {
            StmtKind::Labeled { label, stmt } => {
                if !label.is_blank() {
                    match labels.get(&label.name) {
                        Some(&previous) => {
                            let previous = self.db().symbol(previous).pos;
                            let span = self.span(label.range);
                            self.diags.duplicate(span, &label.name, previous);
                        }
                        None => {
                            let invalid = self.invalid();
                            let id = self.new_symbol(label, SymbolClass::Label, invalid, false);
                            labels.insert(label.name.clone(), id);
                        }
                    }
                }
                self.collect_label(stmt, labels);
            }
            StmtKind::Block(block) => self.collect_labels(&block.stmts, labels),
            StmtKind::If { then, els, .. } => {
                self.collect_labels(&then.stmts, labels);
                if let Some(els) = els {
                    self.collect_label(els, labels);
                }
            }
            StmtKind::Switch { clauses, .. } | StmtKind::TypeSwitch { clauses, .. } => {
                for clause in clauses {
                    self.collect_labels(&clause.body, labels);
                }
            }
            StmtKind::Select(clauses) => {
                for clause in clauses {
                    self.collect_labels(&clause.body, labels);
                }
            }
            StmtKind::For { body, .. } | StmtKind::Range { body, .. } => {
                self.collect_labels(&body.stmts, labels);
            }
            _ => {}
        }
    }
}
