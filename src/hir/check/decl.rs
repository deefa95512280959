//! Declarations and type expressions.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::{Checker, Color, DeclInfo, Mode, ScopeId};
use crate::base::Span;
use crate::hir::display::type_string;
use crate::hir::ids::{SymbolId, TypeId};
use crate::hir::symbols::{ConstValue, SymbolClass};
use crate::hir::types::{Interface, Named, Signature, Struct, Type};
use crate::syntax::ast::{Decl, Expr, ExprKind, FieldList, FuncType, Ident, Spec, ValueSpec};

impl Checker<'_> {
    pub(super) fn new_named(&mut self, obj: SymbolId) -> TypeId {
        let invalid = self.invalid();
        self.db_mut().alloc_type(Type::Named(Named {
            obj,
            underlying: invalid,
            methods: Vec::new(),
        }))
    }

    /// Attach every method to the named type its receiver names.
    pub(super) fn associate_methods(&mut self) {
        for id in self.methods.clone() {
            let Some(DeclInfo::Func { file, decl }) = self.decls.get(&id).copied() else {
                continue;
            };
            let source = self.files[file].clone();
            let Decl::Func(func) = &source.ast().decls[decl] else {
                continue;
            };
            let Some(base) = func
                .recv
                .as_ref()
                .and_then(|recv| recv.fields.first())
                .and_then(|field| receiver_base(&field.ty))
            else {
                continue;
            };
            let Some(obj) = self.db().package(self.pkg).lookup(&base.name) else {
                continue;
            };
            let ty = self.db().symbol(obj).ty;
            let Some(named) = self.db().ty(ty).as_named() else {
                continue;
            };
            if func.name.is_blank() {
                continue;
            }
            let previous = named
                .methods
                .iter()
                .find(|m| self.db().symbol(**m).name == func.name.name)
                .and_then(|m| self.db().symbol(*m).pos);
            if let Some(previous) = previous {
                let span = source.span(func.name.range);
                let name = format!("{}.{}", base.name, func.name.name);
                self.diags.duplicate(span, &name, Some(previous));
                continue;
            }
            if let Type::Named(named) = self.db_mut().ty_mut(ty) {
                named.methods.push(id);
            }
        }
    }

    // ========================================================================
    // PACKAGE-LEVEL DECLARATIONS
    // ========================================================================

    pub(super) fn const_decl(
        &mut self,
        id: SymbolId,
        file: usize,
        decl: usize,
        spec: usize,
        src: usize,
        index: usize,
    ) {
        self.cur_file = file;
        let source = self.files[file].clone();
        let Decl::Gen(gen_decl) = &source.ast().decls[decl] else {
            return;
        };
        let (Some(Spec::Value(own)), Some(Spec::Value(from))) =
            (gen_decl.specs.get(spec), gen_decl.specs.get(src))
        else {
            return;
        };
        let scope = self.file_scopes[file];
        self.iota = Some(ConstValue::Int(own.iota as i64));
        let (ty, value) = self.const_value(scope, from, index);
        let symbol = self.db_mut().symbol_mut(id);
        symbol.ty = ty;
        symbol.class = SymbolClass::Const { value };
    }

    /// Type and value of the `index`-th name of a const spec.
    pub(super) fn const_value(
        &mut self,
        scope: ScopeId,
        spec: &ValueSpec,
        index: usize,
    ) -> (TypeId, ConstValue) {
        let declared = spec.ty.as_ref().map(|ty| self.typexpr(scope, ty, None));
        let Some(init) = spec.values.get(index) else {
            let span = self.span(spec.range);
            self.diags.invalid_operand(span, "missing init expr for const declaration");
            return (declared.unwrap_or_else(|| self.invalid()), ConstValue::Unknown);
        };
        let operand = self.expr(scope, init, declared);
        let ty = declared.unwrap_or(operand.ty);
        match operand.mode {
            Mode::Const => (ty, operand.value.unwrap_or_default()),
            Mode::Invalid => (ty, ConstValue::Unknown),
            _ => {
                let span = self.span(init.range);
                self.diags.invalid_operand(span, "value is not constant");
                (ty, ConstValue::Unknown)
            }
        }
    }

    /// Types every name of a var spec at once.
    pub(super) fn var_decl(&mut self, file: usize, decl: usize, spec: usize) {
        self.cur_file = file;
        let source = self.files[file].clone();
        let Decl::Gen(gen_decl) = &source.ast().decls[decl] else {
            return;
        };
        let Some(Spec::Value(vs)) = gen_decl.specs.get(spec) else {
            return;
        };
        let ids: Vec<SymbolId> = vs
            .names
            .iter()
            .filter_map(|name| self.info.defs.get(&source.span(name.range)).copied())
            .collect();
        for &id in &ids {
            self.colors.insert(id, Color::Grey);
        }
        let scope = self.file_scopes[file];
        let types = self.value_types(scope, vs);
        for (id, ty) in ids.into_iter().zip(types) {
            self.db_mut().symbol_mut(id).ty = ty;
            self.colors.insert(id, Color::Black);
        }
    }

    /// One type per name of a var spec.
    pub(super) fn value_types(&mut self, scope: ScopeId, spec: &ValueSpec) -> Vec<TypeId> {
        let declared = spec.ty.as_ref().map(|ty| self.typexpr(scope, ty, None));
        let n = spec.names.len();
        if spec.values.is_empty() {
            return vec![declared.unwrap_or_else(|| self.invalid()); n];
        }
        let types = self.expr_list(scope, &spec.values, n, declared);
        types
            .into_iter()
            .map(|ty| declared.unwrap_or_else(|| self.default_type(ty)))
            .collect()
    }

    pub(super) fn type_decl(&mut self, id: SymbolId, file: usize, decl: usize, spec: usize) {
        self.cur_file = file;
        let source = self.files[file].clone();
        let Decl::Gen(gen_decl) = &source.ast().decls[decl] else {
            return;
        };
        let Some(Spec::Type(ts)) = gen_decl.specs.get(spec) else {
            return;
        };
        let scope = self.file_scopes[file];
        if ts.alias {
            let ty = self.typexpr(scope, &ts.ty, None);
            self.db_mut().symbol_mut(id).ty = ty;
            return;
        }
        let named = self.db().symbol(id).ty;
        self.named_type(scope, &ts.name, named, &ts.ty);
    }

    /// Resolve the underlying type of `named` from its declaration.
    pub(super) fn named_type(&mut self, scope: ScopeId, name: &Ident, named: TypeId, rhs: &Expr) {
        let rhs_ty = self.typexpr(scope, rhs, Some(named));
        let rhs_obj = self.db().ty(rhs_ty).as_named().map(|n| n.obj);
        let underlying = match rhs_obj {
            Some(obj) if self.is_grey(obj) || rhs_ty == named => {
                let span = self.span(name.range);
                self.diags
                    .cycle(span, format!("invalid recursive type {}", name.name));
                self.invalid()
            }
            Some(_) => self.db().underlying(rhs_ty),
            None => rhs_ty,
        };
        if let Type::Named(named) = self.db_mut().ty_mut(named) {
            named.underlying = underlying;
        }
    }

    pub(super) fn func_decl(&mut self, id: SymbolId, file: usize, decl: usize) {
        self.cur_file = file;
        let source = self.files[file].clone();
        let Decl::Func(func) = &source.ast().decls[decl] else {
            return;
        };
        let scope = self.new_scope(Some(self.file_scopes[file]));
        let sig = self.signature(scope, func.recv.as_ref(), &func.ty);
        self.db_mut().symbol_mut(id).ty = sig;
        self.func_scopes.insert(id, scope);
    }

    // ========================================================================
    // SIGNATURES
    // ========================================================================

    /// Declare receiver, parameters and results in `scope`.
    pub(super) fn signature(
        &mut self,
        scope: ScopeId,
        recv: Option<&FieldList>,
        ty: &FuncType,
    ) -> TypeId {
        let recv = match recv.and_then(|list| list.fields.first()) {
            Some(field) => {
                let recv_ty = self.typexpr(scope, &field.ty, None);
                let name = field.names.first();
                let var = self.new_var(name, recv_ty);
                if let Some(name) = name {
                    self.record_def(name, var);
                    self.declare(scope, name, var);
                }
                Some(var)
            }
            None => None,
        };
        let (params, variadic) = self.param_list(scope, &ty.params);
        let (results, _) = self.param_list(scope, &ty.results);
        self.db_mut().alloc_type(Type::Signature(Signature {
            recv,
            params,
            results,
            variadic,
        }))
    }

    fn param_list(&mut self, scope: ScopeId, list: &FieldList) -> (Vec<SymbolId>, bool) {
        let mut vars = Vec::with_capacity(list.len());
        let mut variadic = false;
        for field in &list.fields {
            let ty = match &field.ty.kind {
                ExprKind::Ellipsis(Some(elem)) => {
                    variadic = true;
                    let elem = self.typexpr(scope, elem, None);
                    self.db_mut().alloc_type(Type::Slice(elem))
                }
                _ => self.typexpr(scope, &field.ty, None),
            };
            if field.names.is_empty() {
                vars.push(self.new_var(None, ty));
            }
            for name in &field.names {
                let var = self.new_var(Some(name), ty);
                self.record_def(name, var);
                self.declare(scope, name, var);
                vars.push(var);
            }
        }
        (vars, variadic)
    }

    // ========================================================================
    // TYPE EXPRESSIONS
    // ========================================================================

    /// The type denoted by `expr`. `def` is the named type being declared,
    /// if `expr` is the right-hand side of its declaration.
    pub(super) fn typexpr(&mut self, scope: ScopeId, expr: &Expr, def: Option<TypeId>) -> TypeId {
        match &expr.kind {
            ExprKind::Ident(_) | ExprKind::Selector { .. } => {
                let operand = self.expr(scope, expr, None);
                match operand.mode {
                    Mode::TypeExpr => operand.ty,
                    Mode::Invalid => self.invalid(),
                    _ => {
                        let span = self.span(expr.range);
                        self.diags.invalid_operand(span, "not a type");
                        self.invalid()
                    }
                }
            }
            ExprKind::Paren(inner) => self.typexpr(scope, inner, def),
            ExprKind::Star(inner) => {
                let elem = self.typexpr(scope, inner, None);
                self.db_mut().pointer_to(elem)
            }
            ExprKind::ArrayType { len: None, elem } => {
                let elem = self.typexpr(scope, elem, None);
                self.db_mut().alloc_type(Type::Slice(elem))
            }
            ExprKind::ArrayType {
                len: Some(len),
                elem,
            } => {
                let len = match &len.kind {
                    ExprKind::Ellipsis(_) => {
                        let span = self.span(len.range);
                        self.diags
                            .invalid_operand(span, "invalid use of [...] array outside a composite literal");
                        None
                    }
                    _ => self.const_int(scope, len),
                };
                let elem = self.typexpr(scope, elem, None);
                self.db_mut().alloc_type(Type::Array { len, elem })
            }
            ExprKind::Ellipsis(Some(elem)) => {
                let elem = self.typexpr(scope, elem, None);
                self.db_mut().alloc_type(Type::Slice(elem))
            }
            ExprKind::MapType { key, value } => {
                let key = self.typexpr(scope, key, None);
                let value = self.typexpr(scope, value, None);
                self.db_mut().alloc_type(Type::Map { key, value })
            }
            ExprKind::ChanType { dir, value } => {
                let elem = self.typexpr(scope, value, None);
                self.db_mut().alloc_type(Type::Chan { dir: *dir, elem })
            }
            ExprKind::FuncType(ft) => {
                let params = self.new_scope(Some(scope));
                self.signature(params, None, ft)
            }
            ExprKind::StructType(fields) => self.struct_type(scope, fields),
            ExprKind::InterfaceType(elems) => self.interface_type(scope, elems, def),
            ExprKind::Bad => self.invalid(),
            _ => {
                let span = self.span(expr.range);
                self.diags.invalid_operand(span, "not a type");
                self.invalid()
            }
        }
    }

    fn struct_type(&mut self, scope: ScopeId, list: &FieldList) -> TypeId {
        let mut fields = Vec::with_capacity(list.len());
        let mut seen: FxHashMap<SmolStr, Span> = FxHashMap::default();
        for field in &list.fields {
            let ty = self.typexpr(scope, &field.ty, None);
            if field.names.is_empty() {
                let Some(name) = embedded_name(&field.ty) else {
                    let span = self.span(field.ty.range);
                    self.diags.invalid_operand(span, "invalid embedded field type");
                    continue;
                };
                let class = SymbolClass::Var {
                    field: true,
                    embedded: true,
                };
                fields.push(self.field(name, class, ty, &mut seen));
            }
            for name in &field.names {
                let class = SymbolClass::Var {
                    field: true,
                    embedded: false,
                };
                fields.push(self.field(name, class, ty, &mut seen));
            }
        }
        self.db_mut().alloc_type(Type::Struct(Struct { fields }))
    }

    fn field(
        &mut self,
        name: &Ident,
        class: SymbolClass,
        ty: TypeId,
        seen: &mut FxHashMap<SmolStr, Span>,
    ) -> SymbolId {
        let id = self.new_symbol(name, class, ty, false);
        self.record_def(name, id);
        if !name.is_blank() {
            let span = self.span(name.range);
            if let Some(&previous) = seen.get(&name.name) {
                self.diags.duplicate(span, &name.name, Some(previous));
            } else {
                seen.insert(name.name.clone(), span);
            }
        }
        id
    }

    /// Methods of a declared interface take the named type as receiver;
    /// those of an interface literal take the literal itself.
    fn interface_type(&mut self, scope: ScopeId, list: &FieldList, def: Option<TypeId>) -> TypeId {
        let iface = self
            .db_mut()
            .alloc_type(Type::Interface(Interface::default()));
        let recv_ty = def.unwrap_or(iface);
        let mut methods = Vec::new();
        let mut embeddeds = Vec::new();
        for elem in &list.fields {
            match (elem.names.first(), &elem.ty.kind) {
                (Some(name), ExprKind::FuncType(ft)) => {
                    let params = self.new_scope(Some(scope));
                    let recv = self.new_var(None, recv_ty);
                    let sig = self.signature(params, None, ft);
                    if let Type::Signature(sig) = self.db_mut().ty_mut(sig) {
                        sig.recv = Some(recv);
                    }
                    let method = self.new_symbol(name, SymbolClass::Func, sig, false);
                    self.record_def(name, method);
                    methods.push(method);
                }
                (None, _) => {
                    let embedded = self.typexpr(scope, &elem.ty, None);
                    embeddeds.push(embedded);
                }
                (Some(_), _) => {
                    let span = self.span(elem.range);
                    self.diags.invalid_operand(span, "invalid interface element");
                }
            }
        }
        *self.db_mut().ty_mut(iface) = Type::Interface(Interface { methods, embeddeds });
        iface
    }

    /// Evaluate a constant integer expression such as an array length.
    pub(super) fn const_int(&mut self, scope: ScopeId, expr: &Expr) -> Option<i64> {
        let operand = self.expr(scope, expr, None);
        match operand.mode {
            Mode::Const => operand.value.and_then(|v| v.as_int()),
            Mode::Invalid => None,
            _ => {
                let span = self.span(expr.range);
                let ty = type_string(self.db(), operand.ty);
                self.diags
                    .invalid_operand(span, format!("array length must be constant, found {ty}"));
                None
            }
        }
    }
}

/// The identifier naming the base type of a method receiver.
fn receiver_base(expr: &Expr) -> Option<&Ident> {
    match &expr.unparen().kind {
        ExprKind::Ident(ident) => Some(ident),
        ExprKind::Star(inner) => receiver_base(inner),
        _ => None,
    }
}

/// The identifier naming an embedded field: `T`, `*T`, `pkg.T`, `*pkg.T`.
pub(super) fn embedded_name(expr: &Expr) -> Option<&Ident> {
    match &expr.unparen().kind {
        ExprKind::Ident(ident) => Some(ident),
        ExprKind::Star(inner) => embedded_name(inner),
        ExprKind::Selector { sel, .. } => Some(sel),
        _ => None,
    }
}
