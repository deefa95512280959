//! Expressions.

use super::{Checker, Mode, Operand, ScopeId};
use crate::hir::display::type_string;
use crate::hir::ids::{SymbolId, TypeId};
use crate::hir::info::{Selection, SelectionKind};
use crate::hir::lookup::lookup_field_or_method;
use crate::hir::symbols::{Builtin, ConstValue, SymbolClass};
use crate::hir::types::{BasicKind, Signature, Type};
use crate::syntax::ast::{self, BasicLit, Expr, ExprKind, Ident};
use crate::syntax::lexer::TokenKind;

impl Checker<'_> {
    /// Evaluate `expr`. `hint` is the type an untyped composite literal
    /// takes, e.g. an element of an enclosing literal.
    pub(super) fn expr(&mut self, scope: ScopeId, expr: &Expr, hint: Option<TypeId>) -> Operand {
        match &expr.kind {
            ExprKind::Ident(ident) => self.ident(scope, ident),
            ExprKind::BasicLit(lit) => self.basic_lit(lit),
            ExprKind::CompositeLit { ty, elts } => {
                self.composite_lit(scope, expr, ty.as_deref(), elts, hint)
            }
            ExprKind::FuncLit { ty, body } => {
                let fscope = self.new_scope(Some(scope));
                let sig = self.signature(fscope, None, ty);
                if !self.config.ignore_function_bodies {
                    let saved_iota = self.iota.take();
                    self.body(fscope, body);
                    self.iota = saved_iota;
                }
                Operand::new(Mode::Value, sig)
            }
            ExprKind::Paren(inner) => self.expr(scope, inner, hint),
            ExprKind::Selector { x, sel } => self.selector(scope, x, sel),
            ExprKind::Index { x, index } => self.index(scope, expr, x, index),
            ExprKind::Slice { x, lo, hi, max } => {
                let operand = self.expr(scope, x, None);
                for bound in [lo, hi, max].into_iter().flatten() {
                    self.expr(scope, bound, None);
                }
                if operand.is_invalid() {
                    return operand;
                }
                let under = self.db().underlying(operand.ty);
                let ty = match self.db().ty(under).clone() {
                    Type::Basic(kind) if kind.is_string() => self.default_type(operand.ty),
                    Type::Slice(_) => operand.ty,
                    Type::Array { elem, .. } => self.db_mut().alloc_type(Type::Slice(elem)),
                    Type::Pointer(target) => match self.db().ty(self.db().underlying(target)).clone() {
                        Type::Array { elem, .. } => self.db_mut().alloc_type(Type::Slice(elem)),
                        _ => return self.cannot(expr, "slice", operand.ty),
                    },
                    _ => return self.cannot(expr, "slice", operand.ty),
                };
                Operand::new(Mode::Value, ty)
            }
            ExprKind::TypeAssert { x, ty } => {
                let operand = self.expr(scope, x, None);
                let Some(ty) = ty else {
                    let span = self.span(expr.range);
                    self.diags
                        .invalid_operand(span, "use of .(type) outside type switch");
                    return Operand::invalid();
                };
                let ty = self.typexpr(scope, ty, None);
                if operand.is_invalid() {
                    return operand;
                }
                Operand::new(Mode::Value, ty)
            }
            ExprKind::Call { fun, args, .. } => self.call(scope, expr, fun, args),
            ExprKind::Star(inner) => {
                let operand = self.expr(scope, inner, None);
                match operand.mode {
                    Mode::Invalid => operand,
                    Mode::TypeExpr => {
                        let ty = self.db_mut().pointer_to(operand.ty);
                        Operand::new(Mode::TypeExpr, ty)
                    }
                    _ => match self.db().ty(self.db().underlying(operand.ty)) {
                        Type::Pointer(elem) => Operand::new(Mode::Value, *elem),
                        _ => self.cannot(expr, "indirect", operand.ty),
                    },
                }
            }
            ExprKind::Unary { op, x } => self.unary(scope, expr, *op, x, hint),
            ExprKind::Binary { op, x, y } => self.binary(scope, *op, x, y),
            ExprKind::KeyValue { key, value } => {
                self.expr(scope, key, None);
                self.expr(scope, value, None);
                let span = self.span(expr.range);
                self.diags
                    .invalid_operand(span, "key:value pair outside a composite literal");
                Operand::invalid()
            }
            ExprKind::ArrayType { .. }
            | ExprKind::StructType(_)
            | ExprKind::FuncType(_)
            | ExprKind::InterfaceType(_)
            | ExprKind::MapType { .. }
            | ExprKind::ChanType { .. } => {
                let ty = self.typexpr(scope, expr, None);
                Operand::new(Mode::TypeExpr, ty)
            }
            ExprKind::Ellipsis(_) | ExprKind::Bad => Operand::invalid(),
        }
    }

    fn cannot(&mut self, expr: &Expr, what: &str, ty: TypeId) -> Operand {
        let span = self.span(expr.range);
        let ty = type_string(self.db(), ty);
        self.diags
            .invalid_operand(span, format!("cannot {what} operand of type {ty}"));
        Operand::invalid()
    }

    /// The default type of an untyped constant type; other types unchanged.
    pub(super) fn default_type(&self, ty: TypeId) -> TypeId {
        match self.db().ty(ty) {
            Type::Basic(kind) if kind.is_untyped() && *kind != BasicKind::UntypedNil => {
                self.db().basic(kind.default_kind())
            }
            _ => ty,
        }
    }

    // ========================================================================
    // IDENTIFIERS AND SELECTORS
    // ========================================================================

    fn ident(&mut self, scope: ScopeId, ident: &Ident) -> Operand {
        if ident.is_blank() {
            let span = self.span(ident.range);
            self.diags
                .invalid_operand(span, "cannot use _ as value");
            return Operand::invalid();
        }
        let Some(obj) = self.lookup(scope, &ident.name) else {
            let span = self.span(ident.range);
            self.diags.undefined(span, &ident.name);
            return Operand::invalid();
        };
        self.record_use(ident, obj);
        if let SymbolClass::PkgName { .. } = self.db().symbol(obj).class {
            let span = self.span(ident.range);
            self.diags.invalid_operand(
                span,
                format!("use of package {} without selector", ident.name),
            );
            return Operand::invalid();
        }
        self.obj_decl(obj);
        self.object_operand(obj)
    }

    /// The operand denoted by a resolved object.
    fn object_operand(&self, obj: SymbolId) -> Operand {
        let symbol = self.db().symbol(obj);
        match &symbol.class {
            SymbolClass::Const { value } => {
                let is_iota = symbol.package.is_none() && symbol.name == "iota";
                match (&self.iota, is_iota) {
                    (Some(iota), true) => Operand::constant(symbol.ty, iota.clone()),
                    _ => Operand::constant(symbol.ty, value.clone()),
                }
            }
            SymbolClass::TypeName => Operand::new(Mode::TypeExpr, symbol.ty),
            SymbolClass::Var { .. } | SymbolClass::Func | SymbolClass::Nil => {
                Operand::new(Mode::Value, symbol.ty)
            }
            SymbolClass::Builtin(builtin) => Operand::new(Mode::Builtin(*builtin), symbol.ty),
            SymbolClass::Cgo => Operand::new(Mode::Value, symbol.ty),
            SymbolClass::PkgName { .. } | SymbolClass::Label => Operand::invalid(),
        }
    }

    /// Resolve `pkg.Name` if `x` names an imported package.
    fn package_member(&mut self, scope: ScopeId, x: &Expr, sel: &Ident) -> Option<Operand> {
        let ident = x.as_ident()?;
        let obj = self.lookup(scope, &ident.name)?;
        let SymbolClass::PkgName { imported } = self.db().symbol(obj).class else {
            return None;
        };
        self.record_use(ident, obj);

        if self.db().package(imported).is_fake() {
            let cgo = self.cgo_symbol(&sel.name);
            self.record_use(sel, cgo);
            return Some(Operand::new(Mode::Value, self.invalid()));
        }
        let member = self
            .db()
            .package(imported)
            .lookup(&sel.name)
            .filter(|_| sel.is_exported());
        let Some(member) = member else {
            let span = self.span(sel.range);
            let qualified = format!("{}.{}", ident.name, sel.name);
            self.diags.undefined(span, &qualified);
            return Some(Operand::invalid());
        };
        self.record_use(sel, member);
        Some(self.object_operand(member))
    }

    fn selector(&mut self, scope: ScopeId, x: &Expr, sel: &Ident) -> Operand {
        if let Some(operand) = self.package_member(scope, x, sel) {
            return operand;
        }
        let operand = self.expr(scope, x, None);
        if operand.is_invalid() {
            return operand;
        }
        let span = self.span(sel.range);
        let Some(found) = lookup_field_or_method(self.db(), operand.ty, &sel.name) else {
            let recv = type_string(self.db(), operand.ty);
            self.diags.unknown_member(span, &recv, &sel.name);
            return Operand::invalid();
        };
        self.obj_decl(found.obj);
        let is_field = found.is_field(self.db());
        let kind = match (operand.mode, is_field) {
            (Mode::TypeExpr, false) => SelectionKind::MethodExpr,
            (Mode::TypeExpr, true) => {
                let recv = type_string(self.db(), operand.ty);
                self.diags.unknown_member(span, &recv, &sel.name);
                return Operand::invalid();
            }
            (_, true) => SelectionKind::FieldVal,
            (_, false) => SelectionKind::MethodVal,
        };
        self.info.record_selection(
            span,
            Selection {
                kind,
                recv: operand.ty,
                obj: found.obj,
                index: found.index,
                indirect: found.indirect,
            },
        );

        let obj_ty = self.db().symbol(found.obj).ty;
        if kind != SelectionKind::MethodExpr {
            return Operand::new(Mode::Value, obj_ty);
        }
        // T.M is a function taking the receiver first.
        let Some(sig) = self.db().ty(obj_ty).as_signature().cloned() else {
            return Operand::new(Mode::Value, obj_ty);
        };
        let recv = self.new_var(None, operand.ty);
        let mut params = vec![recv];
        params.extend(sig.params);
        let ty = self.db_mut().alloc_type(Type::Signature(Signature {
            recv: None,
            params,
            results: sig.results,
            variadic: sig.variadic,
        }));
        Operand::new(Mode::Value, ty)
    }

    // ========================================================================
    // LITERALS
    // ========================================================================

    fn basic_lit(&mut self, lit: &BasicLit) -> Operand {
        let (kind, value) = match lit.kind {
            TokenKind::Int => (BasicKind::UntypedInt, int_value(&lit.value)),
            TokenKind::Float => (BasicKind::UntypedFloat, float_value(&lit.value)),
            TokenKind::Imag => (BasicKind::UntypedComplex, ConstValue::Unknown),
            TokenKind::Char => (BasicKind::UntypedRune, rune_value(&lit.value)),
            TokenKind::String => (
                BasicKind::UntypedString,
                ast::unquote(&lit.value)
                    .map(|s| ConstValue::Str(s.into()))
                    .unwrap_or_default(),
            ),
            _ => return Operand::invalid(),
        };
        Operand::constant(self.db().basic(kind), value)
    }

    fn composite_lit(
        &mut self,
        scope: ScopeId,
        expr: &Expr,
        ty: Option<&Expr>,
        elts: &[Expr],
        hint: Option<TypeId>,
    ) -> Operand {
        let (ty, result) = match (ty, hint) {
            (Some(ty), _) => {
                let ty = match &ty.kind {
                    ExprKind::ArrayType {
                        len: Some(len),
                        elem,
                    } if matches!(len.kind, ExprKind::Ellipsis(_)) => {
                        let elem = self.typexpr(scope, elem, None);
                        let len = Some(elts.len() as i64);
                        self.db_mut().alloc_type(Type::Array { len, elem })
                    }
                    _ => self.typexpr(scope, ty, None),
                };
                (ty, ty)
            }
            // An elided &T{...} inside a literal of pointers.
            (None, Some(hint)) => match self.db().ty(self.db().underlying(hint)) {
                Type::Pointer(elem) => (*elem, hint),
                _ => (hint, hint),
            },
            (None, None) => {
                let span = self.span(expr.range);
                self.diags
                    .invalid_operand(span, "invalid composite literal type");
                for elt in elts {
                    self.expr(scope, elt, None);
                }
                return Operand::invalid();
            }
        };

        match self.db().ty(self.db().underlying(ty)).clone() {
            Type::Struct(st) => {
                for (i, elt) in elts.iter().enumerate() {
                    match &elt.kind {
                        ExprKind::KeyValue { key, value } => {
                            let field = key.as_ident().and_then(|key| {
                                st.fields
                                    .iter()
                                    .copied()
                                    .find(|f| self.db().symbol(*f).name == key.name)
                                    .map(|f| (key, f))
                            });
                            let field_ty = match field {
                                Some((key, field)) => {
                                    self.record_use(key, field);
                                    Some(self.db().symbol(field).ty)
                                }
                                None => {
                                    let span = self.span(key.range);
                                    let recv = type_string(self.db(), ty);
                                    let name = key.as_ident().map_or("?", |k| k.name.as_str());
                                    self.diags.unknown_member(span, &recv, name);
                                    None
                                }
                            };
                            self.expr(scope, value, field_ty);
                        }
                        _ => {
                            let field_ty = st.fields.get(i).map(|f| self.db().symbol(*f).ty);
                            self.expr(scope, elt, field_ty);
                        }
                    }
                }
            }
            Type::Array { elem, .. } | Type::Slice(elem) => {
                for elt in elts {
                    self.element(scope, elt, None, elem);
                }
            }
            Type::Map { key, value } => {
                for elt in elts {
                    self.element(scope, elt, Some(key), value);
                }
            }
            Type::Invalid => {
                for elt in elts {
                    self.expr(scope, elt, None);
                }
            }
            _ => {
                let span = self.span(expr.range);
                let ty = type_string(self.db(), ty);
                self.diags
                    .invalid_operand(span, format!("invalid composite literal type {ty}"));
                for elt in elts {
                    self.expr(scope, elt, None);
                }
            }
        }
        Operand::new(Mode::Value, result)
    }

    /// One element of an array, slice or map literal.
    fn element(&mut self, scope: ScopeId, elt: &Expr, key_ty: Option<TypeId>, elem: TypeId) {
        match &elt.kind {
            ExprKind::KeyValue { key, value } => {
                self.expr(scope, key, key_ty);
                self.expr(scope, value, Some(elem));
            }
            _ => {
                self.expr(scope, elt, Some(elem));
            }
        }
    }

    // ========================================================================
    // OPERATORS
    // ========================================================================

    fn index(&mut self, scope: ScopeId, expr: &Expr, x: &Expr, index: &Expr) -> Operand {
        let operand = self.expr(scope, x, None);
        if operand.mode == Mode::TypeExpr {
            self.expr(scope, index, None);
            let span = self.span(expr.range);
            self.diags
                .invalid_operand(span, "generic type instantiation is not supported");
            return Operand::invalid();
        }
        let under = self.db().underlying(operand.ty);
        let (elem, key) = match self.db().ty(under).clone() {
            Type::Basic(kind) if kind.is_string() => (Some(self.db().basic(BasicKind::Byte)), None),
            Type::Array { elem, .. } | Type::Slice(elem) => (Some(elem), None),
            Type::Map { key, value } => (Some(value), Some(key)),
            Type::Pointer(target) => match self.db().ty(self.db().underlying(target)) {
                Type::Array { elem, .. } => (Some(*elem), None),
                _ => (None, None),
            },
            _ => (None, None),
        };
        self.expr(scope, index, key);
        if operand.is_invalid() {
            return operand;
        }
        match elem {
            Some(elem) => Operand::new(Mode::Value, elem),
            None => self.cannot(expr, "index", operand.ty),
        }
    }

    fn unary(
        &mut self,
        scope: ScopeId,
        expr: &Expr,
        op: TokenKind,
        x: &Expr,
        hint: Option<TypeId>,
    ) -> Operand {
        if op == TokenKind::And {
            let inner_hint = hint.map(|hint| self.db().deref(hint).0);
            let operand = self.expr(scope, x, inner_hint);
            if operand.is_invalid() {
                return operand;
            }
            let ty = self.db_mut().pointer_to(operand.ty);
            return Operand::new(Mode::Value, ty);
        }
        let operand = self.expr(scope, x, None);
        if operand.is_invalid() {
            return operand;
        }
        if op == TokenKind::Arrow {
            return match self.db().ty(self.db().underlying(operand.ty)) {
                Type::Chan { elem, .. } => Operand::new(Mode::Value, *elem),
                _ => self.cannot(expr, "receive from", operand.ty),
            };
        }
        if operand.mode != Mode::Const {
            return Operand::new(Mode::Value, operand.ty);
        }
        let value = match (op, operand.value.unwrap_or_default()) {
            (TokenKind::Sub, ConstValue::Int(v)) => v.checked_neg().map(ConstValue::Int),
            (TokenKind::Sub, ConstValue::Float(v)) => Some(ConstValue::Float(-v)),
            (TokenKind::Add, value) => Some(value),
            (TokenKind::Xor, ConstValue::Int(v)) => Some(ConstValue::Int(!v)),
            (TokenKind::Not, ConstValue::Bool(v)) => Some(ConstValue::Bool(!v)),
            _ => None,
        };
        Operand::constant(operand.ty, value.unwrap_or_default())
    }

    fn binary(&mut self, scope: ScopeId, op: TokenKind, x: &Expr, y: &Expr) -> Operand {
        let left = self.expr(scope, x, None);
        let right = self.expr(scope, y, None);
        if left.is_invalid() || right.is_invalid() {
            return Operand::invalid();
        }
        let constant = left.mode == Mode::Const && right.mode == Mode::Const;
        let folded = || match (&left.value, &right.value) {
            (Some(a), Some(b)) if constant => fold(op, a, b),
            _ => None,
        };

        let ty = match op {
            TokenKind::Eql
            | TokenKind::Neq
            | TokenKind::Lss
            | TokenKind::Leq
            | TokenKind::Gtr
            | TokenKind::Geq => self.db().basic(BasicKind::UntypedBool),
            TokenKind::Shl | TokenKind::Shr | TokenKind::LAnd | TokenKind::LOr => left.ty,
            _ => self.binary_type(left.ty, right.ty),
        };
        if constant {
            Operand::constant(ty, folded().unwrap_or_default())
        } else {
            Operand::new(Mode::Value, ty)
        }
    }

    /// Result type of an arithmetic operation: a typed operand wins over an
    /// untyped one; between untyped kinds the later one in the numeric
    /// ranking wins.
    fn binary_type(&self, x: TypeId, y: TypeId) -> TypeId {
        let kind = |ty| match self.db().ty(ty) {
            Type::Basic(kind) if kind.is_untyped() => Some(*kind),
            _ => None,
        };
        match (kind(x), kind(y)) {
            (Some(_), None) => y,
            (Some(a), Some(b)) if untyped_rank(b) > untyped_rank(a) => y,
            _ => x,
        }
    }

    // ========================================================================
    // CALLS
    // ========================================================================

    fn call(&mut self, scope: ScopeId, expr: &Expr, fun: &Expr, args: &[Expr]) -> Operand {
        let callee = self.expr(scope, fun, None);
        match callee.mode {
            Mode::Invalid => {
                self.exprs(scope, args);
                Operand::invalid()
            }
            Mode::TypeExpr => {
                let arg = args.first().map(|arg| self.expr(scope, arg, Some(callee.ty)));
                self.exprs(scope, args.get(1..).unwrap_or_default());
                match arg {
                    Some(arg) if arg.mode == Mode::Const && self.db().basic_kind(callee.ty).is_some() => {
                        Operand::constant(callee.ty, arg.value.unwrap_or_default())
                    }
                    _ => Operand::new(Mode::Value, callee.ty),
                }
            }
            Mode::Builtin(builtin) => self.builtin(scope, expr, builtin, args),
            _ => {
                let under = self.db().underlying(callee.ty);
                let sig = match self.db().ty(under) {
                    Type::Signature(sig) => sig.clone(),
                    Type::Invalid => {
                        self.exprs(scope, args);
                        return Operand::invalid();
                    }
                    _ => {
                        self.exprs(scope, args);
                        return self.cannot(expr, "call", callee.ty);
                    }
                };
                self.exprs(scope, args);
                self.call_result(&sig)
            }
        }
    }

    fn call_result(&mut self, sig: &Signature) -> Operand {
        let results: Vec<TypeId> = sig
            .results
            .iter()
            .map(|r| self.db().symbol(*r).ty)
            .collect();
        match results.as_slice() {
            [] => Operand::new(Mode::NoValue, self.invalid()),
            [single] => Operand::new(Mode::Value, *single),
            _ => {
                let tuple = self.db_mut().alloc_type(Type::Tuple(results));
                Operand::new(Mode::Value, tuple)
            }
        }
    }

    pub(super) fn exprs(&mut self, scope: ScopeId, exprs: &[Expr]) {
        for expr in exprs {
            self.expr(scope, expr, None);
        }
    }

    fn builtin(&mut self, scope: ScopeId, expr: &Expr, builtin: Builtin, args: &[Expr]) -> Operand {
        let basic = |this: &Self, kind| this.db().basic(kind);
        match builtin {
            Builtin::Make | Builtin::New => {
                let Some(first) = args.first() else {
                    let span = self.span(expr.range);
                    self.diags
                        .invalid_operand(span, format!("not enough arguments for {}", builtin.name()));
                    return Operand::invalid();
                };
                let ty = self.typexpr(scope, first, None);
                self.exprs(scope, &args[1..]);
                let ty = match builtin {
                    Builtin::New => self.db_mut().pointer_to(ty),
                    _ => ty,
                };
                Operand::new(Mode::Value, ty)
            }
            Builtin::Append => {
                let first = args.first().map(|arg| self.expr(scope, arg, None));
                let elem = first.as_ref().and_then(|slice| {
                    match self.db().ty(self.db().underlying(slice.ty)) {
                        Type::Slice(elem) => Some(*elem),
                        _ => None,
                    }
                });
                for arg in args.iter().skip(1) {
                    self.expr(scope, arg, elem);
                }
                match first {
                    Some(first) if !first.is_invalid() => Operand::new(Mode::Value, first.ty),
                    _ => Operand::invalid(),
                }
            }
            Builtin::Len | Builtin::Cap => {
                let arg = args.first().map(|arg| self.expr(scope, arg, None));
                self.exprs(scope, args.get(1..).unwrap_or_default());
                let int = basic(self, BasicKind::Int);
                match arg.and_then(|arg| arg.value) {
                    Some(ConstValue::Str(s)) => Operand::constant(int, ConstValue::Int(s.len() as i64)),
                    _ => Operand::new(Mode::Value, int),
                }
            }
            Builtin::Copy => {
                self.exprs(scope, args);
                Operand::new(Mode::Value, basic(self, BasicKind::Int))
            }
            Builtin::Complex => {
                self.exprs(scope, args);
                Operand::new(Mode::Value, basic(self, BasicKind::Complex128))
            }
            Builtin::Real | Builtin::Imag => {
                self.exprs(scope, args);
                Operand::new(Mode::Value, basic(self, BasicKind::Float64))
            }
            Builtin::Recover => {
                self.exprs(scope, args);
                let any = self.db().universe().empty_interface();
                Operand::new(Mode::Value, any)
            }
            Builtin::Alignof | Builtin::Offsetof | Builtin::Sizeof => {
                self.exprs(scope, args);
                Operand::new(Mode::Value, basic(self, BasicKind::Uintptr))
            }
            Builtin::Close
            | Builtin::Delete
            | Builtin::Panic
            | Builtin::Print
            | Builtin::Println => {
                self.exprs(scope, args);
                Operand::new(Mode::NoValue, self.invalid())
            }
        }
    }

    // ========================================================================
    // MULTI-VALUE CONTEXTS
    // ========================================================================

    /// Types assigned to `n` left-hand sides by `exprs`.
    ///
    /// A single call yields its results; a single map index, type
    /// assertion or receive yields the value and a `bool` when two are
    /// wanted.
    pub(super) fn expr_list(
        &mut self,
        scope: ScopeId,
        exprs: &[Expr],
        n: usize,
        hint: Option<TypeId>,
    ) -> Vec<TypeId> {
        let invalid = self.invalid();
        if let [single] = exprs {
            if n > 1 {
                let operand = self.expr(scope, single, hint);
                let mut types = match self.db().ty(operand.ty) {
                    Type::Tuple(types) => types.clone(),
                    _ if n == 2 && comma_ok(single) => {
                        vec![operand.ty, self.db().basic(BasicKind::Bool)]
                    }
                    _ => vec![operand.ty],
                };
                types.resize(n, invalid);
                return types;
            }
        }
        let mut types: Vec<TypeId> = exprs
            .iter()
            .map(|expr| self.expr(scope, expr, hint).ty)
            .collect();
        if types.len() != n {
            if let Some(first) = exprs.first() {
                let span = self.span(first.range);
                self.diags.invalid_operand(
                    span,
                    format!("assignment mismatch: {n} variables but {} values", exprs.len()),
                );
            }
        }
        types.resize(n, invalid);
        types
    }
}

fn comma_ok(expr: &Expr) -> bool {
    matches!(
        &expr.unparen().kind,
        ExprKind::Index { .. }
            | ExprKind::TypeAssert { ty: Some(_), .. }
            | ExprKind::Unary {
                op: TokenKind::Arrow,
                ..
            }
    )
}

fn untyped_rank(kind: BasicKind) -> u8 {
    match kind {
        BasicKind::UntypedInt => 1,
        BasicKind::UntypedRune => 2,
        BasicKind::UntypedFloat => 3,
        BasicKind::UntypedComplex => 4,
        _ => 0,
    }
}

fn fold(op: TokenKind, x: &ConstValue, y: &ConstValue) -> Option<ConstValue> {
    use ConstValue::*;
    match (x, y) {
        (Int(a), Int(b)) => {
            let (a, b) = (*a, *b);
            let value = match op {
                TokenKind::Add => a.checked_add(b)?,
                TokenKind::Sub => a.checked_sub(b)?,
                TokenKind::Mul => a.checked_mul(b)?,
                TokenKind::Quo => a.checked_div(b)?,
                TokenKind::Rem => a.checked_rem(b)?,
                TokenKind::And => a & b,
                TokenKind::Or => a | b,
                TokenKind::Xor => a ^ b,
                TokenKind::AndNot => a & !b,
                TokenKind::Shl => a.checked_shl(u32::try_from(b).ok()?)?,
                TokenKind::Shr => a.checked_shr(u32::try_from(b).ok()?)?,
                _ => return compare(op, a.cmp(&b)).map(Bool),
            };
            Some(Int(value))
        }
        (Float(_), Int(_) | Float(_)) | (Int(_), Float(_)) => {
            let (a, b) = (as_float(x)?, as_float(y)?);
            let value = match op {
                TokenKind::Add => a + b,
                TokenKind::Sub => a - b,
                TokenKind::Mul => a * b,
                TokenKind::Quo if b != 0.0 => a / b,
                _ => return compare(op, a.partial_cmp(&b)?).map(Bool),
            };
            Some(Float(value))
        }
        (Str(a), Str(b)) => match op {
            TokenKind::Add => Some(Str(format!("{a}{b}").into())),
            _ => compare(op, a.cmp(b)).map(Bool),
        },
        (Bool(a), Bool(b)) => match op {
            TokenKind::LAnd => Some(Bool(*a && *b)),
            TokenKind::LOr => Some(Bool(*a || *b)),
            TokenKind::Eql => Some(Bool(a == b)),
            TokenKind::Neq => Some(Bool(a != b)),
            _ => None,
        },
        _ => None,
    }
}

fn as_float(value: &ConstValue) -> Option<f64> {
    match value {
        ConstValue::Int(v) => Some(*v as f64),
        ConstValue::Float(v) => Some(*v),
        _ => None,
    }
}

fn compare(op: TokenKind, ord: std::cmp::Ordering) -> Option<bool> {
    use std::cmp::Ordering::*;
    Some(match op {
        TokenKind::Eql => ord == Equal,
        TokenKind::Neq => ord != Equal,
        TokenKind::Lss => ord == Less,
        TokenKind::Leq => ord != Greater,
        TokenKind::Gtr => ord == Greater,
        TokenKind::Geq => ord != Less,
        _ => return None,
    })
}

fn int_value(lit: &str) -> ConstValue {
    let digits: String = lit.chars().filter(|c| *c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    let parsed = if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8)
    } else if lower.len() > 1 && lower.starts_with('0') {
        i64::from_str_radix(&lower[1..], 8)
    } else {
        lower.parse()
    };
    parsed.map(ConstValue::Int).unwrap_or_default()
}

fn float_value(lit: &str) -> ConstValue {
    let digits: String = lit.chars().filter(|c| *c != '_').collect();
    digits
        .parse::<f64>()
        .map(ConstValue::Float)
        .unwrap_or_default()
}

/// Value of a rune literal such as `'a'`, `'\n'` or `'\x41'`.
fn rune_value(lit: &str) -> ConstValue {
    let body = lit
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(lit);
    let value = match body.strip_prefix('\\') {
        None => body.chars().next().map(|c| c as i64),
        Some(escape) => {
            let mut chars = escape.chars();
            match chars.next() {
                Some('n') => Some('\n' as i64),
                Some('t') => Some('\t' as i64),
                Some('r') => Some('\r' as i64),
                Some('a') => Some(7),
                Some('b') => Some(8),
                Some('f') => Some(12),
                Some('v') => Some(11),
                Some('\\') => Some('\\' as i64),
                Some('\'') => Some('\'' as i64),
                Some('x') | Some('u') | Some('U') => i64::from_str_radix(chars.as_str(), 16).ok(),
                Some(c) if c.is_digit(8) => i64::from_str_radix(escape, 8).ok(),
                _ => None,
            }
        }
    };
    value.map(ConstValue::Int).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_literals() {
        assert_eq!(int_value("42"), ConstValue::Int(42));
        assert_eq!(int_value("0x1F"), ConstValue::Int(31));
        assert_eq!(int_value("0b101"), ConstValue::Int(5));
        assert_eq!(int_value("0o17"), ConstValue::Int(15));
        assert_eq!(int_value("017"), ConstValue::Int(15));
        assert_eq!(int_value("1_000"), ConstValue::Int(1000));
        assert_eq!(int_value("99999999999999999999"), ConstValue::Unknown);
    }

    #[test]
    fn test_rune_literals() {
        assert_eq!(rune_value("'a'"), ConstValue::Int(97));
        assert_eq!(rune_value("'\\n'"), ConstValue::Int(10));
        assert_eq!(rune_value("'\\x41'"), ConstValue::Int(65));
        assert_eq!(rune_value("'\\101'"), ConstValue::Int(65));
    }

    #[test]
    fn test_fold() {
        use ConstValue::*;
        assert_eq!(fold(TokenKind::Shl, &Int(1), &Int(3)), Some(Int(8)));
        assert_eq!(fold(TokenKind::Quo, &Int(1), &Int(0)), None);
        assert_eq!(fold(TokenKind::Lss, &Int(1), &Int(2)), Some(Bool(true)));
        assert_eq!(
            fold(TokenKind::Add, &Str("a".into()), &Str("b".into())),
            Some(Str("ab".into()))
        );
        assert_eq!(fold(TokenKind::Mul, &Int(2), &Float(1.5)), Some(Float(3.0)));
    }
}
