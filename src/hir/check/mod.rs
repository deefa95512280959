//! The type checker.
//!
//! Checks one package at a time and records what every identifier declares
//! or refers to in a [`SemanticInfo`]. Imports are resolved through an
//! [`ImportHost`], which may re-enter the checker for the imported package.
//!
//! ```text
//! collect    declare package-level objects, resolve imports per file
//!   ↓
//! associate  attach methods to their receiver base types
//!   ↓
//! resolve    type every package-level object, lazily and in any order
//!   ↓
//! bodies     check function bodies (skipped when ignoring bodies)
//! ```
//!
//! Errors are collected as diagnostics; checking never stops early.

mod decl;
mod expr;
mod stmt;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::db::{Db, Package, PackageOrigin};
use super::diagnostics::{Diagnostic, DiagnosticCollector};
use super::ids::{PackageId, SymbolId, TypeId};
use super::info::SemanticInfo;
use super::source::SourceFile;
use super::symbols::{ConstValue, Symbol, SymbolClass};
use crate::base::{Span, TextRange};
use crate::error::ResolveError;
use crate::syntax::ast::{Decl, GenKind, Ident, ImportSpec, Spec};

/// Gives the checker access to the session arenas and to other packages.
pub trait ImportHost {
    fn db(&self) -> &Db;

    fn db_mut(&mut self) -> &mut Db;

    /// Resolve `path` as imported from a file in `from_dir`.
    fn import(&mut self, from_dir: &Path, path: &str) -> Result<PackageId, ResolveError>;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct CheckConfig {
    /// Skip function bodies (and function literal bodies).
    pub ignore_function_bodies: bool,
    /// Accept `import "C"` as a fake package.
    pub fake_import_c: bool,
}

/// What a check produced besides the package scope.
#[derive(Debug, Default)]
pub struct CheckOutput {
    pub info: SemanticInfo,
    pub diagnostics: Vec<Diagnostic>,
    pub imports: Vec<PackageId>,
    pub import_errors: Vec<(String, ResolveError)>,
}

/// Check `files` as package `pkg`, recording into `info`.
///
/// `info` may already hold the tables of another package; an external test
/// package is checked into the tables of the package it tests.
pub fn check_package(
    host: &mut dyn ImportHost,
    pkg: PackageId,
    dir: &Path,
    files: &[Arc<SourceFile>],
    info: SemanticInfo,
    config: CheckConfig,
) -> CheckOutput {
    let checker = Checker {
        host,
        pkg,
        dir: dir.to_owned(),
        files: files.to_vec(),
        config,
        info,
        diags: DiagnosticCollector::new(),
        scopes: Vec::new(),
        file_scopes: Vec::new(),
        cur_file: 0,
        decls: FxHashMap::default(),
        colors: FxHashMap::default(),
        order: Vec::new(),
        methods: Vec::new(),
        func_scopes: FxHashMap::default(),
        iota: None,
        labels: Vec::new(),
        cgo: FxHashMap::default(),
        fake_c: None,
        imports: Vec::new(),
        import_errors: Vec::new(),
    };
    checker.run()
}

// ============================================================================
// CHECKER STATE
// ============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(super) struct ScopeId(u32);

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    names: FxHashMap<SmolStr, SymbolId>,
}

/// Where a package-level object is declared.
#[derive(Copy, Clone, Debug)]
enum DeclInfo {
    /// `src` is the spec that supplies type and values (implicit
    /// repetition in const groups).
    Const {
        file: usize,
        decl: usize,
        spec: usize,
        src: usize,
        index: usize,
    },
    Var {
        file: usize,
        decl: usize,
        spec: usize,
    },
    Type {
        file: usize,
        decl: usize,
        spec: usize,
    },
    Func {
        file: usize,
        decl: usize,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Color {
    Grey,
    Black,
}

#[derive(Clone, Debug)]
pub(super) struct Operand {
    pub mode: Mode,
    pub ty: TypeId,
    pub value: Option<ConstValue>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum Mode {
    Invalid,
    NoValue,
    Value,
    Const,
    TypeExpr,
    Builtin(super::symbols::Builtin),
}

impl Operand {
    fn new(mode: Mode, ty: TypeId) -> Self {
        Self {
            mode,
            ty,
            value: None,
        }
    }

    fn invalid() -> Self {
        Self::new(Mode::Invalid, TypeId::new(0))
    }

    fn constant(ty: TypeId, value: ConstValue) -> Self {
        Self {
            mode: Mode::Const,
            ty,
            value: Some(value),
        }
    }

    fn is_invalid(&self) -> bool {
        self.mode == Mode::Invalid
    }
}

pub(super) struct Checker<'a> {
    host: &'a mut dyn ImportHost,
    pkg: PackageId,
    dir: PathBuf,
    files: Vec<Arc<SourceFile>>,
    config: CheckConfig,
    info: SemanticInfo,
    diags: DiagnosticCollector,
    scopes: Vec<Scope>,
    file_scopes: Vec<ScopeId>,
    /// Index into `files` of the declaration being checked.
    cur_file: usize,
    decls: FxHashMap<SymbolId, DeclInfo>,
    colors: FxHashMap<SymbolId, Color>,
    /// Package-level objects (and methods) in collection order.
    order: Vec<SymbolId>,
    methods: Vec<SymbolId>,
    /// Parameter scope of each function, reused by its body.
    func_scopes: FxHashMap<SymbolId, ScopeId>,
    iota: Option<ConstValue>,
    /// Labels of the enclosing function bodies, innermost last.
    labels: Vec<FxHashMap<SmolStr, SymbolId>>,
    cgo: FxHashMap<SmolStr, SymbolId>,
    fake_c: Option<PackageId>,
    imports: Vec<PackageId>,
    import_errors: Vec<(String, ResolveError)>,
}

impl Checker<'_> {
    fn run(mut self) -> CheckOutput {
        for file in 0..self.files.len() {
            self.collect_file(file);
        }
        self.associate_methods();
        for id in self.order.clone() {
            self.obj_decl(id);
        }
        if !self.config.ignore_function_bodies {
            for id in self.order.clone() {
                if let Some(DeclInfo::Func { file, decl }) = self.decls.get(&id).copied() {
                    self.func_body(id, file, decl);
                }
            }
        }
        CheckOutput {
            info: self.info,
            diagnostics: self.diags.take(),
            imports: self.imports,
            import_errors: self.import_errors,
        }
    }

    // --- small helpers ------------------------------------------------------

    fn db(&self) -> &Db {
        self.host.db()
    }

    fn db_mut(&mut self) -> &mut Db {
        self.host.db_mut()
    }

    fn invalid(&self) -> TypeId {
        self.db().invalid()
    }

    fn span(&self, range: TextRange) -> Span {
        self.files[self.cur_file].span(range)
    }

    fn new_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent,
            names: FxHashMap::default(),
        });
        id
    }

    fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id.0 as usize];
            if let Some(&symbol) = scope.names.get(name) {
                return Some(symbol);
            }
            current = scope.parent;
        }
        let db = self.db();
        db.package(self.pkg)
            .lookup(name)
            .or_else(|| db.universe().lookup(name))
    }

    /// A new symbol owned by this package, declared at `ident`.
    fn new_symbol(&mut self, ident: &Ident, class: SymbolClass, ty: TypeId, package_level: bool) -> SymbolId {
        let pos = self.span(ident.range);
        let pkg = self.pkg;
        self.db_mut().alloc_symbol(Symbol {
            name: ident.name.clone(),
            class,
            package: Some(pkg),
            pos: Some(pos),
            ty,
            package_level,
        })
    }

    fn new_var(&mut self, ident: Option<&Ident>, ty: TypeId) -> SymbolId {
        let class = SymbolClass::Var {
            field: false,
            embedded: false,
        };
        match ident {
            Some(ident) => self.new_symbol(ident, class, ty, false),
            None => {
                let pkg = self.pkg;
                self.db_mut().alloc_symbol(Symbol {
                    name: SmolStr::default(),
                    class,
                    package: Some(pkg),
                    pos: None,
                    ty,
                    package_level: false,
                })
            }
        }
    }

    fn record_def(&mut self, ident: &Ident, id: SymbolId) {
        let span = self.span(ident.range);
        self.info.record_def(span, id);
    }

    fn record_use(&mut self, ident: &Ident, id: SymbolId) {
        let span = self.span(ident.range);
        self.info.record_use(span, id);
    }

    /// Declare in a local or file scope; blank identifiers are not declared.
    fn declare(&mut self, scope: ScopeId, ident: &Ident, id: SymbolId) {
        if ident.is_blank() {
            return;
        }
        let names = &mut self.scopes[scope.0 as usize].names;
        if let Some(&previous) = names.get(&ident.name) {
            let previous = self.db().symbol(previous).pos;
            let span = self.span(ident.range);
            self.diags.duplicate(span, &ident.name, previous);
            return;
        }
        names.insert(ident.name.clone(), id);
    }

    fn declare_package(&mut self, ident: &Ident, id: SymbolId) {
        if ident.is_blank() {
            return;
        }
        let pkg = self.pkg;
        if let Some(previous) = self.db().package(pkg).lookup(&ident.name) {
            let previous = self.db().symbol(previous).pos;
            let span = self.span(ident.range);
            self.diags.duplicate(span, &ident.name, previous);
            return;
        }
        self.db_mut()
            .package_mut(pkg)
            .scope
            .insert(ident.name.clone(), id);
    }

    // ========================================================================
    // COLLECT
    // ========================================================================

    fn collect_file(&mut self, file_idx: usize) {
        self.cur_file = file_idx;
        let file = self.files[file_idx].clone();
        let scope = self.new_scope(None);
        self.file_scopes.push(scope);

        for spec in &file.ast().imports {
            self.import_spec(scope, spec);
        }

        for (decl_idx, decl) in file.ast().decls.iter().enumerate() {
            match decl {
                Decl::Gen(gen_decl) => {
                    let mut src = None;
                    for (spec_idx, spec) in gen_decl.specs.iter().enumerate() {
                        match (gen_decl.kind, spec) {
                            (GenKind::Const, Spec::Value(vs)) => {
                                if vs.ty.is_some() || !vs.values.is_empty() {
                                    src = Some(spec_idx);
                                }
                                for (index, name) in vs.names.iter().enumerate() {
                                    let class = SymbolClass::Const {
                                        value: ConstValue::Unknown,
                                    };
                                    let invalid = self.invalid();
                                    let id = self.new_symbol(name, class, invalid, true);
                                    self.record_def(name, id);
                                    self.declare_package(name, id);
                                    self.decls.insert(
                                        id,
                                        DeclInfo::Const {
                                            file: file_idx,
                                            decl: decl_idx,
                                            spec: spec_idx,
                                            src: src.unwrap_or(spec_idx),
                                            index,
                                        },
                                    );
                                    self.order.push(id);
                                }
                            }
                            (GenKind::Var, Spec::Value(vs)) => {
                                for name in &vs.names {
                                    let invalid = self.invalid();
                                    let class = SymbolClass::Var {
                                        field: false,
                                        embedded: false,
                                    };
                                    let id = self.new_symbol(name, class, invalid, true);
                                    self.record_def(name, id);
                                    self.declare_package(name, id);
                                    self.decls.insert(
                                        id,
                                        DeclInfo::Var {
                                            file: file_idx,
                                            decl: decl_idx,
                                            spec: spec_idx,
                                        },
                                    );
                                    self.order.push(id);
                                }
                            }
                            (GenKind::Type, Spec::Type(ts)) => {
                                let invalid = self.invalid();
                                let id = self.new_symbol(&ts.name, SymbolClass::TypeName, invalid, true);
                                if !ts.alias {
                                    let named = self.new_named(id);
                                    self.db_mut().symbol_mut(id).ty = named;
                                }
                                self.record_def(&ts.name, id);
                                self.declare_package(&ts.name, id);
                                self.decls.insert(
                                    id,
                                    DeclInfo::Type {
                                        file: file_idx,
                                        decl: decl_idx,
                                        spec: spec_idx,
                                    },
                                );
                                self.order.push(id);
                            }
                            _ => {}
                        }
                    }
                }
                Decl::Func(func) => {
                    let invalid = self.invalid();
                    let id = self.new_symbol(&func.name, SymbolClass::Func, invalid, true);
                    self.record_def(&func.name, id);
                    if func.recv.is_some() {
                        self.methods.push(id);
                    } else if func.name.name != "init" {
                        self.declare_package(&func.name, id);
                    }
                    self.decls.insert(
                        id,
                        DeclInfo::Func {
                            file: file_idx,
                            decl: decl_idx,
                        },
                    );
                    self.order.push(id);
                }
                Decl::Bad(_) => {}
            }
        }
    }

    fn import_spec(&mut self, file_scope: ScopeId, spec: &ImportSpec) {
        let path_span = self.span(spec.path.range);
        let Some(path) = spec.path_value() else {
            self.diags
                .invalid_operand(path_span, format!("invalid import path: {}", spec.path.value));
            return;
        };

        let imported = if path == "C" && self.config.fake_import_c {
            self.fake_c_package()
        } else {
            let dir = self.dir.clone();
            match self.host.import(&dir, &path) {
                Ok(id) => id,
                Err(err) => {
                    tracing::warn!(%path, error = %err, "import failed");
                    self.diags.import_failed(path_span, &path, &err);
                    self.import_errors.push((path, err));
                    return;
                }
            }
        };
        if !self.imports.contains(&imported) {
            self.imports.push(imported);
        }

        let imported_name = self.db().package(imported).name.clone();
        let local_name = match &spec.name {
            Some(alias) if alias.name != "." => alias.name.clone(),
            _ => imported_name,
        };
        let pos = self.span(spec.range);
        let pkg = self.pkg;
        let invalid = self.invalid();
        let pkg_name = self.db_mut().alloc_symbol(Symbol {
            name: local_name,
            class: SymbolClass::PkgName { imported },
            package: Some(pkg),
            pos: Some(pos),
            ty: invalid,
            package_level: false,
        });

        match &spec.name {
            Some(alias) if alias.name == "." => {
                self.info.record_implicit(pos, pkg_name);
                let members: Vec<(SmolStr, SymbolId)> = self
                    .db()
                    .package(imported)
                    .scope
                    .iter()
                    .filter(|(name, _)| crate::syntax::ast::is_exported(name))
                    .map(|(name, id)| (name.clone(), *id))
                    .collect();
                for (name, id) in members {
                    self.scopes[file_scope.0 as usize].names.insert(name, id);
                }
            }
            Some(alias) => {
                self.record_def(alias, pkg_name);
                self.declare(file_scope, alias, pkg_name);
            }
            None => {
                self.info.record_implicit(pos, pkg_name);
                let name = self.db().symbol(pkg_name).name.clone();
                self.declare(file_scope, &Ident::new(name, spec.path.range), pkg_name);
            }
        }
    }

    fn fake_c_package(&mut self) -> PackageId {
        if let Some(id) = self.fake_c {
            return id;
        }
        let id = self
            .db_mut()
            .alloc_package(Package::new("C", "C", PackageOrigin::Synthetic));
        self.fake_c = Some(id);
        id
    }

    /// Symbol standing for `C.name`.
    fn cgo_symbol(&mut self, name: &SmolStr) -> SymbolId {
        if let Some(&id) = self.cgo.get(name) {
            return id;
        }
        let invalid = self.invalid();
        let package = self.fake_c;
        let id = self.db_mut().alloc_symbol(Symbol {
            name: name.clone(),
            class: SymbolClass::Cgo,
            package,
            pos: None,
            ty: invalid,
            package_level: true,
        });
        self.cgo.insert(name.clone(), id);
        id
    }

    // ========================================================================
    // RESOLVE
    // ========================================================================

    /// Type a package-level object on first use.
    fn obj_decl(&mut self, id: SymbolId) {
        let Some(decl) = self.decls.get(&id).copied() else {
            return;
        };
        match self.colors.get(&id) {
            Some(Color::Black) => return,
            Some(Color::Grey) => {
                if !matches!(self.db().symbol(id).class, SymbolClass::TypeName | SymbolClass::Func) {
                    if let Some(pos) = self.db().symbol(id).pos {
                        let name = self.db().symbol(id).name.clone();
                        self.diags
                            .cycle(pos, format!("initialization cycle or loop involving {name}"));
                    }
                }
                return;
            }
            None => {}
        }
        self.colors.insert(id, Color::Grey);
        let saved_file = self.cur_file;
        let saved_iota = self.iota.take();
        match decl {
            DeclInfo::Const {
                file,
                decl,
                spec,
                src,
                index,
            } => self.const_decl(id, file, decl, spec, src, index),
            DeclInfo::Var { file, decl, spec } => self.var_decl(file, decl, spec),
            DeclInfo::Type { file, decl, spec } => self.type_decl(id, file, decl, spec),
            DeclInfo::Func { file, decl } => self.func_decl(id, file, decl),
        }
        self.cur_file = saved_file;
        self.iota = saved_iota;
        self.colors.insert(id, Color::Black);
    }

    fn is_grey(&self, id: SymbolId) -> bool {
        self.colors.get(&id) == Some(&Color::Grey)
    }
}

#[cfg(test)]
mod tests;
