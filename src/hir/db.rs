//! Session arenas for symbols, types and packages.

use std::path::PathBuf;

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::diagnostics::Diagnostic;
use super::ids::{PackageId, SymbolId, TypeId};
use super::info::SemanticInfo;
use super::symbols::Symbol;
use super::types::{BasicKind, Type};
use super::universe::Universe;
use crate::base::FileId;
use crate::error::ResolveError;

/// Where a package's symbols came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PackageOrigin {
    /// Checked from source; symbols carry positions.
    Source,
    /// Imported from a position-free summary.
    Summary,
    /// `unsafe` and the fake `C` package.
    Synthetic,
}

/// A checked (or imported) package.
#[derive(Debug)]
pub struct Package {
    /// Import path the package was checked under.
    pub path: String,
    /// Declared package name.
    pub name: SmolStr,
    pub dir: Option<PathBuf>,
    /// Package-level objects in declaration order.
    pub scope: IndexMap<SmolStr, SymbolId>,
    pub files: Vec<FileId>,
    pub imports: Vec<PackageId>,
    pub origin: PackageOrigin,
    /// Semantic tables; empty for summary-loaded packages.
    pub info: SemanticInfo,
    pub diagnostics: Vec<Diagnostic>,
    /// Imports that could not be resolved, with the reason.
    pub import_errors: Vec<(String, ResolveError)>,
}

impl Package {
    pub fn new(path: impl Into<String>, name: impl Into<SmolStr>, origin: PackageOrigin) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            dir: None,
            scope: IndexMap::new(),
            files: Vec::new(),
            imports: Vec::new(),
            origin,
            info: SemanticInfo::default(),
            diagnostics: Vec::new(),
            import_errors: Vec::new(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.scope.get(name).copied()
    }

    pub fn is_fake(&self) -> bool {
        self.origin == PackageOrigin::Synthetic && self.path == "C"
    }
}

/// The arenas of one session.
///
/// Created with the universe scope and package `unsafe` already present.
#[derive(Debug)]
pub struct Db {
    symbols: Vec<Symbol>,
    types: Vec<Type>,
    packages: Vec<Package>,
    universe: Universe,
}

impl Default for Db {
    fn default() -> Self {
        Self::new()
    }
}

impl Db {
    pub fn new() -> Self {
        let mut db = Self {
            symbols: Vec::new(),
            types: vec![Type::Invalid],
            packages: Vec::new(),
            universe: Universe::default(),
        };
        db.universe = Universe::populate(&mut db);
        db
    }

    // --- symbols ------------------------------------------------------------

    pub fn alloc_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId::new(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    // --- types --------------------------------------------------------------

    pub fn alloc_type(&mut self, ty: Type) -> TypeId {
        let id = TypeId::new(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    pub fn ty_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.index()]
    }

    /// The shared invalid type.
    pub fn invalid(&self) -> TypeId {
        TypeId::new(0)
    }

    pub fn basic(&self, kind: BasicKind) -> TypeId {
        self.universe.basic(kind)
    }

    /// Follow named types to their underlying type.
    pub fn underlying(&self, mut ty: TypeId) -> TypeId {
        // Chains of named types are short; the bound stops a malformed
        // self-reference.
        for _ in 0..16 {
            match self.ty(ty) {
                Type::Named(named) if named.underlying != ty => ty = named.underlying,
                Type::Named(_) => return self.invalid(),
                _ => return ty,
            }
        }
        self.invalid()
    }

    /// Strip one level of pointer indirection; reports whether one was
    /// removed.
    pub fn deref(&self, ty: TypeId) -> (TypeId, bool) {
        match self.ty(ty) {
            Type::Pointer(elem) => (*elem, true),
            _ => (ty, false),
        }
    }

    pub fn pointer_to(&mut self, elem: TypeId) -> TypeId {
        self.alloc_type(Type::Pointer(elem))
    }

    /// Basic kind of the underlying type, if it is basic.
    pub fn basic_kind(&self, ty: TypeId) -> Option<BasicKind> {
        match self.ty(self.underlying(ty)) {
            Type::Basic(kind) => Some(*kind),
            _ => None,
        }
    }

    // --- packages -----------------------------------------------------------

    pub fn alloc_package(&mut self, package: Package) -> PackageId {
        let id = PackageId::new(self.packages.len() as u32);
        self.packages.push(package);
        id
    }

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.index()]
    }

    pub fn package_mut(&mut self, id: PackageId) -> &mut Package {
        &mut self.packages[id.index()]
    }

    pub fn packages(&self) -> impl Iterator<Item = (PackageId, &Package)> {
        self.packages
            .iter()
            .enumerate()
            .map(|(i, pkg)| (PackageId::new(i as u32), pkg))
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_db_has_unsafe() {
        let db = Db::new();
        let unsafe_pkg = db.package(db.universe().unsafe_package());
        assert_eq!(unsafe_pkg.path, "unsafe");
        assert!(unsafe_pkg.lookup("Pointer").is_some());
        assert!(unsafe_pkg.lookup("Sizeof").is_some());
    }

    #[test]
    fn test_underlying_of_error_is_interface() {
        let db = Db::new();
        let error = db.universe().lookup("error").unwrap();
        let under = db.underlying(db.symbol(error).ty);
        assert!(matches!(db.ty(under), Type::Interface(_)));
    }

    #[test]
    fn test_deref() {
        let mut db = Db::new();
        let int = db.basic(BasicKind::Int);
        let ptr = db.pointer_to(int);
        assert_eq!(db.deref(ptr), (int, true));
        assert_eq!(db.deref(int), (int, false));
    }
}
