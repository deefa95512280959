//! Package summaries.
//!
//! A summary is the exported surface of a checked package without bodies
//! or positions: enough to check importers against it. Summaries are
//! exported after a fast source load, kept in a [`SummaryStore`] shared
//! between sessions, and optionally read from disk as JSON (feature
//! `interchange`).
//!
//! Objects imported from a summary have no declaration position. Methods
//! of interfaces take the interface literal as receiver, so their object
//! string reads `func (interface).M()`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::db::{Db, Package, PackageOrigin};
use super::ids::{PackageId, SymbolId, TypeId};
use super::symbols::{ConstValue, Symbol, SymbolClass};
use super::types::{BasicKind, Interface, Named, Signature, Struct, Type};
use crate::syntax::ast::{ChanDir, is_exported};

// ============================================================================
// SUMMARY FORMAT
// ============================================================================

/// The exported surface of one package.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct PackageSummary {
    pub path: String,
    pub name: String,
    pub imports: Vec<String>,
    /// Type table; other entries refer to types by index.
    pub types: Vec<SummaryType>,
    pub objects: Vec<SummaryObject>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub enum SummaryType {
    Invalid,
    Basic(String),
    /// Reference to a named type declared in `package`.
    Named { package: String, name: String },
    Pointer(u32),
    Slice(u32),
    Array { len: Option<i64>, elem: u32 },
    Map { key: u32, value: u32 },
    Chan { dir: SummaryChanDir, elem: u32 },
    Signature(SummarySig),
    Struct(Vec<SummaryField>),
    Interface {
        methods: Vec<SummaryMethod>,
        embeddeds: Vec<u32>,
    },
    Tuple(Vec<u32>),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub enum SummaryChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct SummarySig {
    pub params: Vec<SummaryParam>,
    pub results: Vec<SummaryParam>,
    pub variadic: bool,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct SummaryParam {
    pub name: String,
    pub ty: u32,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct SummaryField {
    pub name: String,
    pub ty: u32,
    pub embedded: bool,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct SummaryMethod {
    pub name: String,
    pub sig: SummarySig,
    /// Declared on `*T` rather than `T`.
    pub pointer_recv: bool,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub enum SummaryObject {
    Const {
        name: String,
        ty: u32,
        value: SummaryConst,
    },
    Var {
        name: String,
        ty: u32,
    },
    Func {
        name: String,
        sig: SummarySig,
    },
    Type {
        name: String,
        /// For an alias, the aliased type.
        underlying: u32,
        alias: bool,
        methods: Vec<SummaryMethod>,
    },
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub enum SummaryConst {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Unknown,
}

// ============================================================================
// EXPORT
// ============================================================================

/// Export the exported objects of `pkg`.
pub fn export(db: &Db, pkg: PackageId) -> PackageSummary {
    let package = db.package(pkg);
    let mut exporter = Exporter {
        db,
        types: Vec::new(),
        memo: FxHashMap::default(),
    };
    let mut objects = Vec::new();
    for (name, &id) in &package.scope {
        if !is_exported(name) {
            continue;
        }
        if let Some(object) = exporter.object(id) {
            objects.push(object);
        }
    }
    PackageSummary {
        path: package.path.clone(),
        name: package.name.to_string(),
        imports: package
            .imports
            .iter()
            .map(|&imported| db.package(imported).path.clone())
            .collect(),
        types: exporter.types,
        objects,
    }
}

struct Exporter<'a> {
    db: &'a Db,
    types: Vec<SummaryType>,
    memo: FxHashMap<TypeId, u32>,
}

impl Exporter<'_> {
    fn object(&mut self, id: SymbolId) -> Option<SummaryObject> {
        let db = self.db;
        let symbol = db.symbol(id);
        let name = symbol.name.to_string();
        let object = match &symbol.class {
            SymbolClass::Const { value } => SummaryObject::Const {
                name,
                ty: self.ty(symbol.ty),
                value: match value {
                    ConstValue::Int(v) => SummaryConst::Int(*v),
                    ConstValue::Float(v) => SummaryConst::Float(*v),
                    ConstValue::Bool(v) => SummaryConst::Bool(*v),
                    ConstValue::Str(v) => SummaryConst::Str(v.to_string()),
                    ConstValue::Unknown => SummaryConst::Unknown,
                },
            },
            SymbolClass::Var { .. } => SummaryObject::Var {
                name,
                ty: self.ty(symbol.ty),
            },
            SymbolClass::Func => SummaryObject::Func {
                name,
                sig: self.sig(symbol.ty),
            },
            SymbolClass::TypeName => match db.ty(symbol.ty) {
                Type::Named(named) if named.obj == id => SummaryObject::Type {
                    name,
                    underlying: self.ty(named.underlying),
                    alias: false,
                    methods: named.methods.iter().map(|&m| self.method(m)).collect(),
                },
                _ => SummaryObject::Type {
                    name,
                    underlying: self.ty(symbol.ty),
                    alias: true,
                    methods: Vec::new(),
                },
            },
            _ => return None,
        };
        Some(object)
    }

    fn method(&mut self, id: SymbolId) -> SummaryMethod {
        let db = self.db;
        let symbol = db.symbol(id);
        let pointer_recv = db
            .ty(symbol.ty)
            .as_signature()
            .and_then(|sig| sig.recv)
            .is_some_and(|recv| matches!(db.ty(db.symbol(recv).ty), Type::Pointer(_)));
        SummaryMethod {
            name: symbol.name.to_string(),
            sig: self.sig(symbol.ty),
            pointer_recv,
        }
    }

    fn sig(&mut self, ty: TypeId) -> SummarySig {
        let db = self.db;
        let Some(sig) = db.ty(ty).as_signature() else {
            return SummarySig {
                params: Vec::new(),
                results: Vec::new(),
                variadic: false,
            };
        };
        SummarySig {
            params: sig.params.iter().map(|&p| self.param(p)).collect(),
            results: sig.results.iter().map(|&r| self.param(r)).collect(),
            variadic: sig.variadic,
        }
    }

    fn param(&mut self, id: SymbolId) -> SummaryParam {
        let symbol = self.db.symbol(id);
        SummaryParam {
            name: symbol.name.to_string(),
            ty: self.ty(symbol.ty),
        }
    }

    fn ty(&mut self, ty: TypeId) -> u32 {
        if let Some(&index) = self.memo.get(&ty) {
            return index;
        }
        let db = self.db;
        let summary = match db.ty(ty) {
            Type::Invalid => SummaryType::Invalid,
            Type::Basic(kind) => SummaryType::Basic(kind.name().to_string()),
            Type::Named(named) => {
                let obj = db.symbol(named.obj);
                SummaryType::Named {
                    package: obj
                        .package
                        .map(|pkg| db.package(pkg).path.clone())
                        .unwrap_or_default(),
                    name: obj.name.to_string(),
                }
            }
            Type::Pointer(elem) => SummaryType::Pointer(self.ty(*elem)),
            Type::Slice(elem) => SummaryType::Slice(self.ty(*elem)),
            Type::Array { len, elem } => SummaryType::Array {
                len: *len,
                elem: self.ty(*elem),
            },
            Type::Map { key, value } => SummaryType::Map {
                key: self.ty(*key),
                value: self.ty(*value),
            },
            Type::Chan { dir, elem } => SummaryType::Chan {
                dir: match dir {
                    ChanDir::Both => SummaryChanDir::Both,
                    ChanDir::Send => SummaryChanDir::Send,
                    ChanDir::Recv => SummaryChanDir::Recv,
                },
                elem: self.ty(*elem),
            },
            Type::Signature(_) => SummaryType::Signature(self.sig(ty)),
            Type::Struct(st) => SummaryType::Struct(
                st.fields
                    .iter()
                    .map(|&f| {
                        let field = db.symbol(f);
                        SummaryField {
                            name: field.name.to_string(),
                            ty: self.ty(field.ty),
                            embedded: field.is_embedded_field(),
                        }
                    })
                    .collect(),
            ),
            Type::Interface(iface) => SummaryType::Interface {
                methods: iface.methods.iter().map(|&m| self.method(m)).collect(),
                embeddeds: iface.embeddeds.iter().map(|&e| self.ty(e)).collect(),
            },
            Type::Tuple(types) => SummaryType::Tuple(types.iter().map(|&t| self.ty(t)).collect()),
        };
        let index = self.types.len() as u32;
        self.types.push(summary);
        self.memo.insert(ty, index);
        index
    }
}

// ============================================================================
// IMPORT
// ============================================================================

/// Materialise `summary` as a package of `db`.
///
/// Named types of other packages are declared in (possibly empty) stand-in
/// packages; a later import of such a package fills in the stand-in, so
/// type identity is preserved.
pub fn import_summary(db: &mut Db, summary: &PackageSummary) -> PackageId {
    let pkg = summary_package(db, &summary.path, Some(&summary.name));
    let mut importer = Importer {
        db: &mut *db,
        summary,
        pkg,
        types: vec![None; summary.types.len()],
    };
    for object in &summary.objects {
        importer.object(object);
    }
    let imports: Vec<PackageId> = summary
        .imports
        .iter()
        .map(|path| summary_package(importer.db, path, None))
        .collect();
    db.package_mut(pkg).imports = imports;
    tracing::debug!(path = %summary.path, objects = summary.objects.len(), "imported summary");
    pkg
}

/// The summary-origin package for `path`, created empty if needed.
fn summary_package(db: &mut Db, path: &str, name: Option<&str>) -> PackageId {
    let existing = db
        .packages()
        .find(|(_, pkg)| pkg.origin == PackageOrigin::Summary && pkg.path == path)
        .map(|(id, _)| id);
    match existing {
        Some(id) => {
            if let Some(name) = name {
                db.package_mut(id).name = SmolStr::new(name);
            }
            id
        }
        None => {
            let guess = path.rsplit('/').next().unwrap_or(path);
            let name = name.unwrap_or(guess);
            db.alloc_package(Package::new(path, name, PackageOrigin::Summary))
        }
    }
}

struct Importer<'a> {
    db: &'a mut Db,
    summary: &'a PackageSummary,
    pkg: PackageId,
    types: Vec<Option<TypeId>>,
}

impl Importer<'_> {
    fn object(&mut self, object: &SummaryObject) {
        match object {
            SummaryObject::Const { name, ty, value } => {
                let ty = self.ty(*ty);
                let value = match value {
                    SummaryConst::Int(v) => ConstValue::Int(*v),
                    SummaryConst::Float(v) => ConstValue::Float(*v),
                    SummaryConst::Bool(v) => ConstValue::Bool(*v),
                    SummaryConst::Str(v) => ConstValue::Str(v.into()),
                    SummaryConst::Unknown => ConstValue::Unknown,
                };
                self.declare(name, SymbolClass::Const { value }, ty);
            }
            SummaryObject::Var { name, ty } => {
                let ty = self.ty(*ty);
                let class = SymbolClass::Var {
                    field: false,
                    embedded: false,
                };
                self.declare(name, class, ty);
            }
            SummaryObject::Func { name, sig } => {
                let ty = self.sig(sig, None);
                self.declare(name, SymbolClass::Func, ty);
            }
            SummaryObject::Type {
                name,
                underlying,
                alias: true,
                ..
            } => {
                let ty = self.ty(*underlying);
                self.declare(name, SymbolClass::TypeName, ty);
            }
            SummaryObject::Type {
                name,
                underlying,
                methods,
                ..
            } => {
                let named = self.named(self.pkg, name);
                let underlying = self.ty(*underlying);
                let underlying = self.db.underlying(underlying);
                let mut method_ids = Vec::with_capacity(methods.len());
                for method in methods {
                    let recv_ty = if method.pointer_recv {
                        self.db.pointer_to(named)
                    } else {
                        named
                    };
                    let recv = self.var("", recv_ty);
                    let sig = self.sig(&method.sig, Some(recv));
                    method_ids.push(self.symbol(&method.name, SymbolClass::Func, sig, false));
                }
                if let Type::Named(n) = self.db.ty_mut(named) {
                    n.underlying = underlying;
                    n.methods = method_ids;
                }
            }
        }
    }

    fn declare(&mut self, name: &str, class: SymbolClass, ty: TypeId) {
        let id = self.symbol(name, class, ty, true);
        self.db
            .package_mut(self.pkg)
            .scope
            .insert(SmolStr::new(name), id);
    }

    fn symbol(&mut self, name: &str, class: SymbolClass, ty: TypeId, package_level: bool) -> SymbolId {
        self.db.alloc_symbol(Symbol {
            name: SmolStr::new(name),
            class,
            package: Some(self.pkg),
            pos: None,
            ty,
            package_level,
        })
    }

    fn var(&mut self, name: &str, ty: TypeId) -> SymbolId {
        let class = SymbolClass::Var {
            field: false,
            embedded: false,
        };
        self.symbol(name, class, ty, false)
    }

    /// The named type `name` of package `owner`, declared on first use.
    fn named(&mut self, owner: PackageId, name: &str) -> TypeId {
        if let Some(existing) = self.db.package(owner).lookup(name) {
            let ty = self.db.symbol(existing).ty;
            if self.db.ty(ty).as_named().is_some_and(|n| n.obj == existing) {
                return ty;
            }
        }
        let invalid = self.db.invalid();
        let obj = self.db.alloc_symbol(Symbol {
            name: SmolStr::new(name),
            class: SymbolClass::TypeName,
            package: Some(owner),
            pos: None,
            ty: invalid,
            package_level: true,
        });
        let ty = self.db.alloc_type(Type::Named(Named {
            obj,
            underlying: invalid,
            methods: Vec::new(),
        }));
        self.db.symbol_mut(obj).ty = ty;
        self.db
            .package_mut(owner)
            .scope
            .insert(SmolStr::new(name), obj);
        ty
    }

    fn sig(&mut self, sig: &SummarySig, recv: Option<SymbolId>) -> TypeId {
        let params = sig
            .params
            .iter()
            .map(|p| {
                let ty = self.ty(p.ty);
                self.var(&p.name, ty)
            })
            .collect();
        let results = sig
            .results
            .iter()
            .map(|r| {
                let ty = self.ty(r.ty);
                self.var(&r.name, ty)
            })
            .collect();
        self.db.alloc_type(Type::Signature(Signature {
            recv,
            params,
            results,
            variadic: sig.variadic,
        }))
    }

    fn ty(&mut self, index: u32) -> TypeId {
        let slot = index as usize;
        if let Some(Some(ty)) = self.types.get(slot) {
            return *ty;
        }
        let table: &PackageSummary = self.summary;
        let Some(summary) = table.types.get(slot) else {
            return self.db.invalid();
        };
        let ty = match summary {
            SummaryType::Invalid => self.db.invalid(),
            SummaryType::Basic(name) => match BasicKind::from_name(name) {
                Some(kind) => self.db.basic(kind),
                None => self.db.invalid(),
            },
            SummaryType::Named { package, name } => {
                if package.is_empty() {
                    // Universe types such as `error`.
                    match self.db.universe().lookup(name) {
                        Some(obj) => self.db.symbol(obj).ty,
                        None => self.db.invalid(),
                    }
                } else if *package == table.path {
                    self.named(self.pkg, name)
                } else {
                    let owner = summary_package(self.db, package, None);
                    self.named(owner, name)
                }
            }
            SummaryType::Pointer(elem) => {
                let elem = self.ty(*elem);
                self.db.pointer_to(elem)
            }
            SummaryType::Slice(elem) => {
                let elem = self.ty(*elem);
                self.db.alloc_type(Type::Slice(elem))
            }
            SummaryType::Array { len, elem } => {
                let elem = self.ty(*elem);
                self.db.alloc_type(Type::Array { len: *len, elem })
            }
            SummaryType::Map { key, value } => {
                let key = self.ty(*key);
                let value = self.ty(*value);
                self.db.alloc_type(Type::Map { key, value })
            }
            SummaryType::Chan { dir, elem } => {
                let elem = self.ty(*elem);
                let dir = match dir {
                    SummaryChanDir::Both => ChanDir::Both,
                    SummaryChanDir::Send => ChanDir::Send,
                    SummaryChanDir::Recv => ChanDir::Recv,
                };
                self.db.alloc_type(Type::Chan { dir, elem })
            }
            SummaryType::Signature(sig) => self.sig(sig, None),
            SummaryType::Struct(fields) => {
                let fields = fields
                    .iter()
                    .map(|f| {
                        let ty = self.ty(f.ty);
                        let class = SymbolClass::Var {
                            field: true,
                            embedded: f.embedded,
                        };
                        self.symbol(&f.name, class, ty, false)
                    })
                    .collect();
                self.db.alloc_type(Type::Struct(Struct { fields }))
            }
            SummaryType::Interface { methods, embeddeds } => {
                let iface = self.db.alloc_type(Type::Interface(Interface::default()));
                let methods = methods
                    .iter()
                    .map(|m| {
                        let recv = self.var("", iface);
                        let sig = self.sig(&m.sig, Some(recv));
                        self.symbol(&m.name, SymbolClass::Func, sig, false)
                    })
                    .collect();
                let embeddeds = embeddeds.iter().map(|&e| self.ty(e)).collect();
                *self.db.ty_mut(iface) = Type::Interface(Interface { methods, embeddeds });
                iface
            }
            SummaryType::Tuple(types) => {
                let types = types.iter().map(|&t| self.ty(t)).collect();
                self.db.alloc_type(Type::Tuple(types))
            }
        };
        self.types[slot] = Some(ty);
        ty
    }
}

// ============================================================================
// SUMMARY STORE
// ============================================================================

/// Summaries shared by every session of one configuration generation.
///
/// Cloning is cheap; clones share the same table.
#[derive(Clone, Debug, Default)]
pub struct SummaryStore {
    inner: Arc<RwLock<FxHashMap<String, Arc<PackageSummary>>>>,
    /// Directory of `<path>.json` files, read on a miss.
    disk: Option<PathBuf>,
}

impl SummaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that falls back to `<dir>/<path>.json` on a miss.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::default(),
            disk: Some(dir.into()),
        }
    }

    pub fn get(&self, path: &str) -> Option<Arc<PackageSummary>> {
        // Fast path: read lock
        if let Some(summary) = self.inner.read().get(path) {
            return Some(summary.clone());
        }
        let summary = Arc::new(self.read_disk(path)?);
        let mut inner = self.inner.write();
        Some(inner.entry(path.to_string()).or_insert(summary).clone())
    }

    pub fn insert(&self, summary: PackageSummary) {
        let path = summary.path.clone();
        self.inner.write().insert(path, Arc::new(summary));
    }

    pub fn contains(&self, path: &str) -> bool {
        self.inner.read().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dir(&self) -> Option<&Path> {
        self.disk.as_deref()
    }

    #[cfg(feature = "interchange")]
    fn read_disk(&self, path: &str) -> Option<PackageSummary> {
        let file = self.disk.as_ref()?.join(format!("{path}.json"));
        let text = std::fs::read_to_string(&file).ok()?;
        match serde_json::from_str(&text) {
            Ok(summary) => Some(summary),
            Err(err) => {
                tracing::warn!(file = %file.display(), error = %err, "unreadable summary");
                None
            }
        }
    }

    #[cfg(not(feature = "interchange"))]
    fn read_disk(&self, _path: &str) -> Option<PackageSummary> {
        None
    }

    /// Write `summary` to the store directory as JSON.
    #[cfg(feature = "interchange")]
    pub fn write_disk(&self, summary: &PackageSummary) -> std::io::Result<()> {
        let Some(dir) = &self.disk else {
            return Ok(());
        };
        let file = dir.join(format!("{}.json", summary.path));
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string(summary).map_err(std::io::Error::other)?;
        std::fs::write(file, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::display::object_string;

    /// A package `example/shapes` built by hand:
    /// `type Shape interface{ Area() float64 }`,
    /// `type Box struct{ W, H float64 }` with `func (*Box) Area() float64`,
    /// `const Sides = 4`.
    fn shapes(db: &mut Db) -> PackageId {
        let pkg = db.alloc_package(Package::new("example/shapes", "shapes", PackageOrigin::Source));
        let float = db.basic(BasicKind::Float64);
        let new_symbol = |db: &mut Db, name: &str, class, ty, package_level| {
            db.alloc_symbol(Symbol {
                name: name.into(),
                class,
                package: Some(pkg),
                pos: None,
                ty,
                package_level,
            })
        };
        let var = SymbolClass::Var {
            field: false,
            embedded: false,
        };

        // Shape
        let invalid = db.invalid();
        let shape = new_symbol(db, "Shape", SymbolClass::TypeName, invalid, true);
        let shape_ty = db.alloc_type(Type::Named(Named {
            obj: shape,
            underlying: invalid,
            methods: Vec::new(),
        }));
        db.symbol_mut(shape).ty = shape_ty;
        let recv = new_symbol(db, "", var.clone(), shape_ty, false);
        let result = new_symbol(db, "", var.clone(), float, false);
        let sig = db.alloc_type(Type::Signature(Signature {
            recv: Some(recv),
            params: Vec::new(),
            results: vec![result],
            variadic: false,
        }));
        let area = new_symbol(db, "Area", SymbolClass::Func, sig, false);
        let iface = db.alloc_type(Type::Interface(Interface {
            methods: vec![area],
            embeddeds: Vec::new(),
        }));
        if let Type::Named(named) = db.ty_mut(shape_ty) {
            named.underlying = iface;
        }

        // Box
        let boxed = new_symbol(db, "Box", SymbolClass::TypeName, invalid, true);
        let field = SymbolClass::Var {
            field: true,
            embedded: false,
        };
        let w = new_symbol(db, "W", field.clone(), float, false);
        let h = new_symbol(db, "H", field, float, false);
        let st = db.alloc_type(Type::Struct(Struct { fields: vec![w, h] }));
        let box_ty = db.alloc_type(Type::Named(Named {
            obj: boxed,
            underlying: st,
            methods: Vec::new(),
        }));
        db.symbol_mut(boxed).ty = box_ty;
        let ptr = db.pointer_to(box_ty);
        let recv = new_symbol(db, "b", var.clone(), ptr, false);
        let result = new_symbol(db, "", var, float, false);
        let sig = db.alloc_type(Type::Signature(Signature {
            recv: Some(recv),
            params: Vec::new(),
            results: vec![result],
            variadic: false,
        }));
        let box_area = new_symbol(db, "Area", SymbolClass::Func, sig, false);
        if let Type::Named(named) = db.ty_mut(box_ty) {
            named.methods.push(box_area);
        }

        let untyped = db.basic(BasicKind::UntypedInt);
        let sides = new_symbol(
            db,
            "Sides",
            SymbolClass::Const {
                value: ConstValue::Int(4),
            },
            untyped,
            true,
        );
        let hidden = new_symbol(db, "hidden", SymbolClass::Func, sig, true);

        let package = db.package_mut(pkg);
        for (name, id) in [("Shape", shape), ("Box", boxed), ("Sides", sides), ("hidden", hidden)] {
            package.scope.insert(name.into(), id);
        }
        pkg
    }

    #[test]
    fn test_export_skips_unexported_objects() {
        let mut db = Db::new();
        let pkg = shapes(&mut db);
        let summary = export(&db, pkg);
        let names: Vec<&str> = summary
            .objects
            .iter()
            .map(|o| match o {
                SummaryObject::Const { name, .. }
                | SummaryObject::Var { name, .. }
                | SummaryObject::Func { name, .. }
                | SummaryObject::Type { name, .. } => name.as_str(),
            })
            .collect();
        assert_eq!(names, vec!["Shape", "Box", "Sides"]);
    }

    #[test]
    fn test_imported_objects_render_like_the_source() {
        let mut source = Db::new();
        let pkg = shapes(&mut source);
        let summary = export(&source, pkg);

        let mut db = Db::new();
        let imported = import_summary(&mut db, &summary);
        let package = db.package(imported);
        assert_eq!(package.origin, PackageOrigin::Summary);
        assert_eq!(package.name.as_str(), "shapes");

        let boxed = package.lookup("Box").unwrap();
        assert_eq!(
            object_string(&db, boxed),
            object_string(&source, source.package(pkg).lookup("Box").unwrap())
        );
        let method = db.ty(db.symbol(boxed).ty).as_named().unwrap().methods[0];
        assert_eq!(
            object_string(&db, method),
            "func (*example/shapes.Box).Area() float64"
        );
        assert!(db.symbol(method).pos.is_none());

        let sides = package.lookup("Sides").unwrap();
        assert!(matches!(
            db.symbol(sides).class,
            SymbolClass::Const {
                value: ConstValue::Int(4)
            }
        ));
    }

    #[test]
    fn test_interface_methods_take_the_literal_receiver() {
        let mut source = Db::new();
        let pkg = shapes(&mut source);
        let summary = export(&source, pkg);

        let mut db = Db::new();
        let imported = import_summary(&mut db, &summary);
        let shape = db.package(imported).lookup("Shape").unwrap();
        let iface = db.underlying(db.symbol(shape).ty);
        let Type::Interface(iface) = db.ty(iface) else {
            panic!("Shape is not an interface");
        };
        assert_eq!(object_string(&db, iface.methods[0]), "func (interface).Area() float64");
    }

    #[test]
    fn test_foreign_named_types_share_identity() {
        let summary_a = PackageSummary {
            path: "example/a".into(),
            name: "a".into(),
            imports: vec!["example/b".into()],
            types: vec![SummaryType::Named {
                package: "example/b".into(),
                name: "T".into(),
            }],
            objects: vec![SummaryObject::Var {
                name: "V".into(),
                ty: 0,
            }],
        };
        let summary_b = PackageSummary {
            path: "example/b".into(),
            name: "b".into(),
            imports: Vec::new(),
            types: vec![SummaryType::Basic("int".into())],
            objects: vec![SummaryObject::Type {
                name: "T".into(),
                underlying: 0,
                alias: false,
                methods: Vec::new(),
            }],
        };

        let mut db = Db::new();
        let a = import_summary(&mut db, &summary_a);
        let b = import_summary(&mut db, &summary_b);
        let v = db.package(a).lookup("V").unwrap();
        let t = db.package(b).lookup("T").unwrap();
        assert_eq!(db.symbol(v).ty, db.symbol(t).ty);
        assert_eq!(db.basic_kind(db.symbol(t).ty), Some(BasicKind::Int));
        assert_eq!(db.package(a).imports, vec![b]);
    }

    #[test]
    fn test_store_is_shared_between_clones() {
        let store = SummaryStore::new();
        let clone = store.clone();
        let mut db = Db::new();
        let pkg = shapes(&mut db);
        clone.insert(export(&db, pkg));

        assert!(store.contains("example/shapes"));
        assert_eq!(store.get("example/shapes").unwrap().name, "shapes");
        assert!(store.get("example/missing").is_none());
    }

    #[cfg(feature = "interchange")]
    #[test]
    fn test_store_reads_summaries_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Db::new();
        let pkg = shapes(&mut db);
        let exported = export(&db, pkg);
        SummaryStore::with_dir(dir.path()).write_disk(&exported).unwrap();
        assert!(dir.path().join("example/shapes.json").is_file());

        let fresh = SummaryStore::with_dir(dir.path());
        assert!(!fresh.contains("example/shapes"));
        assert_eq!(fresh.get("example/shapes").as_deref(), Some(&exported));
        assert!(fresh.contains("example/shapes"));
    }
}
