//! Cursor Resolver.
//!
//! Maps the bound cursor of a session to an import declaration or to the
//! symbol under it, then follows the indirections that make the symbol's
//! declaration useful to a reader:
//!
//! ```text
//! import?       cursor inside an import spec → ImportTarget
//! lookup        selections, then defs, then uses
//! classify      ObjKind
//! embedded      embedded field of a named type → the type's declaration
//! interface     method through an interface receiver → declaring interface
//! promotion     summary-loaded owner → re-resolve from source for a position
//! field owner   struct type declaring the field
//! ```

use std::path::Path;

use smol_str::SmolStr;

use crate::base::Span;
use crate::error::ClassificationError;
use crate::hir::display::object_string;
use crate::hir::lookup::lookup_named_method;
use crate::hir::{Db, ObjKind, PackageId, PackageOrigin, SemanticInfo, SymbolClass, SymbolId, Type, classify};
use crate::project::{ResolveOptions, Session};

/// An import declaration under the cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportTarget {
    pub path: String,
    /// Explicit alias (`.` and `_` included).
    pub alias: Option<String>,
    /// Name the import is referred to by in the file.
    pub local_name: String,
    /// The import spec.
    pub span: Span,
    /// Package of the file holding the import.
    pub package: PackageId,
}

impl ImportTarget {
    /// `package fname`, or `package fname ("path")` when they differ.
    pub fn info(&self) -> String {
        if self.local_name == self.path {
            format!("package {}", self.local_name)
        } else {
            format!("package {} ({:?})", self.local_name, self.path)
        }
    }
}

/// A symbol under the cursor, after following indirections.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedSymbol {
    pub symbol: SymbolId,
    pub kind: ObjKind,
    /// Declaration position. For summary-loaded symbols this is the
    /// position found by re-resolving the owner from source.
    pub pos: Option<Span>,
    /// Package the symbol is reported in. For methods reached through an
    /// interface this is the package of the declaring interface.
    pub owner: Option<PackageId>,
    /// Package the cursor was resolved in.
    pub root: PackageId,
    /// Name of the declaring interface, for interface methods.
    pub interface: Option<SmolStr>,
    /// Struct type declaring the field, for fields.
    pub field_owner: Option<SymbolId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CursorTarget {
    Import(ImportTarget),
    Symbol(ResolvedSymbol),
}

/// Resolve the session's bound cursor inside `root`.
///
/// Returns `Ok(None)` if the cursor is unbound or on nothing.
pub fn resolve_cursor(session: &mut Session, root: PackageId) -> Result<Option<CursorTarget>, ClassificationError> {
    if let Some(import) = check_import(session, root) {
        return Ok(Some(CursorTarget::Import(import)));
    }
    Ok(lookup_symbol(session, root)?.map(CursorTarget::Symbol))
}

/// The import spec under the cursor, if any.
pub fn check_import(session: &Session, root: PackageId) -> Option<ImportTarget> {
    let bound = session.bound_cursor()?;
    let spec = bound.file.ast().import_at(bound.pos.offset)?;
    let path = spec.path_value()?;
    let alias = spec.name.as_ref().map(|alias| alias.name.to_string());
    let local_name = alias.clone().unwrap_or_else(|| import_base(&path).to_string());
    Some(ImportTarget {
        path,
        alias,
        local_name,
        span: bound.file.span(spec.range),
        package: root,
    })
}

/// The last element of an import path, split at any of `./-\`.
fn import_base(path: &str) -> &str {
    match path.rfind(['.', '/', '-', '\\']) {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// Find and classify the symbol under the cursor.
pub fn lookup_symbol(session: &mut Session, root: PackageId) -> Result<Option<ResolvedSymbol>, ClassificationError> {
    let Some(pos) = session.bound_cursor().map(|bound| bound.pos) else {
        return Ok(None);
    };
    let db = session.db();
    let info = &db.package(root).info;

    let selection = info.selection_at(pos).map(|(_, sel)| sel.clone());
    let found = selection
        .as_ref()
        .map(|sel| sel.obj)
        .or_else(|| info.def_at(pos).map(|(_, id)| id))
        .or_else(|| info.use_at(pos).map(|(_, id)| id));
    let Some(mut symbol) = found else {
        tracing::trace!(?pos, "nothing under cursor");
        return Ok(None);
    };
    let kind = classify(db, symbol)?;

    if kind == ObjKind::Field && db.symbol(symbol).is_embedded_field() {
        if let Type::Named(named) = db.ty(db.symbol(symbol).ty) {
            symbol = named.obj;
        }
    }

    let mut target = ResolvedSymbol {
        symbol,
        kind,
        pos: db.symbol(symbol).pos,
        owner: db.symbol(symbol).package,
        root,
        interface: None,
        field_owner: None,
    };

    if kind == ObjKind::Method {
        if let Some(sel) = &selection {
            if has_interface_receiver(db, symbol) && matches!(db.ty(sel.recv), Type::Named(_)) {
                let name = db.symbol(symbol).name.clone();
                if let Some((method, named)) = lookup_named_method(db, sel.recv, &name) {
                    let iface = db.ty(named).as_named().map(|n| db.symbol(n.obj));
                    target.symbol = method;
                    target.pos = db.symbol(method).pos;
                    target.owner = iface.and_then(|obj| obj.package);
                    target.interface = iface.map(|obj| obj.name.clone());
                }
            }
        }
    }
    tracing::trace!(symbol = %db.symbol(target.symbol).name, kind = kind.label(), "cursor symbol");

    let mut field_info = (target.owner == Some(root)).then_some(root);
    let summary_owned = target
        .owner
        .is_some_and(|owner| owner != root && db.package(owner).origin == PackageOrigin::Summary);
    if summary_owned && kind != ObjKind::Package {
        if let Some(promoted) = promote(session, &mut target) {
            if kind == ObjKind::Field || target.interface.is_some() {
                field_info = Some(promoted);
            }
        }
    }

    if kind == ObjKind::Field {
        let db = session.db();
        let info_pkg = field_info.or_else(|| {
            target
                .owner
                .filter(|&owner| db.package(owner).origin == PackageOrigin::Source)
        });
        if let (Some(info_pkg), Some(pos)) = (info_pkg, target.pos) {
            target.field_owner = struct_owner(db, &db.package(info_pkg).info, pos);
        }
    }
    Ok(Some(target))
}

fn has_interface_receiver(db: &Db, method: SymbolId) -> bool {
    db.ty(db.symbol(method).ty)
        .as_signature()
        .and_then(|sig| sig.recv)
        .is_some_and(|recv| matches!(db.ty(db.underlying(db.symbol(recv).ty)), Type::Interface(_)))
}

/// Check the owner of a summary-loaded symbol from source and take the
/// position of the matching declaration. Returns the source package.
fn promote(session: &mut Session, target: &mut ResolvedSymbol) -> Option<PackageId> {
    let owner = target.owner?;
    let path = session.db().package(owner).path.clone();
    let promoted = match session.resolve(Path::new(""), &path, ResolveOptions::PROMOTE) {
        Ok(id) => id,
        Err(err) => {
            tracing::debug!(%path, error = %err, "promotion failed");
            return None;
        }
    };

    let db = session.db();
    let defs = &db.package(promoted).info.defs;
    let name = db.symbol(target.symbol).name.clone();
    let found = match &target.interface {
        Some(iface) => defs
            .values()
            .copied()
            .find(|&def| is_method_of(db, def, &name, iface)),
        None => {
            let wanted = object_string(db, target.symbol);
            defs.values()
                .copied()
                .find(|&def| object_string(db, def) == wanted)
        }
    };
    match found {
        Some(def) => {
            target.pos = db.symbol(def).pos;
            tracing::debug!(%path, symbol = %name, "promoted summary symbol");
        }
        None => tracing::debug!(%path, symbol = %name, "no source declaration"),
    }
    Some(promoted)
}

/// `def` is a method `name` whose receiver is the named type `iface`.
fn is_method_of(db: &Db, def: SymbolId, name: &str, iface: &str) -> bool {
    let symbol = db.symbol(def);
    if !matches!(symbol.class, SymbolClass::Func) || symbol.name != name {
        return false;
    }
    db.ty(symbol.ty)
        .as_signature()
        .and_then(|sig| sig.recv)
        .and_then(|recv| db.ty(db.symbol(recv).ty).as_named())
        .is_some_and(|named| db.symbol(named.obj).name == iface)
}

/// The type name whose struct declares a field at `pos`.
///
/// Types defined from another struct type (`type T S`) share its fields, so
/// the declaring type is the closest one declared before the field in the
/// same file. Falls back to the first holder in declaration order.
pub fn struct_owner(db: &Db, info: &SemanticInfo, pos: Span) -> Option<SymbolId> {
    let holders: Vec<SymbolId> = info
        .defs
        .values()
        .copied()
        .filter(|&def| {
            let symbol = db.symbol(def);
            if !matches!(symbol.class, SymbolClass::TypeName) {
                return false;
            }
            match db.ty(db.underlying(symbol.ty)) {
                Type::Struct(st) => st.fields.iter().any(|&f| db.symbol(f).pos == Some(pos)),
                _ => false,
            }
        })
        .collect();
    holders
        .iter()
        .copied()
        .filter_map(|def| db.symbol(def).pos.map(|at| (at, def)))
        .filter(|(at, _)| at.file == pos.file && at.range.start() <= pos.range.start())
        .max_by_key(|(at, _)| at.range.start())
        .map(|(_, def)| def)
        .or_else(|| holders.first().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_base() {
        assert_eq!(import_base("encoding/json"), "json");
        assert_eq!(import_base("gopkg.in/yaml.v2"), "v2");
        assert_eq!(import_base("github.com/mattn/go-sqlite3"), "sqlite3");
        assert_eq!(import_base("fmt"), "fmt");
    }

    #[test]
    fn test_import_info() {
        let span = Span::new(crate::base::FileId::new(0), Default::default());
        let target = |path: &str, local: &str| ImportTarget {
            path: path.into(),
            alias: None,
            local_name: local.into(),
            span,
            package: PackageId::new(0),
        };
        assert_eq!(target("fmt", "fmt").info(), "package fmt");
        assert_eq!(
            target("encoding/json", "json").info(),
            "package json (\"encoding/json\")"
        );
    }
}
