//! Field and method lookup through embedding.
//!
//! Every search that follows embedded types keeps a visited set, so
//! self-embedding (direct or through a cycle of named types) terminates.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use super::db::Db;
use super::ids::{SymbolId, TypeId};
use super::types::Type;

/// Result of [`lookup_field_or_method`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Found {
    pub obj: SymbolId,
    /// Field indices leading to `obj`; the last one selects `obj` itself.
    pub index: Vec<usize>,
    /// A pointer was dereferenced on the way.
    pub indirect: bool,
}

impl Found {
    pub fn is_field(&self, db: &Db) -> bool {
        db.symbol(self.obj).is_field()
    }
}

struct Candidate {
    ty: TypeId,
    index: Vec<usize>,
    indirect: bool,
}

/// Find the field or method `name` of `ty`, breadth first through embedded
/// fields. The shallowest match wins; two matches at the same depth are
/// ambiguous and yield `None`.
pub fn lookup_field_or_method(db: &Db, ty: TypeId, name: &str) -> Option<Found> {
    let (start, indirect) = db.deref(ty);
    let mut current = vec![Candidate {
        ty: start,
        index: Vec::new(),
        indirect,
    }];
    let mut seen = FxHashSet::default();

    while !current.is_empty() {
        let mut next = Vec::new();
        let mut found: Option<Found> = None;
        let mut count = 0;

        for candidate in current {
            let mut ty = candidate.ty;
            if let Type::Named(named) = db.ty(ty) {
                if !seen.insert(ty) {
                    continue;
                }
                if let Some(i) = named
                    .methods
                    .iter()
                    .position(|m| db.symbol(*m).name == name)
                {
                    count += 1;
                    found = Some(Found {
                        obj: named.methods[i],
                        index: extend(&candidate.index, i),
                        indirect: candidate.indirect,
                    });
                    continue;
                }
                ty = named.underlying;
            }

            match db.ty(ty) {
                Type::Struct(st) => {
                    for (i, &field_id) in st.fields.iter().enumerate() {
                        let field = db.symbol(field_id);
                        if field.name == name {
                            count += 1;
                            found = Some(Found {
                                obj: field_id,
                                index: extend(&candidate.index, i),
                                indirect: candidate.indirect,
                            });
                            continue;
                        }
                        if field.is_embedded_field() {
                            let (embedded, is_ptr) = db.deref(field.ty);
                            next.push(Candidate {
                                ty: embedded,
                                index: extend(&candidate.index, i),
                                indirect: candidate.indirect || is_ptr,
                            });
                        }
                    }
                }
                Type::Interface(_) => {
                    let methods = interface_method_set(db, ty);
                    if let Some(i) = methods.iter().position(|m| db.symbol(*m).name == name) {
                        count += 1;
                        found = Some(Found {
                            obj: methods[i],
                            index: extend(&candidate.index, i),
                            indirect: candidate.indirect,
                        });
                    }
                }
                _ => {}
            }
        }

        match count {
            0 => current = next,
            1 => return found,
            _ => return None,
        }
    }
    None
}

fn extend(index: &[usize], i: usize) -> Vec<usize> {
    let mut index = index.to_vec();
    index.push(i);
    index
}

/// All methods of an interface: explicit ones first, then those of
/// embedded interfaces depth first. Method symbols keep their identity, so
/// a method reached through embedding is the embedded interface's symbol.
pub fn interface_method_set(db: &Db, ty: TypeId) -> Vec<SymbolId> {
    let mut out = Vec::new();
    let mut names = FxHashSet::default();
    let mut visited = FxHashSet::default();
    collect_methods(db, ty, &mut out, &mut names, &mut visited);
    out
}

fn collect_methods(
    db: &Db,
    ty: TypeId,
    out: &mut Vec<SymbolId>,
    names: &mut FxHashSet<SmolStr>,
    visited: &mut FxHashSet<TypeId>,
) {
    if !visited.insert(ty) {
        return;
    }
    let Type::Interface(iface) = db.ty(db.underlying(ty)) else {
        return;
    };
    for &method in &iface.methods {
        if names.insert(db.symbol(method).name.clone()) {
            out.push(method);
        }
    }
    for &embedded in &iface.embeddeds {
        collect_methods(db, embedded, out, names, visited);
    }
}

/// Find the declaration of method `name` starting at a named type.
///
/// For an interface: its own methods, then embedded interfaces depth first.
/// For a struct: its methods, then embedded named fields. Returns the
/// method and the named type that declares it.
pub fn lookup_named_method(db: &Db, named: TypeId, name: &str) -> Option<(SymbolId, TypeId)> {
    let mut visited = FxHashSet::default();
    named_method(db, named, name, &mut visited)
}

fn named_method(
    db: &Db,
    ty: TypeId,
    name: &str,
    visited: &mut FxHashSet<TypeId>,
) -> Option<(SymbolId, TypeId)> {
    let Type::Named(named) = db.ty(ty) else {
        return None;
    };
    if !visited.insert(ty) {
        return None;
    }
    match db.ty(named.underlying) {
        Type::Interface(iface) => {
            if let Some(&m) = iface.methods.iter().find(|m| db.symbol(**m).name == name) {
                return Some((m, ty));
            }
            iface
                .embeddeds
                .iter()
                .find_map(|&embedded| named_method(db, embedded, name, visited))
        }
        Type::Struct(st) => {
            if let Some(&m) = named.methods.iter().find(|m| db.symbol(**m).name == name) {
                return Some((m, ty));
            }
            st.fields
                .iter()
                .map(|&f| db.symbol(f))
                .filter(|field| field.is_embedded_field())
                .find_map(|field| named_method(db, field.ty, name, visited))
        }
        _ => None,
    }
}
