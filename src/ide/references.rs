//! Cross-Reference Finder.
//!
//! Collects every occurrence of a symbol in the semantic tables of one
//! checked package and maps them to location records, in position order.

use crate::base::Span;
use crate::hir::{Db, ObjKind, PackageId, SemanticInfo, SourceCache, SymbolClass, SymbolId, object_id};
use crate::syntax::ast::is_exported;

/// One reported location.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationRecord {
    /// Name of the package owning the symbol; empty for universe objects.
    pub package: String,
    pub name: String,
    /// Kind label, e.g. `func` or `field`.
    pub kind: String,
    pub file: String,
    /// 0-based.
    pub line: u32,
    /// 0-based, in bytes.
    pub column: u32,
}

/// Spans of every occurrence of `symbol`, strictly increasing.
///
/// Package names are matched by object id over uses, since every file
/// declares its own package name object. Everything else is matched by
/// identity over definitions and uses.
pub fn find_usages(db: &Db, info: &SemanticInfo, symbol: SymbolId, kind: ObjKind) -> Vec<Span> {
    let mut spans: Vec<Span> = if kind == ObjKind::Package {
        let id = object_id(db, symbol);
        info.uses
            .iter()
            .filter(|(_, used)| is_package_name(db, **used) && object_id(db, **used) == id)
            .map(|(span, _)| *span)
            .collect()
    } else {
        info.defs
            .iter()
            .chain(info.uses.iter())
            .filter(|(_, found)| **found == symbol)
            .map(|(span, _)| *span)
            .collect()
    };
    spans.sort();
    spans.dedup();
    spans
}

/// Uses of the package name an import declares in `root`.
pub fn import_usages(db: &Db, info: &SemanticInfo, root: PackageId, local_name: &str) -> Vec<Span> {
    let id = if is_exported(local_name) {
        local_name.to_string()
    } else {
        format!("{}.{}", db.package(root).path, local_name)
    };
    let mut spans: Vec<Span> = info
        .uses
        .iter()
        .filter(|(_, used)| is_package_name(db, **used) && object_id(db, **used) == id)
        .map(|(span, _)| *span)
        .collect();
    spans.sort();
    spans
}

fn is_package_name(db: &Db, id: SymbolId) -> bool {
    matches!(db.symbol(id).class, SymbolClass::PkgName { .. })
}

/// Name of the package owning `symbol`, or empty.
pub fn package_name(db: &Db, symbol: SymbolId) -> String {
    db.symbol(symbol)
        .package
        .map(|pkg| db.package(pkg).name.to_string())
        .unwrap_or_default()
}

/// Map a span to a record. `None` if the span's file is not in the cache.
pub fn location(sources: &SourceCache, span: Span, package: &str, name: &str, kind: &str) -> Option<LocationRecord> {
    let file = sources.file(span.file)?;
    let line_col = file.line_col(span.start());
    Some(LocationRecord {
        package: package.to_string(),
        name: name.to_string(),
        kind: kind.to_string(),
        file: file.path().display().to_string(),
        line: line_col.line,
        column: line_col.col,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{FileId, TextRange};
    use crate::hir::{Db, Symbol};

    fn span(file: u32, start: u32, end: u32) -> Span {
        Span::new(FileId::new(file), TextRange::new(start.into(), end.into()))
    }

    fn var(db: &mut Db, name: &str) -> SymbolId {
        let ty = db.invalid();
        db.alloc_symbol(Symbol {
            name: name.into(),
            class: SymbolClass::Var {
                field: false,
                embedded: false,
            },
            package: None,
            pos: None,
            ty,
            package_level: false,
        })
    }

    #[test]
    fn test_usages_sorted_across_tables() {
        let mut db = Db::new();
        let x = var(&mut db, "x");
        let y = var(&mut db, "y");
        let mut info = SemanticInfo::default();
        info.record_use(span(1, 4, 5), x);
        info.record_def(span(0, 10, 11), x);
        info.record_use(span(0, 2, 3), y);
        info.record_use(span(0, 20, 21), x);

        let spans = find_usages(&db, &info, x, ObjKind::Var);
        assert_eq!(spans, vec![span(0, 10, 11), span(0, 20, 21), span(1, 4, 5)]);
        assert!(spans.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_same_name_different_symbol_excluded() {
        let mut db = Db::new();
        let outer = var(&mut db, "v");
        let inner = var(&mut db, "v");
        let mut info = SemanticInfo::default();
        info.record_def(span(0, 0, 1), outer);
        info.record_def(span(0, 8, 9), inner);
        info.record_use(span(0, 12, 13), inner);

        assert_eq!(find_usages(&db, &info, outer, ObjKind::Var), vec![span(0, 0, 1)]);
    }
}
