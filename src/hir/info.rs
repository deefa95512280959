//! Semantic tables recorded while checking a package.
//!
//! Keys are identifier spans. Tables preserve insertion order, which is the
//! order the checker visited the identifiers in.

use indexmap::IndexMap;

use super::ids::{SymbolId, TypeId};
use crate::base::{FilePos, Span};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SelectionKind {
    /// `x.f` where `f` is a field.
    FieldVal,
    /// `x.m` where `m` is a method.
    MethodVal,
    /// `T.m`, a method expression.
    MethodExpr,
}

/// A resolved member access `x.sel`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub kind: SelectionKind,
    /// Type of `x`.
    pub recv: TypeId,
    /// The selected field or method.
    pub obj: SymbolId,
    /// Field path through embedded fields; the last entry selects `obj`.
    pub index: Vec<usize>,
    /// The path crossed a pointer indirection.
    pub indirect: bool,
}

/// Definition, use and selection tables of a checked package.
#[derive(Clone, Debug, Default)]
pub struct SemanticInfo {
    /// Identifier → symbol it declares.
    pub defs: IndexMap<Span, SymbolId>,
    /// Identifier → symbol it refers to.
    pub uses: IndexMap<Span, SymbolId>,
    /// Selector identifier → selection.
    pub selections: IndexMap<Span, Selection>,
    /// Nodes that declare a symbol without an identifier of their own:
    /// unaliased imports and type switch clauses.
    pub implicits: IndexMap<Span, SymbolId>,
}

impl SemanticInfo {
    pub fn record_def(&mut self, span: Span, symbol: SymbolId) {
        self.defs.insert(span, symbol);
    }

    pub fn record_use(&mut self, span: Span, symbol: SymbolId) {
        self.uses.insert(span, symbol);
    }

    /// Record a selection; the selector identifier also becomes a use.
    pub fn record_selection(&mut self, span: Span, selection: Selection) {
        self.uses.insert(span, selection.obj);
        self.selections.insert(span, selection);
    }

    pub fn record_implicit(&mut self, span: Span, symbol: SymbolId) {
        self.implicits.insert(span, symbol);
    }

    /// The selection whose selector identifier contains `pos`.
    pub fn selection_at(&self, pos: FilePos) -> Option<(Span, &Selection)> {
        self.selections
            .iter()
            .find(|(span, _)| span.contains_pos(pos))
            .map(|(span, sel)| (*span, sel))
    }

    pub fn def_at(&self, pos: FilePos) -> Option<(Span, SymbolId)> {
        find_at(&self.defs, pos)
    }

    pub fn use_at(&self, pos: FilePos) -> Option<(Span, SymbolId)> {
        find_at(&self.uses, pos)
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty() && self.uses.is_empty()
    }
}

fn find_at(table: &IndexMap<Span, SymbolId>, pos: FilePos) -> Option<(Span, SymbolId)> {
    table
        .iter()
        .find(|(span, _)| span.contains_pos(pos))
        .map(|(span, id)| (*span, *id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{FileId, TextRange};

    fn span(start: u32, end: u32) -> Span {
        Span::new(FileId::new(0), TextRange::new(start.into(), end.into()))
    }

    #[test]
    fn test_selection_is_also_a_use() {
        let mut info = SemanticInfo::default();
        let sel = Selection {
            kind: SelectionKind::FieldVal,
            recv: TypeId::new(1),
            obj: SymbolId::new(9),
            index: vec![0],
            indirect: false,
        };
        info.record_selection(span(10, 13), sel);
        assert_eq!(info.uses.get(&span(10, 13)), Some(&SymbolId::new(9)));
    }

    #[test]
    fn test_lookup_at_is_end_inclusive() {
        let mut info = SemanticInfo::default();
        info.record_def(span(4, 7), SymbolId::new(2));
        let at = |offset: u32| FilePos::new(FileId::new(0), offset.into());
        assert_eq!(info.def_at(at(7)).map(|(_, id)| id), Some(SymbolId::new(2)));
        assert!(info.def_at(at(8)).is_none());
        assert!(info.use_at(at(5)).is_none());
    }
}
