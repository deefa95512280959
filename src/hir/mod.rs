//! Semantic model: arenas, symbols, types and the checker.
//!
//! ## Module Structure
//!
//! ```text
//! source    → Source Cache (parsed files, runtime stubs)
//! check     → type checker producing SemanticInfo
//!   ↓
//! summary   → position-free package summaries + shared store
//! lookup    → field / method lookup through embedding
//! display   → object and type strings
//!   ↓
//! db        → arenas: symbols, types, packages
//! symbols   → Symbol, classification
//! types     → Type, BasicKind
//! universe  → predeclared objects and package `unsafe`
//! info      → defs / uses / selections / implicits
//! ```
//!
//! Everything here is request scoped: one [`Db`] per session, dropped with
//! it. Only the [`SummaryStore`] outlives a session.

pub mod check;
mod db;
mod diagnostics;
pub mod display;
mod ids;
mod info;
pub mod lookup;
mod source;
pub mod summary;
mod symbols;
mod types;
mod universe;

pub use check::{CheckConfig, CheckOutput, ImportHost, check_package};
pub use db::{Db, Package, PackageOrigin};
pub use diagnostics::{Diagnostic, DiagnosticCollector, RelatedInfo, Severity, codes};
pub use ids::{PackageId, SymbolId, TypeId};
pub use info::{Selection, SelectionKind, SemanticInfo};
pub use source::{SourceCache, SourceFile, runtime_stub_names};
pub use summary::{PackageSummary, SummaryStore};
pub use symbols::{Builtin, ConstValue, ObjKind, Symbol, SymbolClass, classify, object_id};
pub use types::{BasicKind, Interface, Named, Signature, Struct, Type};
pub use universe::Universe;
