//! # gosense
//!
//! Source intelligence for Go: definitions, usages and hover text for the
//! identifier under a cursor.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide      → AnalysisHost, cursor resolution, usages, hover, calltips
//!   ↓
//! project  → build configuration, package location, Dependency Resolver
//!   ↓
//! hir      → arenas, type checker, semantic tables, summaries, Source Cache
//!   ↓
//! syntax   → logos lexer + recovering parser
//!   ↓
//! base     → primitives (FileId, Span, LineIndex)
//! ```

/// Foundation types: FileId, Span, line/column conversion
pub mod base;

/// Crate error taxonomy
pub mod error;

/// Semantic model: symbols, types and the checker
pub mod hir;

/// IDE features: documentation, usages, hover, calltips
pub mod ide;

/// Build configuration and package resolution
pub mod project;

/// Lexer, AST and parser
pub mod syntax;

pub use base::{FileId, LineCol, LineIndex, Span, TextRange, TextSize};
pub use error::{AnalysisError, ClassificationError, ResolveError, SourceError};
pub use ide::{AnalysisHost, DocQuery, DocResponse, LocationRecord};
pub use project::{BuildContext, ResolveOptions, Session};
