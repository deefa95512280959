//! IDE features: documentation lookup, usages, hover text and calltips.
//!
//! Everything here sits on top of a [`Session`](crate::project::Session):
//! the session loads and checks packages, this module interprets the
//! semantic tables for a cursor.
//!
//! ## Usage
//!
//! The recommended entry point is [`AnalysisHost`]:
//!
//! ```ignore
//! use gosense::ide::{AnalysisHost, DocQuery};
//!
//! let host = AnalysisHost::new(ctx);
//! let docs = host.find_docs(&DocQuery { file_name: "main.go".into(), dir, offset, ..Default::default() })?;
//! ```

mod analysis;
mod calltip;
mod cursor;
mod hover;
mod references;

pub use analysis::{AnalysisHost, DocQuery, DocResponse};
pub use calltip::{Candidate, CandidateEngine, CompletionHost, NoCandidates, calltip_ident};
pub use cursor::{
    CursorTarget, ImportTarget, ResolvedSymbol, check_import, lookup_symbol, resolve_cursor,
    struct_owner,
};
pub use hover::{builtin_info, hover_text, simple_type};
pub use references::{LocationRecord, find_usages, import_usages, location, package_name};
