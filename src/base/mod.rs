//! Foundation types for gosense.
//!
//! - [`FileId`] - handle of a parsed source file
//! - [`TextRange`], [`TextSize`] - offsets inside a file
//! - [`Span`], [`FilePos`] - session-wide positions (file + offset)
//! - [`LineCol`], [`LineIndex`] - line/column conversion
//!
//! This module has NO dependencies on other gosense modules.

mod file_id;
mod span;

pub use file_id::FileId;
pub use span::{FilePos, LineCol, LineIndex, Span, TextRange, TextSize};

pub use text_size;
