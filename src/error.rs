//! Error types.
//!
//! Only [`AnalysisError`] ends a request. Everything else is recorded and
//! the analysis continues with what it has.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::hir::SourceFile;

/// Failure to turn an import path into a checked package.
#[derive(Clone, Debug, Error)]
pub enum ResolveError {
    #[error("cannot find package {path:?} in any of: {}", display_dirs(.searched))]
    NotFound { path: String, searched: Vec<PathBuf> },

    #[error("no buildable Go source files in {}", .dir.display())]
    NoGoFiles { dir: PathBuf },

    #[error("cycle importing package {path:?}")]
    Cycle { path: String },

    #[error("reading {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NoGoFiles { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, err: &io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

fn display_dirs(dirs: &[PathBuf]) -> String {
    let dirs: Vec<String> = dirs.iter().map(|d| d.display().to_string()).collect();
    dirs.join(", ")
}

/// Failure to obtain a syntax tree from the Source Cache.
#[derive(Clone, Debug, Error)]
pub enum SourceError {
    #[error("reading {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },

    /// The file parsed with errors; the partial tree is still usable.
    #[error("{}: {} syntax error(s)", .file.path().display(), .file.errors().len())]
    Syntax { file: Arc<SourceFile> },
}

impl SourceError {
    /// The best-effort tree, if the file could be read at all.
    pub fn partial(&self) -> Option<&Arc<SourceFile>> {
        match self {
            Self::Syntax { file } => Some(file),
            Self::Io { .. } => None,
        }
    }
}

/// A symbol under the cursor that has no reportable kind.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("unknown symbol kind for {name:?}")]
    UnknownKind { name: String },
}

/// Session-level failure of one analysis request.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("loading root package {package:?}: {source}")]
    Root {
        package: String,
        #[source]
        source: ResolveError,
    },

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_names_path() {
        let err = ResolveError::Cycle {
            path: "example.com/a".into(),
        };
        assert_eq!(err.to_string(), "cycle importing package \"example.com/a\"");
    }

    #[test]
    fn test_not_found_lists_dirs() {
        let err = ResolveError::NotFound {
            path: "x/y".into(),
            searched: vec![PathBuf::from("/r/src/x/y"), PathBuf::from("/p/src/x/y")],
        };
        assert!(err.is_not_found());
        assert!(err.to_string().contains("/r/src/x/y, /p/src/x/y"));
    }
}
