//! The Source Cache: parsed files of one session.
//!
//! Files are memoised by absolute path and handed out as shared
//! [`SourceFile`]s. The first caller wins: a later request for the same
//! path gets the cached outcome, even if it passes different text.
//! `FileId`s are assigned in parse order.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use rayon::prelude::*;

use crate::base::{FileId, LineCol, LineIndex, Span, TextRange, TextSize};
use crate::error::SourceError;
use crate::syntax::{self, SyntaxError, ast};

/// A parsed file. Immutable once created.
#[derive(Debug)]
pub struct SourceFile {
    id: FileId,
    path: PathBuf,
    text: Arc<str>,
    ast: ast::File,
    line_index: LineIndex,
    errors: Vec<SyntaxError>,
}

impl SourceFile {
    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }

    /// File name without directory.
    pub fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("")
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn ast(&self) -> &ast::File {
        &self.ast
    }

    /// Syntax errors of a degraded parse; empty for a clean file.
    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn line_col(&self, offset: TextSize) -> LineCol {
        self.line_index.line_col(offset)
    }

    pub fn span(&self, range: TextRange) -> Span {
        Span::new(self.id, range)
    }
}

/// Text plus tree, produced off-thread before a `FileId` is assigned.
struct Parsed {
    text: Arc<str>,
    parse: syntax::Parse,
}

type Outcome = Result<Arc<SourceFile>, SourceError>;

/// Parses files, memoised by absolute path.
#[derive(Debug)]
pub struct SourceCache {
    inner: RwLock<SourceCacheInner>,
    goos: String,
    goarch: String,
}

#[derive(Debug, Default)]
struct SourceCacheInner {
    /// Path → outcome of the first parse
    by_path: IndexMap<PathBuf, Outcome>,
    /// FileId → file
    files: Vec<Arc<SourceFile>>,
}

impl SourceCache {
    /// `goos`/`goarch` name the runtime stub files this cache synthesises.
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        Self {
            inner: RwLock::new(SourceCacheInner::default()),
            goos: goos.into(),
            goarch: goarch.into(),
        }
    }

    /// Parse `dir/name`, or `override_text` in its place.
    pub fn parse(&self, dir: &Path, name: &str, override_text: Option<&str>) -> Outcome {
        let path = dir.join(name);
        // Fast path: read lock
        if let Some(outcome) = self.inner.read().by_path.get(&path) {
            return outcome.clone();
        }
        let parsed = self.read_and_parse(&path, name, override_text.map(Arc::from));
        self.insert(path, parsed)
    }

    /// Parse the files of one directory, returning outcomes in `names`
    /// order. Uncached files are read and parsed in parallel; `override_file`
    /// supplies the text of one of them.
    pub fn parse_all(
        &self,
        dir: &Path,
        names: &[String],
        override_file: Option<(&str, &str)>,
    ) -> Vec<(String, Outcome)> {
        let pending: Vec<&String> = {
            let inner = self.inner.read();
            names
                .iter()
                .filter(|name| !inner.by_path.contains_key(&dir.join(name.as_str())))
                .collect()
        };
        let mut parsed: IndexMap<&str, Result<Parsed, SourceError>> = pending
            .par_iter()
            .map(|name| {
                let text = override_file
                    .filter(|(file, _)| *file == name.as_str())
                    .map(|(_, text)| Arc::from(text));
                (
                    name.as_str(),
                    self.read_and_parse(&dir.join(name.as_str()), name, text),
                )
            })
            .collect::<Vec<_>>()
            .into_iter()
            .collect();

        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                let outcome = match parsed.swap_remove(name.as_str()) {
                    Some(result) => self.insert(path, result),
                    None => self.cached(&path).unwrap_or_else(|| {
                        Err(SourceError::Io {
                            path,
                            message: "file vanished from cache".into(),
                        })
                    }),
                };
                (name.clone(), outcome)
            })
            .collect()
    }

    /// A previously parsed file.
    pub fn file(&self, id: FileId) -> Option<Arc<SourceFile>> {
        self.inner.read().files.get(id.index()).cloned()
    }

    /// The cached outcome for an absolute path.
    pub fn cached(&self, path: &Path) -> Option<Outcome> {
        self.inner.read().by_path.get(path).cloned()
    }

    /// Number of files that produced a tree.
    pub fn len(&self) -> usize {
        self.inner.read().files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_and_parse(
        &self,
        path: &Path,
        name: &str,
        override_text: Option<Arc<str>>,
    ) -> Result<Parsed, SourceError> {
        let mut encoding_errors = Vec::new();
        let text = match override_text {
            Some(text) => text,
            None => match fs::read(path) {
                Ok(bytes) => {
                    let (text, errors) = decode_source(&bytes);
                    encoding_errors = errors;
                    Arc::from(text)
                }
                Err(err) => match self.runtime_stub(name) {
                    Some(stub) => Arc::from(stub),
                    None => {
                        return Err(SourceError::Io {
                            path: path.to_owned(),
                            message: err.to_string(),
                        });
                    }
                },
            },
        };
        let mut parse = syntax::parse(&text);
        if !encoding_errors.is_empty() {
            parse.errors.extend(encoding_errors);
            parse.errors.sort_by_key(|err| err.range.start());
        }
        Ok(Parsed { text, parse })
    }

    fn insert(&self, path: PathBuf, parsed: Result<Parsed, SourceError>) -> Outcome {
        let mut inner = self.inner.write();
        // Double-check: another caller may have won the race.
        if let Some(outcome) = inner.by_path.get(&path) {
            return outcome.clone();
        }
        let outcome = parsed.and_then(|Parsed { text, parse }| {
            let file = Arc::new(SourceFile {
                id: FileId::new(inner.files.len() as u32),
                line_index: LineIndex::new(&text),
                path: path.clone(),
                text,
                ast: parse.file,
                errors: parse.errors,
            });
            inner.files.push(file.clone());
            if file.errors.is_empty() {
                Ok(file)
            } else {
                tracing::warn!(
                    path = %file.path.display(),
                    errors = file.errors.len(),
                    "degraded parse"
                );
                Err(SourceError::Syntax { file })
            }
        });
        inner.by_path.insert(path, outcome.clone());
        outcome
    }

    /// Synthesised platform files of package `runtime`.
    fn runtime_stub(&self, name: &str) -> Option<String> {
        if name == format!("zgoos_{}.go", self.goos) {
            Some(format!(
                "package runtime\n\nconst theGoos = `{}`\n",
                self.goos
            ))
        } else if name == format!("zgoarch_{}.go", self.goarch) {
            Some(format!(
                "package runtime\n\nconst theGoarch = `{}`\n",
                self.goarch
            ))
        } else {
            None
        }
    }
}

/// Decode file bytes without moving any offset. Each byte of an invalid
/// UTF-8 sequence becomes a space and the sequence is reported as an error.
fn decode_source(bytes: &[u8]) -> (String, Vec<SyntaxError>) {
    let mut text = String::with_capacity(bytes.len());
    let mut errors = Vec::new();
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
        let invalid = chunk.invalid();
        if invalid.is_empty() {
            continue;
        }
        let start = TextSize::of(text.as_str());
        text.extend(std::iter::repeat_n(' ', invalid.len()));
        let end = TextSize::of(text.as_str());
        errors.push(SyntaxError::new("invalid UTF-8 encoding", TextRange::new(start, end)));
    }
    (text, errors)
}

/// Names of the runtime stub files for a platform.
pub fn runtime_stub_names(goos: &str, goarch: &str) -> [String; 2] {
    [format!("zgoos_{goos}.go"), format!("zgoarch_{goarch}.go")]
}
