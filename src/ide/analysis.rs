//! AnalysisHost: shared state across requests.
//!
//! The host owns the build configuration, the summary store and the
//! completion host. Each [`AnalysisHost::find_docs`] call runs in its own
//! [`Session`]; sessions only share the summary store, so requests can be
//! served from several threads at once.
//!
//! ## Usage
//!
//! ```ignore
//! let host = AnalysisHost::new(BuildContext::new("/usr/local/go", "linux", "amd64"));
//! let response = host.find_docs(&DocQuery {
//!     file_name: "main.go".into(),
//!     dir: "/home/u/src/app".into(),
//!     offset: 120,
//!     ..DocQuery::default()
//! })?;
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::calltip::{Candidate, CandidateEngine, CompletionHost};
use super::cursor::{CursorTarget, ImportTarget, resolve_cursor};
use super::hover::hover_text;
use super::references::{LocationRecord, find_usages, import_usages, location, package_name};
use crate::error::AnalysisError;
use crate::hir::{PackageId, SummaryStore};
use crate::project::{BuildContext, Cursor, ImportListing, Session, Versioned, import_paths};

/// One documentation request.
#[derive(Clone, Debug)]
pub struct DocQuery {
    /// Root packages: `.` for the working directory, directories or import
    /// paths. Empty means the directory of the file.
    pub packages: Vec<String>,
    pub file_name: String,
    pub dir: PathBuf,
    /// Unsaved text of the file.
    pub text: Option<String>,
    /// Byte offset of the cursor.
    pub offset: usize,
    pub want_definition: bool,
    pub want_usages: bool,
    pub want_hover_info: bool,
}

impl Default for DocQuery {
    fn default() -> Self {
        Self {
            packages: Vec::new(),
            file_name: String::new(),
            dir: PathBuf::new(),
            text: None,
            offset: 0,
            want_definition: true,
            want_usages: true,
            want_hover_info: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocResponse {
    pub definition: Option<LocationRecord>,
    /// Definitions and uses, in position order.
    pub usages: Vec<LocationRecord>,
    pub hover: Option<String>,
    /// Set when the cursor is on an import declaration.
    pub import: Option<ImportTarget>,
}

impl DocResponse {
    pub fn is_empty(&self) -> bool {
        self.definition.is_none() && self.usages.is_empty() && self.hover.is_none()
    }
}

/// Owns the configuration and the caches shared between requests.
#[derive(Debug)]
pub struct AnalysisHost {
    context: Versioned<BuildContext>,
    summaries: SummaryStore,
    completion: CompletionHost,
}

impl AnalysisHost {
    pub fn new(ctx: BuildContext) -> Self {
        let summaries = summary_store(&ctx);
        Self {
            context: Versioned::new(ctx),
            summaries,
            completion: CompletionHost::default(),
        }
    }

    /// Use `factory` to build the candidate engine.
    pub fn with_engine(
        mut self,
        factory: impl Fn(&BuildContext) -> Box<dyn CandidateEngine> + Send + Sync + 'static,
    ) -> Self {
        self.completion = CompletionHost::new(factory);
        self
    }

    pub fn context(&self) -> &BuildContext {
        self.context.get()
    }

    pub fn generation(&self) -> u64 {
        self.context.generation()
    }

    pub fn summaries(&self) -> &SummaryStore {
        &self.summaries
    }

    /// Replace the configuration. Returns whether it changed; a change
    /// drops every cached summary.
    pub fn set_context(&mut self, ctx: BuildContext) -> bool {
        if !self.context.set(ctx) {
            return false;
        }
        self.summaries = summary_store(self.context.get());
        true
    }

    /// A fresh session on the current configuration.
    pub fn session(&self) -> Session {
        Session::new(self.context.snapshot(), self.summaries.clone())
    }

    /// Definition, usages and hover text of whatever is under the cursor.
    pub fn find_docs(&self, query: &DocQuery) -> Result<DocResponse, AnalysisError> {
        let mut session = self.session().with_cursor(Cursor {
            file_name: query.file_name.clone(),
            dir: query.dir.clone(),
            text: query.text.as_deref().map(Arc::from),
            offset: query.offset,
        });

        let packages = if query.packages.is_empty() {
            vec![query.dir.display().to_string()]
        } else {
            query.packages.clone()
        };
        for package in packages {
            let path = root_path(&package)?;
            session
                .load_root(&path)
                .map_err(|source| AnalysisError::Root { package, source })?;
        }

        let Some(root) = session.bound_cursor().and_then(|bound| bound.package) else {
            tracing::debug!(file = %query.file_name, "cursor file not in any root package");
            return Ok(DocResponse::default());
        };

        match resolve_cursor(&mut session, root)? {
            Some(CursorTarget::Import(import)) => Ok(import_response(&session, root, import, query)),
            Some(CursorTarget::Symbol(target)) => {
                let db = session.db();
                let symbol = db.symbol(target.symbol);
                let package = package_name(db, target.symbol);
                let kind = target.kind.label();
                let mut response = DocResponse::default();
                if query.want_definition {
                    response.definition = target
                        .pos
                        .and_then(|pos| location(session.sources(), pos, &package, &symbol.name, kind));
                }
                if query.want_hover_info {
                    response.hover = Some(hover_text(db, &target));
                }
                if query.want_usages {
                    let info = &db.package(root).info;
                    response.usages = find_usages(db, info, target.symbol, target.kind)
                        .into_iter()
                        .filter_map(|span| location(session.sources(), span, &package, &symbol.name, kind))
                        .collect();
                }
                Ok(response)
            }
            None => Ok(DocResponse::default()),
        }
    }

    /// Imports of a file and every importable package path.
    pub fn import_paths(&self, file: Option<&Path>, src: Option<&str>) -> ImportListing {
        import_paths(self.context.get(), file, src)
    }

    pub fn complete(&self, src: &str, filename: &str, offset: usize) -> Vec<Candidate> {
        self.completion.complete(&self.context, src, filename, offset)
    }

    pub fn calltip(&self, src: &str, filename: &str, offset: usize) -> Vec<Candidate> {
        self.completion.calltip(&self.context, src, filename, offset)
    }
}

fn import_response(session: &Session, root: PackageId, import: ImportTarget, query: &DocQuery) -> DocResponse {
    let db = session.db();
    let root_name = db.package(root).name.to_string();
    let mut response = DocResponse::default();
    if query.want_definition {
        response.definition = location(session.sources(), import.span, &root_name, &import.local_name, "package");
    }
    if query.want_hover_info {
        response.hover = Some(import.info());
    }
    if query.want_usages {
        let info = &db.package(root).info;
        response.usages = import_usages(db, info, root, &import.local_name)
            .into_iter()
            .filter_map(|span| location(session.sources(), span, &root_name, &import.local_name, "package"))
            .collect();
    }
    response.import = Some(import);
    response
}

/// `.` is the working directory; anything else is passed through.
fn root_path(package: &str) -> Result<String, AnalysisError> {
    if package != "." {
        return Ok(package.to_string());
    }
    std::env::current_dir()
        .map(|dir| dir.display().to_string())
        .map_err(|err| AnalysisError::InvalidRequest(format!("working directory: {err}")))
}

/// Summaries are read from the first compiled package directory.
fn summary_store(ctx: &BuildContext) -> SummaryStore {
    ctx.pkg_dirs()
        .into_iter()
        .next()
        .map(SummaryStore::with_dir)
        .unwrap_or_default()
}
