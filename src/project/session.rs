//! The Dependency Resolver.
//!
//! A [`Session`] owns the arenas and the Source Cache of one request and
//! turns import paths into checked packages. Every path is resolved at
//! most once: the memo table records `InProgress` while a package is being
//! checked (re-entering it is an import cycle) and the final outcome
//! afterwards, failures included.
//!
//! Nested imports go through [`ImportHost::import`]. Known packages are
//! served from the shared [`SummaryStore`] when possible; everything else
//! is loaded from source in fast mode (no function bodies, no tests).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use text_size::TextSize;

use super::context::BuildContext;
use super::locate::{self, LocatedPackage, clean};
use crate::base::FilePos;
use crate::error::{ResolveError, SourceError};
use crate::hir::summary::{self, SummaryStore};
use crate::hir::{
    CheckConfig, Db, ImportHost, Package, PackageId, PackageOrigin, SemanticInfo, SourceCache,
    SourceFile, check_package, runtime_stub_names,
};

/// How a package is loaded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolveOptions {
    pub ignore_function_bodies: bool,
    /// Let nested imports of known packages use summaries.
    pub allow_fast_mode_for_known_packages: bool,
    pub include_test_files: bool,
}

impl ResolveOptions {
    /// Options for the packages of a request: bodies and tests included.
    pub const ROOT: ResolveOptions = ResolveOptions {
        ignore_function_bodies: false,
        allow_fast_mode_for_known_packages: true,
        include_test_files: true,
    };

    /// Options for nested imports.
    pub const IMPORT: ResolveOptions = ResolveOptions {
        ignore_function_bodies: true,
        allow_fast_mode_for_known_packages: true,
        include_test_files: false,
    };

    /// Options for re-resolving a summary-loaded package from source.
    pub const PROMOTE: ResolveOptions = ResolveOptions {
        ignore_function_bodies: true,
        allow_fast_mode_for_known_packages: true,
        include_test_files: true,
    };
}

/// Memo entry of an import path.
#[derive(Clone, Debug)]
pub enum PackageStatus {
    InProgress,
    Resolved(PackageId),
    Failed(ResolveError),
}

/// The file and offset a request is about.
#[derive(Clone, Debug)]
pub struct Cursor {
    pub file_name: String,
    /// Directory the client reported for the file. The file is bound in
    /// whichever root package lists a file of this name.
    pub dir: PathBuf,
    /// Unsaved text of the file; read from disk when `None`.
    pub text: Option<Arc<str>>,
    pub offset: usize,
}

/// A cursor bound to a parsed file.
#[derive(Clone, Debug)]
pub struct BoundCursor {
    pub file: Arc<SourceFile>,
    pub pos: FilePos,
    /// Directory of the package the file was found in.
    pub dir: PathBuf,
    /// Package whose semantic tables cover the file.
    pub package: Option<PackageId>,
}

/// One request's worth of packages.
pub struct Session {
    ctx: Arc<BuildContext>,
    db: Db,
    sources: SourceCache,
    summaries: SummaryStore,
    memo: IndexMap<String, PackageStatus>,
    /// Packages materialised from summaries, by import path.
    summary_imported: FxHashMap<String, PackageId>,
    /// How often each package was checked from source.
    checks: FxHashMap<String, usize>,
    cursor: Option<Cursor>,
    bound: Option<BoundCursor>,
    /// Fast-mode flag of each package being checked, innermost last.
    fast_allowed: Vec<bool>,
}

impl Session {
    pub fn new(ctx: Arc<BuildContext>, summaries: SummaryStore) -> Self {
        let db = Db::new();
        let mut memo = IndexMap::new();
        memo.insert(
            "unsafe".to_string(),
            PackageStatus::Resolved(db.universe().unsafe_package()),
        );
        let sources = SourceCache::new(ctx.goos.clone(), ctx.goarch.clone());
        Self {
            ctx,
            db,
            sources,
            summaries,
            memo,
            summary_imported: FxHashMap::default(),
            checks: FxHashMap::default(),
            cursor: None,
            bound: None,
            fast_allowed: Vec::new(),
        }
    }

    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn sources(&self) -> &SourceCache {
        &self.sources
    }

    pub fn summaries(&self) -> &SummaryStore {
        &self.summaries
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    /// The cursor, once a root package contained (or adopted) its file.
    pub fn bound_cursor(&self) -> Option<&BoundCursor> {
        self.bound.as_ref()
    }

    pub fn status(&self, path: &str) -> Option<&PackageStatus> {
        self.memo.get(path)
    }

    /// How many times the package checked under `name` was checked.
    pub fn check_count(&self, name: &str) -> usize {
        self.checks.get(name).copied().unwrap_or(0)
    }

    /// Total number of source checks in this session.
    pub fn total_checks(&self) -> usize {
        self.checks.values().sum()
    }

    // ========================================================================
    // RESOLUTION
    // ========================================================================

    /// Load a package of the request, binding the cursor into it.
    pub fn load_root(&mut self, path: &str) -> Result<PackageId, ResolveError> {
        self.resolve_with(Path::new(""), path, ResolveOptions::ROOT, true)
    }

    /// Resolve `import_path` as imported from `parent_dir`.
    pub fn resolve(
        &mut self,
        parent_dir: &Path,
        import_path: &str,
        options: ResolveOptions,
    ) -> Result<PackageId, ResolveError> {
        self.resolve_with(parent_dir, import_path, options, false)
    }

    fn resolve_with(
        &mut self,
        parent_dir: &Path,
        import_path: &str,
        options: ResolveOptions,
        root: bool,
    ) -> Result<PackageId, ResolveError> {
        let name = normalize(parent_dir, import_path);
        match self.memo.get(&name) {
            Some(PackageStatus::InProgress) => {
                return Err(ResolveError::Cycle { path: name });
            }
            Some(PackageStatus::Resolved(id)) => return Ok(*id),
            Some(PackageStatus::Failed(err)) => return Err(err.clone()),
            None => {}
        }

        self.memo.insert(name.clone(), PackageStatus::InProgress);
        let located = match locate::locate(&self.ctx, &name) {
            Ok(located) => located,
            Err(err) => {
                tracing::debug!(path = %name, error = %err, "package not located");
                self.memo.insert(name, PackageStatus::Failed(err.clone()));
                return Err(err);
            }
        };

        // A directory inside a root is the same package as its import path.
        let alias = (located.import_path != name && located.import_path != ".")
            .then(|| located.import_path.clone());
        if let Some(alias) = &alias {
            match self.memo.get(alias) {
                Some(PackageStatus::InProgress) => {
                    let err = ResolveError::Cycle { path: alias.clone() };
                    self.memo.insert(name, PackageStatus::Failed(err.clone()));
                    return Err(err);
                }
                Some(PackageStatus::Resolved(id)) => {
                    let id = *id;
                    self.memo.insert(name, PackageStatus::Resolved(id));
                    return Ok(id);
                }
                _ => {
                    self.memo.insert(alias.clone(), PackageStatus::InProgress);
                }
            }
        }

        let id = self.load(&name, &located, options, root);
        self.memo.insert(name.clone(), PackageStatus::Resolved(id));
        if let Some(alias) = alias {
            self.memo.insert(alias, PackageStatus::Resolved(id));
        }

        if options.include_test_files && !located.xtest_go_files.is_empty() {
            self.load_xtest(id, &located, options, root);
        }
        if options.ignore_function_bodies && self.ctx.is_known(&name) {
            self.export_summary(&name, id);
        }
        Ok(id)
    }

    /// Parse and check the package files of `located`.
    fn load(&mut self, name: &str, located: &LocatedPackage, options: ResolveOptions, root: bool) -> PackageId {
        let mut names = located.go_files.clone();
        if options.include_test_files {
            names.extend(located.test_go_files.iter().cloned());
        }
        if name == "runtime" {
            for stub in runtime_stub_names(&self.ctx.goos, &self.ctx.goarch) {
                if !names.contains(&stub) {
                    names.push(stub);
                }
            }
        }

        let mut files = self.parse_files(&located.dir, &names, root);
        let in_xtest = options.include_test_files
            && self
                .cursor
                .as_ref()
                .is_some_and(|cursor| located.xtest_go_files.contains(&cursor.file_name));
        if root && self.bound.is_none() && !in_xtest {
            if let Some(file) = self.adopt_cursor_file(&located.dir) {
                files.push(file);
            }
        }

        let check_name = located.check_name().to_string();
        let mut package = Package::new(check_name.clone(), located.name.as_str(), PackageOrigin::Source);
        package.dir = Some(located.dir.clone());
        package.files = files.iter().map(|f| f.id()).collect();
        let id = self.db.alloc_package(package);
        self.claim_cursor(&files, id);
        let info = self.check(id, &check_name, &located.dir, &files, SemanticInfo::default(), options);
        self.db.package_mut(id).info = info;
        id
    }

    /// Check the external tests of `pkg` as `<name>_test`, recording into
    /// the semantic tables of `pkg`.
    fn load_xtest(&mut self, pkg: PackageId, located: &LocatedPackage, options: ResolveOptions, root: bool) {
        let files = self.parse_files(&located.dir, &located.xtest_go_files, root);
        let check_name = format!("{}_test", located.check_name());
        let mut package = Package::new(
            check_name.clone(),
            format!("{}_test", located.name),
            PackageOrigin::Source,
        );
        package.dir = Some(located.dir.clone());
        package.files = files.iter().map(|f| f.id()).collect();
        let xpkg = self.db.alloc_package(package);
        self.claim_cursor(&files, pkg);
        self.memo
            .insert(check_name.clone(), PackageStatus::InProgress);

        let info = std::mem::take(&mut self.db.package_mut(pkg).info);
        let info = self.check(xpkg, &check_name, &located.dir, &files, info, options);
        self.db.package_mut(pkg).info = info;
        self.memo.insert(check_name, PackageStatus::Resolved(xpkg));
    }

    /// Run the checker and store its diagnostics and imports on `pkg`.
    /// The semantic tables are returned to the caller.
    fn check(
        &mut self,
        pkg: PackageId,
        check_name: &str,
        dir: &Path,
        files: &[Arc<SourceFile>],
        info: SemanticInfo,
        options: ResolveOptions,
    ) -> SemanticInfo {
        let config = CheckConfig {
            ignore_function_bodies: options.ignore_function_bodies,
            fake_import_c: true,
        };
        self.fast_allowed
            .push(options.allow_fast_mode_for_known_packages);
        let output = check_package(self, pkg, dir, files, info, config);
        self.fast_allowed.pop();
        *self.checks.entry(check_name.to_string()).or_default() += 1;
        tracing::debug!(
            package = %check_name,
            files = files.len(),
            diagnostics = output.diagnostics.len(),
            fast = options.ignore_function_bodies,
            "checked package"
        );

        let package = self.db.package_mut(pkg);
        package.diagnostics = output.diagnostics;
        package.imports = output.imports;
        package.import_errors = output.import_errors;
        output.info
    }

    /// Parse `names` in `dir`, substituting the cursor's text and binding
    /// the cursor when its file is among them.
    fn parse_files(&mut self, dir: &Path, names: &[String], root: bool) -> Vec<Arc<SourceFile>> {
        let cursor = if root { self.cursor.clone() } else { None };
        let override_file = cursor
            .as_ref()
            .filter(|cursor| names.contains(&cursor.file_name))
            .and_then(|cursor| Some((cursor.file_name.as_str(), cursor.text.as_deref()?)));

        let mut files = Vec::with_capacity(names.len());
        for (name, outcome) in self.sources.parse_all(dir, names, override_file) {
            let Some(file) = usable(outcome) else {
                continue;
            };
            if let Some(cursor) = &cursor {
                if cursor.file_name == name && self.bound.is_none() {
                    self.bind(cursor, &file, dir);
                }
            }
            files.push(file);
        }
        files
    }

    /// Parse the cursor's file in `dir` although it was not selected, so
    /// that the request can still look at it.
    fn adopt_cursor_file(&mut self, dir: &Path) -> Option<Arc<SourceFile>> {
        let cursor = self.cursor.clone()?;
        let outcome = self
            .sources
            .parse(dir, &cursor.file_name, cursor.text.as_deref());
        let file = usable(outcome)?;
        tracing::debug!(file = %cursor.file_name, dir = %dir.display(), "adopted cursor file");
        self.bind(&cursor, &file, dir);
        Some(file)
    }

    /// Record `pkg` as the package of the bound cursor if `files` hold its
    /// file.
    fn claim_cursor(&mut self, files: &[Arc<SourceFile>], pkg: PackageId) {
        if let Some(bound) = &mut self.bound {
            if bound.package.is_none() && files.iter().any(|f| f.id() == bound.file.id()) {
                bound.package = Some(pkg);
            }
        }
    }

    fn bind(&mut self, cursor: &Cursor, file: &Arc<SourceFile>, dir: &Path) {
        let offset = TextSize::try_from(cursor.offset).unwrap_or(TextSize::from(u32::MAX));
        self.bound = Some(BoundCursor {
            file: file.clone(),
            pos: FilePos::new(file.id(), offset),
            dir: dir.to_owned(),
            package: None,
        });
    }

    // ========================================================================
    // SUMMARIES
    // ========================================================================

    /// Materialise the stored summary of `path`, once per session.
    fn import_from_summary(&mut self, path: &str) -> Option<PackageId> {
        if let Some(&id) = self.summary_imported.get(path) {
            return Some(id);
        }
        let stored = self.summaries.get(path)?;
        let id = summary::import_summary(&mut self.db, &stored);
        self.summary_imported.insert(path.to_string(), id);
        Some(id)
    }

    fn export_summary(&self, path: &str, pkg: PackageId) {
        if self.summaries.contains(path) || self.db.package(pkg).origin != PackageOrigin::Source {
            return;
        }
        let exported = summary::export(&self.db, pkg);
        tracing::debug!(path, objects = exported.objects.len(), "exported summary");
        self.summaries.insert(exported);
    }
}

impl ImportHost for Session {
    fn db(&self) -> &Db {
        &self.db
    }

    fn db_mut(&mut self) -> &mut Db {
        &mut self.db
    }

    fn import(&mut self, from_dir: &Path, path: &str) -> Result<PackageId, ResolveError> {
        let fast = self.fast_allowed.last().copied().unwrap_or(true);
        if fast {
            if let Some(&id) = self.summary_imported.get(path) {
                return Ok(id);
            }
        }
        if let Some(PackageStatus::Resolved(id)) = self.memo.get(path) {
            return Ok(*id);
        }
        if fast && self.ctx.is_known(path) {
            if let Some(id) = self.import_from_summary(path) {
                return Ok(id);
            }
        }
        self.resolve(from_dir, path, ResolveOptions::IMPORT)
    }
}

/// A tree from a parse outcome; degraded parses are used as they are.
fn usable(outcome: Result<Arc<SourceFile>, SourceError>) -> Option<Arc<SourceFile>> {
    match outcome {
        Ok(file) => Some(file),
        Err(SourceError::Syntax { file }) => Some(file),
        Err(err) => {
            tracing::warn!(error = %err, "skipping unreadable file");
            None
        }
    }
}

/// Resolve `./` and `../` imports against the importing directory.
fn normalize(parent_dir: &Path, import_path: &str) -> String {
    if import_path.starts_with('.') && !parent_dir.as_os_str().is_empty() {
        clean(&parent_dir.join(import_path)).display().to_string()
    } else {
        import_path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_relative_imports() {
        assert_eq!(normalize(Path::new("/src/app"), "./util"), "/src/app/util");
        assert_eq!(normalize(Path::new("/src/app"), "../lib"), "/src/lib");
        assert_eq!(normalize(Path::new(""), "./util"), "./util");
        assert_eq!(normalize(Path::new("/src/app"), "fmt"), "fmt");
    }

    #[test]
    fn test_unsafe_is_preseeded() {
        let session = Session::new(Arc::new(BuildContext::default()), SummaryStore::new());
        let unsafe_pkg = session.db().universe().unsafe_package();
        assert!(matches!(
            session.status("unsafe"),
            Some(PackageStatus::Resolved(id)) if *id == unsafe_pkg
        ));
    }

    #[test]
    fn test_missing_package_is_memoised() {
        let ctx = BuildContext::new("/nonexistent/goroot", "linux", "amd64");
        let mut session = Session::new(Arc::new(ctx), SummaryStore::new());
        let err = session
            .resolve(Path::new(""), "example.com/missing", ResolveOptions::IMPORT)
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(
            session.status("example.com/missing"),
            Some(PackageStatus::Failed(_))
        ));
        assert_eq!(session.total_checks(), 0);
    }
}
