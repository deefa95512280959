//! Package location and build-file selection.
//!
//! Maps an import path to a directory and splits the directory's Go files
//! into package files, in-package test files and external test files,
//! applying the usual file name and build constraint rules:
//!
//! - names starting with `_` or `.` are ignored;
//! - `_GOOS`, `_GOARCH` and `_GOOS_GOARCH` name suffixes restrict a file to
//!   a platform;
//! - a `//go:build` line (or, without one, `// +build` lines) in the file
//!   header must be satisfied;
//! - files importing `C` are dropped when cgo is disabled;
//! - files whose package clause disagrees with the package are dropped.

use std::fs;
use std::path::{Component, Path, PathBuf};

use super::context::{BuildContext, KNOWN_ARCH, KNOWN_OS};
use crate::error::ResolveError;
use crate::syntax;

/// A package directory and its buildable files, names relative to `dir`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocatedPackage {
    /// Import path, or `.` for a directory outside every root.
    pub import_path: String,
    pub dir: PathBuf,
    /// Package name from the package clauses.
    pub name: String,
    pub go_files: Vec<String>,
    /// `_test.go` files of the package itself.
    pub test_go_files: Vec<String>,
    /// `_test.go` files of package `<name>_test`.
    pub xtest_go_files: Vec<String>,
    /// Go files excluded by constraints or package name.
    pub ignored_files: Vec<String>,
}

impl LocatedPackage {
    /// Name the package is checked under: its import path, or its package
    /// name when it lies outside every root.
    pub fn check_name(&self) -> &str {
        if self.import_path == "." {
            &self.name
        } else {
            &self.import_path
        }
    }
}

/// Find the package for `path`.
///
/// Absolute paths name a directory directly; other paths are searched under
/// each source root in order.
pub fn locate(ctx: &BuildContext, path: &str) -> Result<LocatedPackage, ResolveError> {
    let as_path = Path::new(path);
    if as_path.is_absolute() {
        return locate_dir(ctx, as_path);
    }
    if path.starts_with('.') {
        let cwd = std::env::current_dir().map_err(|err| ResolveError::io(path, &err))?;
        return locate_dir(ctx, &clean(&cwd.join(as_path)));
    }

    let searched = ctx.src_dirs();
    for src in &searched {
        let dir = src.join(path);
        if dir.is_dir() {
            return scan_dir(ctx, path.to_string(), &dir);
        }
    }
    Err(ResolveError::NotFound {
        path: path.to_string(),
        searched,
    })
}

/// Import the package in `dir`, deriving its import path from the roots.
pub fn locate_dir(ctx: &BuildContext, dir: &Path) -> Result<LocatedPackage, ResolveError> {
    if !dir.is_dir() {
        return Err(ResolveError::NotFound {
            path: dir.display().to_string(),
            searched: Vec::new(),
        });
    }
    let import_path = ctx
        .src_dirs()
        .iter()
        .find_map(|src| {
            let rel = dir.strip_prefix(src).ok()?;
            let parts: Vec<&str> = rel
                .components()
                .filter_map(|c| match c {
                    Component::Normal(part) => part.to_str(),
                    _ => None,
                })
                .collect();
            (!parts.is_empty()).then(|| parts.join("/"))
        })
        .unwrap_or_else(|| ".".to_string());
    scan_dir(ctx, import_path, dir)
}

/// Lexically normalise `.` and `..` components.
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn scan_dir(ctx: &BuildContext, import_path: String, dir: &Path) -> Result<LocatedPackage, ResolveError> {
    let entries = fs::read_dir(dir).map_err(|err| ResolveError::io(dir, &err))?;
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|ty| ty.is_file()))
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| name.ends_with(".go"))
        .collect();
    names.sort();

    let mut located = LocatedPackage {
        import_path,
        dir: dir.to_owned(),
        ..LocatedPackage::default()
    };

    for name in names {
        if name.starts_with('_') || name.starts_with('.') || !good_os_arch_file(ctx, &name) {
            located.ignored_files.push(name);
            continue;
        }
        let path = dir.join(&name);
        let text = match fs::read(&path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(err) => return Err(ResolveError::io(path, &err)),
        };
        if !should_build(ctx, &text) {
            located.ignored_files.push(name);
            continue;
        }
        let header = syntax::parse_imports(&text);
        let Some(clause) = &header.file.package else {
            tracing::warn!(file = %path.display(), "missing package clause");
            located.ignored_files.push(name);
            continue;
        };
        if !ctx.cgo_enabled
            && header
                .file
                .imports
                .iter()
                .any(|spec| spec.path_value().as_deref() == Some("C"))
        {
            located.ignored_files.push(name);
            continue;
        }

        let is_test = name.ends_with("_test.go");
        let mut pkg = clause.name.as_str();
        let mut is_xtest = false;
        if is_test && pkg.ends_with("_test") && located.name != pkg {
            is_xtest = true;
            pkg = &pkg[..pkg.len() - "_test".len()];
        }
        if pkg == "documentation" {
            located.ignored_files.push(name);
            continue;
        }
        if located.name.is_empty() {
            located.name = pkg.to_string();
        } else if located.name != pkg {
            tracing::warn!(
                dir = %dir.display(),
                file = %name,
                expected = %located.name,
                found = %pkg,
                "package name mismatch"
            );
            located.ignored_files.push(name);
            continue;
        }

        if is_xtest {
            located.xtest_go_files.push(name);
        } else if is_test {
            located.test_go_files.push(name);
        } else {
            located.go_files.push(name);
        }
    }

    if located.go_files.is_empty() && located.test_go_files.is_empty() && located.xtest_go_files.is_empty() {
        return Err(ResolveError::NoGoFiles { dir: dir.to_owned() });
    }
    tracing::debug!(
        path = %located.import_path,
        dir = %dir.display(),
        files = located.go_files.len(),
        tests = located.test_go_files.len(),
        xtests = located.xtest_go_files.len(),
        "located package"
    );
    Ok(located)
}

// ============================================================================
// FILE NAME CONSTRAINTS
// ============================================================================

/// Apply `name_GOOS_GOARCH.go`, `name_GOOS.go` and `name_GOARCH.go` rules.
pub fn good_os_arch_file(ctx: &BuildContext, name: &str) -> bool {
    let stem = name.strip_suffix(".go").unwrap_or(name);
    let stem = stem.strip_suffix("_test").unwrap_or(stem);
    // The part before the first `_` never counts: `linux.go` builds
    // everywhere.
    let Some((_, tail)) = stem.split_once('_') else {
        return true;
    };
    let parts: Vec<&str> = tail.split('_').collect();
    let n = parts.len();
    if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
        return ctx.match_tag(parts[n - 2]) && ctx.match_tag(parts[n - 1]);
    }
    let last = parts[n - 1];
    if KNOWN_OS.contains(&last) || KNOWN_ARCH.contains(&last) {
        return ctx.match_tag(last);
    }
    true
}

// ============================================================================
// BUILD CONSTRAINTS
// ============================================================================

/// Evaluate the build constraints in the header of `text`.
///
/// The header is the run of comments and blank lines before the package
/// clause. A `//go:build` line wins over `// +build` lines.
pub fn should_build(ctx: &BuildContext, text: &str) -> bool {
    let mut go_build: Option<&str> = None;
    let mut plus_build: Vec<&str> = Vec::new();
    let mut in_block = false;

    for line in text.lines() {
        let line = line.trim();
        if in_block {
            if line.contains("*/") {
                in_block = false;
            }
            continue;
        }
        if line.is_empty() {
            continue;
        }
        if line.starts_with("/*") {
            in_block = !line.contains("*/");
            continue;
        }
        let Some(comment) = line.strip_prefix("//") else {
            break;
        };
        if let Some(expr) = comment.strip_prefix("go:build") {
            if go_build.is_none() {
                go_build = Some(expr.trim());
            }
        } else if let Some(expr) = comment.trim_start().strip_prefix("+build") {
            plus_build.push(expr.trim());
        }
    }

    if let Some(expr) = go_build {
        return match BuildExpr::parse(expr) {
            Some(expr) => expr.eval(&|tag| ctx.match_tag(tag)),
            None => {
                tracing::warn!(constraint = expr, "malformed //go:build line");
                false
            }
        };
    }
    plus_build.iter().all(|line| plus_build_line(ctx, line))
}

/// `// +build a,b !c` means `(a && b) || !c`.
fn plus_build_line(ctx: &BuildContext, line: &str) -> bool {
    line.split_whitespace().any(|term| {
        term.split(',').all(|atom| match atom.strip_prefix('!') {
            Some(tag) => !ctx.match_tag(tag),
            None => ctx.match_tag(atom),
        })
    })
}

/// A parsed `//go:build` expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildExpr {
    Tag(String),
    Not(Box<BuildExpr>),
    And(Box<BuildExpr>, Box<BuildExpr>),
    Or(Box<BuildExpr>, Box<BuildExpr>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum BuildToken<'a> {
    Tag(&'a str),
    Not,
    And,
    Or,
    Open,
    Close,
}

impl BuildExpr {
    pub fn parse(text: &str) -> Option<BuildExpr> {
        let tokens = tokenize(text)?;
        let mut pos = 0;
        let expr = parse_or(&tokens, &mut pos)?;
        (pos == tokens.len()).then_some(expr)
    }

    pub fn eval(&self, has_tag: &dyn Fn(&str) -> bool) -> bool {
        match self {
            BuildExpr::Tag(tag) => has_tag(tag),
            BuildExpr::Not(x) => !x.eval(has_tag),
            BuildExpr::And(x, y) => x.eval(has_tag) && y.eval(has_tag),
            BuildExpr::Or(x, y) => x.eval(has_tag) || y.eval(has_tag),
        }
    }
}

fn tokenize(text: &str) -> Option<Vec<BuildToken<'_>>> {
    let mut tokens = Vec::new();
    let mut rest = text.trim_start();
    while !rest.is_empty() {
        let (token, len) = if rest.starts_with("&&") {
            (BuildToken::And, 2)
        } else if rest.starts_with("||") {
            (BuildToken::Or, 2)
        } else if rest.starts_with('!') {
            (BuildToken::Not, 1)
        } else if rest.starts_with('(') {
            (BuildToken::Open, 1)
        } else if rest.starts_with(')') {
            (BuildToken::Close, 1)
        } else {
            let len = rest
                .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
                .unwrap_or(rest.len());
            if len == 0 {
                return None;
            }
            (BuildToken::Tag(&rest[..len]), len)
        };
        tokens.push(token);
        rest = rest[len..].trim_start();
    }
    Some(tokens)
}

fn parse_or(tokens: &[BuildToken<'_>], pos: &mut usize) -> Option<BuildExpr> {
    let mut x = parse_and(tokens, pos)?;
    while tokens.get(*pos) == Some(&BuildToken::Or) {
        *pos += 1;
        let y = parse_and(tokens, pos)?;
        x = BuildExpr::Or(Box::new(x), Box::new(y));
    }
    Some(x)
}

fn parse_and(tokens: &[BuildToken<'_>], pos: &mut usize) -> Option<BuildExpr> {
    let mut x = parse_not(tokens, pos)?;
    while tokens.get(*pos) == Some(&BuildToken::And) {
        *pos += 1;
        let y = parse_not(tokens, pos)?;
        x = BuildExpr::And(Box::new(x), Box::new(y));
    }
    Some(x)
}

fn parse_not(tokens: &[BuildToken<'_>], pos: &mut usize) -> Option<BuildExpr> {
    match tokens.get(*pos)? {
        BuildToken::Not => {
            *pos += 1;
            Some(BuildExpr::Not(Box::new(parse_not(tokens, pos)?)))
        }
        BuildToken::Open => {
            *pos += 1;
            let x = parse_or(tokens, pos)?;
            if tokens.get(*pos) != Some(&BuildToken::Close) {
                return None;
            }
            *pos += 1;
            Some(x)
        }
        BuildToken::Tag(tag) => {
            *pos += 1;
            Some(BuildExpr::Tag(tag.to_string()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn linux() -> BuildContext {
        BuildContext::new("/go", "linux", "amd64")
    }

    #[rstest]
    #[case("file.go", true)]
    #[case("linux.go", true)]
    #[case("file_linux.go", true)]
    #[case("file_windows.go", false)]
    #[case("file_amd64.go", true)]
    #[case("file_arm64.go", false)]
    #[case("file_linux_amd64.go", true)]
    #[case("file_linux_arm64.go", false)]
    #[case("file_windows_test.go", false)]
    #[case("file_other_test.go", true)]
    fn test_good_os_arch_file(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(good_os_arch_file(&linux(), name), expected);
    }

    #[rstest]
    #[case("linux && amd64", true)]
    #[case("linux && !cgo", false)]
    #[case("windows || (linux && go1.18)", true)]
    #[case("!(darwin || windows)", true)]
    #[case("ignore", false)]
    fn test_go_build_lines(#[case] expr: &str, #[case] expected: bool) {
        let text = format!("// Copyright\n\n//go:build {expr}\n\npackage p\n");
        assert_eq!(should_build(&linux(), &text), expected);
    }

    #[test]
    fn test_go_build_wins_over_plus_build() {
        let text = "//go:build linux\n// +build windows\n\npackage p\n";
        assert!(should_build(&linux(), text));
    }

    #[test]
    fn test_plus_build_lines() {
        let ctx = linux();
        assert!(should_build(&ctx, "// +build darwin linux,amd64\n\npackage p\n"));
        assert!(!should_build(&ctx, "// +build linux\n// +build !amd64\n\npackage p\n"));
    }

    #[test]
    fn test_constraints_after_package_clause_are_ignored() {
        let text = "package p\n\n//go:build ignore\n";
        assert!(should_build(&linux(), text));
    }

    #[test]
    fn test_malformed_expression_excludes_the_file() {
        assert_eq!(BuildExpr::parse("linux &&"), None);
        assert!(!should_build(&linux(), "//go:build (linux\n\npackage p\n"));
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(clean(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_check_name_outside_roots() {
        let located = LocatedPackage {
            import_path: ".".into(),
            name: "main".into(),
            ..LocatedPackage::default()
        };
        assert_eq!(located.check_name(), "main");
    }
}
