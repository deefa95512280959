//! Import listing: the imports of one file and the importable packages.
//!
//! Importable packages are found by walking the compiled package
//! directories (`<root>/pkg/<os_arch>`) for `.a` archives.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use super::context::BuildContext;
use crate::error::AnalysisError;
use crate::syntax;

/// One import declaration of a file.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct ImportDecl {
    /// Alias, `.` or `_`; empty when the import has none.
    pub name: String,
    pub path: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct ImportListing {
    pub imports: Vec<ImportDecl>,
    /// Every importable package path; always contains `unsafe`.
    pub paths: BTreeSet<String>,
}

/// List the imports of `file` (or of `src` in its place) and every
/// importable package. A file that cannot be read yields no imports.
pub fn import_paths(ctx: &BuildContext, file: Option<&Path>, src: Option<&str>) -> ImportListing {
    let imports = file_imports(file, src).unwrap_or_else(|err| {
        tracing::debug!(error = %err, "no imports listed");
        Vec::new()
    });
    ImportListing {
        imports,
        paths: importable_paths(ctx),
    }
}

/// The import declarations of a file, parsing only its header.
pub fn file_imports(file: Option<&Path>, src: Option<&str>) -> Result<Vec<ImportDecl>, AnalysisError> {
    let text = match (src, file) {
        (Some(src), _) if !src.is_empty() => src.to_string(),
        (_, Some(file)) if !file.as_os_str().is_empty() => fs::read_to_string(file)
            .map_err(|err| AnalysisError::InvalidRequest(format!("{}: {err}", file.display())))?,
        _ => {
            return Err(AnalysisError::InvalidRequest(
                "neither file name nor source given".into(),
            ));
        }
    };
    let parsed = syntax::parse_imports(&text);
    Ok(parsed
        .file
        .imports
        .iter()
        .filter_map(|spec| {
            Some(ImportDecl {
                name: spec
                    .name
                    .as_ref()
                    .map(|alias| alias.name.to_string())
                    .unwrap_or_default(),
                path: spec.path_value()?,
            })
        })
        .collect())
}

/// Package paths with a compiled archive under any package directory.
pub fn importable_paths(ctx: &BuildContext) -> BTreeSet<String> {
    let mut paths = BTreeSet::new();
    paths.insert("unsafe".to_string());
    for root in ctx.pkg_dirs() {
        collect_archives(&root, &mut paths);
    }
    paths
}

fn collect_archives(root: &Path, paths: &mut BTreeSet<String>) {
    for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let Some(rel) = rel.to_str() else {
            continue;
        };
        let rel = rel.replace('\\', "/");
        if rel.starts_with('.') || rel.starts_with('_') {
            continue;
        }
        let Some(path) = rel.strip_suffix(".a") else {
            continue;
        };
        if path.ends_with("_test") {
            continue;
        }
        paths.insert(path.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_imports_from_source() {
        let src = "package p\n\nimport (\n\t\"fmt\"\n\tj \"encoding/json\"\n\t_ \"net/http/pprof\"\n)\n\nfunc f() {}\n";
        let imports = file_imports(None, Some(src)).unwrap();
        assert_eq!(
            imports,
            vec![
                ImportDecl {
                    name: String::new(),
                    path: "fmt".into()
                },
                ImportDecl {
                    name: "j".into(),
                    path: "encoding/json".into()
                },
                ImportDecl {
                    name: "_".into(),
                    path: "net/http/pprof".into()
                },
            ]
        );
    }

    #[test]
    fn test_file_imports_needs_input() {
        assert!(matches!(
            file_imports(None, None),
            Err(AnalysisError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_missing_pkg_dirs_still_list_unsafe() {
        let ctx = BuildContext::new("/nonexistent/goroot", "linux", "amd64");
        let paths = importable_paths(&ctx);
        assert_eq!(paths.into_iter().collect::<Vec<_>>(), vec!["unsafe".to_string()]);
    }
}
