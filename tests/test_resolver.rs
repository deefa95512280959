//! Dependency resolution across real directory trees.

mod common;

use std::path::Path;
use std::sync::Arc;

use common::Workspace;
use gosense::hir::{PackageOrigin, SummaryStore};
use gosense::project::{PackageStatus, locate};
use gosense::{ResolveError, ResolveOptions, Session};
use rstest::rstest;

fn session(ws: &Workspace) -> Session {
    Session::new(Arc::new(ws.context()), SummaryStore::new())
}

fn import_errors(session: &Session, path: &str) -> Vec<(String, ResolveError)> {
    match session.status(path) {
        Some(PackageStatus::Resolved(id)) => session.db().package(*id).import_errors.clone(),
        other => panic!("{path} not resolved: {other:?}"),
    }
}

#[test]
fn test_diamond_checks_each_package_once() {
    let ws = Workspace::new();
    ws.file("example/app", "main.go", "package main\n\nimport (\n\t\"example/a\"\n\t\"example/b\"\n)\n\nfunc main() {\n\ta.A()\n\tb.B()\n}\n")
        .file("example/a", "a.go", "package a\n\nimport \"example/c\"\n\nfunc A() int { return c.C }\n")
        .file("example/b", "b.go", "package b\n\nimport \"example/c\"\n\nfunc B() int { return c.C + 1 }\n")
        .file("example/c", "c.go", "package c\n\nconst C = 1\n");

    let mut session = session(&ws);
    let app = session.load_root("example/app").unwrap();

    for path in ["example/app", "example/a", "example/b", "example/c"] {
        assert_eq!(session.check_count(path), 1, "{path}");
    }
    assert_eq!(session.total_checks(), 4);
    assert!(session.db().package(app).import_errors.is_empty());

    // Resolving again is a memo hit.
    let again = session
        .resolve(Path::new(""), "example/c", ResolveOptions::IMPORT)
        .unwrap();
    assert!(matches!(session.status("example/c"), Some(PackageStatus::Resolved(id)) if *id == again));
    assert_eq!(session.check_count("example/c"), 1);
}

#[test]
fn test_self_import_is_a_cycle() {
    let ws = Workspace::new();
    ws.file("example/self", "self.go", "package self\n\nimport \"example/self\"\n\nvar X = self.X\n");

    let mut session = session(&ws);
    session.load_root("example/self").unwrap();

    let errors = import_errors(&session, "example/self");
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0].1, ResolveError::Cycle { path } if path == "example/self"));
    assert_eq!(session.check_count("example/self"), 1);
}

#[test]
fn test_mutual_imports_are_a_cycle() {
    let ws = Workspace::new();
    ws.file("example/a", "a.go", "package a\n\nimport \"example/b\"\n\nfunc A() { b.B() }\n")
        .file("example/b", "b.go", "package b\n\nimport \"example/a\"\n\nfunc B() { a.A() }\n");

    let mut session = session(&ws);
    session.load_root("example/a").unwrap();

    let errors = import_errors(&session, "example/b");
    assert!(errors
        .iter()
        .any(|(path, err)| path == "example/a" && matches!(err, ResolveError::Cycle { .. })));
    assert_eq!(session.check_count("example/a"), 1);
    assert_eq!(session.check_count("example/b"), 1);
}

#[test]
fn test_root_directory_and_import_path_are_one_package() {
    let ws = Workspace::new();
    ws.file("example/lib", "lib.go", "package lib\n\nfunc F() {}\n");

    let mut session = session(&ws);
    let dir = ws.dir("example/lib");
    let by_dir = session.load_root(&dir.display().to_string()).unwrap();
    let by_path = session
        .resolve(Path::new(""), "example/lib", ResolveOptions::IMPORT)
        .unwrap();
    assert_eq!(by_dir, by_path);
    assert_eq!(session.check_count("example/lib"), 1);
}

#[test]
fn test_missing_import_is_recorded_not_fatal() {
    let ws = Workspace::new();
    ws.file("example/app", "main.go", "package main\n\nimport \"example/missing\"\n\nfunc main() { missing.Do() }\n");

    let mut session = session(&ws);
    session.load_root("example/app").unwrap();

    let errors = import_errors(&session, "example/app");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].1.is_not_found());
}

#[test]
fn test_external_tests_share_the_semantic_tables() {
    let ws = Workspace::new();
    ws.file("example/p", "p.go", "package p\n\nfunc Exported() int { return 1 }\n")
        .file("example/p", "p_test.go", "package p\n\nfunc internalHelper() int { return Exported() }\n")
        .file("example/p", "x_test.go", "package p_test\n\nimport \"example/p\"\n\nvar v = p.Exported()\n");

    let mut session = session(&ws);
    let pkg = session.load_root("example/p").unwrap();

    assert_eq!(session.check_count("example/p"), 1);
    assert_eq!(session.check_count("example/p_test"), 1);

    let db = session.db();
    let exported = db.package(pkg).lookup("Exported").unwrap();
    let uses = db.package(pkg).info.uses.values().filter(|&&id| id == exported).count();
    assert_eq!(uses, 2, "one use from p_test.go, one from x_test.go");
}

#[test]
fn test_known_package_summary_is_exported_after_a_fast_load() {
    let ws = Workspace::new();
    ws.std_file("strings", "strings.go", "package strings\n\nfunc ToUpper(s string) string { return s }\n")
        .file("example/app", "main.go", "package main\n\nimport \"strings\"\n\nvar s = strings.ToUpper(\"x\")\n");

    let summaries = SummaryStore::new();
    let mut first = Session::new(Arc::new(ws.context()), summaries.clone());
    first.load_root("example/app").unwrap();
    assert_eq!(first.check_count("strings"), 1);
    assert!(summaries.contains("strings"));

    let mut second = Session::new(Arc::new(ws.context()), summaries.clone());
    let app = second.load_root("example/app").unwrap();
    assert_eq!(second.check_count("strings"), 0);
    let db = second.db();
    let imported = db.package(app).imports[0];
    assert_eq!(db.package(imported).origin, PackageOrigin::Summary);
    assert_eq!(db.package(imported).path, "strings");
}

#[rstest]
#[case("linux", "amd64", &["common.go", "sys_linux.go", "sys_unix.go"])]
#[case("windows", "amd64", &["common.go", "sys_windows.go"])]
#[case("darwin", "arm64", &["common.go", "sys_unix.go"])]
fn test_build_constraints_select_files(#[case] goos: &str, #[case] goarch: &str, #[case] expected: &[&str]) {
    let ws = Workspace::new();
    ws.file("example/sys", "common.go", "package sys\n")
        .file("example/sys", "sys_linux.go", "package sys\n")
        .file("example/sys", "sys_windows.go", "package sys\n")
        .file("example/sys", "sys_unix.go", "//go:build unix\n\npackage sys\n")
        .file("example/sys", "ignored.go", "//go:build ignore\n\npackage sys\n")
        .file("example/sys", "_draft.go", "package sys\n");

    let mut ctx = ws.context();
    ctx.goos = goos.to_string();
    ctx.goarch = goarch.to_string();
    let located = locate(&ctx, "example/sys").unwrap();
    assert_eq!(located.go_files, expected);
    assert!(located.ignored_files.iter().any(|name| name == "ignored.go"));
    assert!(located.ignored_files.iter().any(|name| name == "_draft.go"));
}

#[test]
fn test_directory_without_go_files() {
    let ws = Workspace::new();
    ws.file("example/empty", "README", "nothing here\n");

    let err = locate(&ws.context(), "example/empty").unwrap_err();
    assert!(matches!(err, ResolveError::NoGoFiles { .. }));
    assert!(err.is_not_found());
}
