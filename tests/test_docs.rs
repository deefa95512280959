//! Documentation requests end to end: definition, usages and hover text.

mod common;

use common::{Workspace, line_of, offset_of};
use gosense::ide::{Candidate, CandidateEngine, LocationRecord};
use gosense::{AnalysisError, AnalysisHost, BuildContext, DocQuery, DocResponse};

const JSON: &str = "package json\n\nfunc Marshal(v interface{}) ([]byte, error) { return nil, nil }\n\nfunc Valid(data []byte) bool { return true }\n";

fn query(ws: &Workspace, package: &str, file: &str, offset: usize) -> DocQuery {
    DocQuery {
        packages: vec![package.to_string()],
        file_name: file.to_string(),
        dir: ws.dir(package),
        offset,
        ..DocQuery::default()
    }
}

fn docs(host: &AnalysisHost, query: &DocQuery) -> DocResponse {
    host.find_docs(query).unwrap()
}

fn lines(records: &[LocationRecord]) -> Vec<u32> {
    records.iter().map(|record| record.line).collect()
}

// ============================================================================
// IMPORTS
// ============================================================================

const APP: &str = "package main

import (
	\"encoding/json\"
)

func main() {
	b, _ := json.Marshal(1)
	_ = b
	json.Valid(b)
}
";

fn json_workspace() -> Workspace {
    let ws = Workspace::new();
    ws.std_file("encoding/json", "json.go", JSON)
        .file("example/app", "main.go", APP);
    ws
}

#[test]
fn test_cursor_in_import_spec() {
    let ws = json_workspace();
    let host = AnalysisHost::new(ws.context());
    let offset = offset_of(APP, "\"encoding/json\"", 0) + 3;
    let response = docs(&host, &query(&ws, "example/app", "main.go", offset));

    let import = response.import.as_ref().unwrap();
    assert_eq!(import.path, "encoding/json");
    assert_eq!(import.alias, None);
    assert_eq!(import.local_name, "json");
    assert_eq!(response.hover.as_deref(), Some("package json (\"encoding/json\")"));

    let definition = response.definition.unwrap();
    assert_eq!((definition.package.as_str(), definition.name.as_str()), ("main", "json"));
    assert_eq!(definition.kind, "package");
    assert_eq!(definition.line, 3);
    assert_eq!(lines(&response.usages), vec![7, 9]);
}

#[test]
fn test_cursor_on_package_name() {
    let ws = json_workspace();
    let host = AnalysisHost::new(ws.context());
    let offset = offset_of(APP, "json.Valid", 0) + 1;
    let response = docs(&host, &query(&ws, "example/app", "main.go", offset));

    assert!(response.import.is_none());
    assert_eq!(response.hover.as_deref(), Some("package json (\"encoding/json\")"));
    assert_eq!(response.definition.unwrap().line, 3);
    assert_eq!(lines(&response.usages), vec![7, 9]);
}

#[test]
fn test_cursor_on_imported_function() {
    let ws = json_workspace();
    let host = AnalysisHost::new(ws.context());
    let offset = offset_of(APP, "Marshal", 0) + 2;
    let response = docs(&host, &query(&ws, "example/app", "main.go", offset));

    let definition = response.definition.unwrap();
    assert_eq!(definition.package, "json");
    assert_eq!(definition.kind, "func");
    assert_eq!(definition.line, 2);
    assert!(definition.file.ends_with("encoding/json/json.go"));
    assert_eq!(
        response.hover.as_deref(),
        Some("func json.Marshal(v interface{}) ([]byte, error)")
    );
}

// ============================================================================
// SYMBOLS
// ============================================================================

#[test]
fn test_field_owner_with_shared_field_name() {
    let src = "package geo

type Point struct {
	X, Y int
}

type Size struct {
	X int
	W int
}

func area(s Size) int {
	return s.X * s.W
}
";
    let ws = Workspace::new();
    ws.file("example/geo", "geo.go", src);
    let host = AnalysisHost::new(ws.context());
    let offset = offset_of(src, "s.X", 0) + 2;
    let response = docs(&host, &query(&ws, "example/geo", "geo.go", offset));

    assert_eq!(response.hover.as_deref(), Some("Size field X int"));
    let definition = response.definition.unwrap();
    assert_eq!(definition.kind, "field");
    assert_eq!(definition.line, 7);
    assert_eq!(lines(&response.usages), vec![7, 12]);
}

#[test]
fn test_field_owner_is_the_declaring_struct() {
    let src = "package defs

type S struct {
	F int
}

type T S

func read(t T) int {
	return t.F
}
";
    let ws = Workspace::new();
    ws.file("example/defs", "defs.go", src);
    let host = AnalysisHost::new(ws.context());

    for offset in [offset_of(src, "F int", 0), offset_of(src, "t.F", 0) + 2] {
        let response = docs(&host, &query(&ws, "example/defs", "defs.go", offset));
        assert_eq!(response.hover.as_deref(), Some("S field F int"));
        assert_eq!(response.definition.unwrap().line, 3);
        assert_eq!(lines(&response.usages), vec![3, 9]);
    }
}

#[test]
fn test_method_through_embedded_interface() {
    let src = "package p

type I interface {
	M()
}

type J interface {
	I
}

func use(j J) {
	j.M()
}
";
    let ws = Workspace::new();
    ws.file("example/p", "p.go", src);
    let host = AnalysisHost::new(ws.context());
    let offset = offset_of(src, "j.M", 0) + 2;
    let response = docs(&host, &query(&ws, "example/p", "p.go", offset));

    let definition = response.definition.unwrap();
    assert_eq!(definition.kind, "method");
    assert_eq!(definition.name, "M");
    assert_eq!(definition.line, 3);
    assert_eq!(response.hover.as_deref(), Some("func (p.I).M()"));
    assert_eq!(lines(&response.usages), vec![3, 11]);
}

#[test]
fn test_usages_across_two_files() {
    let a = "package two\n\nfunc Foo() {}\n\nfunc g() {\n\tFoo()\n\tFoo()\n}\n";
    let b = "package two\n\nfunc h() {\n\tFoo()\n\tFoo()\n\tFoo()\n}\n";
    let ws = Workspace::new();
    ws.file("example/two", "a.go", a).file("example/two", "b.go", b);
    let host = AnalysisHost::new(ws.context());
    let offset = offset_of(b, "Foo", 1);
    let response = docs(&host, &query(&ws, "example/two", "b.go", offset));

    assert_eq!(response.usages.len(), 6);
    let keys: Vec<(&str, u32, u32)> = response
        .usages
        .iter()
        .map(|record| (record.file.as_str(), record.line, record.column))
        .collect();
    assert!(keys.windows(2).all(|pair| pair[0] < pair[1]), "{keys:?}");
    assert!(response.usages.iter().all(|record| record.name == "Foo" && record.kind == "func"));

    let definition = response.definition.unwrap();
    assert!(definition.file.ends_with("a.go"));
    assert_eq!((definition.line, definition.column), (2, 5));
    assert_eq!(response.hover.as_deref(), Some("func two.Foo()"));
}

#[test]
fn test_block_comments_do_not_hide_declarations() {
    let src = "/* Copyright 2024 */
package app

func Foo() {}

func main() {
	Foo() /* } */
	Foo()
}
";
    let ws = Workspace::new();
    ws.file("example/app", "main.go", src);
    let host = AnalysisHost::new(ws.context());
    let response = docs(&host, &query(&ws, "example/app", "main.go", offset_of(src, "Foo", 2)));

    let definition = response.definition.unwrap();
    assert_eq!((definition.line, definition.column), (3, 5));
    assert_eq!(lines(&response.usages), vec![3, 6, 7]);
    assert_eq!(response.hover.as_deref(), Some("func app.Foo()"));
}

#[test]
fn test_syntax_error_in_cursor_file_is_not_fatal() {
    let src = "package app

func Foo() {}

func bad() { x := := }

func main() {
	Foo()
	Foo()
}
";
    let ws = Workspace::new();
    ws.file("example/app", "main.go", src);
    let host = AnalysisHost::new(ws.context());
    let response = docs(&host, &query(&ws, "example/app", "main.go", offset_of(src, "Foo", 1)));

    let definition = response.definition.unwrap();
    assert_eq!((definition.line, definition.column), (2, 5));
    assert_eq!(lines(&response.usages), vec![2, 7, 8]);
}

#[test]
fn test_builtin_hover_is_canned() {
    let src = "package b\n\nfunc f(s []int) int {\n\ts = append(s, 1)\n\treturn len(s)\n}\n";
    let ws = Workspace::new();
    ws.file("example/b", "b.go", src);
    let host = AnalysisHost::new(ws.context());

    let len = docs(&host, &query(&ws, "example/b", "b.go", offset_of(src, "len", 0)));
    assert_eq!(len.hover.as_deref(), Some("builtin func len(v Type) int"));
    assert!(len.definition.is_none());
    assert_eq!(len.usages.len(), 1);
    assert_eq!(len.usages[0].package, "");

    let append = docs(&host, &query(&ws, "example/b", "b.go", offset_of(src, "append", 0)));
    assert_eq!(
        append.hover.as_deref(),
        Some("builtin func append(slice []Type, elems ...Type) []Type")
    );
}

#[test]
fn test_unsaved_text_replaces_the_file() {
    let on_disk = "package main\n\nfunc main() {}\n";
    let unsaved = "package main\n\nvar answer = 42\n\nfunc main() {\n\t_ = answer\n}\n";
    let ws = Workspace::new();
    ws.file("example/cmd", "main.go", on_disk);
    let host = AnalysisHost::new(ws.context());

    let mut request = query(&ws, "example/cmd", "main.go", offset_of(unsaved, "answer", 1));
    request.text = Some(unsaved.to_string());
    let response = docs(&host, &request);

    assert_eq!(response.definition.unwrap().line, line_of(unsaved, offset_of(unsaved, "answer", 0)));
    assert_eq!(response.usages.len(), 2);
}

#[test]
fn test_flags_limit_the_response() {
    let ws = json_workspace();
    let host = AnalysisHost::new(ws.context());
    let mut request = query(&ws, "example/app", "main.go", offset_of(APP, "Marshal", 0));
    request.want_usages = false;
    request.want_hover_info = false;
    let response = docs(&host, &request);

    assert!(response.definition.is_some());
    assert!(response.usages.is_empty());
    assert!(response.hover.is_none());
}

#[test]
fn test_packages_default_to_the_file_directory() {
    let ws = json_workspace();
    let host = AnalysisHost::new(ws.context());
    let mut request = query(&ws, "example/app", "main.go", offset_of(APP, "Valid", 0));
    request.packages.clear();
    let response = docs(&host, &request);

    assert_eq!(response.definition.unwrap().name, "Valid");
}

#[test]
fn test_cursor_on_nothing() {
    let ws = json_workspace();
    let host = AnalysisHost::new(ws.context());
    let response = docs(&host, &query(&ws, "example/app", "main.go", 1));
    assert!(response.is_empty());
}

#[test]
fn test_missing_root_is_a_session_error() {
    let ws = Workspace::new();
    let host = AnalysisHost::new(ws.context());
    let err = host
        .find_docs(&query(&ws, "example/nowhere", "main.go", 0))
        .unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::Root { ref package, ref source } if package == "example/nowhere" && source.is_not_found()
    ));
}

// ============================================================================
// SUMMARIES
// ============================================================================

const SHAPES: &str = "package shapes

type Box struct {
	W, H float64
}

func NewBox(w, h float64) *Box {
	return &Box{W: w, H: h}
}

func (b *Box) Area() float64 {
	return b.W * b.H
}
";

const SHAPES_APP: &str = "package main

import \"example/shapes\"

func main() {
	b := shapes.NewBox(1, 2)
	_ = b.Area()
	_ = b.W
}
";

#[test]
fn test_summary_symbols_are_promoted_to_source_positions() {
    let ws = Workspace::new();
    ws.file("example/shapes", "shapes.go", SHAPES)
        .file("example/app", "main.go", SHAPES_APP);
    let host = AnalysisHost::new(ws.context().with_known_packages(["example/shapes"]));

    for (needle, line, hover) in [
        ("Area", 10, "func (*shapes.Box).Area() float64"),
        ("NewBox", 6, "func shapes.NewBox(w float64, h float64) *shapes.Box"),
        ("b.W", 3, "shapes.Box field W float64"),
    ] {
        let shift = if needle == "b.W" { 2 } else { 0 };
        let request = query(&ws, "example/app", "main.go", offset_of(SHAPES_APP, needle, 0) + shift);

        let from_source = docs(&host, &request);
        assert!(host.summaries().contains("example/shapes"));
        let from_summary = docs(&host, &request);

        let definition = from_summary.definition.clone().unwrap();
        assert!(definition.file.ends_with("shapes.go"), "{needle}");
        assert_eq!(definition.line, line, "{needle}");
        assert_eq!(from_summary.definition, from_source.definition, "{needle}");
        assert_eq!(from_summary.hover.as_deref(), Some(hover), "{needle}");
        assert_eq!(from_source.hover, from_summary.hover, "{needle}");
    }
}

// ============================================================================
// COLLABORATORS
// ============================================================================

struct Funcs;

impl CandidateEngine for Funcs {
    fn complete(&mut self, src: &str, _: &str, offset: usize, _: &BuildContext) -> Vec<Candidate> {
        // Completing at the end of the function name sees the name itself.
        let prefix: String = src[..offset]
            .chars()
            .rev()
            .take_while(|c| c.is_alphanumeric())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        ["Marshal", "MarshalIndent", "Valid"]
            .into_iter()
            .filter(|name| name.starts_with(&prefix))
            .map(|name| Candidate {
                name: name.to_string(),
                ty: format!("func {name}()"),
                class: "func".into(),
            })
            .collect()
    }
}

#[test]
fn test_calltip_through_the_host() {
    let ws = Workspace::new();
    let host = AnalysisHost::new(ws.context()).with_engine(|_| Box::new(Funcs));
    let offset = offset_of(APP, "json.Marshal(", 0) + "json.Marshal(".len();

    let tips = host.calltip(APP, "main.go", offset);
    assert_eq!(tips.len(), 1);
    assert_eq!(tips[0].name, "Marshal");
    assert!(host.calltip(APP, "main.go", 0).is_empty());
}

#[test]
fn test_import_paths_lists_archives() {
    let ws = Workspace::new();
    let pkg = ws.goroot.join("pkg/linux_amd64");
    for archive in ["fmt.a", "encoding/json.a", "net/http_test.a", "_obj/x.a"] {
        let path = pkg.join(archive);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"!<arch>\n").unwrap();
    }
    let host = AnalysisHost::new(ws.context());

    let listing = host.import_paths(None, Some(APP));
    assert_eq!(listing.imports.len(), 1);
    assert_eq!(listing.imports[0].path, "encoding/json");
    let paths: Vec<&str> = listing.paths.iter().map(String::as_str).collect();
    assert_eq!(paths, vec!["encoding/json", "fmt", "unsafe"]);
}
