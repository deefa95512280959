use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::*;
use crate::base::FilePos;
use crate::hir::diagnostics::codes;
use crate::hir::display::object_string;
use crate::hir::info::SelectionKind;
use crate::hir::lookup::lookup_named_method;
use crate::hir::source::SourceCache;
use crate::hir::symbols::{ObjKind, classify};
use crate::hir::types::{BasicKind, Type};

// ============================================================================
// HARNESS
// ============================================================================

#[derive(Default)]
struct Host {
    db: Db,
    packages: FxHashMap<String, PackageId>,
}

impl ImportHost for Host {
    fn db(&self) -> &Db {
        &self.db
    }

    fn db_mut(&mut self) -> &mut Db {
        &mut self.db
    }

    fn import(&mut self, _from_dir: &Path, path: &str) -> Result<PackageId, ResolveError> {
        if path == "unsafe" {
            return Ok(self.db.universe().unsafe_package());
        }
        self.packages
            .get(path)
            .copied()
            .ok_or_else(|| ResolveError::NotFound {
                path: path.to_string(),
                searched: Vec::new(),
            })
    }
}

struct Checked {
    pkg: PackageId,
    files: Vec<Arc<SourceFile>>,
    out: CheckOutput,
}

impl Checked {
    /// Position of the `nth` occurrence of `needle` in file `file`, moved
    /// `shift` bytes forward.
    fn pos(&self, file: usize, needle: &str, nth: usize, shift: usize) -> FilePos {
        let text = self.files[file].text();
        let offset = text
            .match_indices(needle)
            .nth(nth)
            .map(|(offset, _)| offset + shift)
            .unwrap_or_else(|| panic!("{needle:?} #{nth} not found"));
        FilePos {
            file: self.files[file].id(),
            offset: (offset as u32).into(),
        }
    }

    fn use_of(&self, needle: &str, nth: usize) -> SymbolId {
        self.out.info.use_at(self.pos(0, needle, nth, 0)).unwrap().1
    }

    fn def_of(&self, needle: &str, nth: usize) -> SymbolId {
        self.out.info.def_at(self.pos(0, needle, nth, 0)).unwrap().1
    }

    fn has_code(&self, code: &str) -> bool {
        self.out
            .diagnostics
            .iter()
            .any(|d| d.code.as_deref() == Some(code))
    }
}

fn check_with(
    host: &mut Host,
    cache: &SourceCache,
    path: &str,
    name: &str,
    sources: &[&str],
    config: CheckConfig,
) -> Checked {
    let dir = PathBuf::from("/virtual").join(path);
    let files: Vec<Arc<SourceFile>> = sources
        .iter()
        .enumerate()
        .map(|(i, text)| cache.parse(&dir, &format!("f{i}.go"), Some(text)).unwrap())
        .collect();
    let pkg = host
        .db
        .alloc_package(Package::new(path, name, PackageOrigin::Source));
    let out = check_package(host, pkg, &dir, &files, SemanticInfo::default(), config);
    Checked { pkg, files, out }
}

fn check(sources: &[&str]) -> (Host, Checked) {
    let mut host = Host::default();
    let cache = SourceCache::new("linux", "amd64");
    let checked = check_with(&mut host, &cache, "p", "p", sources, CheckConfig::default());
    (host, checked)
}

/// Check `lib` as package `example/lib` and make it importable.
fn with_lib(lib: &str) -> (Host, SourceCache) {
    let mut host = Host::default();
    let cache = SourceCache::new("linux", "amd64");
    let checked = check_with(&mut host, &cache, "example/lib", "lib", &[lib], CheckConfig::default());
    host.db.package_mut(checked.pkg).info = checked.out.info;
    host.packages.insert("example/lib".into(), checked.pkg);
    (host, cache)
}

// ============================================================================
// TESTS
// ============================================================================

#[test]
fn test_local_defs_and_uses() {
    let (host, checked) = check(&["package p\n\nfunc f() int {\n\tx := 1\n\ty := x + 2\n\treturn y\n}\n"]);
    assert!(checked.out.diagnostics.is_empty(), "{:?}", checked.out.diagnostics);

    let def = checked.def_of("x :=", 0);
    assert_eq!(checked.use_of("x + 2", 0), def);
    let x = host.db.symbol(def);
    assert_eq!(x.ty, host.db.basic(BasicKind::Int));
    assert!(!x.package_level);
}

#[test]
fn test_embedded_field_and_promoted_method() {
    let src = "package p

type Inner struct{ N int }

func (i *Inner) Get() int { return i.N }

type Outer struct {
	*Inner
	Name string
}

func use(o Outer) int { return o.Get() + o.N }
";
    let (host, checked) = check(&[src]);
    assert!(checked.out.diagnostics.is_empty(), "{:?}", checked.out.diagnostics);
    let info = &checked.out.info;

    let (_, get) = info.selection_at(checked.pos(0, "o.Get", 0, 2)).unwrap();
    assert_eq!(get.kind, SelectionKind::MethodVal);
    assert_eq!(get.index, vec![0, 0]);
    assert!(get.indirect);
    assert_eq!(classify(&host.db, get.obj), Ok(ObjKind::Method));

    let (_, n) = info.selection_at(checked.pos(0, "o.N", 0, 2)).unwrap();
    assert_eq!(n.kind, SelectionKind::FieldVal);
    assert_eq!(n.obj, checked.def_of("N int", 0));

    // The embedded name defines the field and uses the type.
    let embedded = checked.pos(0, "*Inner\n", 0, 1);
    let field = info.def_at(embedded).unwrap().1;
    assert!(host.db.symbol(field).is_embedded_field());
    let type_name = info.use_at(embedded).unwrap().1;
    assert_eq!(type_name, checked.def_of("Inner struct", 0));
}

#[test]
fn test_composite_literal_keys_are_field_uses() {
    let (_, checked) = check(&["package p\n\ntype T struct{ A, B int }\n\nvar v = []T{{A: 1}, {B: 2}}\n"]);
    assert!(checked.out.diagnostics.is_empty(), "{:?}", checked.out.diagnostics);
    assert_eq!(checked.use_of("A: 1", 0), checked.def_of("A, B", 0));
    assert_eq!(checked.use_of("B: 2", 0), checked.def_of("B int", 0));
}

#[test]
fn test_interface_methods_take_the_named_receiver() {
    let (host, checked) = check(&["package p\n\ntype I interface{ M() }\n\ntype J interface {\n\tI\n\tN()\n}\n"]);
    let db = &host.db;
    let i = db.symbol(checked.def_of("I interface", 0)).ty;
    let j = db.symbol(checked.def_of("J interface", 0)).ty;
    let m = checked.def_of("M()", 0);

    let recv = db.ty(db.symbol(m).ty).as_signature().unwrap().recv.unwrap();
    assert_eq!(db.symbol(recv).ty, i);
    assert_eq!(object_string(db, m), "func (p.I).M()");
    assert_eq!(lookup_named_method(db, j, "M"), Some((m, i)));
}

#[test]
fn test_qualified_identifier_and_package_name() {
    let (mut host, cache) = with_lib("package lib\n\nconst Answer = 42\n");
    let main = "package main\n\nimport \"example/lib\"\n\nvar x = lib.Answer\n";
    let checked = check_with(&mut host, &cache, "main", "main", &[main], CheckConfig::default());
    assert!(checked.out.diagnostics.is_empty(), "{:?}", checked.out.diagnostics);
    let db = &host.db;

    let pkg_name = checked.use_of("lib.Answer", 0);
    assert_eq!(classify(db, pkg_name), Ok(ObjKind::Package));
    let spec_start = checked.pos(0, "\"example/lib\"", 0, 0);
    assert_eq!(db.symbol(pkg_name).pos.unwrap().start_pos(), spec_start);
    assert_eq!(object_string(db, pkg_name), "package lib (\"example/lib\")");

    let answer = checked.use_of("Answer", 0);
    assert_eq!(db.symbol(answer).package, Some(host.packages["example/lib"]));
    assert!(matches!(
        db.symbol(answer).class,
        SymbolClass::Const {
            value: ConstValue::Int(42)
        }
    ));

    let x = checked.def_of("x =", 0);
    assert_eq!(db.symbol(x).ty, db.basic(BasicKind::Int));
    assert_eq!(checked.out.imports, vec![host.packages["example/lib"]]);
    assert_eq!(checked.out.info.implicits.len(), 1);
}

#[test]
fn test_dot_import_exposes_exported_names() {
    let (mut host, cache) = with_lib("package lib\n\nfunc Hello() string { return \"hi\" }\n");
    let main = "package main\n\nimport . \"example/lib\"\n\nvar s = Hello()\n";
    let checked = check_with(&mut host, &cache, "main", "main", &[main], CheckConfig::default());
    assert!(checked.out.diagnostics.is_empty(), "{:?}", checked.out.diagnostics);

    let hello = checked.use_of("Hello()", 0);
    assert_eq!(host.db.symbol(hello).package, Some(host.packages["example/lib"]));
    let s = checked.def_of("s =", 0);
    assert_eq!(host.db.symbol(s).ty, host.db.basic(BasicKind::String));
}

#[test]
fn test_failed_import_is_recorded() {
    let (_, checked) = check(&["package p\n\nimport \"missing/pkg\"\n\nvar x = 1\n"]);
    assert!(checked.has_code(codes::IMPORT_FAILED));
    let (path, err) = &checked.out.import_errors[0];
    assert_eq!(path, "missing/pkg");
    assert!(err.is_not_found());
    // The rest of the package is still checked.
    checked.def_of("x =", 0);
}

#[test]
fn test_type_switch_records_one_implicit_per_clause() {
    let src = "package p

func f(v interface{}) {
	switch t := v.(type) {
	case int:
		_ = t
	case string, error:
		_ = t
	}
}
";
    let (host, checked) = check(&[src]);
    assert!(checked.out.diagnostics.is_empty(), "{:?}", checked.out.diagnostics);
    let implicits: Vec<SymbolId> = checked.out.info.implicits.values().copied().collect();
    assert_eq!(implicits.len(), 2);

    let db = &host.db;
    assert_eq!(db.symbol(implicits[0]).ty, db.basic(BasicKind::Int));
    assert!(matches!(db.ty(db.symbol(implicits[1]).ty), Type::Interface(_)));
    assert_eq!(checked.use_of("t\n", 0), implicits[0]);
    assert_eq!(checked.use_of("t\n", 1), implicits[1]);
    // The binding itself defines nothing.
    assert!(checked.out.info.def_at(checked.pos(0, "t :=", 0, 0)).is_none());
}

#[test]
fn test_labels_are_function_scoped() {
    let (host, checked) = check(&["package p\n\nfunc f() {\nouter:\n\tfor {\n\t\tbreak outer\n\t}\n}\n"]);
    assert!(checked.out.diagnostics.is_empty(), "{:?}", checked.out.diagnostics);
    let label = checked.def_of("outer:", 0);
    assert_eq!(checked.use_of("outer\n", 0), label);
    assert_eq!(classify(&host.db, label), Ok(ObjKind::Label));
}

#[test]
fn test_ignoring_bodies_skips_locals() {
    let mut host = Host::default();
    let cache = SourceCache::new("linux", "amd64");
    let config = CheckConfig {
        ignore_function_bodies: true,
        ..CheckConfig::default()
    };
    let src = "package p\n\nfunc F(a int) int {\n\tx := a\n\treturn x\n}\n";
    let checked = check_with(&mut host, &cache, "p", "p", &[src], config);

    // Parameters are part of the signature; body identifiers are not.
    checked.def_of("a int", 0);
    assert!(checked.out.info.def_at(checked.pos(0, "x :=", 0, 0)).is_none());
    assert!(checked.out.info.use_at(checked.pos(0, "a\n", 0, 0)).is_none());
}

#[test]
fn test_recursive_types() {
    let (_, checked) = check(&["package p\n\ntype T T\n"]);
    assert!(checked.has_code(codes::CYCLE));

    let (_, checked) = check(&["package p\n\ntype L struct{ next *L }\n\ntype A B\ntype B struct{ a *A }\n"]);
    assert!(checked.out.diagnostics.is_empty(), "{:?}", checked.out.diagnostics);
}

#[test]
fn test_iota_repetition() {
    let (host, checked) = check(&["package p\n\nconst (\n\tA = iota * 10\n\tB\n\tC\n)\n"]);
    let c = checked.def_of("C\n", 0);
    assert!(matches!(
        host.db.symbol(c).class,
        SymbolClass::Const {
            value: ConstValue::Int(20)
        }
    ));
}

#[test]
fn test_declaration_order_does_not_matter() {
    let src = "package p\n\nvar total = count() + base\n\nconst base = 3\n\nfunc count() int { return base }\n";
    let (host, checked) = check(&[src]);
    assert!(checked.out.diagnostics.is_empty(), "{:?}", checked.out.diagnostics);
    let total = checked.def_of("total", 0);
    assert_eq!(host.db.symbol(total).ty, host.db.basic(BasicKind::Int));
}

#[test]
fn test_fake_cgo_package() {
    let mut host = Host::default();
    let cache = SourceCache::new("linux", "amd64");
    let config = CheckConfig {
        fake_import_c: true,
        ..CheckConfig::default()
    };
    let src = "package p\n\nimport \"C\"\n\nvar n = C.size_t(1)\n";
    let checked = check_with(&mut host, &cache, "p", "p", &[src], config);
    assert!(checked.out.diagnostics.is_empty(), "{:?}", checked.out.diagnostics);
    let size_t = checked.use_of("size_t", 0);
    assert!(classify(&host.db, size_t).is_err());
}

#[test]
fn test_method_expression() {
    let src = "package p\n\ntype T struct{}\n\nfunc (T) M(x int) {}\n\nvar f = T.M\n";
    let (host, checked) = check(&[src]);
    assert!(checked.out.diagnostics.is_empty(), "{:?}", checked.out.diagnostics);
    let (_, sel) = checked.out.info.selection_at(checked.pos(0, "T.M", 0, 2)).unwrap();
    assert_eq!(sel.kind, SelectionKind::MethodExpr);

    let f = checked.def_of("f =", 0);
    let sig = host.db.ty(host.db.symbol(f).ty).as_signature().unwrap();
    assert_eq!(sig.params.len(), 2);
}

#[test]
fn test_errors_do_not_stop_the_check() {
    let src = "package p\n\nvar a = missing\n\nfunc f() {\n\tb := 1\n\tb := 2\n\t_ = b\n}\n\nvar a = 2\n";
    let (_, checked) = check(&[src]);
    assert!(checked.has_code(codes::UNDEFINED));
    assert!(checked.has_code(codes::DUPLICATE_DECLARATION));
    assert!(
        checked
            .out
            .diagnostics
            .iter()
            .any(|d| d.message.contains("no new variables"))
    );
    assert_eq!(checked.use_of("b\n", 0), checked.def_of("b := 1", 0));
}

#[test]
fn test_methods_are_attached_across_files() {
    let (host, checked) = check(&[
        "package p\n\ntype T struct{}\n",
        "package p\n\nfunc (t *T) M() {}\n",
    ]);
    assert!(checked.out.diagnostics.is_empty(), "{:?}", checked.out.diagnostics);
    let t = host.db.package(checked.pkg).lookup("T").unwrap();
    let named = host.db.ty(host.db.symbol(t).ty).as_named().unwrap();
    assert_eq!(named.methods.len(), 1);
    assert_eq!(object_string(&host.db, named.methods[0]), "func (*p.T).M()");
}
