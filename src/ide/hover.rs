//! One-line hover signatures.

use super::cursor::ResolvedSymbol;
use crate::hir::display::object_string;
use crate::hir::{Db, ObjKind};

/// Shorten the package paths in an object string.
///
/// Every run of word characters, dots and slashes loses everything up to
/// its last `/`; a run that still holds more than one `.` then loses its
/// first qualifier too. `func (*encoding/json.Decoder).Decode()` becomes
/// `func (*json.Decoder).Decode()`.
pub fn simple_type(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(start) = rest.find(is_path_char) {
        out.push_str(&rest[..start]);
        let run = &rest[start..];
        let len = run.find(|c: char| !is_path_char(c)).unwrap_or(run.len());
        out.push_str(shorten(&run[..len]));
        rest = &run[len..];
    }
    out.push_str(rest);
    out
}

fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/')
}

fn shorten(token: &str) -> &str {
    let token = match token.rfind('/') {
        Some(i) => &token[i + 1..],
        None => token,
    };
    if token.matches('.').count() > 1 {
        if let Some(i) = token.find('.') {
            return &token[i + 1..];
        }
    }
    token
}

/// Canned signature of a builtin function or type.
pub fn builtin_info(name: &str) -> String {
    let info = match name {
        "append" => "func append(slice []Type, elems ...Type) []Type",
        "copy" => "func copy(dst, src []Type) int",
        "delete" => "func delete(m map[Type]Type1, key Type)",
        "len" => "func len(v Type) int",
        "cap" => "func cap(v Type) int",
        "make" => "func make(Type, size IntegerType) Type",
        "new" => "func new(Type) *Type",
        "complex" => "func complex(r, i FloatType) ComplexType",
        "real" => "func real(c ComplexType) FloatType",
        "imag" => "func imag(c ComplexType) FloatType",
        "close" => "func close(c chan<- Type)",
        "panic" => "func panic(v interface{})",
        "recover" => "func recover() interface{}",
        "print" => "func print(args ...Type)",
        "println" => "func println(args ...Type)",
        "error" => "type error interface {Error() string}",
        _ => name,
    };
    format!("builtin {info}")
}

/// Hover text of a resolved symbol.
pub fn hover_text(db: &Db, target: &ResolvedSymbol) -> String {
    let symbol = db.symbol(target.symbol);
    let root_path = &db.package(target.root).path;
    let text = simple_type(&object_string(db, target.symbol));
    match (target.kind, target.field_owner, &target.interface) {
        (ObjKind::Builtin, ..) => builtin_info(&symbol.name),
        (ObjKind::Package, ..) => object_string(db, target.symbol),
        (ObjKind::Field, Some(owner), _) => {
            let owner = db.symbol(owner);
            match owner.package.map(|pkg| db.package(pkg)) {
                Some(pkg) if &pkg.path != root_path => format!("{}.{} {text}", pkg.name, owner.name),
                _ => format!("{} {text}", owner.name),
            }
        }
        (ObjKind::Method, _, Some(iface)) => {
            let qualified = match target.owner {
                Some(pkg) => format!("{}.{iface}", db.package(pkg).name),
                None => iface.to_string(),
            };
            text.replacen("(interface)", &qualified, 1)
        }
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("func (*encoding/json.Decoder).Decode(v interface{}) error", "func (*json.Decoder).Decode(v interface{}) error")]
    #[case("var net/http.DefaultClient *net/http.Client", "var http.DefaultClient *http.Client")]
    #[case("field W float64", "field W float64")]
    #[case("type example/shapes.Box struct{W float64}", "type shapes.Box struct{W float64}")]
    #[case("func example/a.b.F()", "func b.F()")]
    fn test_simple_type(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(simple_type(input), expected);
    }

    #[test]
    fn test_builtin_info_canned() {
        assert_eq!(builtin_info("len"), "builtin func len(v Type) int");
        assert_eq!(
            builtin_info("append"),
            "builtin func append(slice []Type, elems ...Type) []Type"
        );
        assert_eq!(builtin_info("iota"), "builtin iota");
    }
}
