//! Type and object strings.
//!
//! Renderings use full package paths as qualifiers, e.g.
//! `func (*encoding/json.Decoder).Decode(v interface{}) error`. Hover text
//! shortens them afterwards; summary promotion compares them verbatim, so
//! a symbol checked from source and the same symbol loaded from a summary
//! must render identically.

use std::fmt::Write;

use super::db::Db;
use super::ids::{SymbolId, TypeId};
use super::symbols::SymbolClass;
use super::types::{Signature, Type};
use crate::syntax::ast::ChanDir;

/// Named types only print their name, so rendering cannot loop through
/// them; the bound guards against malformed anonymous nesting.
const MAX_DEPTH: usize = 64;

pub fn type_string(db: &Db, ty: TypeId) -> String {
    let mut buf = String::new();
    write_type(db, &mut buf, ty, 0);
    buf
}

pub fn object_string(db: &Db, id: SymbolId) -> String {
    let symbol = db.symbol(id);
    let mut buf = String::new();
    match &symbol.class {
        SymbolClass::PkgName { imported } => {
            let imported = db.package(*imported);
            buf.push_str("package ");
            buf.push_str(&symbol.name);
            if !imported.path.is_empty() && imported.path != symbol.name.as_str() {
                let _ = write!(buf, " ({:?})", imported.path);
            }
            return buf;
        }
        SymbolClass::Const { .. } => buf.push_str("const "),
        SymbolClass::TypeName => buf.push_str("type "),
        SymbolClass::Var { field: true, .. } => buf.push_str("field "),
        SymbolClass::Var { .. } => buf.push_str("var "),
        SymbolClass::Func => {
            buf.push_str("func ");
            write_func_name(db, &mut buf, id);
            if let Some(sig) = db.ty(symbol.ty).as_signature() {
                write_signature(db, &mut buf, sig, 0);
            }
            return buf;
        }
        SymbolClass::Label => {
            buf.push_str("label ");
            buf.push_str(&symbol.name);
            return buf;
        }
        SymbolClass::Builtin(builtin) => {
            buf.push_str("builtin ");
            buf.push_str(builtin.name());
            return buf;
        }
        SymbolClass::Nil => return "nil".to_string(),
        SymbolClass::Cgo => {
            buf.push_str("C.");
            buf.push_str(&symbol.name);
            return buf;
        }
    }

    write_qualified_name(db, &mut buf, id);
    if matches!(symbol.class, SymbolClass::TypeName) {
        match db.ty(symbol.ty) {
            Type::Named(named) if named.obj == id => {
                buf.push(' ');
                write_type(db, &mut buf, named.underlying, 0);
            }
            Type::Basic(kind) if kind.name() == symbol.name.as_str() => {
                buf.push(' ');
                buf.push_str(kind.name());
            }
            _ => {
                buf.push_str(" = ");
                write_type(db, &mut buf, symbol.ty, 0);
            }
        }
        return buf;
    }
    buf.push(' ');
    write_type(db, &mut buf, symbol.ty, 0);
    buf
}

fn write_qualified_name(db: &Db, buf: &mut String, id: SymbolId) {
    let symbol = db.symbol(id);
    if symbol.package_level {
        if let Some(pkg) = symbol.package {
            buf.push_str(&db.package(pkg).path);
            buf.push('.');
        }
    }
    buf.push_str(&symbol.name);
}

fn write_func_name(db: &Db, buf: &mut String, id: SymbolId) {
    let symbol = db.symbol(id);
    let recv = db
        .ty(symbol.ty)
        .as_signature()
        .and_then(|sig| sig.recv)
        .map(|recv| db.symbol(recv).ty);
    match recv {
        Some(recv_ty) => {
            buf.push('(');
            // Methods of an interface literal (as loaded from summaries)
            // print an abbreviated receiver.
            if matches!(db.ty(recv_ty), Type::Interface(_)) {
                buf.push_str("interface");
            } else {
                write_type(db, buf, recv_ty, 0);
            }
            buf.push_str(").");
            buf.push_str(&symbol.name);
        }
        None => write_qualified_name(db, buf, id),
    }
}

fn write_type(db: &Db, buf: &mut String, ty: TypeId, depth: usize) {
    if depth > MAX_DEPTH {
        buf.push_str("...");
        return;
    }
    let depth = depth + 1;
    match db.ty(ty) {
        Type::Invalid => buf.push_str("invalid type"),
        Type::Basic(kind) => buf.push_str(kind.name()),
        Type::Named(named) => write_qualified_name(db, buf, named.obj),
        Type::Pointer(elem) => {
            buf.push('*');
            write_type(db, buf, *elem, depth);
        }
        Type::Slice(elem) => {
            buf.push_str("[]");
            write_type(db, buf, *elem, depth);
        }
        Type::Array { len, elem } => {
            match len {
                Some(len) => {
                    let _ = write!(buf, "[{len}]");
                }
                None => buf.push_str("[?]"),
            }
            write_type(db, buf, *elem, depth);
        }
        Type::Map { key, value } => {
            buf.push_str("map[");
            write_type(db, buf, *key, depth);
            buf.push(']');
            write_type(db, buf, *value, depth);
        }
        Type::Chan { dir, elem } => {
            buf.push_str(match dir {
                ChanDir::Both => "chan ",
                ChanDir::Send => "chan<- ",
                ChanDir::Recv => "<-chan ",
            });
            write_type(db, buf, *elem, depth);
        }
        Type::Signature(sig) => {
            buf.push_str("func");
            write_signature(db, buf, sig, depth);
        }
        Type::Struct(st) => {
            buf.push_str("struct{");
            for (i, field) in st.fields.iter().enumerate() {
                if i > 0 {
                    buf.push_str("; ");
                }
                let field = db.symbol(*field);
                if !field.is_embedded_field() {
                    buf.push_str(&field.name);
                    buf.push(' ');
                }
                write_type(db, buf, field.ty, depth);
            }
            buf.push('}');
        }
        Type::Interface(iface) => {
            buf.push_str("interface{");
            let mut first = true;
            for method in &iface.methods {
                if !first {
                    buf.push_str("; ");
                }
                first = false;
                let method = db.symbol(*method);
                buf.push_str(&method.name);
                if let Some(sig) = db.ty(method.ty).as_signature() {
                    write_signature(db, buf, sig, depth);
                }
            }
            for embedded in &iface.embeddeds {
                if !first {
                    buf.push_str("; ");
                }
                first = false;
                write_type(db, buf, *embedded, depth);
            }
            buf.push('}');
        }
        Type::Tuple(types) => {
            buf.push('(');
            for (i, ty) in types.iter().enumerate() {
                if i > 0 {
                    buf.push_str(", ");
                }
                write_type(db, buf, *ty, depth);
            }
            buf.push(')');
        }
    }
}

fn write_signature(db: &Db, buf: &mut String, sig: &Signature, depth: usize) {
    write_params(db, buf, &sig.params, sig.variadic, depth);
    match sig.results.as_slice() {
        [] => {}
        [single] if db.symbol(*single).name.is_empty() => {
            buf.push(' ');
            write_type(db, buf, db.symbol(*single).ty, depth);
        }
        results => {
            buf.push(' ');
            write_params(db, buf, results, false, depth);
        }
    }
}

fn write_params(db: &Db, buf: &mut String, params: &[SymbolId], variadic: bool, depth: usize) {
    buf.push('(');
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            buf.push_str(", ");
        }
        let param = db.symbol(*param);
        if !param.name.is_empty() {
            buf.push_str(&param.name);
            buf.push(' ');
        }
        let last = i + 1 == params.len();
        match db.ty(param.ty) {
            Type::Slice(elem) if variadic && last => {
                buf.push_str("...");
                write_type(db, buf, *elem, depth);
            }
            _ => write_type(db, buf, param.ty, depth),
        }
    }
    buf.push(')');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::types::BasicKind;

    #[test]
    fn test_universe_object_strings() {
        let db = Db::new();
        let universe = db.universe();
        let render = |name: &str| object_string(&db, universe.lookup(name).unwrap());
        assert_eq!(render("error"), "type error interface{Error() string}");
        assert_eq!(render("int"), "type int int");
        assert_eq!(render("any"), "type any = interface{}");
        assert_eq!(render("len"), "builtin len");
        assert_eq!(render("nil"), "nil");
        assert_eq!(render("true"), "const true untyped bool");
    }

    #[test]
    fn test_composite_type_strings() {
        let mut db = Db::new();
        let int = db.basic(BasicKind::Int);
        let string = db.basic(BasicKind::String);
        let map = db.alloc_type(Type::Map {
            key: string,
            value: int,
        });
        let slice = db.alloc_type(Type::Slice(map));
        let chan = db.alloc_type(Type::Chan {
            dir: ChanDir::Recv,
            elem: slice,
        });
        assert_eq!(type_string(&db, chan), "<-chan []map[string]int");
    }
}
