//! Symbols and their classification.
//!
//! A [`Symbol`] is one declared object: a package name, constant, type name,
//! variable or field, function or method, label, builtin, or `nil`. Symbols
//! are arena records; the checker creates them and the rest of the crate
//! reads them through [`Db`].

use smol_str::SmolStr;

use super::db::Db;
use super::ids::{PackageId, SymbolId, TypeId};
use super::types::Type;
use crate::base::Span;
use crate::error::ClassificationError;

// ============================================================================
// SYMBOL RECORDS
// ============================================================================

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: SmolStr,
    pub class: SymbolClass,
    /// Owning package; `None` for universe objects.
    pub package: Option<PackageId>,
    /// Declaration position; `None` for universe and summary-loaded objects.
    pub pos: Option<Span>,
    pub ty: TypeId,
    /// Declared in a package scope (or a method), which qualifies it in
    /// object strings.
    pub package_level: bool,
}

#[derive(Clone, Debug)]
pub enum SymbolClass {
    PkgName { imported: PackageId },
    Const { value: ConstValue },
    TypeName,
    Var { field: bool, embedded: bool },
    Func,
    Label,
    Builtin(Builtin),
    Nil,
    /// A selector of the fake `C` package. Accepted by the checker but
    /// carries no kind.
    Cgo,
}

/// Compile-time value of a constant, as far as it is tracked.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum ConstValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(SmolStr),
    #[default]
    Unknown,
}

impl ConstValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConstValue::Int(v) => Some(*v),
            ConstValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    Append,
    Cap,
    Close,
    Complex,
    Copy,
    Delete,
    Imag,
    Len,
    Make,
    New,
    Panic,
    Print,
    Println,
    Real,
    Recover,
    Alignof,
    Offsetof,
    Sizeof,
}

impl Builtin {
    /// Builtins declared in the universe scope.
    pub const UNIVERSE: &[Builtin] = &[
        Builtin::Append,
        Builtin::Cap,
        Builtin::Close,
        Builtin::Complex,
        Builtin::Copy,
        Builtin::Delete,
        Builtin::Imag,
        Builtin::Len,
        Builtin::Make,
        Builtin::New,
        Builtin::Panic,
        Builtin::Print,
        Builtin::Println,
        Builtin::Real,
        Builtin::Recover,
    ];

    /// Builtins declared in package `unsafe`.
    pub const UNSAFE: &[Builtin] = &[Builtin::Alignof, Builtin::Offsetof, Builtin::Sizeof];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Append => "append",
            Builtin::Cap => "cap",
            Builtin::Close => "close",
            Builtin::Complex => "complex",
            Builtin::Copy => "copy",
            Builtin::Delete => "delete",
            Builtin::Imag => "imag",
            Builtin::Len => "len",
            Builtin::Make => "make",
            Builtin::New => "new",
            Builtin::Panic => "panic",
            Builtin::Print => "print",
            Builtin::Println => "println",
            Builtin::Real => "real",
            Builtin::Recover => "recover",
            Builtin::Alignof => "Alignof",
            Builtin::Offsetof => "Offsetof",
            Builtin::Sizeof => "Sizeof",
        }
    }
}

impl Symbol {
    pub fn is_field(&self) -> bool {
        matches!(self.class, SymbolClass::Var { field: true, .. })
    }

    pub fn is_embedded_field(&self) -> bool {
        matches!(
            self.class,
            SymbolClass::Var {
                field: true,
                embedded: true
            }
        )
    }

    pub fn is_exported(&self) -> bool {
        crate::syntax::ast::is_exported(&self.name)
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// The kind reported for a symbol under the cursor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ObjKind {
    Package,
    Const,
    TypeName,
    Interface,
    Struct,
    Var,
    Field,
    Func,
    Method,
    Label,
    Builtin,
    Nil,
}

impl ObjKind {
    /// Label used in location records.
    pub fn label(self) -> &'static str {
        match self {
            ObjKind::Package => "package",
            ObjKind::Const => "const",
            ObjKind::TypeName => "type",
            ObjKind::Interface => "interface",
            ObjKind::Struct => "struct",
            ObjKind::Var => "var",
            ObjKind::Field => "field",
            ObjKind::Func => "func",
            ObjKind::Method => "method",
            ObjKind::Label => "label",
            ObjKind::Builtin => "builtin",
            ObjKind::Nil => "nil",
        }
    }
}

/// Classify a symbol.
///
/// Type names are split by their underlying type; functions with a receiver
/// are methods.
pub fn classify(db: &Db, id: SymbolId) -> Result<ObjKind, ClassificationError> {
    let symbol = db.symbol(id);
    let kind = match &symbol.class {
        SymbolClass::PkgName { .. } => ObjKind::Package,
        SymbolClass::Const { .. } => ObjKind::Const,
        SymbolClass::TypeName => match db.ty(db.underlying(symbol.ty)) {
            Type::Interface(_) => ObjKind::Interface,
            Type::Struct(_) => ObjKind::Struct,
            _ => ObjKind::TypeName,
        },
        SymbolClass::Var { field: true, .. } => ObjKind::Field,
        SymbolClass::Var { .. } => ObjKind::Var,
        SymbolClass::Func => match db.ty(symbol.ty).as_signature() {
            Some(sig) if sig.recv.is_some() => ObjKind::Method,
            _ => ObjKind::Func,
        },
        SymbolClass::Label => ObjKind::Label,
        SymbolClass::Builtin(_) => ObjKind::Builtin,
        SymbolClass::Nil => ObjKind::Nil,
        SymbolClass::Cgo => {
            return Err(ClassificationError::UnknownKind {
                name: symbol.name.to_string(),
            });
        }
    };
    Ok(kind)
}

/// Go's object id: exported names stand alone, unexported names are
/// qualified by the owning package path.
pub fn object_id(db: &Db, id: SymbolId) -> String {
    let symbol = db.symbol(id);
    if symbol.is_exported() {
        return symbol.name.to_string();
    }
    match symbol.package {
        Some(pkg) => format!("{}.{}", db.package(pkg).path, symbol.name),
        None => symbol.name.to_string(),
    }
}
