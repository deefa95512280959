//! Type representation.
//!
//! Types are stored in the session arena and referenced by [`TypeId`].
//! Named types are the only nodes that are mutated after creation: their
//! underlying type and method list are filled in once the declaration has
//! been checked.

use super::ids::{SymbolId, TypeId};
use crate::syntax::ast::ChanDir;

/// Predeclared basic types, including the untyped constant kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
    /// `byte`, identical to `uint8`.
    Byte,
    /// `rune`, identical to `int32`.
    Rune,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedComplex,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    pub const ALL: &[BasicKind] = &[
        BasicKind::Bool,
        BasicKind::Int,
        BasicKind::Int8,
        BasicKind::Int16,
        BasicKind::Int32,
        BasicKind::Int64,
        BasicKind::Uint,
        BasicKind::Uint8,
        BasicKind::Uint16,
        BasicKind::Uint32,
        BasicKind::Uint64,
        BasicKind::Uintptr,
        BasicKind::Float32,
        BasicKind::Float64,
        BasicKind::Complex64,
        BasicKind::Complex128,
        BasicKind::String,
        BasicKind::UnsafePointer,
        BasicKind::Byte,
        BasicKind::Rune,
        BasicKind::UntypedBool,
        BasicKind::UntypedInt,
        BasicKind::UntypedRune,
        BasicKind::UntypedFloat,
        BasicKind::UntypedComplex,
        BasicKind::UntypedString,
        BasicKind::UntypedNil,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::UnsafePointer => "unsafe.Pointer",
            BasicKind::Byte => "byte",
            BasicKind::Rune => "rune",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedComplex => "untyped complex",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedNil => "untyped nil",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    pub fn is_untyped(self) -> bool {
        matches!(
            self,
            BasicKind::UntypedBool
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
                | BasicKind::UntypedFloat
                | BasicKind::UntypedComplex
                | BasicKind::UntypedString
                | BasicKind::UntypedNil
        )
    }

    /// The type an untyped constant assumes when it needs a concrete type.
    pub fn default_kind(self) -> Self {
        match self {
            BasicKind::UntypedBool => BasicKind::Bool,
            BasicKind::UntypedInt => BasicKind::Int,
            BasicKind::UntypedRune => BasicKind::Rune,
            BasicKind::UntypedFloat => BasicKind::Float64,
            BasicKind::UntypedComplex => BasicKind::Complex128,
            BasicKind::UntypedString => BasicKind::String,
            other => other,
        }
    }

    pub fn is_string(self) -> bool {
        matches!(self, BasicKind::String | BasicKind::UntypedString)
    }
}

#[derive(Clone, Debug)]
pub enum Type {
    /// Result of an erroneous expression or declaration.
    Invalid,
    Basic(BasicKind),
    Named(Named),
    Pointer(TypeId),
    Slice(TypeId),
    Array { len: Option<i64>, elem: TypeId },
    Map { key: TypeId, value: TypeId },
    Chan { dir: ChanDir, elem: TypeId },
    Signature(Signature),
    Struct(Struct),
    Interface(Interface),
    /// Multiple results of a call.
    Tuple(Vec<TypeId>),
}

#[derive(Clone, Debug)]
pub struct Named {
    /// The declaring `TypeName`.
    pub obj: SymbolId,
    pub underlying: TypeId,
    /// Methods declared with this type as receiver base, in source order.
    pub methods: Vec<SymbolId>,
}

#[derive(Clone, Debug, Default)]
pub struct Signature {
    /// Receiver variable; for interface methods its type is the interface.
    pub recv: Option<SymbolId>,
    pub params: Vec<SymbolId>,
    pub results: Vec<SymbolId>,
    /// The last parameter is `...T` (its type is `[]T`).
    pub variadic: bool,
}

#[derive(Clone, Debug, Default)]
pub struct Struct {
    pub fields: Vec<SymbolId>,
}

#[derive(Clone, Debug, Default)]
pub struct Interface {
    /// Explicitly declared methods.
    pub methods: Vec<SymbolId>,
    /// Embedded interface types, usually named.
    pub embeddeds: Vec<TypeId>,
}

impl Type {
    pub fn as_named(&self) -> Option<&Named> {
        match self {
            Type::Named(named) => Some(named),
            _ => None,
        }
    }

    pub fn as_signature(&self) -> Option<&Signature> {
        match self {
            Type::Signature(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Type::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_kind_from_name() {
        assert_eq!(BasicKind::from_name("untyped int"), Some(BasicKind::UntypedInt));
        assert_eq!(BasicKind::from_name("byte"), Some(BasicKind::Byte));
        assert_eq!(BasicKind::from_name("Int"), None);
    }

    #[test]
    fn test_untyped_defaults() {
        assert_eq!(BasicKind::UntypedInt.default_kind(), BasicKind::Int);
        assert_eq!(BasicKind::UntypedRune.default_kind(), BasicKind::Rune);
        assert_eq!(BasicKind::UntypedFloat.default_kind(), BasicKind::Float64);
        assert_eq!(BasicKind::String.default_kind(), BasicKind::String);
        assert!(!BasicKind::Int.is_untyped());
    }
}
