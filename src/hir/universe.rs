//! The universe scope and package `unsafe`.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::db::{Db, Package, PackageOrigin};
use super::ids::{PackageId, SymbolId, TypeId};
use super::symbols::{Builtin, ConstValue, Symbol, SymbolClass};
use super::types::{BasicKind, Interface, Named, Signature, Type};

/// Predeclared objects shared by every package of a session.
#[derive(Debug)]
pub struct Universe {
    scope: FxHashMap<SmolStr, SymbolId>,
    basics: FxHashMap<BasicKind, TypeId>,
    error_type: TypeId,
    empty_interface: TypeId,
    unsafe_package: PackageId,
}

impl Default for Universe {
    fn default() -> Self {
        Self {
            scope: FxHashMap::default(),
            basics: FxHashMap::default(),
            error_type: TypeId::new(0),
            empty_interface: TypeId::new(0),
            unsafe_package: PackageId::new(0),
        }
    }
}

/// Type names of the universe scope and the basic kind they denote.
const TYPE_NAMES: &[(&str, BasicKind)] = &[
    ("bool", BasicKind::Bool),
    ("int", BasicKind::Int),
    ("int8", BasicKind::Int8),
    ("int16", BasicKind::Int16),
    ("int32", BasicKind::Int32),
    ("int64", BasicKind::Int64),
    ("uint", BasicKind::Uint),
    ("uint8", BasicKind::Uint8),
    ("uint16", BasicKind::Uint16),
    ("uint32", BasicKind::Uint32),
    ("uint64", BasicKind::Uint64),
    ("uintptr", BasicKind::Uintptr),
    ("float32", BasicKind::Float32),
    ("float64", BasicKind::Float64),
    ("complex64", BasicKind::Complex64),
    ("complex128", BasicKind::Complex128),
    ("string", BasicKind::String),
    ("byte", BasicKind::Byte),
    ("rune", BasicKind::Rune),
];

impl Universe {
    pub(super) fn populate(db: &mut Db) -> Universe {
        let mut universe = Universe::default();
        for &kind in BasicKind::ALL {
            let id = db.alloc_type(Type::Basic(kind));
            universe.basics.insert(kind, id);
        }

        for &(name, kind) in TYPE_NAMES {
            let ty = universe.basic(kind);
            declare(db, &mut universe, name, SymbolClass::TypeName, ty);
        }

        // type error interface { Error() string }
        let iface = db.alloc_type(Type::Interface(Interface::default()));
        let invalid = db.invalid();
        let error_obj = declare(db, &mut universe, "error", SymbolClass::TypeName, invalid);
        let error_type = db.alloc_type(Type::Named(Named {
            obj: error_obj,
            underlying: iface,
            methods: Vec::new(),
        }));
        db.symbol_mut(error_obj).ty = error_type;
        let recv = unnamed_var(db, error_type);
        let result = unnamed_var(db, universe.basic(BasicKind::String));
        let sig = db.alloc_type(Type::Signature(Signature {
            recv: Some(recv),
            params: Vec::new(),
            results: vec![result],
            variadic: false,
        }));
        let error_method = db.alloc_symbol(Symbol {
            name: "Error".into(),
            class: SymbolClass::Func,
            package: None,
            pos: None,
            ty: sig,
            package_level: false,
        });
        *db.ty_mut(iface) = Type::Interface(Interface {
            methods: vec![error_method],
            embeddeds: Vec::new(),
        });
        universe.error_type = error_type;

        let empty = db.alloc_type(Type::Interface(Interface::default()));
        universe.empty_interface = empty;
        declare(db, &mut universe, "any", SymbolClass::TypeName, empty);

        let untyped_bool = universe.basic(BasicKind::UntypedBool);
        for (name, value) in [("true", true), ("false", false)] {
            declare(
                db,
                &mut universe,
                name,
                SymbolClass::Const {
                    value: ConstValue::Bool(value),
                },
                untyped_bool,
            );
        }
        let untyped_int = universe.basic(BasicKind::UntypedInt);
        declare(
            db,
            &mut universe,
            "iota",
            SymbolClass::Const {
                value: ConstValue::Int(0),
            },
            untyped_int,
        );
        let untyped_nil = universe.basic(BasicKind::UntypedNil);
        declare(db, &mut universe, "nil", SymbolClass::Nil, untyped_nil);

        for &builtin in Builtin::UNIVERSE {
            declare(
                db,
                &mut universe,
                builtin.name(),
                SymbolClass::Builtin(builtin),
                invalid,
            );
        }

        universe.unsafe_package = populate_unsafe(db, &universe);
        universe
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.scope.get(name).copied()
    }

    pub fn basic(&self, kind: BasicKind) -> TypeId {
        self.basics.get(&kind).copied().unwrap_or(TypeId::new(0))
    }

    pub fn error_type(&self) -> TypeId {
        self.error_type
    }

    pub fn empty_interface(&self) -> TypeId {
        self.empty_interface
    }

    pub fn unsafe_package(&self) -> PackageId {
        self.unsafe_package
    }
}

fn declare(
    db: &mut Db,
    universe: &mut Universe,
    name: &str,
    class: SymbolClass,
    ty: TypeId,
) -> SymbolId {
    let id = db.alloc_symbol(Symbol {
        name: name.into(),
        class,
        package: None,
        pos: None,
        ty,
        package_level: true,
    });
    universe.scope.insert(name.into(), id);
    id
}

fn unnamed_var(db: &mut Db, ty: TypeId) -> SymbolId {
    db.alloc_symbol(Symbol {
        name: SmolStr::default(),
        class: SymbolClass::Var {
            field: false,
            embedded: false,
        },
        package: None,
        pos: None,
        ty,
        package_level: false,
    })
}

fn populate_unsafe(db: &mut Db, universe: &Universe) -> PackageId {
    let pkg = db.alloc_package(Package::new("unsafe", "unsafe", PackageOrigin::Synthetic));
    let pointer = db.alloc_symbol(Symbol {
        name: "Pointer".into(),
        class: SymbolClass::TypeName,
        package: Some(pkg),
        pos: None,
        ty: universe.basic(BasicKind::UnsafePointer),
        package_level: true,
    });
    db.package_mut(pkg).scope.insert("Pointer".into(), pointer);
    let invalid = db.invalid();
    for &builtin in Builtin::UNSAFE {
        let id = db.alloc_symbol(Symbol {
            name: builtin.name().into(),
            class: SymbolClass::Builtin(builtin),
            package: Some(pkg),
            pos: None,
            ty: invalid,
            package_level: true,
        });
        db.package_mut(pkg).scope.insert(builtin.name().into(), id);
    }
    pkg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_and_rune_are_distinct_names() {
        let db = Db::new();
        let byte = db.universe().lookup("byte").unwrap();
        let uint8 = db.universe().lookup("uint8").unwrap();
        assert_ne!(byte, uint8);
        assert_eq!(db.basic_kind(db.symbol(byte).ty), Some(BasicKind::Byte));
    }

    #[test]
    fn test_error_method_has_receiver() {
        let db = Db::new();
        let error = db.universe().error_type();
        let Type::Interface(iface) = db.ty(db.underlying(error)) else {
            panic!("error is not an interface");
        };
        let method = db.symbol(iface.methods[0]);
        assert_eq!(method.name, "Error");
        assert!(db.ty(method.ty).as_signature().unwrap().recv.is_some());
    }
}
