mod basics;

use crate::tree::Expr;
use crate::types::{Type, TypeBuilder};

pub(super) fn param(ty: &Type, name: &str) -> Expr {
    Expr::parameter(ty, Some(name)).unwrap()
}

pub(super) fn int(v: i32) -> Expr {
    Expr::constant(v)
}

/// Value type with `+`, `<`, `-x` and an implicit conversion from `int`.
pub(super) fn money() -> Type {
    let b = TypeBuilder::structure("Money");
    let this = b.this();
    b.static_method("op_Addition", vec![this.clone(), this.clone()], this.clone())
        .static_method("op_LessThan", vec![this.clone(), this.clone()], Type::bool())
        .static_method("op_UnaryNegation", vec![this.clone()], this.clone())
        .static_method("op_Implicit", vec![Type::i32()], this.clone())
        .build()
}

/// Value type whose `+` with an int yields a bare int, so `+=` needs a
/// conversion back.
pub(super) fn meter() -> Type {
    let b = TypeBuilder::structure("Meter");
    let this = b.this();
    b.constructor(vec![Type::i32()])
        .static_method("op_Addition", vec![this, Type::i32()], Type::i32())
        .build()
}

/// `v => new Meter(v)`.
pub(super) fn to_meter(meter: &Type) -> Expr {
    let v = param(&Type::i32(), "v");
    let made = Expr::new_object(&meter.constructors()[0], &[v.clone()]).unwrap();
    Expr::lambda_of(&made, &[v]).unwrap()
}

/// Reference type with the operator set that makes `&&` and `||` legal.
pub(super) fn tristate() -> Type {
    let b = TypeBuilder::class("Tri");
    let this = b.this();
    b.static_method("op_BitwiseAnd", vec![this.clone(), this.clone()], this.clone())
        .static_method("op_BitwiseOr", vec![this.clone(), this.clone()], this.clone())
        .static_method("op_True", vec![this.clone()], Type::bool())
        .static_method("op_False", vec![this.clone()], Type::bool())
        .build()
}

/// Class with a mix of fields, properties, an indexer and methods.
pub(super) fn person() -> Type {
    TypeBuilder::class("Person")
        .constructor(vec![])
        .constructor(vec![Type::string(), Type::i32()])
        .field("Name", Type::string())
        .readonly_field("Id", Type::i64())
        .static_field("Count", Type::i32())
        .property("Age", Type::i32())
        .readonly_property("Initials", Type::string())
        .writeonly_property("Secret", Type::string())
        .indexer("Item", vec![Type::i32()], Type::string())
        .method("Greet", vec![Type::string()], Type::string())
        .method("Greet", vec![Type::string(), Type::i32()], Type::string())
        .method("Wave", vec![], Type::void())
        .static_method("Create", vec![Type::string()], Type::object())
        .build()
}

/// Enumerable collection with `Add(int)`.
pub(super) fn int_bag() -> Type {
    TypeBuilder::class("IntBag")
        .implements(&Type::enumerable())
        .constructor(vec![])
        .method("Add", vec![Type::i32()], Type::void())
        .method("Remove", vec![Type::i32()], Type::bool())
        .build()
}
