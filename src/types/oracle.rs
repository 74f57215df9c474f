//! Type-compatibility oracle.
//!
//! Pure predicates over type descriptors: classification, assignability,
//! conversions, equality applicability and operator lookup by conventional
//! name. Nothing here constructs a node.

use super::{Method, Primitive, Type, TypeKind};

// ─── Classification ────────────────────────────────────────────────

fn primitive_of(ty: &Type) -> Option<Primitive> {
    ty.non_nullable().as_primitive()
}

/// Exact type equivalence.
pub fn are_equivalent(a: &Type, b: &Type) -> bool {
    a == b
}

pub fn is_bool(ty: &Type) -> bool {
    primitive_of(ty) == Some(Primitive::Bool)
}

/// Types with builtin arithmetic operators, after unwrapping `T?`.
pub fn is_arithmetic(ty: &Type) -> bool {
    use Primitive::*;
    matches!(
        primitive_of(ty),
        Some(I16 | U16 | I32 | U32 | I64 | U64 | F32 | F64)
    )
}

/// Arithmetic types plus `char`, `sbyte` and `byte`.
pub fn is_numeric(ty: &Type) -> bool {
    use Primitive::*;
    matches!(
        primitive_of(ty),
        Some(Char | I8 | U8 | I16 | U16 | I32 | U32 | I64 | U64 | F32 | F64)
    )
}

pub fn is_integer(ty: &Type) -> bool {
    use Primitive::*;
    matches!(
        primitive_of(ty),
        Some(I8 | U8 | I16 | U16 | I32 | U32 | I64 | U64)
    )
}

pub fn is_integer_or_bool(ty: &Type) -> bool {
    is_integer(ty) || is_bool(ty)
}

pub fn is_unsigned_int(ty: &Type) -> bool {
    use Primitive::*;
    matches!(primitive_of(ty), Some(U16 | U32 | U64))
}

pub fn is_unsigned(ty: &Type) -> bool {
    use Primitive::*;
    matches!(primitive_of(ty), Some(Char | U8 | U16 | U32 | U64))
}

pub fn is_floating_point(ty: &Type) -> bool {
    matches!(primitive_of(ty), Some(Primitive::F32 | Primitive::F64))
}

/// Scalar value types that take part in primitive conversions.
pub fn is_convertible(ty: &Type) -> bool {
    matches!(primitive_of(ty), Some(p) if p.is_value_type())
}

// ─── Assignability ─────────────────────────────────────────────────

fn implements(ty: &Type, interface: &Type) -> bool {
    ty.ancestry().any(|t| {
        t.interfaces()
            .iter()
            .any(|i| i == interface || implements(i, interface))
    })
}

/// True when a value of `src` can be stored where `dest` is expected
/// without a representation change (identity, subclassing, interface
/// implementation, array covariance, boxing to `object`).
pub fn is_assignable_from(dest: &Type, src: &Type) -> bool {
    if dest == src {
        return true;
    }
    if src.is_void() || dest.is_void() || src.is_by_ref() || dest.is_by_ref() {
        return false;
    }
    if let TypeKind::Nullable(inner) = dest.kind() {
        return inner == src;
    }
    if *dest == Type::object() {
        return true;
    }
    if src.ancestry().any(|t| t == *dest) {
        return true;
    }
    if dest.is_interface() && implements(src, dest) {
        return true;
    }
    match (dest.kind(), src.kind()) {
        (
            TypeKind::Array {
                element: de,
                rank: dr,
            },
            TypeKind::Array {
                element: se,
                rank: sr,
            },
        ) => dr == sr && !se.is_value_type() && !de.is_value_type() && is_assignable_from(de, se),
        (_, TypeKind::Array { .. }) => *dest == Type::enumerable(),
        _ => false,
    }
}

/// Assignability without boxing: equal types, or two reference types where
/// `dest` is assignable from `src`.
pub fn are_reference_assignable(dest: &Type, src: &Type) -> bool {
    if dest == src {
        return true;
    }
    !dest.is_value_type() && !src.is_value_type() && is_assignable_from(dest, src)
}

/// Whether a value of type `src` may stand where `dest` is declared, as a
/// method argument or assigned value.
pub fn parameter_is_assignable(param: &Type, src: &Type) -> bool {
    are_reference_assignable(&param.non_ref(), src)
}

// ─── Conversions ───────────────────────────────────────────────────

fn is_implicit_numeric_conversion(src: &Type, dest: &Type) -> bool {
    use Primitive::*;
    let (Some(s), Some(d)) = (src.as_primitive(), dest.as_primitive()) else {
        return false;
    };
    match s {
        I8 => matches!(d, I16 | I32 | I64 | F32 | F64),
        U8 => matches!(d, I16 | U16 | I32 | U32 | I64 | U64 | F32 | F64),
        I16 => matches!(d, I32 | I64 | F32 | F64),
        U16 => matches!(d, I32 | U32 | I64 | U64 | F32 | F64),
        I32 => matches!(d, I64 | F32 | F64),
        U32 => matches!(d, U64 | F32 | F64),
        I64 | U64 => matches!(d, F32 | F64),
        Char => matches!(d, U16 | I32 | U32 | I64 | U64 | F32 | F64),
        F32 => matches!(d, F64),
        _ => false,
    }
}

pub fn is_implicitly_convertible(src: &Type, dest: &Type) -> bool {
    if are_equivalent(src, dest) || is_implicit_numeric_conversion(src, dest) {
        return true;
    }
    // Reference and boxing conversions both reduce to assignability.
    if is_assignable_from(dest, src) {
        return true;
    }
    dest.is_nullable() && is_implicitly_convertible(&src.non_nullable(), &dest.non_nullable())
}

/// Conversions that need no operator method: identity, wrapping and
/// unwrapping `T?`, and primitive-to-primitive (except into `bool`).
pub fn has_identity_primitive_or_nullable_conversion(src: &Type, dest: &Type) -> bool {
    if are_equivalent(src, dest) {
        return true;
    }
    if src.is_nullable() && are_equivalent(dest, &src.non_nullable()) {
        return true;
    }
    if dest.is_nullable() && are_equivalent(src, &dest.non_nullable()) {
        return true;
    }
    is_convertible(src) && is_convertible(dest) && !is_bool(dest)
}

/// Explicit reference conversions: up or down casts, anything through an
/// interface or `object`.
pub fn has_reference_conversion(src: &Type, dest: &Type) -> bool {
    if src.is_void() || dest.is_void() {
        return false;
    }
    let nn_src = src.non_nullable();
    let nn_dest = dest.non_nullable();
    if is_assignable_from(&nn_src, &nn_dest) || is_assignable_from(&nn_dest, &nn_src) {
        return true;
    }
    if src.is_interface() || dest.is_interface() {
        return true;
    }
    *src == Type::object() || *dest == Type::object()
}

// ─── Equality ──────────────────────────────────────────────────────

pub fn has_builtin_equality_operator(left: &Type, right: &Type) -> bool {
    if left.is_interface() && !right.is_value_type() {
        return true;
    }
    if right.is_interface() && !left.is_value_type() {
        return true;
    }
    if !left.is_value_type()
        && !right.is_value_type()
        && (are_reference_assignable(left, right) || are_reference_assignable(right, left))
    {
        return true;
    }
    if !are_equivalent(left, right) {
        return false;
    }
    is_bool(left) || is_numeric(left)
}

/// Both sides are reference types that could denote the same object.
pub fn has_reference_equality(left: &Type, right: &Type) -> bool {
    if left.is_value_type() || right.is_value_type() {
        return false;
    }
    left.is_interface()
        || right.is_interface()
        || are_reference_assignable(left, right)
        || are_reference_assignable(right, left)
}

/// Can an instance of `instance` be the receiver of a member declared on
/// `declaring`?
pub fn is_valid_instance_type(declaring: &Type, instance: &Type) -> bool {
    if are_reference_assignable(declaring, instance) {
        return true;
    }
    if instance.is_value_type() {
        if *declaring == Type::object() {
            return true;
        }
        if declaring.is_interface() && implements(instance, declaring) {
            return true;
        }
    }
    false
}

// ─── Operator lookup ───────────────────────────────────────────────

/// A static method declared directly on `ty`, named exactly `name`, whose
/// parameters accept `args` without boxing.
pub fn find_static_method(ty: &Type, name: &str, args: &[Type]) -> Option<Method> {
    ty.methods()
        .iter()
        .find(|m| {
            m.is_static()
                && m.name() == name
                && m.params().len() == args.len()
                && m.params()
                    .iter()
                    .zip(args)
                    .all(|(p, a)| are_reference_assignable(p, a))
        })
        .cloned()
}

/// User-defined binary operator `name` declared on the unwrapped left type,
/// or on the unwrapped right type when the operand types differ.
pub fn get_user_defined_binary_method(name: &str, left: &Type, right: &Type) -> Option<Method> {
    let args = [left.clone(), right.clone()];
    find_static_method(&left.non_nullable(), name, &args).or_else(|| {
        if are_equivalent(left, right) {
            None
        } else {
            find_static_method(&right.non_nullable(), name, &args)
        }
    })
}

pub fn get_user_defined_unary_method(name: &str, operand: &Type) -> Option<Method> {
    find_static_method(&operand.non_nullable(), name, std::slice::from_ref(operand))
}

/// `op_True` or `op_False` taking `ty`, searched up the base chain.
pub fn get_boolean_operator(ty: &Type, name: &str) -> Option<Method> {
    ty.ancestry()
        .find_map(|t| find_static_method(&t, name, std::slice::from_ref(ty)))
}

fn find_conversion_operator(methods: &[Method], from: &Type, to: &Type) -> Option<Method> {
    methods
        .iter()
        .find(|m| {
            m.is_static()
                && (m.name() == "op_Implicit" || m.name() == "op_Explicit")
                && are_equivalent(m.return_type(), to)
                && m.params().len() == 1
                && are_equivalent(&m.params()[0], from)
        })
        .cloned()
}

/// `op_Implicit` / `op_Explicit` converting `from` into `to`, first exact on
/// either type and then over the unwrapped types.
pub fn get_user_defined_coercion_method(from: &Type, to: &Type) -> Option<Method> {
    let nn_from = from.non_nullable();
    let nn_to = to.non_nullable();
    let from_methods = nn_from.methods();
    let to_methods = nn_to.methods();
    if let Some(m) = find_conversion_operator(from_methods, from, to)
        .or_else(|| find_conversion_operator(to_methods, from, to))
    {
        return Some(m);
    }
    if are_equivalent(&nn_from, from) && are_equivalent(&nn_to, to) {
        return None;
    }
    find_conversion_operator(from_methods, &nn_from, &nn_to)
        .or_else(|| find_conversion_operator(to_methods, &nn_from, &nn_to))
        .or_else(|| find_conversion_operator(from_methods, &nn_from, to))
        .or_else(|| find_conversion_operator(to_methods, &nn_from, to))
}
