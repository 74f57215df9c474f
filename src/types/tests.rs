use super::*;

fn money() -> Type {
    let b = TypeBuilder::structure("Money");
    let this = b.this();
    b.static_method("op_Addition", vec![this.clone(), this.clone()], this.clone())
        .static_method("op_Implicit", vec![Type::i32()], this.clone())
        .build()
}

#[test]
fn test_primitive_singletons() {
    assert!(Type::ptr_eq(&Type::i32(), &Type::i32()));
    assert_eq!(Type::i32(), Type::primitive(Primitive::I32));
    assert_ne!(Type::i32(), Type::i64());
}

#[test]
fn test_constructed_types_compare_structurally() {
    assert_eq!(Type::i32().nullable(), Type::i32().nullable());
    assert_eq!(Type::string().array(), Type::string().array());
    assert_ne!(Type::string().array(), Type::string().array_of_rank(2));
    let d1 = Type::delegate(vec![Type::i32()], Type::bool());
    let d2 = Type::delegate(vec![Type::i32()], Type::bool());
    assert_eq!(d1, d2);
    // Reference types and nullables do not wrap again.
    assert_eq!(Type::string().nullable(), Type::string());
    let n = Type::i32().nullable();
    assert_eq!(n.nullable(), n);
}

#[test]
fn test_nominal_types_compare_by_identity() {
    let a = TypeBuilder::class("Point").build();
    let b = TypeBuilder::class("Point").build();
    assert_ne!(a, b);
    assert_eq!(a, a.clone());
}

#[test]
fn test_display_names() {
    assert_eq!(Type::i32().to_string(), "int");
    assert_eq!(Type::u8().to_string(), "byte");
    assert_eq!(Type::i32().nullable().to_string(), "int?");
    assert_eq!(Type::f64().array_of_rank(2).to_string(), "double[,]");
    assert_eq!(
        Type::delegate(vec![Type::i32(), Type::string()], Type::void()).to_string(),
        "fn(int, string) -> void"
    );
    assert_eq!(Type::i32().by_ref().to_string(), "ref int");
}

#[test]
fn test_classification() {
    assert!(is_arithmetic(&Type::i32()));
    assert!(is_arithmetic(&Type::f64().nullable()));
    assert!(!is_arithmetic(&Type::u8()));
    assert!(is_numeric(&Type::u8()));
    assert!(is_numeric(&Type::char()));
    assert!(!is_numeric(&Type::bool()));
    assert!(is_integer(&Type::i8()));
    assert!(!is_integer(&Type::char()));
    assert!(is_integer_or_bool(&Type::bool()));
    assert!(is_unsigned_int(&Type::u64()));
    assert!(!is_unsigned_int(&Type::u8()));
    assert!(is_convertible(&Type::char()));
    assert!(!is_convertible(&Type::string()));
}

#[test]
fn test_reference_assignability() {
    let animal = TypeBuilder::class("Animal").build();
    let dog = TypeBuilder::class("Dog").extends(&animal).build();
    assert!(are_reference_assignable(&animal, &dog));
    assert!(!are_reference_assignable(&dog, &animal));
    assert!(are_reference_assignable(&Type::object(), &dog));
    // Boxing is not a reference conversion.
    assert!(!are_reference_assignable(&Type::object(), &Type::i32()));
    assert!(is_assignable_from(&Type::object(), &Type::i32()));
}

#[test]
fn test_interface_implementation() {
    let shape = TypeBuilder::interface("IShape").build();
    let base = TypeBuilder::class("Base").implements(&shape).build();
    let derived = TypeBuilder::class("Derived").extends(&base).build();
    assert!(is_assignable_from(&shape, &derived));
    assert!(has_reference_equality(&shape, &Type::string()));
}

#[test]
fn test_array_covariance() {
    let animal = TypeBuilder::class("Animal").build();
    let dog = TypeBuilder::class("Dog").extends(&animal).build();
    assert!(is_assignable_from(&animal.array(), &dog.array()));
    assert!(!is_assignable_from(&Type::i64().array(), &Type::i32().array()));
    assert!(is_assignable_from(&Type::enumerable(), &Type::i32().array()));
}

#[test]
fn test_implicit_conversions() {
    assert!(is_implicitly_convertible(&Type::i32(), &Type::i64()));
    assert!(is_implicitly_convertible(&Type::i32(), &Type::f64()));
    assert!(!is_implicitly_convertible(&Type::i64(), &Type::i32()));
    assert!(is_implicitly_convertible(&Type::i32(), &Type::i32().nullable()));
    assert!(is_implicitly_convertible(&Type::i32(), &Type::i64().nullable()));
    assert!(!is_implicitly_convertible(&Type::i32().nullable(), &Type::i32()));
    assert!(is_implicitly_convertible(&Type::i32(), &Type::object()));
}

#[test]
fn test_primitive_conversions_exclude_bool_target() {
    assert!(has_identity_primitive_or_nullable_conversion(&Type::i32(), &Type::u8()));
    assert!(has_identity_primitive_or_nullable_conversion(&Type::i32().nullable(), &Type::i32()));
    assert!(!has_identity_primitive_or_nullable_conversion(&Type::i32(), &Type::bool()));
    assert!(!has_identity_primitive_or_nullable_conversion(&Type::string(), &Type::i32()));
}

#[test]
fn test_reference_conversion() {
    let animal = TypeBuilder::class("Animal").build();
    let dog = TypeBuilder::class("Dog").extends(&animal).build();
    assert!(has_reference_conversion(&animal, &dog));
    assert!(has_reference_conversion(&Type::object(), &Type::i32()));
    assert!(!has_reference_conversion(&Type::string(), &dog));
}

#[test]
fn test_builtin_equality() {
    assert!(has_builtin_equality_operator(&Type::i32(), &Type::i32()));
    assert!(has_builtin_equality_operator(&Type::string(), &Type::object()));
    assert!(!has_builtin_equality_operator(&Type::i32(), &Type::i64()));
    let point = TypeBuilder::structure("Point").build();
    assert!(!has_builtin_equality_operator(&point, &point));
}

#[test]
fn test_instance_validity() {
    let shape = TypeBuilder::interface("IShape").build();
    let square = TypeBuilder::structure("Square").implements(&shape).build();
    assert!(is_valid_instance_type(&shape, &square));
    assert!(is_valid_instance_type(&Type::object(), &Type::i32()));
    assert!(!is_valid_instance_type(&Type::string(), &Type::i32()));
}

#[test]
fn test_user_defined_operator_lookup() {
    let m = money();
    let add = get_user_defined_binary_method("op_Addition", &m, &m);
    assert!(add.is_some());
    assert_eq!(add.as_ref().map(|a| a.name()), Some("op_Addition"));
    assert!(get_user_defined_binary_method("op_Subtraction", &m, &m).is_none());
    // Nullable operands do not match without lifting.
    let nm = m.nullable();
    assert!(get_user_defined_binary_method("op_Addition", &nm, &nm).is_none());
}

#[test]
fn test_coercion_lookup_lifts() {
    let m = money();
    assert!(get_user_defined_coercion_method(&Type::i32(), &m).is_some());
    assert!(get_user_defined_coercion_method(&Type::i32().nullable(), &m.nullable()).is_some());
    assert!(get_user_defined_coercion_method(&Type::i64(), &m).is_none());
}

#[test]
fn test_boolean_operator_walks_bases() {
    let b = TypeBuilder::class("Flag");
    let this = b.this();
    let flag = b
        .static_method("op_True", vec![this.clone()], Type::bool())
        .static_method("op_False", vec![this.clone()], Type::bool())
        .build();
    let sub = TypeBuilder::class("SubFlag").extends(&flag).build();
    assert!(get_boolean_operator(&flag, "op_True").is_some());
    assert!(get_boolean_operator(&sub, "op_False").is_some());
    assert!(get_boolean_operator(&Type::string(), "op_True").is_none());
}

#[test]
fn test_object_exposes_get_type() {
    let get_type = Type::object()
        .methods()
        .iter()
        .find(|m| m.name() == "GetType")
        .cloned();
    assert_eq!(
        get_type.map(|m| m.return_type().clone()),
        Some(Type::type_handle())
    );
}
