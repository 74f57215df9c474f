use super::*;
use crate::error::Error;
use crate::tree::{NodeType, SymbolDocument, Value};

// ─── Leaves ────────────────────────────────────────────────────────

#[test]
fn test_constant_types() {
    assert_eq!(*int(1).ty(), Type::i32());
    assert_eq!(*Expr::constant("hi").ty(), Type::string());
    assert_eq!(*Expr::constant(Value::Null).ty(), Type::object());
    assert_eq!(
        *Expr::constant(Value::Type(Type::f64())).ty(),
        Type::type_handle()
    );
}

#[test]
fn test_constant_typed_checks_value() {
    let boxed = Expr::constant_typed(5, &Type::object()).unwrap();
    assert_eq!(*boxed.ty(), Type::object());
    assert!(matches!(
        Expr::constant_typed("x", &Type::i32()),
        Err(Error::ConstantTypeMismatch { .. })
    ));
    assert!(Expr::null(&Type::i32()).is_err());
    assert!(Expr::null(&Type::i32().nullable()).is_ok());
    assert!(Expr::null(&Type::string()).is_ok());
}

#[test]
fn test_parameter_by_ref_and_void() {
    let p = Expr::parameter(&Type::i32().by_ref(), Some("x")).unwrap();
    assert_eq!(*p.ty(), Type::i32());
    assert!(p.as_parameter().unwrap().is_by_ref);
    assert_eq!(
        Expr::parameter(&Type::void(), None).unwrap_err(),
        Error::ArgumentCannotBeOfTypeVoid
    );
    assert!(matches!(
        Expr::variable(&Type::i32().by_ref(), Some("v")),
        Err(Error::TypeMustNotBeByRef(_))
    ));
}

#[test]
fn test_parameters_are_distinct_by_identity() {
    let a = param(&Type::i32(), "x");
    let b = param(&Type::i32(), "x");
    assert_ne!(a, b);
    assert_eq!(a, a.clone());
}

// ─── Binary ────────────────────────────────────────────────────────

#[test]
fn test_builtin_arithmetic() {
    let sum = Expr::add(&int(1), &int(2)).unwrap();
    assert_eq!(sum.node_type(), NodeType::Add);
    assert_eq!(*sum.ty(), Type::i32());
    assert!(sum.as_binary().unwrap().method.is_none());
    assert!(!sum.is_lifted());
}

#[test]
fn test_mismatched_arithmetic_is_undefined() {
    let err = Expr::add(&int(1), &Expr::constant(2i64)).unwrap_err();
    assert!(matches!(
        err,
        Error::BinaryOperatorNotDefined {
            op: NodeType::Add,
            ..
        }
    ));
    assert_eq!(
        err.to_string(),
        "the binary operator Add is not defined for the types 'int' and 'long'"
    );
}

#[test]
fn test_nullable_arithmetic_is_lifted() {
    let n = Type::i32().nullable();
    let sum = Expr::add(&param(&n, "a"), &param(&n, "b")).unwrap();
    assert_eq!(*sum.ty(), n);
    assert!(sum.is_lifted());
    assert!(sum.is_lifted_to_null());
}

#[test]
fn test_power_is_builtin_only_for_double() {
    let d = Expr::constant(2.0);
    assert_eq!(*Expr::power(&d, &d).unwrap().ty(), Type::f64());
    assert!(Expr::power(&int(2), &int(3)).is_err());
}

#[test]
fn test_shift_result_type() {
    let l = param(&Type::i64(), "l");
    let r = param(&Type::i32().nullable(), "r");
    let shifted = Expr::left_shift(&l, &r).unwrap();
    assert_eq!(*shifted.ty(), Type::i64().nullable());
    assert!(Expr::left_shift(&l, &Expr::constant(1i64)).is_err());
}

#[test]
fn test_user_defined_binary_operator() {
    let m = money();
    let a = param(&m, "a");
    let b = param(&m, "b");
    let sum = Expr::add(&a, &b).unwrap();
    assert_eq!(*sum.ty(), m);
    assert_eq!(sum.as_binary().unwrap().method.as_ref().unwrap().name(), "op_Addition");

    let less = Expr::less_than(&a, &b).unwrap();
    assert_eq!(*less.ty(), Type::bool());
}

#[test]
fn test_user_defined_operator_lifts_over_nullables() {
    let n = money().nullable();
    let sum = Expr::add(&param(&n, "a"), &param(&n, "b")).unwrap();
    assert_eq!(*sum.ty(), n);
    assert!(sum.is_lifted());
}

#[test]
fn test_equality_lift_to_null() {
    let n = Type::i32().nullable();
    let (a, b) = (param(&n, "a"), param(&n, "b"));
    assert_eq!(*Expr::equal(&a, &b).unwrap().ty(), Type::bool());
    let lifted = Expr::comparison(NodeType::Equal, &a, &b, true, None).unwrap();
    assert_eq!(*lifted.ty(), Type::bool().nullable());
}

#[test]
fn test_reference_equality() {
    let s = param(&Type::string(), "s");
    let t = param(&Type::string(), "t");
    let eq = Expr::equal(&s, &t).unwrap();
    assert!(eq.is_reference_comparison());
    assert!(Expr::reference_equal(&s, &t).is_ok());
    assert!(matches!(
        Expr::reference_equal(&int(1), &int(2)),
        Err(Error::ReferenceEqualityNotDefined { .. })
    ));
}

#[test]
fn test_nullable_compared_with_null() {
    let n = param(&Type::i32().nullable(), "n");
    let eq = Expr::equal(&n, &Expr::constant(Value::Null)).unwrap();
    assert_eq!(*eq.ty(), Type::bool());
}

#[test]
fn test_conditional_logic() {
    let t = Expr::constant(true);
    assert_eq!(*Expr::and_also(&t, &t).unwrap().ty(), Type::bool());
    assert!(Expr::or_else(&int(1), &int(0)).is_err());

    let tri = tristate();
    let (a, b) = (param(&tri, "a"), param(&tri, "b"));
    let both = Expr::and_also(&a, &b).unwrap();
    assert_eq!(*both.ty(), tri);
    assert_eq!(
        both.as_binary().unwrap().method.as_ref().unwrap().name(),
        "op_BitwiseAnd"
    );
}

#[test]
fn test_conditional_logic_requires_true_false_operators() {
    let b = TypeBuilder::class("Half");
    let this = b.this();
    let half = b
        .static_method("op_BitwiseOr", vec![this.clone(), this.clone()], this.clone())
        .build();
    let (x, y) = (param(&half, "x"), param(&half, "y"));
    assert!(matches!(
        Expr::or_else(&x, &y),
        Err(Error::LogicalOperatorMustHaveBooleanOperators { .. })
    ));
}

#[test]
fn test_coalesce_typing_ladder() {
    let n = param(&Type::i32().nullable(), "n");
    assert_eq!(*Expr::coalesce(&n, &int(0)).unwrap().ty(), Type::i32());

    let s = param(&Type::string(), "s");
    assert_eq!(
        *Expr::coalesce(&s, &Expr::constant("")).unwrap().ty(),
        Type::string()
    );

    let o = param(&Type::object(), "o");
    assert_eq!(*Expr::coalesce(&s, &o).unwrap().ty(), Type::object());

    assert!(matches!(
        Expr::coalesce(&int(1), &int(2)),
        Err(Error::CoalesceUsedOnNonNullType(_))
    ));
    assert_eq!(
        Expr::coalesce(&n, &s).unwrap_err(),
        Error::ArgumentTypesMustMatch
    );
}

#[test]
fn test_coalesce_with_conversion() {
    let n = param(&Type::i32().nullable(), "n");
    let x = param(&Type::i32(), "x");
    let to_string = Expr::lambda_of(&Expr::constant("num"), &[x]).unwrap();
    let c = Expr::coalesce_with(&n, &Expr::constant("none"), Some(&to_string)).unwrap();
    assert_eq!(*c.ty(), Type::string());
    assert!(matches!(
        Expr::coalesce_with(&n, &Expr::constant("none"), Some(&int(1))),
        Err(Error::ArgumentMustBeLambda(NodeType::Constant))
    ));
}

#[test]
fn test_assignment_rules() {
    let x = param(&Type::i32(), "x");
    assert_eq!(*Expr::assign(&x, &int(1)).unwrap().ty(), Type::i32());
    assert_eq!(
        Expr::assign(&int(1), &int(2)).unwrap_err(),
        Error::ExpressionMustBeWritable
    );
    assert!(matches!(
        Expr::assign(&x, &Expr::constant("s")),
        Err(Error::ExpressionTypeDoesNotMatchAssignment { .. })
    ));
}

#[test]
fn test_compound_assignment() {
    let x = param(&Type::i32(), "x");
    let add = Expr::add_assign(&x, &int(1)).unwrap();
    assert_eq!(add.node_type(), NodeType::AddAssign);
    assert_eq!(*add.ty(), Type::i32());

    let y = param(&Type::i32(), "y");
    let conv = Expr::lambda_of(&y, &[y.clone()]).unwrap();
    assert_eq!(
        Expr::op_assign(NodeType::AddAssign, &x, &int(1), None, Some(&conv)).unwrap_err(),
        Error::ConversionIsNotSupportedForArithmeticTypes
    );
}

#[test]
fn test_compound_assignment_with_conversion() {
    let ty = meter();
    let m = param(&ty, "m");
    assert!(matches!(
        Expr::add_assign(&m, &int(1)),
        Err(Error::UserDefinedOpMustHaveValidReturnType {
            op: NodeType::AddAssign,
            ..
        })
    ));

    let conv = to_meter(&ty);
    let node = Expr::op_assign(NodeType::AddAssign, &m, &int(1), None, Some(&conv)).unwrap();
    assert_eq!(*node.ty(), ty);
    let b = node.as_binary().unwrap();
    assert!(b.conversion.as_ref().is_some_and(|c| Expr::ptr_eq(c, &conv)));
    assert_eq!(b.method.as_ref().map(|m| m.name()), Some("op_Addition"));

    let s = param(&Type::string(), "s");
    let from_string = Expr::lambda_of(&Expr::new_default(&ty).unwrap(), &[s]).unwrap();
    assert_eq!(
        Expr::op_assign(NodeType::AddAssign, &m, &int(1), None, Some(&from_string)).unwrap_err(),
        Error::OverloadOperatorTypeDoesNotMatchConversionType {
            op: NodeType::AddAssign,
            method: "conversion".to_string(),
        }
    );

    let v = param(&Type::i32(), "v");
    let to_int = Expr::lambda_of(&v, &[v.clone()]).unwrap();
    assert_eq!(
        Expr::op_assign(NodeType::AddAssign, &m, &int(1), None, Some(&to_int)).unwrap_err(),
        Error::OperandTypesDoNotMatchParameters {
            op: NodeType::AddAssign,
            method: "conversion".to_string(),
        }
    );
}

#[test]
fn test_array_index() {
    let arr = param(&Type::string().array(), "arr");
    assert_eq!(*Expr::array_index(&arr, &int(0)).unwrap().ty(), Type::string());
    assert!(matches!(
        Expr::array_index(&arr, &Expr::constant(0i64)),
        Err(Error::ArgumentMustBeArrayIndexType(_))
    ));
    let grid = param(&Type::i32().array_of_rank(2), "grid");
    assert!(matches!(
        Expr::array_index(&grid, &int(0)),
        Err(Error::IncorrectNumberOfIndexes { rank: 2 })
    ));
}

// ─── Unary ─────────────────────────────────────────────────────────

#[test]
fn test_unary_operators() {
    assert_eq!(*Expr::negate(&int(1)).unwrap().ty(), Type::i32());
    assert_eq!(*Expr::not(&Expr::constant(true)).unwrap().ty(), Type::bool());
    assert_eq!(*Expr::not(&int(1)).unwrap().ty(), Type::i32());
    assert!(matches!(
        Expr::negate(&Expr::constant("s")),
        Err(Error::UnaryOperatorNotDefined { .. })
    ));
    let m = money();
    let neg = Expr::negate(&param(&m, "m")).unwrap();
    assert_eq!(neg.as_unary().unwrap().method.as_ref().unwrap().name(), "op_UnaryNegation");
}

#[test]
fn test_conversions() {
    let widened = Expr::convert(&int(1), &Type::i64(), None).unwrap();
    assert!(widened.as_unary().unwrap().method.is_none());

    let m = money();
    let user = Expr::convert(&int(1), &m, None).unwrap();
    assert_eq!(user.as_unary().unwrap().method.as_ref().unwrap().name(), "op_Implicit");

    assert!(matches!(
        Expr::convert(&Expr::constant("1"), &Type::i32(), None),
        Err(Error::CoercionOperatorNotDefined { .. })
    ));
}

#[test]
fn test_type_as_and_unbox() {
    let o = param(&Type::object(), "o");
    assert!(Expr::type_as(&o, &Type::string()).is_ok());
    assert!(matches!(
        Expr::type_as(&o, &Type::i32()),
        Err(Error::IncorrectTypeForTypeAs(_))
    ));
    assert_eq!(*Expr::unbox(&o, &Type::i32()).unwrap().ty(), Type::i32());
    assert!(matches!(
        Expr::unbox(&param(&Type::string(), "s"), &Type::i32()),
        Err(Error::InvalidUnboxType { .. })
    ));
}

#[test]
fn test_increment_assign_needs_writable_operand() {
    let x = param(&Type::i32(), "x");
    let post = Expr::post_increment_assign(&x).unwrap();
    assert_eq!(post.node_type(), NodeType::PostIncrementAssign);
    assert_eq!(
        Expr::pre_decrement_assign(&int(1)).unwrap_err(),
        Error::ExpressionMustBeWritable
    );
}

#[test]
fn test_throw_and_array_length() {
    let ex = param(&Type::object(), "ex");
    let t = Expr::throw(Some(&ex), &Type::i32()).unwrap();
    assert_eq!(*t.ty(), Type::i32());
    assert!(matches!(
        Expr::throw(Some(&int(1)), &Type::void()),
        Err(Error::ArgumentMustNotHaveValueType(_))
    ));
    assert_eq!(*Expr::rethrow().ty(), Type::void());

    let grid = param(&Type::i32().array_of_rank(2), "grid");
    assert!(matches!(
        Expr::array_length(&grid),
        Err(Error::ArgumentMustBeSingleDimensionalArray(_))
    ));
}

#[test]
fn test_type_tests_are_boolean() {
    let o = param(&Type::object(), "o");
    assert_eq!(*Expr::type_is(&o, &Type::string()).unwrap().ty(), Type::bool());
    let eq = Expr::type_equal(&o, &Type::string()).unwrap();
    assert_eq!(eq.node_type(), NodeType::TypeEqual);
}

// ─── Control flow ──────────────────────────────────────────────────

#[test]
fn test_condition_rules() {
    let t = Expr::constant(true);
    let c = Expr::condition(&t, &int(1), &int(2)).unwrap();
    assert_eq!(*c.ty(), Type::i32());
    assert!(matches!(
        Expr::condition(&int(1), &int(1), &int(2)),
        Err(Error::ArgumentMustBeBoolean(_))
    ));
    assert_eq!(
        Expr::condition(&t, &int(1), &Expr::constant("x")).unwrap_err(),
        Error::ArgumentTypesMustMatch
    );
    let v = Expr::condition_typed(&t, &int(1), &Expr::constant("x"), &Type::void()).unwrap();
    assert!(v.ty().is_void());
}

#[test]
fn test_block_type_and_variables() {
    let v = Expr::variable(&Type::i32(), Some("v")).unwrap();
    let b = Expr::block_with(&[v.clone()], &[Expr::assign(&v, &int(1)).unwrap(), v.clone()]).unwrap();
    assert_eq!(*b.ty(), Type::i32());
    assert_eq!(Expr::block(&[]).unwrap_err(), Error::EmptyBlock);
    assert!(matches!(
        Expr::block_with(&[v.clone(), v.clone()], &[v.clone()]),
        Err(Error::DuplicateVariable(_))
    ));
    let typed = Expr::block_typed(&Type::object(), &[], &[Expr::constant("s")]).unwrap();
    assert_eq!(*typed.ty(), Type::object());
}

#[test]
fn test_goto_and_label_types() {
    let l = Expr::label_target(&Type::i32(), Some("done")).unwrap();
    assert!(Expr::return_to(&l, Some(&int(1))).is_ok());
    assert!(matches!(
        Expr::return_to(&l, Some(&Expr::constant("x"))),
        Err(Error::ExpressionTypeDoesNotMatchLabel { .. })
    ));
    assert!(matches!(
        Expr::goto(&l),
        Err(Error::LabelMustBeVoidOrHaveExpression(_))
    ));
    let lab = Expr::label(&l, Some(&int(0))).unwrap();
    assert_eq!(*lab.ty(), Type::i32());

    let cont = Expr::label_target(&Type::i32(), None).unwrap();
    assert_eq!(
        Expr::make_loop(&Expr::empty(), None, Some(&cont)).unwrap_err(),
        Error::LabelTypeMustBeVoid
    );
}

#[test]
fn test_switch_rules() {
    let x = param(&Type::i32(), "x");
    assert_eq!(
        Expr::switch_case(&int(1), &[]).unwrap_err(),
        Error::SwitchCaseWithoutTestValues
    );
    let one = Expr::switch_case(&Expr::constant("one"), &[int(1)]).unwrap();
    let two = Expr::switch_case(&Expr::constant("two"), &[int(2), int(3)]).unwrap();
    let s = Expr::switch(
        None,
        &x,
        Some(&Expr::constant("many")),
        None,
        &[one.clone(), two],
    )
    .unwrap();
    assert_eq!(*s.ty(), Type::string());

    assert!(matches!(
        Expr::switch(None, &x, None, None, &[one.clone()]),
        Err(Error::DefaultBodyMustBeSupplied(_))
    ));
    let mixed = Expr::switch_case(&Expr::constant("m"), &[Expr::constant(1i64)]).unwrap();
    assert_eq!(
        Expr::switch(None, &x, Some(&Expr::constant("d")), None, &[one, mixed]).unwrap_err(),
        Error::AllTestValuesMustHaveSameType
    );
}

#[test]
fn test_try_rules() {
    let body = int(1);
    assert_eq!(
        Expr::make_try(None, &body, None, None, &[]).unwrap_err(),
        Error::TryMustHaveCatchFinallyOrFault
    );
    let ex = param(&Type::object(), "ex");
    let handler = Expr::catch(&Type::object(), Some(&ex), &int(0), None).unwrap();
    let t = Expr::try_catch(&body, &[handler.clone()]).unwrap();
    assert_eq!(*t.ty(), Type::i32());
    assert_eq!(
        Expr::make_try(None, &body, None, Some(&Expr::empty()), &[handler]).unwrap_err(),
        Error::FaultCannotHaveCatchOrFinally
    );
    let mismatched = Expr::catch(&Type::object(), None, &Expr::constant("s"), None).unwrap();
    assert_eq!(
        Expr::try_catch(&body, &[mismatched]).unwrap_err(),
        Error::BodyOfCatchMustHaveSameTypeAsBodyOfTry
    );
    assert!(matches!(
        Expr::catch(&Type::string(), Some(&ex), &int(0), None),
        Err(Error::CatchVariableTypeMismatch { .. })
    ));
}

#[test]
fn test_debug_info_ranges() {
    let doc = SymbolDocument::new("a.src");
    assert!(Expr::debug_info(&doc, 1, 1, 1, 5).is_ok());
    assert!(matches!(
        Expr::debug_info(&doc, 0, 1, 1, 1),
        Err(Error::DebugInfoOutOfRange { what: "start line", .. })
    ));
    assert_eq!(
        Expr::debug_info(&doc, 3, 1, 2, 1).unwrap_err(),
        Error::StartEndMustBeOrdered
    );
    assert!(Expr::clear_debug_info(&doc).ty().is_void());
}
