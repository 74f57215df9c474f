use super::*;
use crate::tree::{Expr, NodeType};
use crate::types::{Type, TypeBuilder};
use crate::visit::Unchanged;

fn param(ty: &Type, name: &str) -> Expr {
    Expr::parameter(ty, Some(name)).unwrap()
}

fn show(e: &Expr) -> String {
    format!("{:?}", e)
}

fn person() -> Type {
    TypeBuilder::class("Person")
        .constructor(vec![])
        .field("Name", Type::string())
        .property("Age", Type::i32())
        .build()
}

/// Counts call nodes.
#[derive(Default)]
struct Calls(usize);

impl Visitor for Calls {
    fn enter(&mut self, node: &Expr) -> Result<bool> {
        if node.node_type() == NodeType::Call {
            self.0 += 1;
        }
        Ok(true)
    }
}

fn count_calls(e: &Expr) -> usize {
    let mut calls = Calls::default();
    walk(&mut calls, e).unwrap();
    calls.0
}

#[test]
fn test_core_nodes_do_not_reduce() {
    let x = param(&Type::i32(), "x");
    let sum = Expr::add(&x, &Expr::constant(1)).unwrap();
    assert!(!sum.can_reduce());
    assert!(Expr::ptr_eq(&sum.reduce().unwrap(), &sum));
    assert_eq!(
        sum.reduce_and_check().unwrap_err(),
        Error::MustBeReducible(NodeType::Add)
    );
}

#[test]
fn test_op_assign_on_variable() {
    let x = param(&Type::i32(), "x");
    let y = param(&Type::i32(), "y");
    let node = Expr::add_assign(&x, &y).unwrap();
    assert!(node.can_reduce());
    let reduced = node.reduce_and_check().unwrap();
    assert_eq!(show(&reduced), "(Assign x (Add x y))");
}

#[test]
fn test_reduce_is_cached() {
    let x = param(&Type::i32(), "x");
    let node = Expr::multiply_assign(&x, &Expr::constant(2)).unwrap();
    let first = node.reduce().unwrap();
    let second = node.reduce().unwrap();
    assert!(Expr::ptr_eq(&first, &second));
}

#[test]
fn test_op_assign_on_member() {
    let p = param(&person(), "p");
    let age = Expr::property_named(&p, "Age").unwrap();
    let node = Expr::add_assign(&age, &Expr::constant(1)).unwrap();
    assert_eq!(
        show(&node.reduce().unwrap()),
        "(Block [$0 $1] (Assign $0 p) (Assign $1 (Add $0.Age 1)) (Assign $0.Age $1) $1)"
    );
}

#[test]
fn test_op_assign_on_array_element() {
    let arr = param(&Type::i32().array(), "arr");
    let i = param(&Type::i32(), "i");
    let slot = Expr::array_access(&arr, &[i]).unwrap();
    let node = Expr::subtract_assign(&slot, &Expr::constant(2)).unwrap();
    assert_eq!(
        show(&node.reduce().unwrap()),
        "(Block [$0 $1 $2] (Assign $0 arr) (Assign $1 i) (Assign $2 (Subtract $0[$1] 2)) \
         (Assign $0[$1] $2) $2)"
    );
}

/// Value type whose `+` with an int yields a bare int.
fn meter() -> Type {
    let b = TypeBuilder::structure("Meter");
    let this = b.this();
    b.constructor(vec![Type::i32()])
        .static_method("op_Addition", vec![this, Type::i32()], Type::i32())
        .build()
}

#[test]
fn test_op_assign_applies_conversion() {
    let ty = meter();
    let v = param(&Type::i32(), "v");
    let made = Expr::new_object(&ty.constructors()[0], &[v.clone()]).unwrap();
    let conv = Expr::lambda_of(&made, &[v]).unwrap();
    let one = Expr::constant(1);

    let m = param(&ty, "m");
    let node = Expr::op_assign(NodeType::AddAssign, &m, &one, None, Some(&conv)).unwrap();
    assert_eq!(
        show(&node.reduce_and_check().unwrap()),
        "(Assign m (Invoke (Lambda [v] (New Meter v)) (Add m 1)))"
    );

    let ruler = TypeBuilder::class("Ruler").property("Len", ty.clone()).build();
    let o = param(&ruler, "o");
    let len = Expr::property_named(&o, "Len").unwrap();
    let node = Expr::op_assign(NodeType::AddAssign, &len, &one, None, Some(&conv)).unwrap();
    let reduced = node.reduce_and_check().unwrap();
    assert_eq!(*reduced.ty(), ty);
    assert_eq!(
        show(&reduced),
        "(Block [$0 $1] (Assign $0 o) \
         (Assign $1 (Invoke (Lambda [v] (New Meter v)) (Add $0.Len 1))) \
         (Assign $0.Len $1) $1)"
    );
}

#[test]
fn test_op_assign_on_static_member_needs_no_temps() {
    let ty = TypeBuilder::class("Stats")
        .static_field("Count", Type::i32())
        .build();
    let count = Expr::static_field_named(&ty, "Count").unwrap();
    let node = Expr::add_assign(&count, &Expr::constant(1)).unwrap();
    assert_eq!(
        show(&node.reduce().unwrap()),
        "(Assign Stats.Count (Add Stats.Count 1))"
    );
}

#[test]
fn test_increments_on_variable() {
    let x = param(&Type::i32(), "x");
    let pre = Expr::pre_increment_assign(&x).unwrap();
    assert_eq!(show(&pre.reduce().unwrap()), "(Assign x (Increment x))");
    let post = Expr::post_decrement_assign(&x).unwrap();
    assert_eq!(
        show(&post.reduce().unwrap()),
        "(Block [$0] (Assign $0 x) (Assign x (Decrement $0)) $0)"
    );
}

#[test]
fn test_post_increment_evaluates_receiver_once() {
    let person = person();
    let factory = TypeBuilder::class("Factory")
        .static_method("Make", vec![], person)
        .build();
    let make = Expr::call_static_named(&factory, "Make", &[]).unwrap();
    let age = Expr::property_named(&make, "Age").unwrap();
    let node = Expr::post_increment_assign(&age).unwrap();
    let reduced = node.reduce_and_check().unwrap();
    assert_eq!(
        show(&reduced),
        "(Block [$0 $1] (Assign $0 (Call Factory.Make)) (Assign $1 $0.Age) \
         (Assign $0.Age (Increment $1)) $1)"
    );
    assert_eq!(count_calls(&reduced), 1);
    assert_eq!(*reduced.ty(), Type::i32());
}

#[test]
fn test_pre_increment_on_member() {
    let p = param(&person(), "p");
    let age = Expr::property_named(&p, "Age").unwrap();
    let node = Expr::pre_increment_assign(&age).unwrap();
    assert_eq!(
        show(&node.reduce().unwrap()),
        "(Block [$0] (Assign $0 p) (Assign $0.Age (Increment $0.Age)))"
    );
}

fn flag() -> Type {
    let b = TypeBuilder::structure("Flag");
    let this = b.this();
    b.static_method("op_BitwiseAnd", vec![this.clone(), this.clone()], this.clone())
        .static_method("op_BitwiseOr", vec![this.clone(), this.clone()], this.clone())
        .static_method("op_True", vec![this.clone()], Type::bool())
        .static_method("op_False", vec![this.clone()], Type::bool())
        .build()
}

#[test]
fn test_lifted_and_also_short_circuits() {
    let ty = flag().nullable();
    let a = param(&ty, "a");
    let b = param(&ty, "b");
    let node = Expr::and_also(&a, &b).unwrap();
    assert!(node.can_reduce());
    let reduced = node.reduce_and_check().unwrap();
    assert_eq!(
        show(&reduced),
        "(Block [$0] (Assign $0 a) (Conditional (NotEqual $0 null) \
         (Conditional (Call Flag.op_False (Convert $0 Flag)) $0 \
         (Block [$1] (Assign $1 b) (Conditional (NotEqual $1 null) \
         (Convert (Call Flag.op_BitwiseAnd (Convert $0 Flag) (Convert $1 Flag)) Flag?) null))) \
         null))"
    );
    assert_eq!(*reduced.ty(), ty);
}

#[test]
fn test_lifted_or_else_tests_op_true() {
    let ty = flag().nullable();
    let node = Expr::or_else(&param(&ty, "a"), &param(&ty, "b")).unwrap();
    let text = show(&node.reduce().unwrap());
    assert!(text.contains("(Call Flag.op_True (Convert $0 Flag))"));
    assert!(text.contains("Flag.op_BitwiseOr"));
}

#[test]
fn test_builtin_and_also_is_core() {
    let a = param(&Type::bool(), "a");
    let node = Expr::and_also(&a, &a).unwrap();
    assert!(!node.can_reduce());
}

#[test]
fn test_coalesce_with_conversion() {
    let n = param(&Type::i32().nullable(), "n");
    let v = param(&Type::i32(), "v");
    let widen = Expr::lambda_of(&Expr::convert(&v, &Type::i64(), None).unwrap(), &[v]).unwrap();
    let node = Expr::coalesce_with(&n, &Expr::constant(0i64), Some(&widen)).unwrap();
    assert!(node.can_reduce());
    let reduced = node.reduce_and_check().unwrap();
    assert_eq!(
        show(&reduced),
        "(Block [$0] (Assign $0 n) (Conditional (Equal $0 null) 0 \
         (Invoke (Lambda [v] (Convert v long)) (Convert $0 int))))"
    );
    assert_eq!(*reduced.ty(), Type::i64());
}

#[test]
fn test_type_equal_on_value_types() {
    let x = param(&Type::i32(), "x");
    let exact = Expr::type_equal(&x, &Type::i32()).unwrap();
    assert_eq!(show(&exact.reduce().unwrap()), "(Block x true)");
    let other = Expr::type_equal(&x, &Type::i64()).unwrap();
    assert_eq!(show(&other.reduce().unwrap()), "(Block x false)");

    let n = param(&Type::i32().nullable(), "n");
    let wrapped = Expr::type_equal(&n, &Type::i32()).unwrap();
    assert_eq!(show(&wrapped.reduce().unwrap()), "(NotEqual n null)");
}

#[test]
fn test_type_equal_on_references() {
    let person = person();
    let o = param(&Type::object(), "o");
    let node = Expr::type_equal(&o, &person).unwrap();
    assert_eq!(
        show(&node.reduce().unwrap()),
        "(AndAlso (NotEqual o null) (Equal (Call o.GetType) typeof(Person)))"
    );

    let text = Expr::type_equal(&Expr::constant("s"), &Type::string()).unwrap();
    assert_eq!(show(&text.reduce().unwrap()), "true");
}

#[test]
fn test_type_equal_spills_side_effects() {
    let factory = TypeBuilder::class("Factory")
        .static_method("Make", vec![], Type::object())
        .build();
    let make = Expr::call_static_named(&factory, "Make", &[]).unwrap();
    let node = Expr::type_equal(&make, &Type::string()).unwrap();
    let reduced = node.reduce().unwrap();
    assert_eq!(
        show(&reduced),
        "(Block [$0] (Assign $0 (Call Factory.Make)) \
         (AndAlso (NotEqual $0 null) (Equal (Call $0.GetType) typeof(string))))"
    );
    // One call to `Make`, one to `GetType`.
    assert_eq!(count_calls(&reduced), 2);
}

#[test]
fn test_member_init() {
    let ty = person();
    let new = Expr::new_default(&ty).unwrap();
    let name = ty.fields()[0].clone();
    let age = ty.properties()[0].clone();
    let node = Expr::member_init(
        &new,
        &[
            Expr::bind(&name.into(), &Expr::constant("a")).unwrap(),
            Expr::bind(&age.into(), &Expr::constant(3)).unwrap(),
        ],
    )
    .unwrap();
    let reduced = node.reduce_and_check().unwrap();
    assert_eq!(
        show(&reduced),
        "(Block [$0] (Assign $0 (New Person)) (Assign $0.Name \"a\") (Assign $0.Age 3) $0)"
    );
}

fn int_bag() -> Type {
    TypeBuilder::class("IntBag")
        .implements(&Type::enumerable())
        .constructor(vec![])
        .method("Add", vec![Type::i32()], Type::void())
        .build()
}

#[test]
fn test_list_init() {
    let bag = int_bag();
    let node = Expr::list_init_values(
        &Expr::new_default(&bag).unwrap(),
        &[Expr::constant(1), Expr::constant(2)],
    )
    .unwrap();
    assert_eq!(
        show(&node.reduce().unwrap()),
        "(Block [$0] (Assign $0 (New IntBag)) (Call $0.Add 1) (Call $0.Add 2) $0)"
    );
}

#[test]
fn test_nested_list_binding() {
    let bag = int_bag();
    let team = TypeBuilder::class("Team")
        .constructor(vec![])
        .readonly_property("Members", bag.clone())
        .build();
    let members = team.properties()[0].clone().into();
    let add = bag.methods()[0].clone();
    let binding = Expr::list_bind(
        &members,
        &[Expr::element_init(&add, &[Expr::constant(1)]).unwrap()],
    )
    .unwrap();
    let node = Expr::member_init(&Expr::new_default(&team).unwrap(), &[binding]).unwrap();
    assert_eq!(
        show(&node.reduce().unwrap()),
        "(Block [$0] (Assign $0 (New Team)) \
         (Block [$1] (Assign $1 $0.Members) (Call $1.Add 1) (Empty)) $0)"
    );
}

#[test]
fn test_reduce_fully_lowers_nested_nodes() {
    let x = param(&Type::i32(), "x");
    let p = param(&person(), "p");
    let age = Expr::property_named(&p, "Age").unwrap();
    let body = Expr::block(&[
        Expr::add_assign(&x, &Expr::constant(1)).unwrap(),
        Expr::post_increment_assign(&age).unwrap(),
    ])
    .unwrap();
    let f = Expr::lambda_of(&body, &[x, p]).unwrap();
    assert!(!is_fully_reduced(&f).unwrap());

    let lowered = reduce_fully(&f).unwrap();
    assert!(is_fully_reduced(&lowered).unwrap());
    assert_eq!(
        show(&lowered),
        "(Lambda [x p] (Block (Assign x (Add x 1)) \
         (Block [$0 $1] (Assign $0 p) (Assign $1 $0.Age) (Assign $0.Age (Increment $1)) $1)))"
    );
    // Already core: nothing changes.
    assert!(Expr::ptr_eq(&reduce_fully(&lowered).unwrap(), &lowered));
}

#[test]
fn test_reduce_fully_moves_deep_trees_to_a_fresh_stack() {
    let x = param(&Type::i32(), "x");
    let mut e = Expr::add_assign(&x, &Expr::constant(1)).unwrap();
    for _ in 0..300 {
        e = Expr::negate(&e).unwrap();
    }
    stack::with_max_depth(100, || {
        assert!(Unchanged.visit(&e).unwrap_err().is_stack_exhausted());
        let lowered = reduce_fully(&e).unwrap();
        assert!(!Expr::ptr_eq(&lowered, &e));
        assert!(is_fully_reduced(&lowered).unwrap());
    });
}
