use super::*;
use crate::stack;
use crate::types::{Type, TypeBuilder};

fn param(ty: &Type, name: &str) -> Expr {
    Expr::parameter(ty, Some(name)).unwrap()
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_handles_are_thread_safe() {
    assert_send_sync::<Expr>();
    assert_send_sync::<Type>();
    assert_send_sync::<NodeList<Expr>>();
    assert_send_sync::<LabelTarget>();
}

#[test]
fn test_node_list_identity() {
    let a = Expr::constant(1);
    let b = Expr::constant(1);
    let list: ExprList = vec![a.clone(), b.clone()].into();
    assert!(list.same_items(&[a.clone(), b.clone()]));
    assert!(!list.same_items(&[a.clone(), Expr::constant(1)]));
    assert!(!list.same_items(&[a]));
    assert!(list.ptr_eq(&list.clone()));
    assert_eq!(list.len(), 2);
}

#[test]
#[should_panic]
fn test_node_list_index_out_of_range_panics() {
    let list: ExprList = vec![Expr::constant(1)].into();
    let _ = &list[1];
}

#[test]
fn test_argument_provider() {
    let ty = TypeBuilder::class("Calc")
        .method("Sum", vec![Type::i32(), Type::i32()], Type::i32())
        .build();
    let c = param(&ty, "c");
    let call = Expr::call_named(&c, "Sum", &[Expr::constant(1), Expr::constant(2)]).unwrap();
    let args = call.as_argument_provider().unwrap();
    assert_eq!(args.argument_count(), 2);
    assert_eq!(args.argument(1).as_constant(), Some(&Value::I32(2)));
    assert!(Expr::constant(1).as_argument_provider().is_none());
}

#[test]
#[should_panic]
fn test_argument_out_of_range_panics() {
    let f = param(&Type::delegate(vec![Type::i32()], Type::i32()), "f");
    let call = Expr::invoke(&f, &[Expr::constant(1)]).unwrap();
    call.as_argument_provider().unwrap().argument(1);
}

#[test]
fn test_node_types() {
    let p = TypeBuilder::class("P").field("X", Type::i32()).build();
    let x = Expr::field_named(&param(&p, "p"), "X").unwrap();
    assert_eq!(x.node_type(), NodeType::MemberAccess);
    assert_eq!(Expr::empty().node_type(), NodeType::Default);
    assert_eq!(
        Expr::array_length(&param(&Type::i32().array(), "a"))
            .unwrap()
            .node_type(),
        NodeType::ArrayLength
    );
}

#[test]
fn test_value_equality() {
    assert_eq!(Value::F64(f64::NAN), Value::F64(f64::NAN));
    assert_ne!(Value::F64(0.0), Value::F64(-0.0));
    assert_eq!(Value::from("a"), Value::from("a"));
    assert_ne!(Value::I32(1), Value::I64(1));
}

#[test]
fn test_lifted_conversion() {
    let x = param(&Type::i32(), "x");
    let widened = Expr::convert(&x, &Type::i32().nullable(), None).unwrap();
    assert!(widened.is_lifted());
    let plain = Expr::convert(&x, &Type::i64(), None).unwrap();
    assert!(!plain.is_lifted());
}

#[test]
fn test_debug_rendering() {
    let x = param(&Type::i32(), "x");
    let y = param(&Type::i32(), "y");
    let sum = Expr::add(&x, &y).unwrap();
    assert_eq!(format!("{:?}", sum), "(Add x y)");

    let f = Expr::lambda_of(&sum, &[x.clone(), y]).unwrap();
    assert_eq!(format!("{:?}", f), "(Lambda [x y] (Add x y))");

    let widened = Expr::convert(&x, &Type::i64(), None).unwrap();
    assert_eq!(format!("{:?}", widened), "(Convert x long)");

    let done = Expr::label_target(&Type::i32(), Some("done")).unwrap();
    let ret = Expr::return_to(&done, Some(&Expr::constant(1))).unwrap();
    assert_eq!(format!("{:?}", ret), "(Return label done 1)");
}

#[test]
fn test_debug_numbers_unnamed_parameters() {
    let t = Expr::temp(&Type::i32());
    let u = Expr::temp(&Type::i32());
    let block = Expr::block_with(
        &[t.clone(), u.clone()],
        &[
            Expr::assign(&u, &Expr::constant(2)).unwrap(),
            Expr::assign(&t, &u).unwrap(),
            t,
        ],
    )
    .unwrap();
    assert_eq!(
        format!("{:?}", block),
        "(Block [$0 $1] (Assign $1 2) (Assign $0 $1) $0)"
    );
}

#[test]
fn test_debug_members_and_calls() {
    let ty = TypeBuilder::class("Person")
        .field("Name", Type::string())
        .static_field("Count", Type::i32())
        .method("Greet", vec![Type::string()], Type::string())
        .build();
    let p = param(&ty, "p");
    let name = Expr::field_named(&p, "Name").unwrap();
    assert_eq!(format!("{:?}", name), "p.Name");
    let count = Expr::static_field_named(&ty, "Count").unwrap();
    assert_eq!(format!("{:?}", count), "Person.Count");
    let greet = Expr::call_named(&p, "Greet", &[Expr::constant("hi")]).unwrap();
    assert_eq!(format!("{:?}", greet), "(Call p.Greet \"hi\")");
}

#[test]
fn test_debug_rendering_elides_past_depth_limit() {
    let mut e = param(&Type::i32(), "x");
    for _ in 0..5 {
        e = Expr::negate(&e).unwrap();
    }
    let shown = stack::with_max_depth(3, || format!("{:?}", e));
    assert_eq!(shown, "(Negate (Negate (Negate ...)))");
    assert_eq!(stack::depth(), 0);
}

/// `levels` nested nodes over `x`, cycling through negation, single-element
/// blocks and try bodies guarded by a catch handler.
fn deep_chain(x: &Expr, levels: usize) -> Expr {
    let mut e = x.clone();
    for i in 0..levels {
        e = match i % 3 {
            0 => Expr::negate(&e).unwrap(),
            1 => Expr::block(&[e]).unwrap(),
            _ => {
                let handler = Expr::catch(&Type::object(), None, &e, None).unwrap();
                Expr::try_catch(&Expr::constant(0), &[handler]).unwrap()
            }
        };
    }
    e
}

#[test]
fn test_dropping_a_deep_tree_does_not_recurse() {
    let x = param(&Type::i32(), "x");
    let tree = deep_chain(&x, 40_000);
    drop(tree);
    assert_eq!(format!("{:?}", x), "x");
}

#[test]
fn test_teardown_keeps_shared_children() {
    let x = param(&Type::i32(), "x");
    let shared = Expr::add(&x, &Expr::constant(1)).unwrap();
    let first = Expr::negate(&shared).unwrap();
    let second = Expr::multiply(&shared, &Expr::constant(2)).unwrap();
    drop(shared);
    drop(first);
    assert_eq!(format!("{:?}", second), "(Multiply (Add x 1) 2)");

    let inner = deep_chain(&x, 1_000);
    let outer = Expr::negate(&inner).unwrap();
    drop(outer);
    assert_eq!(inner.node_type(), NodeType::Negate);
}
