//! End-to-end scenarios: construction, rewriting and lowering together.

use rayon::prelude::*;

use exprtree::{
    fingerprint, is_fully_reduced, reduce_fully, Error, Expr, Result, Rewriter, Type,
    TypeBuilder, Unchanged,
};

fn param(ty: &Type, name: &str) -> Expr {
    Expr::parameter(ty, Some(name)).unwrap()
}

fn person() -> Type {
    TypeBuilder::class("Person")
        .constructor(vec![])
        .field("Name", Type::string())
        .property("Age", Type::i32())
        .build()
}

/// Replaces one parameter with another expression.
struct Substitute(Expr, Expr);

impl Rewriter for Substitute {
    fn visit_parameter(&mut self, node: &Expr) -> Result<Expr> {
        Ok(if Expr::ptr_eq(node, &self.0) {
            self.1.clone()
        } else {
            node.clone()
        })
    }
}

#[test]
fn test_compound_assign_on_variable_needs_no_temporaries() {
    let x = param(&Type::i32(), "x");
    let y = param(&Type::i32(), "y");
    let reduced = Expr::add_assign(&x, &y).unwrap().reduce().unwrap();
    insta::assert_snapshot!(format!("{:?}", reduced), @"(Assign x (Add x y))");
}

#[test]
fn test_post_increment_through_side_effecting_receiver() {
    let factory = TypeBuilder::class("Factory")
        .static_method("f", vec![], person())
        .build();
    let receiver = Expr::call_static_named(&factory, "f", &[]).unwrap();
    let prop = Expr::property_named(&receiver, "Age").unwrap();
    let reduced = Expr::post_increment_assign(&prop)
        .unwrap()
        .reduce_and_check()
        .unwrap();
    insta::assert_snapshot!(
        format!("{:?}", reduced),
        @"(Block [$0 $1] (Assign $0 (Call Factory.f)) (Assign $1 $0.Age) (Assign $0.Age (Increment $1)) $1)"
    );
}

#[test]
fn test_reference_equality_is_classified() {
    let ty = person();
    let eq = Expr::equal(&param(&ty, "a"), &param(&ty, "b")).unwrap();
    assert!(eq.is_reference_comparison());
    assert_eq!(*eq.ty(), Type::bool());
}

#[test]
fn test_coalesce_unwraps_nullable_left() {
    let n = param(&Type::i32().nullable(), "n");
    let c = Expr::coalesce(&n, &Expr::constant(0)).unwrap();
    assert_eq!(*c.ty(), Type::i32());
    assert!(!c.can_reduce());
}

#[test]
fn test_duplicate_block_variable_is_rejected() {
    let v = param(&Type::i32(), "v");
    let err = Expr::block_with(&[v.clone(), v.clone()], &[v]).unwrap_err();
    assert_eq!(err, Error::DuplicateVariable("v".to_string()));
}

#[test]
fn test_rewriting_one_of_six_arguments_shares_the_rest() {
    let calc = TypeBuilder::class("Calc")
        .static_method("Six", vec![Type::i32(); 6], Type::i32())
        .build();
    let args: Vec<Expr> = ["a", "b", "c", "d", "e", "f"]
        .iter()
        .map(|n| param(&Type::i32(), n))
        .collect();
    let call = Expr::call_static_named(&calc, "Six", &args).unwrap();

    let mut r = Substitute(args[3].clone(), Expr::constant(4));
    let out = r.visit(&call).unwrap();
    assert!(!Expr::ptr_eq(&out, &call));
    let provider = out.as_argument_provider().unwrap();
    assert_eq!(provider.argument_count(), 6);
    for (i, original) in args.iter().enumerate() {
        if i == 3 {
            assert_eq!(format!("{:?}", provider.argument(i)), "4");
        } else {
            assert!(Expr::ptr_eq(provider.argument(i), original));
        }
    }
}

/// A lambda touching most node kinds.
fn kitchen_sink() -> Expr {
    let ty = person();
    let p = param(&ty, "p");
    let n = param(&Type::i32(), "n");
    let done = Expr::label_target(&Type::i32(), Some("done")).unwrap();
    let brk = Expr::label_target(&Type::void(), Some("brk")).unwrap();
    let age = Expr::property_named(&p, "Age").unwrap();

    let switch = Expr::switch(
        None,
        &n,
        Some(&Expr::constant("many")),
        None,
        &[
            Expr::switch_case(&Expr::constant("none"), &[Expr::constant(0)]).unwrap(),
            Expr::switch_case(&Expr::constant("one"), &[Expr::constant(1)]).unwrap(),
        ],
    )
    .unwrap();
    let guarded = Expr::try_catch(
        &Expr::assign(&Expr::field_named(&p, "Name").unwrap(), &switch).unwrap(),
        &[Expr::catch(&Type::object(), None, &Expr::constant("?"), None).unwrap()],
    )
    .unwrap();
    let countdown = Expr::make_loop(
        &Expr::if_then_else(
            &Expr::greater_than(&n, &Expr::constant(0)).unwrap(),
            &Expr::post_decrement_assign(&n).unwrap(),
            &Expr::break_to(&brk, None).unwrap(),
        )
        .unwrap(),
        Some(&brk),
        None,
    )
    .unwrap();
    let body = Expr::block(&[
        guarded,
        countdown,
        Expr::add_assign(&age, &n).unwrap(),
        Expr::return_to(&done, Some(&age)).unwrap(),
        Expr::label(&done, Some(&Expr::constant(0))).unwrap(),
    ])
    .unwrap();
    Expr::lambda_of(&body, &[p, n]).unwrap()
}

#[test]
fn test_identity_pass_returns_the_same_tree() {
    let tree = kitchen_sink();
    assert!(Expr::ptr_eq(&Unchanged.visit(&tree).unwrap(), &tree));
}

#[test]
fn test_full_lowering_is_idempotent() {
    let tree = kitchen_sink();
    assert!(!is_fully_reduced(&tree).unwrap());
    let once = reduce_fully(&tree).unwrap();
    assert!(is_fully_reduced(&once).unwrap());
    let twice = reduce_fully(&once).unwrap();
    assert!(Expr::ptr_eq(&once, &twice));
    assert_eq!(*once.ty(), *tree.ty());
}

#[test]
fn test_fingerprint_ignores_names_but_not_shape() {
    assert_eq!(
        fingerprint(&kitchen_sink()).unwrap(),
        fingerprint(&kitchen_sink()).unwrap()
    );
    let lowered = reduce_fully(&kitchen_sink()).unwrap();
    assert_ne!(
        fingerprint(&kitchen_sink()).unwrap(),
        fingerprint(&lowered).unwrap()
    );
}

#[test]
fn test_concurrent_first_reduce_agrees() {
    let x = param(&Type::i32(), "x");
    let node = Expr::multiply_assign(&x, &Expr::constant(3)).unwrap();
    let results: Vec<Expr> = (0..64)
        .into_par_iter()
        .map(|_| node.reduce().unwrap())
        .collect();
    let first = node.reduce().unwrap();
    assert!(results.iter().all(|r| Expr::ptr_eq(r, &first)));
}

#[test]
fn test_concurrent_readers_share_a_tree() {
    let tree = kitchen_sink();
    let prints: Vec<String> = (0..16)
        .into_par_iter()
        .map(|_| format!("{:?}", reduce_fully(&tree).unwrap()))
        .collect();
    assert!(prints.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_deep_tree_lowers_and_drops() {
    let x = param(&Type::i32(), "x");
    let mut tree = Expr::add_assign(&x, &Expr::constant(1)).unwrap();
    for _ in 0..40_000 {
        tree = Expr::negate(&tree).unwrap();
    }
    let lowered = reduce_fully(&tree).unwrap();
    assert!(!Expr::ptr_eq(&lowered, &tree));
    assert_eq!(*lowered.ty(), Type::i32());
    drop(lowered);
    drop(tree);
}
