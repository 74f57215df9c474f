//! Rewrite, lowering and fingerprint throughput on generated trees.
//!
//! Each tree is a lambda over two int parameters whose body is a chain of
//! compound assignments and arithmetic, so every pass has real work to do.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use exprtree::{fingerprint, reduce_fully, Expr, Rewriter, Type, Unchanged};

/// Build a lambda whose body holds `n` statements.
fn synthetic_tree(n: usize) -> Expr {
    let x = Expr::parameter(&Type::i32(), Some("x")).unwrap();
    let y = Expr::parameter(&Type::i32(), Some("y")).unwrap();
    let mut body = Vec::with_capacity(n + 1);
    for i in 0..n {
        let k = Expr::constant(i as i32);
        let stmt = match i % 4 {
            0 => Expr::add_assign(&x, &k).unwrap(),
            1 => Expr::multiply(&Expr::add(&x, &y).unwrap(), &k).unwrap(),
            2 => Expr::post_increment_assign(&y).unwrap(),
            3 => Expr::condition(
                &Expr::less_than(&x, &y).unwrap(),
                &Expr::subtract(&y, &x).unwrap(),
                &k,
            )
            .unwrap(),
            _ => unreachable!(),
        };
        body.push(stmt);
    }
    body.push(x.clone());
    let block = Expr::block(&body).unwrap();
    Expr::lambda_of(&block, &[x, y]).unwrap()
}

fn bench_identity_rewrite(c: &mut Criterion) {
    let small = synthetic_tree(50);
    let large = synthetic_tree(500);

    let mut group = c.benchmark_group("identity_rewrite");
    group.bench_function("50_stmts", |b| {
        b.iter(|| Unchanged.visit(black_box(&small)).unwrap())
    });
    group.bench_function("500_stmts", |b| {
        b.iter(|| Unchanged.visit(black_box(&large)).unwrap())
    });
    group.finish();
}

fn bench_reduce_fully(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduce_fully");
    // Reductions are memoized per node, so build a fresh tree per batch.
    group.bench_function("50_stmts", |b| {
        b.iter_batched(
            || synthetic_tree(50),
            |tree| reduce_fully(&tree).unwrap(),
            criterion::BatchSize::SmallInput,
        )
    });
    group.bench_function("50_stmts_warm", |b| {
        let tree = synthetic_tree(50);
        b.iter(|| reduce_fully(black_box(&tree)).unwrap())
    });
    group.finish();
}

fn bench_fingerprint(c: &mut Criterion) {
    let small = synthetic_tree(50);
    let large = synthetic_tree(500);

    let mut group = c.benchmark_group("fingerprint");
    group.bench_function("50_stmts", |b| {
        b.iter(|| fingerprint(black_box(&small)).unwrap())
    });
    group.bench_function("500_stmts", |b| {
        b.iter(|| fingerprint(black_box(&large)).unwrap())
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_identity_rewrite,
    bench_reduce_fully,
    bench_fingerprint
);
criterion_main!(benches);
