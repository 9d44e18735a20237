use core::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use tryblock::run;

fn fact(n: u64) -> u64 {
    (1..=n).fold(1_u64, u64::wrapping_mul)
}

fn fact_without_engine(c: &mut Criterion) {
    c.bench_function("fact_without_engine", |b| {
        b.iter(|| black_box(fact(black_box(10_000))));
    });
}

fn run_with_no_checkpoints(c: &mut Criterion) {
    c.bench_function("run_with_no_checkpoints", |b| {
        b.iter(|| {
            let _ = run(|_t| {
                black_box(fact(black_box(10_000)));
            });
        });
    });
}

fn run_with_one_checkpoint(c: &mut Criterion) {
    c.bench_function("run_with_one_checkpoint", |b| {
        b.iter(|| {
            let _ = run(|t| {
                t.pass("not an error");
                black_box(fact(black_box(10_000)));
            });
        });
    });
}

fn run_with_hundred_checkpoints(c: &mut Criterion) {
    c.bench_function("run_with_hundred_checkpoints", |b| {
        b.iter(|| {
            let _ = run(|t| {
                for _ in 0..100 {
                    t.pass("not an error");
                }
                black_box(fact(black_box(10_000)));
            });
        });
    });
}

criterion_group!(
    benches,
    fact_without_engine,
    run_with_no_checkpoints,
    run_with_one_checkpoint,
    run_with_hundred_checkpoints
);
criterion_main!(benches);
