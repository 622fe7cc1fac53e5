//! Benchmarks for refinement and the automorphism search.
//!
//! Directed cycles make a useful baseline: refinement alone cannot break
//! their symmetry, so the search tree and the pruning tactics are all
//! exercised.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kaleido::prelude::*;

fn directed_cycle(n: usize) -> CSet {
    let schema = Schema::new(
        vec!["V".into(), "E".into()],
        vec![("src".into(), 1, 0), ("tgt".into(), 1, 0)],
        vec![],
        vec![],
    )
    .unwrap();
    let src = (0..n).collect();
    let tgt = (0..n).map(|i| (i + 1) % n).collect();
    CSet::new(schema, vec![n, n], vec![src, tgt], vec![]).unwrap()
}

/// Refinement cost on a symmetric instance (no splitting possible).
fn bench_refine_cycle(c: &mut Criterion) {
    let g = directed_cycle(64);
    let init = uniform_coloring(&g);
    c.bench_function("refine_cycle_64", |b| {
        b.iter(|| color_refine(black_box(&g), black_box(&init)))
    });
}

/// Full search with default pruning against the unpruned tree.
fn bench_autos_cycle(c: &mut Criterion) {
    let g = directed_cycle(12);
    let pruned = SearchConfig::default();
    let all_off = SearchConfig {
        auto_prune: false,
        orbit_prune: false,
        order_prune: false,
        history: false,
    };
    c.bench_function("autos_cycle_12_pruned", |b| {
        b.iter(|| autos(black_box(&g), &pruned).unwrap())
    });
    c.bench_function("autos_cycle_12_unpruned", |b| {
        b.iter(|| autos(black_box(&g), &all_off).unwrap())
    });
}

/// End-to-end canonical hash on a rigid multigraph.
fn bench_canonical_hash(c: &mut Criterion) {
    let schema = Schema::new(
        vec!["V".into(), "E".into()],
        vec![("src".into(), 1, 0), ("tgt".into(), 1, 0)],
        vec![],
        vec![],
    )
    .unwrap();
    let edges: Vec<(usize, usize)> = (0..16).map(|i| (i % 7, (i * 3 + 1) % 7)).collect();
    let src = edges.iter().map(|&(s, _)| s).collect();
    let tgt = edges.iter().map(|&(_, t)| t).collect();
    let g = CSet::new(schema, vec![7, 16], vec![src, tgt], vec![]).unwrap();
    c.bench_function("canonical_hash_7v_16e", |b| {
        b.iter(|| canonical_hash(black_box(&g)).unwrap())
    });
}

criterion_group!(benches, bench_refine_cycle, bench_autos_cycle, bench_canonical_hash);
criterion_main!(benches);
