//! Benchmarks for catalog type resolution.

#![allow(clippy::unwrap_used, missing_docs)]

use arrow_types::{resolve, ColumnCatalog};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_resolve_primitive(c: &mut Criterion) {
    let col = ColumnCatalog::scalar("id", "pg_catalog", "int4", 4);
    c.bench_function("resolve_int4", |b| {
        b.iter(|| black_box(resolve(black_box(&col)).unwrap()))
    });
}

fn bench_resolve_composite(c: &mut Criterion) {
    let children: Vec<ColumnCatalog> = (0..8)
        .map(|i| ColumnCatalog::scalar(format!("field_{i}"), "pg_catalog", "int4", 4))
        .collect();
    let col = ColumnCatalog::scalar("row", "public", "row_t", -1).with_composite(999, children);
    c.bench_function("resolve_composite_8_children", |b| {
        b.iter(|| black_box(resolve(black_box(&col)).unwrap()))
    });
}

criterion_group!(benches, bench_resolve_primitive, bench_resolve_composite);
criterion_main!(benches);
