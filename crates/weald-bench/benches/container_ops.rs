//! Criterion micro-benchmarks for cell-container churn.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use weald_bench::scatter;
use weald_core::{EntityRef, ObjectGuid, ObjectKind, Position};
use weald_grid::KindPartition;
use weald_test_utils::TestEntity;

fn entities(n: usize) -> Vec<EntityRef> {
    scatter(n, 1000.0, 42)
        .into_iter()
        .enumerate()
        .map(|(i, (x, y, kind))| {
            Arc::new(TestEntity::new(i as u64, kind, Position::new(x, y))) as EntityRef
        })
        .collect()
}

/// Benchmark: insert then remove 1K mixed-kind entities.
fn bench_insert_remove_1k(c: &mut Criterion) {
    let entities = entities(1_000);

    c.bench_function("container_insert_remove_1k", |b| {
        b.iter(|| {
            let mut partition = KindPartition::default();
            for entity in &entities {
                partition.insert(Arc::clone(entity));
            }
            for i in 0..entities.len() {
                partition.remove(ObjectGuid(i as u64));
            }
            black_box(partition.len());
        });
    });
}

/// Benchmark: kind-filtered counts over a populated partition.
fn bench_kind_counts(c: &mut Criterion) {
    let mut partition = KindPartition::default();
    for entity in entities(1_000) {
        partition.insert(entity);
    }

    c.bench_function("container_kind_counts", |b| {
        b.iter(|| {
            let mut total = 0usize;
            for kind in ObjectKind::ALL {
                total += partition.count_of(kind);
            }
            black_box(total);
        });
    });
}

criterion_group!(benches, bench_insert_remove_1k, bench_kind_counts);
criterion_main!(benches);
