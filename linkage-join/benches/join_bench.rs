//! Benchmarks for batch join operations.
//!
//! These benchmarks measure hash join and bag union throughput with a
//! product/link shaped workload: a unique-key left side and a right side with
//! a configurable fan-out per key.

use arrow::array::{ArrayRef, Int64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use linkage_join::{JoinKey, JoinOptions, bag_union, hash_join};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;
use std::sync::Arc;

/// Schema: id (Int64), value (Utf8). Ids are unique.
fn create_catalog(num_rows: usize) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("value", DataType::Utf8, false),
    ]));
    let ids: Vec<i64> = (0..num_rows as i64).collect();
    let values: Vec<String> = (0..num_rows).map(|i| format!("value_{i}")).collect();
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(ids)) as ArrayRef,
            Arc::new(StringArray::from(values)) as ArrayRef,
        ],
    )
    .unwrap()
}

/// Schema: id (Int64), other_id (Int64). Roughly `fan_out` rows per catalog id,
/// with about a tenth of the ids never referenced.
fn create_links(num_catalog_rows: usize, fan_out: usize, seed: u64) -> RecordBatch {
    let mut rng = StdRng::seed_from_u64(seed);
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("other_id", DataType::Int64, false),
    ]));
    let mut ids = Vec::with_capacity(num_catalog_rows * fan_out);
    let mut others = Vec::with_capacity(num_catalog_rows * fan_out);
    for id in 0..num_catalog_rows as i64 {
        if rng.random_bool(0.1) {
            continue;
        }
        for _ in 0..fan_out {
            ids.push(id);
            others.push(rng.random_range(0..num_catalog_rows as i64));
        }
    }
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(ids)) as ArrayRef,
            Arc::new(Int64Array::from(others)) as ArrayRef,
        ],
    )
    .unwrap()
}

fn bench_hash_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_join");

    for size in [1_000usize, 10_000, 100_000] {
        let catalog = create_catalog(size);
        let links = create_links(size, 3, 42);
        group.throughput(Throughput::Elements((catalog.num_rows() + links.num_rows()) as u64));

        for (label, options) in [
            ("inner", JoinOptions::inner()),
            ("left", JoinOptions::left()),
            ("anti", JoinOptions::anti()),
        ] {
            group.bench_with_input(BenchmarkId::new(label, size), &size, |b, _| {
                b.iter(|| {
                    let joined =
                        hash_join(&catalog, &links, &[JoinKey::new(0, 0)], &options).unwrap();
                    black_box(joined.num_rows())
                });
            });
        }
    }

    group.finish();
}

fn bench_bag_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("bag_union");

    for size in [10_000usize, 100_000] {
        let a = create_catalog(size);
        let b = create_catalog(size / 10);
        group.throughput(Throughput::Elements((a.num_rows() + b.num_rows()) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bench, _| {
            bench.iter(|| {
                let union = bag_union(&a.schema(), &[a.clone(), b.clone()]).unwrap();
                black_box(union.num_rows())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_hash_join, bench_bag_union);
criterion_main!(benches);
