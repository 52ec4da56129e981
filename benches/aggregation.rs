//! Benchmark suite for windowed feature derivation.
//!
//! Run with: `cargo bench`
//!
//! This benchmark measures:
//! - Single-group aggregation throughput at several group sizes
//! - Full-table runs across parallel worker counts

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use trip_feature_extractor::prelude::*;

/// Deterministic pseudo-random generator (no rand dependency needed).
fn lcg(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state >> 33
}

/// Synthetic group spanning three simulated days.
fn synthetic_group(records: usize) -> Vec<GroupRecord> {
    let day = 57_600u64;
    let mut state = 1234u64;
    (0..records)
        .map(|_| {
            let t = (lcg(&mut state) % (3 * day)) as i64;
            let v = (lcg(&mut state) % 900) as f64 + 60.0;
            GroupRecord {
                cells: vec![t.to_string(), v.to_string()],
                in_time: t,
                date: t / day as i64,
                targets: vec![v],
            }
        })
        .collect()
}

/// Synthetic multi-group trip table.
fn synthetic_table(groups: usize, rows_per_group: usize) -> TripTable {
    let day = 57_600i64;
    let mut state = 99u64;
    let mut rows = Vec::new();
    for g in 0..groups {
        for _ in 0..rows_per_group {
            let t = (lcg(&mut state) % (3 * day as u64)) as i64;
            let v = (lcg(&mut state) % 900) as f64 + 60.0;
            rows.push(vec![
                format!("{g}_{}", g + 1),
                t.to_string(),
                (t / day).to_string(),
                v.to_string(),
            ]);
        }
    }
    TripTable::new(
        vec![
            "OD_Dig_2".to_string(),
            "In Time".to_string(),
            "Date".to_string(),
            "Travel Time".to_string(),
        ],
        rows,
    )
    .unwrap()
}

fn bench_single_group(c: &mut Criterion) {
    let config = FeatureConfig::default();
    let aggregator = WindowedStatAggregator::new(&config);

    let mut group = c.benchmark_group("aggregate_group");
    for &size in &[1_000usize, 5_000, 20_000] {
        let records = synthetic_group(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| {
                let rows = aggregator.aggregate(black_box(records.clone()));
                black_box(rows)
            });
        });
    }
    group.finish();
}

fn bench_full_run(c: &mut Criterion) {
    let table = synthetic_table(16, 2_000);

    let mut group = c.benchmark_group("grouped_run");
    group.throughput(Throughput::Elements(table.len() as u64));
    for &threads in &[1usize, 4] {
        let runner = GroupedFeatureRunner::new(
            FeatureConfig::default(),
            RunnerConfig::new().with_threads(threads),
        )
        .unwrap();
        group.bench_with_input(
            BenchmarkId::new("threads", threads),
            &table,
            |b, table| {
                b.iter(|| {
                    let out = runner.run(black_box(table)).unwrap();
                    black_box(out)
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_single_group, bench_full_run);
criterion_main!(benches);
