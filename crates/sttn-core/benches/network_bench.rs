//! # Network Benchmarks
//!
//! Performance benchmarks for sttn-core transformations.
//!
//! Run with: `cargo bench -p sttn-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use geo::Point;
use std::hint::black_box;
use sttn_core::{
    DataType, Direction, GroupingSpec, NetworkModel, NodeTable, Reducer, Table, Value,
};

/// `nodes` nodes on a line, `nodes * 8` edges cycling over node pairs.
fn create_network(nodes: usize) -> NetworkModel {
    let keys: Vec<i64> = (0..nodes as i64).collect();
    let node_table = Table::from_columns(vec![
        ("id", DataType::Int64, keys.iter().map(|&k| Value::Int64(k)).collect()),
        (
            "geometry",
            DataType::Geometry,
            keys.iter()
                .map(|&k| Value::Geometry(Point::new(k as f64 * 0.01, 45.0).into()))
                .collect(),
        ),
        (
            "zone",
            DataType::Int64,
            keys.iter().map(|&k| Value::Int64(k / 10)).collect(),
        ),
    ])
    .expect("nodes");

    let edge_count = nodes * 8;
    let n = nodes as i64;
    let edges = Table::from_columns(vec![
        (
            "origin",
            DataType::Int64,
            (0..edge_count as i64).map(|i| Value::Int64(i % n)).collect(),
        ),
        (
            "destination",
            DataType::Int64,
            (0..edge_count as i64)
                .map(|i| Value::Int64((i * 7 + 3) % n))
                .collect(),
        ),
        (
            "count",
            DataType::Int64,
            (0..edge_count as i64).map(|i| Value::Int64(i % 13)).collect(),
        ),
    ])
    .expect("edges");

    NetworkModel::new(
        NodeTable::indexed(node_table, "geometry", "id").expect("indexed"),
        edges,
    )
    .expect("model")
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| black_box(create_network(size)));
        });
    }

    group.finish();
}

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");

    for size in [100, 1000, 10000].iter() {
        let model = create_network(*size);

        group.bench_with_input(BenchmarkId::new("parallel", size), &model, |b, model| {
            b.iter(|| black_box(model.agg_parallel_edges(&[("count", Reducer::Sum)], None)));
        });
        group.bench_with_input(BenchmarkId::new("adjacent", size), &model, |b, model| {
            b.iter(|| {
                black_box(model.agg_adjacent_edges(
                    &[("count", Reducer::Sum)],
                    Direction::Outgoing,
                    false,
                ))
            });
        });
    }

    group.finish();
}

fn bench_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_nodes");

    for size in [100, 1000, 10000].iter() {
        let model = create_network(*size);
        let mask: Vec<bool> = (0..*size).map(|i| i % 3 != 0).collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &mask, |b, mask| {
            b.iter(|| black_box(model.filter_nodes(mask)));
        });
    }

    group.finish();
}

fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_nodes");
    let spec = GroupingSpec::ByColumn("zone".to_string());

    for size in [100, 1000, 10000].iter() {
        let model = create_network(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), &spec, |b, spec| {
            b.iter(|| black_box(model.group_nodes(spec)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_construction,
    bench_aggregation,
    bench_filtering,
    bench_grouping
);
criterion_main!(benches);
