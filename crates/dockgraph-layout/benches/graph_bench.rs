//! Benchmarks for docking mutations and snapshot loading.
//!
//! Run with: cargo bench -p dockgraph-layout

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use dockgraph_layout::{ContentHandle, DockLeaf, DockPosition, ElementId, LayoutGraph, Side};
use std::hint::black_box;

const POSITIONS: [DockPosition; 4] = [
    DockPosition::Right,
    DockPosition::Bottom,
    DockPosition::Center,
    DockPosition::Left,
];

/// Build a mixed layout of `n` leaves docked against earlier ones.
fn build_graph(n: usize) -> (LayoutGraph, Vec<ElementId>) {
    let mut graph = LayoutGraph::new();
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        let id = graph.add_leaf(DockLeaf::new(
            format!("panel-{i}"),
            format!("Panel {i}"),
            ContentHandle(i as u64),
        ));
        let target = ids.get(i.wrapping_mul(7) % ids.len().max(1)).copied();
        graph.dock(id, target, POSITIONS[i % POSITIONS.len()], None);
        ids.push(id);
    }
    (graph, ids)
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("dock/build");
    for n in [8, 32, 128, 512] {
        group.bench_with_input(BenchmarkId::new("leaves", n), &n, |b, &n| {
            b.iter(|| black_box(build_graph(n).0.revision()))
        });
    }
    group.finish();
}

fn bench_mutations(c: &mut Criterion) {
    let mut group = c.benchmark_group("dock/mutation");
    for n in [32, 256] {
        let (base, ids) = build_graph(n);
        let first = ids[0];
        let last = ids[ids.len() - 1];
        let middle = ids[ids.len() / 2];

        group.bench_with_input(BenchmarkId::new("move_element", n), &n, |b, _| {
            b.iter_batched(
                || base.clone(),
                |mut graph| {
                    let outcome = graph.move_element(first, Some(last), DockPosition::Bottom, None);
                    black_box(outcome)
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("undock_cleanup", n), &n, |b, _| {
            b.iter_batched(
                || base.clone(),
                |mut graph| black_box(graph.undock(middle)),
                BatchSize::SmallInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("pin_restore", n), &n, |b, _| {
            b.iter_batched(
                || base.clone(),
                |mut graph| {
                    graph.pin_to_sidebar(middle, Side::Left, None);
                    black_box(graph.restore_from_sidebar(middle))
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("validate", n), &base, |b, graph| {
            b.iter(|| black_box(graph.validate().is_ok()))
        });
    }
    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("dock/snapshot");
    for n in [32, 256] {
        let (graph, _) = build_graph(n);
        let snapshot = graph.to_snapshot();

        group.bench_with_input(BenchmarkId::new("capture", n), &graph, |b, graph| {
            b.iter(|| black_box(graph.to_snapshot()))
        });

        group.bench_with_input(BenchmarkId::new("load", n), &snapshot, |b, snapshot| {
            b.iter_batched(
                || (LayoutGraph::new(), snapshot.clone()),
                |(mut graph, snapshot)| black_box(graph.load_snapshot(snapshot).map(|r| r.revision)),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build, bench_mutations, bench_snapshot);
criterion_main!(benches);
