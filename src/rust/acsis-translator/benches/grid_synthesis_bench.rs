// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use acsis_translator::descriptor::Offset;
use acsis_translator::passes::synthesize_grid::synthesize_grid;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use jcmt_units::{arcsec, degrees};
use std::hint::black_box;

/// Centres of an `n` x `n` grid of 10 arcsec pixels rotated by 30 degrees,
/// with every other pixel missing so that gaps must be bridged.
fn sparse_offsets(n: u32) -> Vec<Offset> {
    (0..n)
        .flat_map(|j| (0..n).map(move |i| (i, j)))
        .filter(|(i, j)| (i + j) % 2 == 0)
        .map(|(i, j)| Offset::new(i as f64 * 10.0, j as f64 * 10.0).rotate_from(degrees(30.0)))
        .collect()
}

fn bench_synthesize_grid(c: &mut Criterion) {
    let sizes = [4, 16, 64];

    let mut group = c.benchmark_group("synthesize_grid");

    for &size in &sizes {
        let offsets = sparse_offsets(size);
        group.bench_with_input(BenchmarkId::new("sparse", size), &offsets, |b, offsets| {
            b.iter(|| {
                black_box(synthesize_grid(
                    black_box(offsets),
                    degrees(30.0),
                    arcsec(7.0),
                    0.2,
                ))
            });
        });
    }

    group.finish();
}

fn bench_irregular_axis(c: &mut Criterion) {
    // Offsets on a 3 arcsec lattice sampled with a 10 arcsec first gap, which
    // forces the trial pixel to shrink several times.
    let offsets: Vec<Offset> = [0.0, 10.0, 13.0, 19.0, 31.0, 40.0]
        .iter()
        .map(|x| Offset::new(*x, 0.0))
        .collect();
    c.bench_function("shrinking_trial", |b| {
        b.iter(|| black_box(synthesize_grid(black_box(&offsets), degrees(0.0), arcsec(5.0), 0.2)))
    });
}

criterion_group!(benches, bench_synthesize_grid, bench_irregular_axis);
criterion_main!(benches);
