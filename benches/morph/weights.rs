//! Benchmarks for weight computation.
//!
//! Weights are recomputed every sample while a position smoother moves, so
//! this is the per-sample cost of gliding.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use morph_dsp::morph::{compute_weights, node::default_nodes, MorphMode};

pub fn bench_weights(c: &mut Criterion) {
    let mut group = c.benchmark_group("morph/weights");
    let nodes = default_nodes();

    for mode in MorphMode::ALL {
        for count in [2usize, 4] {
            let id = format!("{}/{count}", mode.name());
            group.bench_with_input(BenchmarkId::new("cursor", id), &count, |b, &count| {
                let mut t = 0.0f32;
                b.iter(|| {
                    t += 0.001;
                    let x = 0.5 + 0.45 * t.sin();
                    let y = 0.5 + 0.45 * t.cos();
                    compute_weights(black_box(&nodes), count, mode, black_box(x), black_box(y))
                })
            });
        }
    }

    group.finish();
}
