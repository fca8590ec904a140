//! Benchmarks for the smoothing controller.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use morph_dsp::morph::{
    compute_weights, node::default_nodes, MorphMode, MorphWeights, SmoothingController,
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_smoothing(c: &mut Criterion) {
    let mut group = c.benchmark_group("morph/smoothing");
    let nodes = default_nodes();

    for &size in BLOCK_SIZES {
        // Position glide: a weight computation per sample
        let mut position = SmoothingController::new(SAMPLE_RATE);
        position.set_time_ms(500.0);
        group.bench_with_input(BenchmarkId::new("position", size), &size, |b, &size| {
            let mut flip = false;
            b.iter(|| {
                flip = !flip;
                let target = if flip { 1.0 } else { 0.0 };
                position.set_position_target(target, target);
                for _ in 0..size {
                    black_box(position.next(|x, y| {
                        compute_weights(&nodes, 4, MorphMode::Planar2D, x, y)
                    }));
                }
            })
        });

        // Weight glide: four one-pole smoothers per sample
        let mut weights = SmoothingController::new(SAMPLE_RATE);
        weights.set_time_ms(500.0);
        let a = MorphWeights::from_raw(&[1.0, 0.0, 0.0, 0.0], 4);
        let z = MorphWeights::from_raw(&[0.1, 0.2, 0.3, 0.4], 4);
        group.bench_with_input(BenchmarkId::new("weights", size), &size, |b, &size| {
            let mut flip = false;
            b.iter(|| {
                flip = !flip;
                weights.set_weight_target(if flip { &z } else { &a });
                for _ in 0..size {
                    black_box(weights.next(|_, _| MorphWeights::default()));
                }
            })
        });
    }

    group.finish();
}
