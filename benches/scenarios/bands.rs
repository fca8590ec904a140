//! Benchmarks for a full multiband plugin: four engines, one budget.
//!
//! This is the realistic worst case: every band cross-family with its cursor
//! near the centre, so the budget is saturated and pruning kicks in.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use morph_dsp::{
    distortion::DistortionType,
    morph::{MorphEngine, MorphMode, MorphNode, ProcessorBudget},
};

use crate::{test_signal, BLOCK_SIZES, SAMPLE_RATE};

const BANDS: usize = 4;

pub fn bench_bands(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/bands");

    for &size in BLOCK_SIZES {
        let input = test_signal(size);
        let mut buffers = vec![input.clone(); BANDS];

        let budget = ProcessorBudget::shared();
        let mut engines: Vec<MorphEngine> = (0..BANDS)
            .map(|band| {
                let mut engine = MorphEngine::new(budget.clone());
                engine.prepare(SAMPLE_RATE, size);
                engine.set_nodes(&[
                    MorphNode::new(0, DistortionType::Tube),
                    MorphNode::new(1, DistortionType::SineFold),
                    MorphNode::new(2, DistortionType::Bitcrush),
                    MorphNode::new(3, DistortionType::Granular),
                ]);
                engine.set_active_node_count(4);
                engine.set_mode(MorphMode::Planar2D);
                let offset = band as f32 * 0.05;
                engine.set_morph_position(0.45 + offset, 0.5 - offset);
                engine
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("four_bands", size), &size, |b, _| {
            b.iter(|| {
                for (engine, buffer) in engines.iter_mut().zip(buffers.iter_mut()) {
                    buffer.copy_from_slice(&input);
                    engine.process_block(black_box(buffer));
                }
            })
        });
    }

    group.finish();
}
