//! Benchmarks for each processing path of a single engine.
//!
//! Every path is measured both at rest and while the cursor glides, since
//! gliding adds a weight computation (and for the shared paths a processor
//! reconfiguration) per sample.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use morph_dsp::{
    distortion::DistortionType,
    morph::{MorphEngine, MorphMode, MorphNode, ProcessorBudget},
};

use crate::{test_signal, BLOCK_SIZES, SAMPLE_RATE};

/// Node sets that land on each path.
const SCENARIOS: &[(&str, [DistortionType; 4])] = &[
    (
        "sample_blend",
        [
            DistortionType::SoftClip,
            DistortionType::Tube,
            DistortionType::Tape,
            DistortionType::Fuzz,
        ],
    ),
    (
        "interpolated",
        [
            DistortionType::SineFold,
            DistortionType::TriangleFold,
            DistortionType::SergeFold,
            DistortionType::SineFold,
        ],
    ),
    (
        "envelope_coupled",
        [DistortionType::Temporal; 4],
    ),
    (
        "cross_family",
        [
            DistortionType::Tube,
            DistortionType::SineFold,
            DistortionType::Bitcrush,
            DistortionType::Chaos,
        ],
    ),
];

fn engine_for(kinds: &[DistortionType; 4], block: usize) -> MorphEngine {
    let mut engine = MorphEngine::new(ProcessorBudget::shared());
    engine.prepare(SAMPLE_RATE, block);
    let nodes: Vec<_> = kinds
        .iter()
        .enumerate()
        .map(|(slot, &kind)| MorphNode::new(slot as u8, kind))
        .collect();
    engine.set_nodes(&nodes);
    engine.set_active_node_count(4);
    engine.set_mode(MorphMode::Planar2D);
    engine.set_smoothing_time_ms(200.0);
    engine.set_morph_position(0.45, 0.55);
    engine
}

pub fn bench_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/paths");

    for &size in BLOCK_SIZES {
        let input = test_signal(size);
        let mut buffer = input.clone();

        for (name, kinds) in SCENARIOS {
            // === AT REST ===
            let mut engine = engine_for(kinds, size);
            group.bench_with_input(
                BenchmarkId::new(format!("{name}/rest"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        buffer.copy_from_slice(&input);
                        engine.process_block(black_box(&mut buffer));
                    })
                },
            );

            // === GLIDING ===
            // The cursor target flips every block so the smoother never settles
            let mut engine = engine_for(kinds, size);
            group.bench_with_input(
                BenchmarkId::new(format!("{name}/glide"), size),
                &size,
                |b, _| {
                    let mut flip = false;
                    b.iter(|| {
                        flip = !flip;
                        let x = if flip { 0.1 } else { 0.9 };
                        engine.set_morph_position(x, 1.0 - x);
                        buffer.copy_from_slice(&input);
                        engine.process_block(black_box(&mut buffer));
                    })
                },
            );
        }
    }

    group.finish();
}
