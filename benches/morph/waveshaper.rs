//! Benchmarks for the reference distortion processor.
//!
//! One representative type per family. The buffer-based types (granular,
//! feedback) are the most expensive and bound the worst case.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use morph_dsp::distortion::{
    CommonParams, DistortionAdapter, DistortionType, TypeParams, Waveshaper,
};

use crate::{test_signal, BLOCK_SIZES, SAMPLE_RATE};

const TYPES: &[DistortionType] = &[
    DistortionType::Tube,
    DistortionType::SergeFold,
    DistortionType::Bitcrush,
    DistortionType::FullRectify,
    DistortionType::Temporal,
    DistortionType::FeedbackDist,
    DistortionType::Granular,
];

pub fn bench_waveshaper(c: &mut Criterion) {
    let mut group = c.benchmark_group("morph/waveshaper");
    let common = CommonParams {
        drive: 4.0,
        ..CommonParams::default()
    };

    for &size in BLOCK_SIZES {
        let input = test_signal(size);
        let mut buffer = input.clone();

        for &kind in TYPES {
            let mut shaper = Waveshaper::default();
            shaper.prepare(SAMPLE_RATE, size);
            shaper.configure(kind, &common, &TypeParams::default());

            group.bench_with_input(BenchmarkId::new(kind.name(), size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    for sample in buffer.iter_mut() {
                        *sample = shaper.process(black_box(*sample));
                    }
                })
            });
        }
    }

    group.finish();
}
