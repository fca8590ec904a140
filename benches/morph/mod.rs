//! Benchmarks for morph building blocks.

mod smoothing;
mod waveshaper;
mod weights;

pub use smoothing::bench_smoothing;
pub use waveshaper::bench_waveshaper;
pub use weights::bench_weights;
