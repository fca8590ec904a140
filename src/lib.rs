//! Realtime-safe morph engine for multiband distortion.
//!
//! The crate is layered strictly, leaves first:
//!
//! - [`dsp`]: core math and allocation-free primitives (smoothers, crossfade
//!   curves, filters, waveshaping transfer functions).
//! - [`distortion`]: the distortion capability every algorithm exposes, the 26
//!   distortion types with their families, and a reference implementation.
//! - [`morph`]: the morph engine that blends 2-4 distortion nodes into one
//!   continuously variable timbre.

pub mod distortion; // Distortion capability, types and families
pub mod dsp;
pub mod error;
pub mod morph; // Weighting, strategy, smoothing, budget, engine

pub use error::MorphError;

pub const MAX_BLOCK_SIZE: usize = 2048;

/// Node slots owned by one engine.
pub const MAX_MORPH_NODES: usize = 4;
/// Fewest nodes a morph can blend.
pub const MIN_ACTIVE_NODES: usize = 2;

/// Process-wide cap on concurrently rendered distortion processors.
pub const MAX_ACTIVE_PROCESSORS: usize = 16;

/// Weights below this are pruned and the remainder renormalized.
pub const WEIGHT_EPSILON: f32 = 0.001;

pub const MAX_SMOOTHING_MS: f32 = 500.0;

pub(crate) const MIN_SAMPLE_RATE: f32 = 1_000.0;
