//! The distortion capability the morph engine consumes.
//!
//! Every distortion algorithm, whatever it does internally, is driven through
//! [`DistortionAdapter`]: configure it with a type and parameters, then feed it
//! one sample at a time. The morph engine never looks past this surface, so
//! algorithms can be swapped without touching the engine.
//!
//! [`Waveshaper`] is the reference adapter shipped with the crate. It covers
//! all 26 [`DistortionType`]s with compact algorithms.

/// Distortion types and their families.
pub mod kind;
/// Common and type-specific parameter records.
pub mod params;
/// Reference adapter implementing every distortion type.
pub mod waveshaper;

pub use kind::{DistortionFamily, DistortionType};
pub use params::{CommonParams, TypeParams};
pub use waveshaper::Waveshaper;

/// Uniform contract every distortion algorithm exposes to the morph engine.
///
/// Implementations must be realtime-safe after `prepare`: `configure`,
/// `process` and `reset` may not allocate, block or panic.
pub trait DistortionAdapter: Send {
    /// Allocate any sample-rate dependent state. Never called on the audio path.
    fn prepare(&mut self, sample_rate: f32, max_block_size: usize);

    /// Select the algorithm and its parameters. Cheap enough to call per sample.
    ///
    /// Changing parameters must not reset internal history.
    fn configure(&mut self, kind: DistortionType, common: &CommonParams, params: &TypeParams);

    fn process(&mut self, sample: f32) -> f32;

    /// Process with an externally tracked envelope level.
    ///
    /// Dynamics-driven algorithms use `envelope` in place of their own
    /// detector; everything else ignores it.
    fn process_with_envelope(&mut self, sample: f32, _envelope: f32) -> f32 {
        self.process(sample)
    }

    /// Clear all history (filter state, delay lines, detectors).
    fn reset(&mut self);

    /// Family of the currently configured type.
    fn family(&self) -> DistortionFamily;
}

/// Allow boxed adapters to be used as adapters (for dynamic dispatch)
impl DistortionAdapter for Box<dyn DistortionAdapter> {
    fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        (**self).prepare(sample_rate, max_block_size)
    }

    fn configure(&mut self, kind: DistortionType, common: &CommonParams, params: &TypeParams) {
        (**self).configure(kind, common, params)
    }

    fn process(&mut self, sample: f32) -> f32 {
        (**self).process(sample)
    }

    fn process_with_envelope(&mut self, sample: f32, envelope: f32) -> f32 {
        (**self).process_with_envelope(sample, envelope)
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn family(&self) -> DistortionFamily {
        (**self).family()
    }
}
