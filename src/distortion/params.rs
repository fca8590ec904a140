#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{dsp::sanitize::clamp_finite, MorphError};

/// Parameters every distortion type understands.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommonParams {
    /// Input gain into the shaper, 0.0 - 10.0.
    pub drive: f32,
    /// Dry/wet, 0.0 - 1.0.
    pub mix: f32,
    /// Post-shaper low-pass cutoff, 200 - 8000 Hz.
    pub tone_hz: f32,
}

impl CommonParams {
    pub const DRIVE_RANGE: (f32, f32) = (0.0, 10.0);
    pub const MIX_RANGE: (f32, f32) = (0.0, 1.0);
    pub const TONE_RANGE: (f32, f32) = (200.0, 8000.0);

    pub fn new(drive: f32, mix: f32, tone_hz: f32) -> Self {
        Self {
            drive,
            mix,
            tone_hz,
        }
        .clamped()
    }

    /// Control-path constructor: rejects non-finite input instead of clamping
    /// it, so a broken preset or host value is reported rather than hidden.
    pub fn try_new(drive: f32, mix: f32, tone_hz: f32) -> Result<Self, MorphError> {
        for (name, value) in [("drive", drive), ("mix", mix), ("tone_hz", tone_hz)] {
            if !value.is_finite() {
                return Err(MorphError::NonFiniteParameter { name, value });
            }
        }
        Ok(Self::new(drive, mix, tone_hz))
    }

    /// Copy with every field forced into range (NaN goes to the lower bound).
    pub fn clamped(self) -> Self {
        Self {
            drive: clamp_finite(self.drive, Self::DRIVE_RANGE.0, Self::DRIVE_RANGE.1),
            mix: clamp_finite(self.mix, Self::MIX_RANGE.0, Self::MIX_RANGE.1),
            tone_hz: clamp_finite(self.tone_hz, Self::TONE_RANGE.0, Self::TONE_RANGE.1),
        }
    }

    /// Weighted sum `Σ wᵢ · paramsᵢ`. Weights are expected to sum to one.
    pub fn interpolate<'a>(items: impl IntoIterator<Item = (f32, &'a CommonParams)>) -> Self {
        let mut out = Self {
            drive: 0.0,
            mix: 0.0,
            tone_hz: 0.0,
        };
        for (w, p) in items {
            out.drive += w * p.drive;
            out.mix += w * p.mix;
            out.tone_hz += w * p.tone_hz;
        }
        out.clamped()
    }
}

impl Default for CommonParams {
    fn default() -> Self {
        Self {
            drive: 1.0,
            mix: 1.0,
            tone_hz: 8000.0,
        }
    }
}

/*
Type-Specific Parameters
========================

Each distortion type reads a handful of extra controls (fold count, bit depth,
feedback amount...). Rather than a different shape per type, every node
carries ONE flat record holding the union of all of them:

    SoftClip reads:   (nothing extra)
    Tube reads:       bias, sag
    SergeFold reads:  folds
    Bitcrush reads:   bit_depth
    Temporal reads:   attack_ms, release_ms, sensitivity
    ...

Why flat? Parameter interpolation between two nodes of the same family is a
plain weighted sum over matching fields:

    param_k = Σ wᵢ × param_k,i

With a flat record that is a loop over an array. Fields a type does not read
are carried and interpolated harmlessly.
*/

/// Union of every type-specific parameter, all plain `f32`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeParams {
    pub bias: f32,
    pub sag: f32,
    pub threshold: f32,
    pub folds: f32,
    pub bit_depth: f32,
    pub downsample: f32,
    pub smoothness: f32,
    pub feedback: f32,
    pub delay_ms: f32,
    pub resonance_hz: f32,
    pub mod_freq_hz: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
    pub sensitivity: f32,
    pub chaos_rate: f32,
    pub formant_shift: f32,
    pub grain_ms: f32,
    pub jitter: f32,
    pub mangle: f32,
}

impl TypeParams {
    pub const FIELD_COUNT: usize = 19;

    /// `(min, max)` per field, in [`TypeParams::to_array`] order.
    pub const RANGES: [(f32, f32); Self::FIELD_COUNT] = [
        (-1.0, 1.0),     // bias
        (0.0, 1.0),      // sag
        (0.05, 1.0),     // threshold
        (1.0, 8.0),      // folds
        (1.0, 16.0),     // bit_depth
        (1.0, 32.0),     // downsample
        (0.0, 1.0),      // smoothness
        (0.0, 0.95),     // feedback
        (0.5, 50.0),     // delay_ms
        (50.0, 8000.0),  // resonance_hz
        (1.0, 4000.0),   // mod_freq_hz
        (0.1, 100.0),    // attack_ms
        (1.0, 1000.0),   // release_ms
        (0.0, 1.0),      // sensitivity
        (0.01, 1.0),     // chaos_rate
        (-1.0, 1.0),     // formant_shift
        (5.0, 100.0),    // grain_ms
        (0.0, 1.0),      // jitter
        (0.0, 1.0),      // mangle
    ];

    pub fn to_array(&self) -> [f32; Self::FIELD_COUNT] {
        [
            self.bias,
            self.sag,
            self.threshold,
            self.folds,
            self.bit_depth,
            self.downsample,
            self.smoothness,
            self.feedback,
            self.delay_ms,
            self.resonance_hz,
            self.mod_freq_hz,
            self.attack_ms,
            self.release_ms,
            self.sensitivity,
            self.chaos_rate,
            self.formant_shift,
            self.grain_ms,
            self.jitter,
            self.mangle,
        ]
    }

    pub fn from_array(values: [f32; Self::FIELD_COUNT]) -> Self {
        let [
            bias,
            sag,
            threshold,
            folds,
            bit_depth,
            downsample,
            smoothness,
            feedback,
            delay_ms,
            resonance_hz,
            mod_freq_hz,
            attack_ms,
            release_ms,
            sensitivity,
            chaos_rate,
            formant_shift,
            grain_ms,
            jitter,
            mangle,
        ] = values;
        Self {
            bias,
            sag,
            threshold,
            folds,
            bit_depth,
            downsample,
            smoothness,
            feedback,
            delay_ms,
            resonance_hz,
            mod_freq_hz,
            attack_ms,
            release_ms,
            sensitivity,
            chaos_rate,
            formant_shift,
            grain_ms,
            jitter,
            mangle,
        }
    }

    /// Copy with every field forced into its range.
    pub fn clamped(&self) -> Self {
        let mut values = self.to_array();
        for (v, &(min, max)) in values.iter_mut().zip(Self::RANGES.iter()) {
            *v = clamp_finite(*v, min, max);
        }
        Self::from_array(values)
    }

    /// Weighted sum `Σ wᵢ · paramsᵢ` over every field.
    pub fn interpolate<'a>(items: impl IntoIterator<Item = (f32, &'a TypeParams)>) -> Self {
        let mut acc = [0.0f32; Self::FIELD_COUNT];
        for (w, params) in items {
            for (a, v) in acc.iter_mut().zip(params.to_array()) {
                *a += w * v;
            }
        }
        Self::from_array(acc).clamped()
    }
}

impl Default for TypeParams {
    fn default() -> Self {
        Self {
            bias: 0.0,
            sag: 0.0,
            threshold: 1.0,
            folds: 2.0,
            bit_depth: 8.0,
            downsample: 4.0,
            smoothness: 0.0,
            feedback: 0.5,
            delay_ms: 5.0,
            resonance_hz: 800.0,
            mod_freq_hz: 220.0,
            attack_ms: 5.0,
            release_ms: 100.0,
            sensitivity: 0.5,
            chaos_rate: 0.2,
            formant_shift: 0.0,
            grain_ms: 30.0,
            jitter: 0.3,
            mangle: 0.5,
        }
    }
}
