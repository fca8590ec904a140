//! Distortion / Waveshaping
//!
//! Distortion adds harmonics by reshaping the waveform. The "drive" parameter
//! controls how aggressively the signal is pushed into the nonlinear region.
//!
//! # How Waveshaping Works
//!
//! A waveshaper applies a transfer function to each sample:
//!   output = f(input * drive)
//!
//! When drive is low (1.0), the signal stays in the linear region of f()
//! and passes through mostly unchanged. As drive increases, the signal hits
//! the nonlinear parts of f(), creating harmonic distortion.
//!
//! # Transfer Function Families
//!
//! Saturation (soft/hard clip, tube, tape, fuzz):
//!   f(x) flattens toward a ceiling
//!   - Compresses peaks, adds odd (symmetric) or even (asymmetric) harmonics
//!
//! Wavefolding (sine, triangle, Serge):
//!   When x exceeds the threshold it "folds" back on itself
//!   - Complex, metallic harmonics that keep multiplying with drive
//!
//! Rectification (full, half):
//!   f(x) = |x| or max(x, 0)
//!   - Octave-up character, strong DC offset (block it afterwards)
//!
//! Quantization (bit depth, level count):
//!   f(x) = round(x * levels) / levels
//!   - Stair-stepped, gritty digital sound
//!
//! # Drive Values
//!
//!   1.0  = Clean (no distortion)
//!   2-4  = Warm saturation
//!   5-10 = Heavy, aggressive
//!
//! Every function here is pure, branch-light and bounded: no loops whose trip
//! count depends on the input, so cost per sample is constant.

use std::f32::consts::FRAC_PI_2;

/// Soft clipping using x / (1 + |x|) transfer function.
///
/// This produces warm, tube-like saturation that gradually
/// compresses peaks without harsh artifacts.
#[inline]
pub fn soft_clip(sample: f32, drive: f32) -> f32 {
    let x = sample * drive;
    x / (1.0 + x.abs())
}

/// Hard clipping - simply clamps the signal at a threshold.
///
/// Creates harsh, buzzy distortion rich in odd harmonics.
/// Lower threshold = more distortion.
#[inline]
pub fn hard_clip(sample: f32, drive: f32, threshold: f32) -> f32 {
    let x = sample * drive;
    x.clamp(-threshold, threshold)
}

/// Rational tanh approximation (error below 0.025), saturating at ±3.
#[inline]
pub fn fast_tanh(x: f32) -> f32 {
    let x = x.clamp(-3.0, 3.0);
    let x2 = x * x;
    x * (27.0 + x2) / (27.0 + 9.0 * x2)
}

/// Asymmetric tube-style saturation.
///
/// `bias` shifts the operating point so positive and negative half-waves
/// saturate differently, which adds even harmonics. The static offset the bias
/// introduces is subtracted back out.
#[inline]
pub fn tube(sample: f32, drive: f32, bias: f32) -> f32 {
    let bias = bias.clamp(-1.0, 1.0) * 0.5;
    fast_tanh(sample * drive + bias) - fast_tanh(bias)
}

/// Tape-style saturation: soft knee with `sag` pulling the ceiling down.
#[inline]
pub fn tape(sample: f32, drive: f32, sag: f32) -> f32 {
    let ceiling = 1.0 - 0.4 * sag.clamp(0.0, 1.0);
    ceiling * fast_tanh(sample * drive / ceiling)
}

/// Fuzz: very high gain into a hard-ish knee.
#[inline]
pub fn fuzz(sample: f32, drive: f32) -> f32 {
    let x = sample * drive * 4.0;
    let shaped = x / (1.0 + x.abs()).sqrt();
    shaped.clamp(-1.0, 1.0)
}

/// Fuzz with different gain on each half-wave.
#[inline]
pub fn asymmetric_fuzz(sample: f32, drive: f32, bias: f32) -> f32 {
    let skew = 1.0 + bias.clamp(-1.0, 1.0) * 0.8;
    if sample >= 0.0 {
        fuzz(sample, drive * skew)
    } else {
        fuzz(sample, drive / skew)
    }
}

/// Sine wavefolder: f(x) = sin(x × π/2).
#[inline]
pub fn sine_fold(sample: f32, drive: f32) -> f32 {
    (sample * drive * FRAC_PI_2).sin()
}

/// Triangle wavefolder with a closed-form fold (no iteration).
///
/// Equivalent to reflecting the signal back each time it crosses
/// ±threshold, for any input magnitude.
#[inline]
pub fn triangle_fold(sample: f32, drive: f32, threshold: f32) -> f32 {
    let t = threshold.max(0.01);
    let x = sample * drive;
    // Map onto a period of 4t, then fold the triangle
    let period = 4.0 * t;
    let phase = (x + t).rem_euclid(period);
    if phase < 2.0 * t {
        phase - t
    } else {
        3.0 * t - phase
    }
}

/// Serge-style folder: a sine fold blended with soft saturation so low drive
/// stays warm and high drive adds dense folds.
#[inline]
pub fn serge_fold(sample: f32, drive: f32, folds: f32) -> f32 {
    let x = sample * drive;
    let folded = (x * folds.max(1.0) * FRAC_PI_2).sin();
    0.6 * folded + 0.4 * fast_tanh(x)
}

#[inline]
pub fn full_rectify(sample: f32, drive: f32) -> f32 {
    (sample * drive).abs().min(1.5)
}

#[inline]
pub fn half_rectify(sample: f32, drive: f32) -> f32 {
    (sample * drive).clamp(0.0, 1.5)
}

/// Quantize to `levels` steps per unit.
#[inline]
pub fn quantize(sample: f32, levels: f32) -> f32 {
    let levels = levels.max(1.0);
    (sample * levels).round() / levels
}

/// Reduce to `bits` of resolution across [-1, 1].
#[inline]
pub fn bit_crush(sample: f32, bits: f32) -> f32 {
    let bits = bits.clamp(1.0, 24.0);
    quantize(sample, 2.0f32.powf(bits - 1.0))
}
