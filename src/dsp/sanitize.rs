//! Input sanitizing for values crossing into the audio path.
//!
//! Anything the engine receives (cursor positions, parameters, samples) may be
//! NaN or infinite when an upstream stage misbehaves. These helpers map such
//! values onto a safe default before they reach any arithmetic, so a single bad
//! value never propagates into weights or filter state.

/// Replace a non-finite value with `fallback`.
#[inline]
pub fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Clamp into `[min, max]`. NaN maps to `min`, infinities to the nearest bound.
#[inline]
pub fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Clamp into the normalized `[0, 1]` range used for morph-space coordinates.
#[inline]
pub fn clamp_unit(value: f32) -> f32 {
    clamp_finite(value, 0.0, 1.0)
}

/// Audio samples: non-finite becomes silence.
#[inline]
pub fn sanitize_sample(sample: f32) -> f32 {
    finite_or(sample, 0.0)
}
