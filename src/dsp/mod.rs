//! Low-level DSP primitives used by the distortion and morph layers.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside processors. They intentionally stay focused on the
//! signal-processing math so the morph layer can layer on orchestration,
//! weighting and resource accounting.

/// Linear and equal-power crossfade curves, power tracking.
pub mod crossfade;
/// Waveshaping transfer functions.
pub mod distortion;
/// Envelope follower for dynamics-driven processing.
pub mod envelope;
/// Tone shaping filters and DC blocking.
pub mod filter;
/// Deterministic white noise.
pub mod noise;
/// Test-tone and carrier oscillators.
pub mod oscillator;
/// NaN/Inf sanitizing and range clamping.
pub mod sanitize;
/// One-pole parameter smoother.
pub mod smoother;

pub use smoother::{OnePoleSmoother, SmootherState};
