//! Crossfade curves and power tracking for blending parallel processors.

use std::f32::consts::FRAC_PI_2;

use crate::{dsp::sanitize::clamp_unit, MIN_SAMPLE_RATE};

/*
Blending Parallel Signals
=========================

When several processors run on the same input and their outputs are combined,
the gains applied to each output decide how loud the blend is compared to any
single processor on its own.

Vocabulary
----------

  balance       Control value (0.0 to 1.0) between two signals.
                  balance = 0.0  →  100% signal A
                  balance = 1.0  →  100% signal B

  gain          The factor a processor's output is multiplied by before
                summing.

  power         Mean of the squared signal. Perceived loudness follows power,
                not amplitude.


Linear Crossfade
----------------

    gain_a = 1.0 - balance
    gain_b = balance

Amplitudes sum to 1.0. For two UNCORRELATED signals the power at the midpoint
is 0.5² + 0.5² = 0.5, a 3 dB dip.

    Level
      1.0 ──────╲      ╱──────
                 ╲    ╱
      0.5         ╲  ╱  ← dip
                   ╲╱
          0.0     0.5     1.0


Equal-Power Crossfade
---------------------

    gain_a = cos(balance × π/2)
    gain_b = sin(balance × π/2)

    gain_a² + gain_b² = 1 for every balance

At the midpoint both gains are √0.5 ≈ 0.707. Uncorrelated signals keep a
constant power through the whole fade.

The same idea extends to N signals: choose any non-negative gains and rescale
them so Σ gain² = 1.


Correlated Signals
------------------

Two distortions fed the SAME input produce strongly correlated outputs. For
perfectly correlated signals, amplitudes add: 0.707 + 0.707 = 1.414, a 3 dB
bump in the middle of an equal-power fade. Real distortion pairs sit between
the two extremes, so no fixed curve is right for every pair.

The fix is to measure: track the power of every processor output and of the
blended sum with one-pole mean-square followers, and scale the sum so its
power matches the gain-weighted average of the individual powers:

    target  = Σ gain_i² × power_i
    comp    = √(target / power_mix)

The compensation gain is smoothed and bounded so it never modulates audibly.
*/

/// Blend dry and wet samples using linear crossfade (single sample version).
///
/// output = (dry × (1-mix)) + (wet × mix)
#[inline]
pub fn blend_dry_wet(dry: f32, wet: f32, mix: f32) -> f32 {
    dry * (1.0 - mix) + wet * mix
}

/// Sum `outputs[i] × weights[i]` over the shorter of the two slices.
#[inline]
pub fn weighted_sum(outputs: &[f32], weights: &[f32]) -> f32 {
    outputs
        .iter()
        .zip(weights.iter())
        .map(|(&o, &w)| o * w)
        .sum()
}

/// Quarter-sine rise from 0.0 at `t = 0` to 1.0 at `t = 1`.
///
/// Paired with its mirror (`t` → `1 - t`) the squares always sum to one.
#[inline]
pub fn equal_power_curve(t: f32) -> f32 {
    (clamp_unit(t) * FRAC_PI_2).sin()
}

/// Equal-power gains for a two-way crossfade: `(gain_a, gain_b)`.
#[inline]
pub fn equal_power_gains(balance: f32) -> (f32, f32) {
    let angle = clamp_unit(balance) * FRAC_PI_2;
    (angle.cos(), angle.sin())
}

/// Rescale `gains` so that Σ gain² = 1.
///
/// Returns the power before rescaling. All-zero gains are left untouched.
#[inline]
pub fn normalize_power(gains: &mut [f32]) -> f32 {
    let power: f32 = gains.iter().map(|g| g * g).sum();
    if power > f32::EPSILON {
        let scale = 1.0 / power.sqrt();
        for g in gains.iter_mut() {
            *g *= scale;
        }
    }
    power
}

/// One-pole mean-square follower.
#[derive(Debug, Clone, Copy)]
pub struct PowerFollower {
    coeff: f32,
    power: f32,
}

impl PowerFollower {
    pub fn new(time_ms: f32, sample_rate: f32) -> Self {
        let mut follower = Self {
            coeff: 1.0,
            power: 0.0,
        };
        follower.set_time(time_ms, sample_rate);
        follower
    }

    pub fn set_time(&mut self, time_ms: f32, sample_rate: f32) {
        let samples = (time_ms.max(0.0) / 1000.0) * sample_rate.max(MIN_SAMPLE_RATE);
        self.coeff = if samples < 1.0 {
            1.0
        } else {
            1.0 - (-1.0 / samples).exp()
        };
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        self.power += self.coeff * (sample * sample - self.power);
        self.power
    }

    #[inline]
    pub fn power(&self) -> f32 {
        self.power
    }

    pub fn reset(&mut self) {
        self.power = 0.0;
    }
}

impl Default for PowerFollower {
    fn default() -> Self {
        Self::new(20.0, 48_000.0)
    }
}
