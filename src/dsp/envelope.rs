use crate::{dsp::sanitize::finite_or, MIN_SAMPLE_RATE};

/*
Envelope Follower
=================

An envelope follower tracks the loudness contour of a signal. Dynamics-driven
distortion uses it to push harder on loud passages and back off on quiet
ones.

Vocabulary
----------

  level     The follower's output (0.0 and up). Roughly the signal's peak
            amplitude, smoothed.

  attack    How quickly the level rises when the input gets louder.

  release   How quickly the level falls when the input gets quieter.

  rectify   Take |x| so negative and positive peaks count the same.


The Math
--------

Per sample:

    input = |x|
    coeff = attack_coeff   if input > level
            release_coeff  otherwise
    level = level + coeff × (input - level)

    coeff = 1 - e^(-1 / (time_seconds × sample_rate))

This is a one-pole smoother whose speed depends on direction. Fast attack and
slow release give the classic "peak with hang" contour:

    |x|   ▕▔▏    ▕▔▔▏
          ▕ ▏    ▕  ▏
    level  ╱‾‾‾╲__ ╱‾‾‾╲___
          ╱       ╲╱       ╲___


Keeping State Across Reconfiguration
------------------------------------

Changing attack or release only swaps coefficients; the current level is
kept. A follower that is re-parameterized every sample (as when its settings
are being interpolated between two presets) therefore tracks continuously
instead of restarting from zero.
*/

#[derive(Debug, Clone, Copy)]
pub struct EnvelopeFollower {
    level: f32,
    attack_coeff: f32,
    release_coeff: f32,
    sample_rate: f32,
}

impl EnvelopeFollower {
    pub fn new(sample_rate: f32, attack_ms: f32, release_ms: f32) -> Self {
        let mut follower = Self {
            level: 0.0,
            attack_coeff: 1.0,
            release_coeff: 1.0,
            sample_rate: sample_rate.max(MIN_SAMPLE_RATE),
        };
        follower.set_times(attack_ms, release_ms);
        follower
    }

    fn coeff(time_ms: f32, sample_rate: f32) -> f32 {
        let samples = (finite_or(time_ms, 0.0).max(0.0) / 1000.0) * sample_rate;
        if samples < 1.0 {
            1.0
        } else {
            1.0 - (-1.0 / samples).exp()
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(MIN_SAMPLE_RATE);
    }

    /// Update attack and release times without touching the current level.
    pub fn set_times(&mut self, attack_ms: f32, release_ms: f32) {
        self.attack_coeff = Self::coeff(attack_ms, self.sample_rate);
        self.release_coeff = Self::coeff(release_ms, self.sample_rate);
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let input = finite_or(sample, 0.0).abs();
        let coeff = if input > self.level {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.level += coeff * (input - self.level);
        self.level
    }

    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn reset(&mut self) {
        self.level = 0.0;
    }
}

impl Default for EnvelopeFollower {
    fn default() -> Self {
        Self::new(48_000.0, 5.0, 100.0)
    }
}
