//! One-pole parameter smoothing.

use crate::{dsp::sanitize::finite_or, MIN_SAMPLE_RATE};

/*
One-Pole Smoothing
==================

Jumping a control value from one setting to another in a single sample
produces a click (or "zipper" noise when it happens repeatedly). A one-pole
smoother turns every jump into an exponential glide:

    current = current + coeff × (target - current)

Each sample closes the same FRACTION of the remaining gap, so the glide is
fast at first and slows as it approaches the target.

    Value
    target ┤          ____________
           │       _-‾
           │     _‾
           │    /
           │   /
    start  ┤__/
           └──┬──────────┬────────→ Time
            change     settle


Defining "Smoothing Time"
-------------------------

An exponential never quite arrives, so "time" needs a definition. We use the
time to settle within 5% of the step:

    residual after N samples = (1 - coeff)^N
    (1 - coeff)^N = 0.05
    coeff = 1 - 0.05^(1/N)

With N = time_ms / 1000 × sample_rate, a 100 ms setting is within 5% of the
target after exactly 100 ms.

A time of 0 ms gives coeff = 1: the next sample lands on the target.

The largest step the smoother ever takes in one sample is `coeff` times the
distance to the target, which bounds how fast anything downstream can change.


State
-----

    AtTarget       current == target, next() is free
    Transitioning  gliding toward target

Once the remaining distance is below a tiny epsilon the smoother snaps onto
the target and reports AtTarget.
*/

/// Remaining fraction of a step when the smoothing time has elapsed.
const SETTLE_RESIDUAL: f32 = 0.05;

/// Distance at which a gliding value snaps onto its target.
pub const SNAP_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmootherState {
    AtTarget,
    Transitioning,
}

/// Exponential glide toward a target value.
#[derive(Debug, Clone, Copy)]
pub struct OnePoleSmoother {
    current: f32,
    target: f32,
    coeff: f32,
    state: SmootherState,
}

impl OnePoleSmoother {
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            state: SmootherState::AtTarget,
        }
    }

    /// Compute the per-sample coefficient for a smoothing time.
    pub fn coefficient_for(time_ms: f32, sample_rate: f32) -> f32 {
        let time_ms = finite_or(time_ms, 0.0).max(0.0);
        let samples = (time_ms / 1000.0) * sample_rate.max(MIN_SAMPLE_RATE);
        if samples <= 1.0 {
            return 1.0;
        }
        1.0 - (SETTLE_RESIDUAL.ln() / samples).exp()
    }

    pub fn configure(&mut self, time_ms: f32, sample_rate: f32) {
        self.coeff = Self::coefficient_for(time_ms, sample_rate);
    }

    pub fn set_target(&mut self, target: f32) {
        let target = finite_or(target, self.target);
        self.target = target;
        self.state = if (target - self.current).abs() <= SNAP_EPSILON {
            self.current = target;
            SmootherState::AtTarget
        } else {
            SmootherState::Transitioning
        };
    }

    /// Advance one sample and return the smoothed value.
    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.state == SmootherState::AtTarget {
            return self.current;
        }

        self.current += self.coeff * (self.target - self.current);
        if (self.target - self.current).abs() <= SNAP_EPSILON {
            self.current = self.target;
            self.state = SmootherState::AtTarget;
        }
        self.current
    }

    /// Jump to `value` and hold it (clears history).
    pub fn snap_to(&mut self, value: f32) {
        let value = finite_or(value, 0.0);
        self.current = value;
        self.target = value;
        self.state = SmootherState::AtTarget;
    }

    pub fn snap_to_target(&mut self) {
        self.snap_to(self.target);
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    #[inline]
    pub fn coefficient(&self) -> f32 {
        self.coeff
    }

    #[inline]
    pub fn state(&self) -> SmootherState {
        self.state
    }

    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.state == SmootherState::Transitioning
    }
}

impl Default for OnePoleSmoother {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_time_snaps_immediately() {
        let mut s = OnePoleSmoother::new(0.0);
        s.configure(0.0, 48_000.0);
        s.set_target(1.0);
        assert_eq!(s.next(), 1.0);
        assert!(!s.is_smoothing());
    }

    #[test]
    fn test_settles_within_five_percent_at_configured_time() {
        let sample_rate = 48_000.0;
        let mut s = OnePoleSmoother::new(0.0);
        s.configure(100.0, sample_rate);
        s.set_target(1.0);

        let mut settled_at = None;
        for i in 1..=48_000 {
            let v = s.next();
            if (1.0 - v) <= 0.05 {
                settled_at = Some(i);
                break;
            }
        }
        let ms = settled_at.unwrap() as f32 / sample_rate * 1000.0;
        assert!(ms >= 95.0 && ms <= 105.0, "settled at {ms} ms");
    }

    #[test]
    fn test_reaches_target_and_reports_state() {
        let mut s = OnePoleSmoother::new(0.0);
        s.configure(10.0, 48_000.0);
        s.set_target(1.0);
        assert_eq!(s.state(), SmootherState::Transitioning);
        for _ in 0..48_000 {
            s.next();
        }
        assert_eq!(s.state(), SmootherState::AtTarget);
        assert_eq!(s.current(), 1.0);
    }

    #[test]
    fn test_step_never_exceeds_coefficient_times_distance() {
        let mut s = OnePoleSmoother::new(0.0);
        s.configure(50.0, 48_000.0);
        s.set_target(1.0);
        let mut prev = s.current();
        for _ in 0..10_000 {
            let v = s.next();
            assert!((v - prev).abs() <= s.coefficient() + 1e-7);
            prev = v;
        }
    }

    #[test]
    fn test_non_finite_target_ignored() {
        let mut s = OnePoleSmoother::new(0.5);
        s.set_target(f32::NAN);
        assert_eq!(s.target(), 0.5);
        assert!(!s.is_smoothing());
    }

    #[test]
    fn test_snap_clears_glide() {
        let mut s = OnePoleSmoother::new(0.0);
        s.configure(100.0, 48_000.0);
        s.set_target(1.0);
        s.next();
        s.snap_to(0.25);
        assert_eq!(s.next(), 0.25);
        assert!(!s.is_smoothing());
    }
}
