#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{sanitize::clamp_finite, OnePoleSmoother},
    morph::weights::MorphWeights,
    MAX_MORPH_NODES, MAX_SMOOTHING_MS, MIN_SAMPLE_RATE,
};

/*
Smoothing Control
=================

Two kinds of driver move a morph, and they need smoothing in different places.

Manual control (a knob, a host automation lane, the pad) moves the cursor
continuously. Smoothing the CURSOR keeps the glide on a path through morph
space, so the weights follow the same curve a slow hand would trace:

    cursor ──→ [smooth x, y] ──→ weights(x, y) ──→ processors

Automated drivers (envelope followers, random or chaotic sources, raw weight
input) jump. Smoothing their position would still be a straight line through
morph space, and straight lines through a corner-heavy IDW field produce very
fast weight swings. Those drivers get the WEIGHTS smoothed instead:

    driver ──→ weights ──→ [smooth w₀..w₃] ──→ processors

Only one target is live at a time. Element-wise smoothing of two vectors that
each sum to 1 with one shared coefficient keeps the sum at 1 on every sample.


Switching Targets
-----------------

Switching from weights to position, or changing what the position means
(different node layout, different mode), would make the weights jump. In
those cases the weight smoothers take over for a moment ("handover"): they
start from the weights currently playing and chase the newly computed ones
until they arrive.

Before the first target is set (after construction, prepare or reset) there
is no history to glide from, so the first target is taken immediately.
*/

/// Who is driving the morph.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlContext {
    /// Continuous cursor movement: smooth the position.
    #[default]
    Manual,
    /// Discontinuous driver: smooth the computed weights.
    Automated,
}

/// Which quantity is currently being smoothed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothingTarget {
    Position,
    Weights,
}

#[derive(Debug, Clone)]
pub struct SmoothingController {
    target: SmoothingTarget,
    context: ControlContext,
    position: [OnePoleSmoother; 2],
    weights: [OnePoleSmoother; MAX_MORPH_NODES],
    active_count: usize,
    handover: bool,
    primed: bool,
    current: MorphWeights,
    time_ms: f32,
    sample_rate: f32,
}

impl SmoothingController {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            target: SmoothingTarget::Position,
            context: ControlContext::Manual,
            position: [OnePoleSmoother::default(); 2],
            weights: [OnePoleSmoother::default(); MAX_MORPH_NODES],
            active_count: MAX_MORPH_NODES,
            handover: false,
            primed: false,
            current: MorphWeights::default(),
            time_ms: 0.0,
            sample_rate: sample_rate.max(MIN_SAMPLE_RATE),
        }
    }

    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(MIN_SAMPLE_RATE);
        self.set_time_ms(self.time_ms);
        self.reset();
    }

    /// Smoothing time in ms, clamped to [0, 500]. 0 snaps on the next sample.
    pub fn set_time_ms(&mut self, time_ms: f32) {
        self.time_ms = clamp_finite(time_ms, 0.0, MAX_SMOOTHING_MS);
        for s in self.position.iter_mut().chain(self.weights.iter_mut()) {
            s.configure(self.time_ms, self.sample_rate);
        }
    }

    #[inline]
    pub fn time_ms(&self) -> f32 {
        self.time_ms
    }

    /// Per-sample coefficient; the largest fraction of the remaining distance
    /// any smoothed value covers in one sample.
    #[inline]
    pub fn coefficient(&self) -> f32 {
        self.position[0].coefficient()
    }

    pub fn set_context(&mut self, context: ControlContext) {
        self.context = context;
    }

    #[inline]
    pub fn context(&self) -> ControlContext {
        self.context
    }

    /// False until the first target after construction, prepare or reset.
    #[inline]
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    #[inline]
    pub fn target(&self) -> SmoothingTarget {
        self.target
    }

    /// Glide the cursor toward `(x, y)`.
    pub fn set_position_target(&mut self, x: f32, y: f32) {
        if !self.primed {
            self.target = SmoothingTarget::Position;
            self.position[0].snap_to(x);
            self.position[1].snap_to(y);
            self.primed = true;
            return;
        }
        if self.target == SmoothingTarget::Weights {
            // The cursor jumps, the weights hand over
            self.target = SmoothingTarget::Position;
            self.position[0].snap_to(x);
            self.position[1].snap_to(y);
            self.begin_handover();
            return;
        }
        self.position[0].set_target(x);
        self.position[1].set_target(y);
    }

    /// Glide the weights toward `weights`.
    pub fn set_weight_target(&mut self, weights: &MorphWeights) {
        self.active_count = weights.active_count();
        if !self.primed {
            self.target = SmoothingTarget::Weights;
            self.hold(*weights);
            self.primed = true;
            return;
        }
        if self.target == SmoothingTarget::Position || self.handover {
            self.seed_weights();
            self.handover = false;
        }
        self.target = SmoothingTarget::Weights;
        for (s, &w) in self.weights.iter_mut().zip(weights.weights()) {
            s.set_target(w);
        }
    }

    /// Start gliding from the weights now playing toward whatever the
    /// position computes from here on.
    pub fn begin_handover(&mut self) {
        if !self.primed {
            return;
        }
        self.seed_weights();
        self.handover = true;
    }

    /// Pin the output to `weights` with no glide.
    ///
    /// Used when nothing is moving, so the result must equal the target.
    pub fn hold(&mut self, weights: MorphWeights) {
        self.current = weights;
        self.active_count = weights.active_count();
        for (s, &w) in self.weights.iter_mut().zip(weights.weights()) {
            s.snap_to(w);
        }
        self.handover = false;
    }

    /// Advance one sample.
    ///
    /// `compute` maps a smoothed cursor to weights; it is only called while
    /// position smoothing is live.
    #[inline]
    pub fn next<F>(&mut self, compute: F) -> MorphWeights
    where
        F: FnOnce(f32, f32) -> MorphWeights,
    {
        let weights = match self.target {
            SmoothingTarget::Position => {
                let x = self.position[0].next();
                let y = self.position[1].next();
                let computed = compute(x, y);
                if self.handover {
                    self.active_count = computed.active_count();
                    for (s, &w) in self.weights.iter_mut().zip(computed.weights()) {
                        s.set_target(w);
                    }
                    let glided = self.step_weights();
                    if !self.weights.iter().any(|s| s.is_smoothing()) {
                        self.handover = false;
                    }
                    glided
                } else {
                    computed
                }
            }
            SmoothingTarget::Weights => self.step_weights(),
        };
        self.current = weights;
        weights
    }

    /// Current smoothed cursor.
    pub fn position(&self) -> (f32, f32) {
        (self.position[0].current(), self.position[1].current())
    }

    /// Cursor the position smoothers are heading for.
    pub fn position_target(&self) -> (f32, f32) {
        (self.position[0].target(), self.position[1].target())
    }

    /// Weights produced by the last `next` or `hold`.
    #[inline]
    pub fn current(&self) -> &MorphWeights {
        &self.current
    }

    /// True while any live smoother has not reached its target.
    pub fn is_smoothing(&self) -> bool {
        match self.target {
            SmoothingTarget::Position => {
                self.handover || self.position.iter().any(|s| s.is_smoothing())
            }
            SmoothingTarget::Weights => self.weights.iter().any(|s| s.is_smoothing()),
        }
    }

    /// Jump every smoother to its target and forget the first-target state.
    pub fn reset(&mut self) {
        for s in self.position.iter_mut().chain(self.weights.iter_mut()) {
            s.snap_to_target();
        }
        self.handover = false;
        self.primed = false;
    }

    fn seed_weights(&mut self) {
        let current = self.current;
        for (s, &w) in self.weights.iter_mut().zip(current.weights()) {
            s.snap_to(w);
        }
    }

    fn step_weights(&mut self) -> MorphWeights {
        let mut raw = [0.0f32; MAX_MORPH_NODES];
        for (r, s) in raw.iter_mut().zip(self.weights.iter_mut()) {
            *r = s.next();
        }
        MorphWeights::from_raw(&raw, self.active_count.max(self.current.active_count()))
    }
}

impl Default for SmoothingController {
    fn default() -> Self {
        Self::new(48_000.0)
    }
}
