use crate::{
    dsp::crossfade::{equal_power_curve, normalize_power, PowerFollower},
    morph::weights::MorphWeights,
    MAX_MORPH_NODES, MIN_SAMPLE_RATE,
};

/*
Transition Zone
===============

In a cross-family blend every weighted node owns a running processor. Two
things go wrong if processors are simply switched on when their weight is
non-zero and mixed with gains equal to their weights:

  - a node at 2% weight costs as much CPU as one at 98%
  - a processor switched on mid-stream starts with cold filter and delay
    state, which clicks

The zone solves both. Each node's weight is compared against its strongest
competitor:

    relative = wᵢ / (wᵢ + max other w)

and mapped through a band:

    gain
    1.0 ┤                    ┌──────────
        │                  ╱
        │                ╱   equal-power (quarter sine)
        │              ╱
    0.0 ┤──────────────┘
        └──────────────┬──────┬─────────→ relative weight
                     0.40   0.60

    below 0.40   not processed at all
    0.40 - 0.60  processed, gain follows the quarter-sine curve
    above 0.60   full gain

With two nodes `relative` is just the node's own weight. With three or four,
comparing against the strongest competitor keeps the dominant node audible and
drops nodes that are clearly outweighed. The gains are then rescaled so
Σ gain² = 1 (equal power).

When a processor goes from inactive to active its gain is additionally ramped
up linearly over a short fade so its warm-up transient is never heard.


Level Compensation
------------------

Equal power is exact only for uncorrelated signals. Distortions of one input
are correlated, so the blend is measured and corrected (see `dsp::crossfade`).
*/

pub const ZONE_LOW: f32 = 0.40;
pub const ZONE_HIGH: f32 = 0.60;
pub const FADE_IN_MS: f32 = 8.0;

const POWER_FOLLOWER_MS: f32 = 20.0;
const COMPENSATION_MS: f32 = 10.0;
const COMPENSATION_RANGE: (f32, f32) = (0.5, 2.0);
const SILENCE_POWER: f32 = 1e-9;

/// Gain for a node's weight relative to its strongest competitor.
#[inline]
pub fn zone_gain(relative: f32) -> f32 {
    if relative < ZONE_LOW {
        0.0
    } else if relative >= ZONE_HIGH {
        1.0
    } else {
        equal_power_curve((relative - ZONE_LOW) / (ZONE_HIGH - ZONE_LOW))
    }
}

/// Equal-power zone gains for a weight vector.
pub fn zone_gains(weights: &MorphWeights) -> [f32; MAX_MORPH_NODES] {
    let w = weights.weights();
    let mut gains = [0.0f32; MAX_MORPH_NODES];

    for i in 0..MAX_MORPH_NODES {
        if w[i] <= 0.0 {
            continue;
        }
        let competitor = w
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .fold(0.0f32, |acc, (_, &v)| acc.max(v));
        gains[i] = zone_gain(w[i] / (w[i] + competitor));
    }

    if normalize_power(&mut gains) <= f32::EPSILON {
        // Unreachable for normalized weights (the dominant node is always at
        // relative ≥ 0.5), kept so a malformed vector still produces sound.
        for (g, &wi) in gains.iter_mut().zip(w) {
            *g = wi.sqrt();
        }
    }
    gains
}

#[derive(Debug, Clone)]
pub struct TransitionZoneController {
    sample_rate: f32,
    gains: [f32; MAX_MORPH_NODES],
    fades: [f32; MAX_MORPH_NODES],
    fade_step: f32,

    node_power: [PowerFollower; MAX_MORPH_NODES],
    mix_power: PowerFollower,
    compensation: f32,
    compensation_coeff: f32,
}

impl TransitionZoneController {
    pub fn new(sample_rate: f32) -> Self {
        let mut controller = Self {
            sample_rate,
            gains: [0.0; MAX_MORPH_NODES],
            fades: [0.0; MAX_MORPH_NODES],
            fade_step: 1.0,
            node_power: [PowerFollower::default(); MAX_MORPH_NODES],
            mix_power: PowerFollower::default(),
            compensation: 1.0,
            compensation_coeff: 1.0,
        };
        controller.prepare(sample_rate);
        controller
    }

    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(MIN_SAMPLE_RATE);
        self.fade_step = 1.0 / (FADE_IN_MS / 1000.0 * self.sample_rate).max(1.0);
        for follower in self.node_power.iter_mut() {
            follower.set_time(POWER_FOLLOWER_MS, self.sample_rate);
        }
        self.mix_power.set_time(POWER_FOLLOWER_MS, self.sample_rate);
        let samples = COMPENSATION_MS / 1000.0 * self.sample_rate;
        self.compensation_coeff = 1.0 - (-1.0 / samples).exp();
        self.reset();
    }

    /// Recompute zone gains. Nodes leaving the zone stop immediately (their
    /// gain is already zero at the zone edge); nodes entering it start a fade.
    pub fn update(&mut self, weights: &MorphWeights) {
        let gains = zone_gains(weights);
        for i in 0..MAX_MORPH_NODES {
            if gains[i] <= 0.0 {
                self.fades[i] = 0.0;
            } else if self.gains[i] <= 0.0 {
                self.node_power[i].reset();
            }
        }
        self.gains = gains;
    }

    /// Skip the fade-in for slots whose processors were already playing.
    pub fn mark_running(&mut self, running: &[bool; MAX_MORPH_NODES]) {
        for ((fade, &gain), &on) in self.fades.iter_mut().zip(&self.gains).zip(running) {
            if on && gain > 0.0 {
                *fade = 1.0;
            }
        }
    }

    /// True if slot `index` must be processed this sample.
    #[inline]
    pub fn is_active(&self, index: usize) -> bool {
        self.gains[index] > 0.0
    }

    pub fn active_count(&self) -> usize {
        self.gains.iter().filter(|g| **g > 0.0).count()
    }

    /// Zone gain without the fade-in ramp.
    #[inline]
    pub fn zone_gain(&self, index: usize) -> f32 {
        self.gains[index]
    }

    /// Mix processor outputs. Inactive slots are ignored.
    #[inline]
    pub fn mix(&mut self, outputs: &[f32; MAX_MORPH_NODES]) -> f32 {
        let mut mix = 0.0;
        let mut target = 0.0;

        for i in 0..MAX_MORPH_NODES {
            if self.gains[i] <= 0.0 {
                continue;
            }
            self.fades[i] = (self.fades[i] + self.fade_step).min(1.0);
            let g = self.gains[i] * self.fades[i];
            let power = self.node_power[i].process(outputs[i]);
            mix += g * outputs[i];
            target += g * g * power;
        }

        let mix_power = self.mix_power.process(mix);
        let wanted = if mix_power > SILENCE_POWER && target > SILENCE_POWER {
            (target / mix_power)
                .sqrt()
                .clamp(COMPENSATION_RANGE.0, COMPENSATION_RANGE.1)
        } else {
            1.0
        };
        self.compensation += self.compensation_coeff * (wanted - self.compensation);

        mix * self.compensation
    }

    #[inline]
    pub fn compensation(&self) -> f32 {
        self.compensation
    }

    pub fn reset(&mut self) {
        self.gains = [0.0; MAX_MORPH_NODES];
        self.fades = [0.0; MAX_MORPH_NODES];
        for follower in self.node_power.iter_mut() {
            follower.reset();
        }
        self.mix_power.reset();
        self.compensation = 1.0;
    }
}

impl Default for TransitionZoneController {
    fn default() -> Self {
        Self::new(48_000.0)
    }
}
