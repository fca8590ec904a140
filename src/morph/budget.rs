use std::sync::{
    atomic::{AtomicU32, AtomicUsize, Ordering},
    Arc,
};

use crate::{MAX_ACTIVE_PROCESSORS, MAX_MORPH_NODES, WEIGHT_EPSILON};

/*
Processor Budget
================

Every morph engine in the plugin draws from one pool of distortion processor
slots. The pool is a counter shared through an `Arc`, never a global, so each
test (or each plugin instance) gets its own.

    engine A ──request(3)──┐
    engine B ──request(1)──┼──→ [ active: 9 / 16 ]  pruning ε: 0.001
    engine C ──request(4)──┘

Grants are made with compare-and-swap, so the counter itself can never pass
the cap no matter how engines interleave.


Graceful Degradation
--------------------

When an engine cannot get all the processors it asks for, it escalates the
shared pruning threshold:

    ε = 0.001 → 0.006 → 0.011 → ... → 0.25 (ceiling)

Every engine prunes its weights with ε, so a higher threshold drops more
low-weight nodes across the whole plugin and frees slots. Past the ceiling no
further pruning happens; an engine that still cannot get slots renders only
its heaviest granted nodes, and always at least its dominant node. Audio
never stops.

Once the pool has room for a whole engine again, ε relaxes back down in the
same steps.

Configured nodes are never touched. Only what is rendered changes.
*/

pub const EPSILON_STEP: f32 = 0.005;
pub const MAX_PRUNING_THRESHOLD: f32 = 0.25;
/// Escalations that take a fresh threshold to the ceiling.
pub const ESCALATION_STEPS: usize = 50;

#[derive(Debug)]
pub struct ProcessorBudget {
    capacity: usize,
    active: AtomicUsize,
    epsilon_bits: AtomicU32,
}

impl ProcessorBudget {
    pub fn new() -> Self {
        Self::with_capacity(MAX_ACTIVE_PROCESSORS)
    }

    /// Budget with a custom cap, mostly for tests and small hosts.
    pub fn with_capacity(capacity: usize) -> Self {
        log::debug!("processor budget created with capacity {capacity}");
        Self {
            capacity,
            active: AtomicUsize::new(0),
            epsilon_bits: AtomicU32::new(WEIGHT_EPSILON.to_bits()),
        }
    }

    /// A budget ready to hand to several engines.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Ask for `count` processors. Returns how many were granted (0..=count).
    pub fn request(&self, count: usize) -> usize {
        if count == 0 {
            return 0;
        }
        let mut current = self.active.load(Ordering::Acquire);
        loop {
            let grant = count.min(self.capacity.saturating_sub(current));
            if grant == 0 {
                return 0;
            }
            match self.active.compare_exchange_weak(
                current,
                current + grant,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return grant,
                Err(actual) => current = actual,
            }
        }
    }

    /// Return `count` processors to the pool.
    pub fn release(&self, count: usize) {
        if count == 0 {
            return;
        }
        // Saturating: a double release must not wrap the counter
        let _ = self
            .active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |active| {
                Some(active.saturating_sub(count))
            });
    }

    /// Processors currently granted across every engine.
    #[inline]
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Threshold every engine prunes its weights with.
    #[inline]
    pub fn pruning_threshold(&self) -> f32 {
        f32::from_bits(self.epsilon_bits.load(Ordering::Acquire))
    }

    /// True once the threshold has hit its ceiling.
    pub fn is_saturated(&self) -> bool {
        self.pruning_threshold() >= MAX_PRUNING_THRESHOLD
    }

    /// Raise the threshold one step (up to the ceiling). Returns the new value.
    pub fn escalate(&self) -> f32 {
        self.step_threshold(|eps| (eps + EPSILON_STEP).min(MAX_PRUNING_THRESHOLD))
    }

    /// Lower the threshold one step if the pool has room for a full engine.
    /// Returns the new value.
    pub fn relax(&self) -> f32 {
        if self.active_count() + MAX_MORPH_NODES > self.capacity {
            return self.pruning_threshold();
        }
        self.step_threshold(|eps| (eps - EPSILON_STEP).max(WEIGHT_EPSILON))
    }

    fn step_threshold(&self, step: impl Fn(f32) -> f32) -> f32 {
        let result = self
            .epsilon_bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                let next = step(f32::from_bits(bits));
                (next.to_bits() != bits).then_some(next.to_bits())
            });
        match result {
            Ok(previous) => step(f32::from_bits(previous)),
            Err(unchanged) => f32::from_bits(unchanged),
        }
    }
}

impl Default for ProcessorBudget {
    fn default() -> Self {
        Self::new()
    }
}
