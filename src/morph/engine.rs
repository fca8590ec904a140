use std::sync::Arc;

#[cfg(feature = "rtrb")]
use rtrb::RingBuffer;

#[cfg(feature = "rtrb")]
use crate::morph::message::MorphController;
use crate::{
    distortion::{DistortionAdapter, Waveshaper},
    dsp::{envelope::EnvelopeFollower, sanitize::clamp_unit},
    morph::{
        budget::{ProcessorBudget, ESCALATION_STEPS, MAX_PRUNING_THRESHOLD},
        message::{MessageReceiver, MorphMessage},
        node::{default_nodes, MorphMode, MorphNode},
        smoothing::{ControlContext, SmoothingController, SmoothingTarget},
        strategy::{InterpolatedSettings, MorphPath},
        transition::{zone_gains, TransitionZoneController},
        weights::{compute_weights_with_threshold, MorphWeights},
    },
    MAX_BLOCK_SIZE, MAX_MORPH_NODES, MIN_ACTIVE_NODES, MIN_SAMPLE_RATE,
};

/*
Morph Engine
============

Owns up to four distortion nodes and turns a cursor (or a raw weight vector)
into one output sample per input sample.

Per block:

    messages ──→ setters
                   │
    budget ε ──→ target weights (pruned)          ← only when nothing moves
                   │
    candidates ──→ path (family table) ──→ processor request
                   │                          │ short? escalate ε until it fits
                   │                          ↓
                   └──────────────→ render limit (heaviest granted nodes)

Per sample:

    smoother step (only while moving) ──→ weights
         │
         ├── Interpolated      one shared processor, interpolated settings
         ├── EnvelopeCoupled   same, plus the engine's envelope follower
         ├── SampleBlend       Σ wᵢ · nodeᵢ(x)
         └── CrossFamily       transition zone gains, level compensated


Candidates
----------

At rest the candidates are the nodes with non-zero weight. While a smoother
is moving the weights may pass through any configured node within the
block, so every active slot is a candidate. This is what keeps the path
fixed for the whole block.


Lifecycle
---------

    Unprepared ──prepare──→ Prepared ──process──→ Processing
                                ↑                     │
                                └───────reset─────────┘

Processing while unprepared passes audio through untouched.
*/

pub const DEFAULT_SMOOTHING_MS: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Unprepared,
    Prepared,
    Processing,
}

/// What the caller last asked the morph to follow.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Driver {
    Position { x: f32, y: f32 },
    RawWeights([f32; MAX_MORPH_NODES]),
}

pub struct MorphEngine<A: DistortionAdapter = Waveshaper> {
    budget: Arc<ProcessorBudget>,
    state: EngineState,
    sample_rate: f32,
    max_block_size: usize,

    nodes: [MorphNode; MAX_MORPH_NODES],
    active_count: usize,
    mode: MorphMode,
    driver: Driver,

    smoothing: SmoothingController,
    transition: TransitionZoneController,
    envelope: EnvelopeFollower,

    node_adapters: [A; MAX_MORPH_NODES],
    shared: A,

    weights: MorphWeights,
    path: MorphPath,
    threshold: f32,
    render_limit: usize,
    granted: usize,
    rendered: usize,
    countdown: usize,
    dirty: bool,

    receiver: Option<Box<dyn MessageReceiver + Send>>,
}

impl MorphEngine<Waveshaper> {
    /// Engine using the reference [`Waveshaper`] for every node.
    pub fn new(budget: Arc<ProcessorBudget>) -> Self {
        Self::with_adapters(budget, Waveshaper::default)
    }
}

impl<A: DistortionAdapter> MorphEngine<A> {
    /// Engine whose five processors (one per node plus the shared one) come
    /// from `factory`.
    pub fn with_adapters(budget: Arc<ProcessorBudget>, mut factory: impl FnMut() -> A) -> Self {
        let sample_rate = 48_000.0;
        let mut smoothing = SmoothingController::new(sample_rate);
        smoothing.set_time_ms(DEFAULT_SMOOTHING_MS);
        let threshold = budget.pruning_threshold();

        Self {
            budget,
            state: EngineState::Unprepared,
            sample_rate,
            max_block_size: MAX_BLOCK_SIZE,
            nodes: default_nodes(),
            active_count: MIN_ACTIVE_NODES,
            mode: MorphMode::default(),
            driver: Driver::Position { x: 0.0, y: 0.0 },
            smoothing,
            transition: TransitionZoneController::new(sample_rate),
            envelope: EnvelopeFollower::default(),
            node_adapters: std::array::from_fn(|_| factory()),
            shared: factory(),
            weights: MorphWeights::default(),
            path: MorphPath::default(),
            threshold,
            render_limit: MAX_MORPH_NODES,
            granted: 0,
            rendered: 0,
            countdown: 0,
            dirty: true,
            receiver: None,
        }
    }

    /// Allocate and configure everything for `sample_rate`.
    ///
    /// Must run before processing and never on the audio thread.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        self.sample_rate = if sample_rate.is_finite() {
            sample_rate.max(MIN_SAMPLE_RATE)
        } else {
            48_000.0
        };
        self.max_block_size = max_block_size.clamp(1, MAX_BLOCK_SIZE);

        self.smoothing.prepare(self.sample_rate);
        self.transition.prepare(self.sample_rate);
        self.envelope.set_sample_rate(self.sample_rate);

        for (adapter, node) in self.node_adapters.iter_mut().zip(&self.nodes) {
            adapter.prepare(self.sample_rate, self.max_block_size);
            adapter.configure(node.distortion_type, &node.common, &node.params);
        }
        self.shared.prepare(self.sample_rate, self.max_block_size);

        self.state = EngineState::Prepared;
        self.reset();

        log::debug!(
            "morph engine prepared: {} Hz, max block {}, {} nodes, {}",
            self.sample_rate,
            self.max_block_size,
            self.active_count,
            self.mode
        );
    }

    /// Clear smoother, transition and processor history.
    ///
    /// Node configuration, mode, position and smoothing time are kept. Held
    /// processor grants go back to the budget.
    pub fn reset(&mut self) {
        self.budget.release(self.granted);
        self.granted = 0;

        self.smoothing.reset();
        self.transition.reset();
        self.envelope.reset();
        for adapter in self.node_adapters.iter_mut() {
            adapter.reset();
        }
        self.shared.reset();

        self.path = MorphPath::default();
        self.render_limit = MAX_MORPH_NODES;
        self.rendered = 0;
        self.countdown = 0;
        self.dirty = true;

        if self.state == EngineState::Processing {
            self.state = EngineState::Prepared;
        }
    }

    // Configuration -------------------------------------------------------

    /// Copy up to four nodes into slots 0.. in order. Each copy is clamped
    /// and its id set to its slot.
    pub fn set_nodes(&mut self, nodes: &[MorphNode]) {
        for (slot, node) in nodes.iter().take(MAX_MORPH_NODES).enumerate() {
            self.store_node(slot, node);
        }
        self.retarget(true);
    }

    /// Replace a single slot. Out-of-range slots are ignored.
    pub fn set_node(&mut self, slot: usize, node: &MorphNode) {
        if slot < MAX_MORPH_NODES {
            self.store_node(slot, node);
            self.retarget(true);
        }
    }

    pub fn set_mode(&mut self, mode: MorphMode) {
        if mode != self.mode {
            self.mode = mode;
            self.retarget(true);
        }
    }

    /// Clamped to [2, 4].
    pub fn set_active_node_count(&mut self, count: usize) {
        let count = count.clamp(MIN_ACTIVE_NODES, MAX_MORPH_NODES);
        if count != self.active_count {
            self.active_count = count;
            self.retarget(true);
        }
    }

    /// Follow a cursor. Coordinates are clamped into [0, 1].
    pub fn set_morph_position(&mut self, x: f32, y: f32) {
        self.driver = Driver::Position {
            x: clamp_unit(x),
            y: clamp_unit(y),
        };
        self.retarget(false);
    }

    /// Follow an externally computed weight vector. Always weight-smoothed.
    pub fn set_raw_weights(&mut self, weights: &[f32]) {
        let mut raw = [0.0; MAX_MORPH_NODES];
        for (r, &w) in raw.iter_mut().zip(weights) {
            *r = w;
        }
        self.driver = Driver::RawWeights(raw);
        self.retarget(false);
    }

    /// Clamped to [0, 500] ms.
    pub fn set_smoothing_time_ms(&mut self, time_ms: f32) {
        self.smoothing.set_time_ms(time_ms);
    }

    pub fn set_control_context(&mut self, context: ControlContext) {
        if context != self.smoothing.context() {
            self.smoothing.set_context(context);
            self.retarget(true);
        }
    }

    /// Apply one queued configuration change.
    pub fn apply_message(&mut self, msg: MorphMessage) {
        match msg {
            MorphMessage::SetNode { slot, node } => self.set_node(slot as usize, &node),
            MorphMessage::SetMode(mode) => self.set_mode(mode),
            MorphMessage::SetPosition { x, y } => self.set_morph_position(x, y),
            MorphMessage::SetRawWeights(weights) => self.set_raw_weights(&weights),
            MorphMessage::SetSmoothingTime { ms } => self.set_smoothing_time_ms(ms),
            MorphMessage::SetActiveNodeCount(count) => self.set_active_node_count(count as usize),
            MorphMessage::SetControlContext(context) => self.set_control_context(context),
            MorphMessage::Reset => self.reset(),
        }
    }

    /// Drain `receiver` at the start of every processing call.
    pub fn set_message_receiver(&mut self, receiver: impl MessageReceiver + Send + 'static) {
        self.receiver = Some(Box::new(receiver));
    }

    /// Create a wait-free queue into this engine and return its sending end.
    #[cfg(feature = "rtrb")]
    pub fn control_channel(&mut self, capacity: usize) -> MorphController {
        let (tx, rx) = RingBuffer::new(capacity.max(1));
        self.set_message_receiver(rx);
        MorphController::new(tx)
    }

    // Processing ----------------------------------------------------------

    /// Process one sample. The path is re-resolved every `max_block_size`
    /// samples or after a configuration change.
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        if self.state == EngineState::Unprepared {
            return sample;
        }
        self.drain_messages();
        if self.dirty || self.countdown == 0 {
            self.begin_block();
            self.countdown = self.max_block_size;
        }
        self.countdown -= 1;
        self.process_sample(sample)
    }

    /// Process `buffer` in place, resolving the path once per chunk of at
    /// most `max_block_size` samples.
    pub fn process_block(&mut self, buffer: &mut [f32]) {
        if self.state == EngineState::Unprepared {
            return;
        }
        self.drain_messages();
        let chunk_size = self.max_block_size;
        for chunk in buffer.chunks_mut(chunk_size) {
            self.begin_block();
            for sample in chunk.iter_mut() {
                *sample = self.process_sample(*sample);
            }
        }
        self.countdown = 0;
    }

    fn drain_messages(&mut self) {
        loop {
            let Some(msg) = self.receiver.as_mut().and_then(|rx| rx.pop()) else {
                break;
            };
            self.apply_message(msg);
        }
    }

    fn begin_block(&mut self) {
        if !self.smoothing.is_primed() {
            self.retarget(false);
        }
        self.threshold = self.budget.pruning_threshold();
        let previous_path = self.path;

        let mut moving = self.settle_weights();
        let mut demand = self.resolve();

        if self.negotiate(demand) {
            self.budget.relax();
        } else {
            // Short on processors: prune harder everywhere until the demand
            // fits or the threshold tops out
            for _ in 0..ESCALATION_STEPS {
                self.threshold = self.budget.escalate();
                moving = self.settle_weights();
                demand = self.resolve();
                if self.negotiate(demand) || self.threshold >= MAX_PRUNING_THRESHOLD {
                    break;
                }
            }
        }

        // Below the ceiling the grant covers the demand; only a saturated
        // budget leaves the dominant node rendering without one
        self.render_limit = if self.path.uses_shared_processor() {
            MAX_MORPH_NODES
        } else {
            self.granted.clamp(1, MAX_MORPH_NODES)
        };
        if !self.path.uses_shared_processor() {
            self.weights.retain_strongest(self.render_limit);
            if !moving {
                self.smoothing.hold(self.weights);
            }
        }

        if self.path.is_cross_family() {
            if previous_path != MorphPath::CrossFamily {
                self.enter_cross_family(previous_path);
            }
            self.transition.update(&self.weights);
        } else if previous_path.is_cross_family() {
            self.transition.reset();
        }
        if self.path.uses_shared_processor() {
            self.configure_shared();
        }

        self.rendered = self.count_rendered();
        self.dirty = false;
        self.state = EngineState::Processing;
    }

    /// At rest, pin the weights to their (pruned) target. Returns true if a
    /// smoother is still moving.
    fn settle_weights(&mut self) -> bool {
        if self.smoothing.is_smoothing() {
            return true;
        }
        self.weights = self.target_weights();
        self.smoothing.hold(self.weights);
        false
    }

    /// Resolve the path for this block and return its processor demand.
    fn resolve(&mut self) -> usize {
        let moving = self.smoothing.is_smoothing();
        let mut candidates = [false; MAX_MORPH_NODES];
        for (i, c) in candidates.iter_mut().enumerate() {
            *c = if moving {
                i < self.active_count
            } else {
                self.weights.get(i) > 0.0
            };
        }
        self.path = MorphPath::resolve(
            self.node_adapters
                .iter()
                .zip(candidates)
                .filter(|(_, on)| *on)
                .map(|(adapter, _)| adapter.family()),
        );

        let count = candidates.iter().filter(|c| **c).count();
        if self.path.is_cross_family() && !moving {
            zone_gains(&self.weights).iter().filter(|g| **g > 0.0).count()
        } else {
            self.path.processor_demand(count)
        }
    }

    /// Bring the held grant to `demand`. Returns false if the budget came up
    /// short.
    fn negotiate(&mut self, demand: usize) -> bool {
        if demand > self.granted {
            self.granted += self.budget.request(demand - self.granted);
        } else if demand < self.granted {
            self.budget.release(self.granted - demand);
            self.granted = demand;
        }
        self.granted >= demand
    }

    fn enter_cross_family(&mut self, previous: MorphPath) {
        self.transition.reset();
        self.transition.update(&self.weights);
        if previous == MorphPath::SampleBlend {
            // Those node processors were already playing: no fade-in
            let mut running = [false; MAX_MORPH_NODES];
            for (i, r) in running.iter_mut().enumerate() {
                *r = self.weights.get(i) > 0.0;
            }
            self.transition.mark_running(&running);
        }
    }

    fn target_weights(&self) -> MorphWeights {
        match self.driver {
            Driver::Position { x, y } => compute_weights_with_threshold(
                &self.nodes,
                self.active_count,
                self.mode,
                x,
                y,
                self.threshold,
            ),
            Driver::RawWeights(raw) => {
                let mut weights = MorphWeights::from_raw(&raw, self.active_count);
                weights.prune(self.threshold);
                weights
            }
        }
    }

    /// Push the current driver into the smoothing controller.
    ///
    /// `structural` marks changes to what a position means (nodes, mode,
    /// count, context) rather than a new position. Before the first target
    /// those are picked up by the next block instead.
    fn retarget(&mut self, structural: bool) {
        self.dirty = true;
        if structural && !self.smoothing.is_primed() {
            return;
        }
        match (self.driver, self.smoothing.context()) {
            (Driver::Position { x, y }, ControlContext::Manual) => {
                if structural && self.smoothing.target() == SmoothingTarget::Position {
                    self.smoothing.begin_handover();
                } else {
                    self.smoothing.set_position_target(x, y);
                }
            }
            (Driver::Position { .. }, ControlContext::Automated) | (Driver::RawWeights(_), _) => {
                let weights = self.target_weights();
                self.smoothing.set_weight_target(&weights);
            }
        }
    }

    fn store_node(&mut self, slot: usize, node: &MorphNode) {
        let mut node = node.clamped();
        node.id = slot as u8;
        self.nodes[slot] = node;
        self.node_adapters[slot].configure(node.distortion_type, &node.common, &node.params);
    }

    fn configure_shared(&mut self) {
        let settings = InterpolatedSettings::from_weights(&self.nodes, &self.weights);
        self.shared
            .configure(settings.kind, &settings.common, &settings.params);
        if self.path == MorphPath::EnvelopeCoupled {
            self.envelope
                .set_times(settings.params.attack_ms, settings.params.release_ms);
        }
    }

    fn count_rendered(&self) -> usize {
        match self.path {
            MorphPath::Interpolated | MorphPath::EnvelopeCoupled => 1,
            MorphPath::SampleBlend => self.weights.nonzero_count(),
            MorphPath::CrossFamily => self.transition.active_count(),
        }
    }

    #[inline]
    fn process_sample(&mut self, input: f32) -> f32 {
        let x = if input.is_finite() { input } else { 0.0 };

        if self.smoothing.is_smoothing() {
            let (nodes, count, mode, threshold) =
                (&self.nodes, self.active_count, self.mode, self.threshold);
            let mut weights = self.smoothing.next(|cx, cy| {
                compute_weights_with_threshold(nodes, count, mode, cx, cy, threshold)
            });
            weights.prune(threshold);
            if !self.path.uses_shared_processor() {
                weights.retain_strongest(self.render_limit);
            }
            self.weights = weights;

            match self.path {
                MorphPath::Interpolated | MorphPath::EnvelopeCoupled => self.configure_shared(),
                MorphPath::CrossFamily => self.transition.update(&self.weights),
                MorphPath::SampleBlend => {}
            }
            self.rendered = self.rendered.max(self.count_rendered());
        }

        match self.path {
            MorphPath::Interpolated => self.shared.process(x),
            MorphPath::EnvelopeCoupled => {
                let env = self.envelope.process(x);
                self.shared.process_with_envelope(x, env)
            }
            MorphPath::SampleBlend => {
                let mut out = 0.0;
                for (adapter, &w) in self.node_adapters.iter_mut().zip(self.weights.weights()) {
                    if w > 0.0 {
                        out += w * adapter.process(x);
                    }
                }
                out
            }
            MorphPath::CrossFamily => {
                let mut outputs = [0.0; MAX_MORPH_NODES];
                for (i, (out, adapter)) in outputs
                    .iter_mut()
                    .zip(self.node_adapters.iter_mut())
                    .enumerate()
                {
                    if self.transition.is_active(i) {
                        *out = adapter.process(x);
                    }
                }
                self.transition.mix(&outputs)
            }
        }
    }

    // Introspection -------------------------------------------------------

    #[inline]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Weights applied to the last processed sample.
    #[inline]
    pub fn weights(&self) -> &MorphWeights {
        &self.weights
    }

    pub fn is_smoothing(&self) -> bool {
        self.smoothing.is_smoothing()
    }

    pub fn is_cross_family(&self) -> bool {
        self.path.is_cross_family()
    }

    /// Processors rendered in the current block (the peak, if weights moved).
    pub fn active_processor_count(&self) -> usize {
        self.rendered
    }

    /// Processors currently held from the shared budget.
    pub fn granted_processors(&self) -> usize {
        self.granted
    }

    pub fn path(&self) -> MorphPath {
        self.path
    }

    pub fn nodes(&self) -> &[MorphNode; MAX_MORPH_NODES] {
        &self.nodes
    }

    pub fn active_node_count(&self) -> usize {
        self.active_count
    }

    pub fn mode(&self) -> MorphMode {
        self.mode
    }

    /// Last requested cursor. `None` while following raw weights.
    pub fn morph_position(&self) -> Option<(f32, f32)> {
        match self.driver {
            Driver::Position { x, y } => Some((x, y)),
            Driver::RawWeights(_) => None,
        }
    }

    /// Cursor after position smoothing.
    pub fn smoothed_position(&self) -> (f32, f32) {
        self.smoothing.position()
    }

    pub fn smoothing_time_ms(&self) -> f32 {
        self.smoothing.time_ms()
    }

    pub fn control_context(&self) -> ControlContext {
        self.smoothing.context()
    }

    /// Pruning threshold used for the current block.
    pub fn pruning_threshold(&self) -> f32 {
        self.threshold
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn budget(&self) -> &Arc<ProcessorBudget> {
        &self.budget
    }
}

impl<A: DistortionAdapter> Drop for MorphEngine<A> {
    fn drop(&mut self) {
        if self.granted > 0 {
            log::debug!(
                "morph engine dropped holding {} processors, releasing",
                self.granted
            );
            self.budget.release(self.granted);
        }
    }
}
