#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    distortion::DistortionAdapter,
    morph::{
        engine::{MorphEngine, DEFAULT_SMOOTHING_MS},
        node::{default_nodes, MorphMode, MorphNode},
        smoothing::ControlContext,
    },
    MAX_MORPH_NODES, MIN_ACTIVE_NODES,
};

/// Snapshot of everything a band configures on its engine.
///
/// Storing and restoring it is the caller's business; with the `serde`
/// feature it serializes to any serde format.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphConfig {
    pub nodes: [MorphNode; MAX_MORPH_NODES],
    pub active_node_count: usize,
    pub mode: MorphMode,
    pub position_x: f32,
    pub position_y: f32,
    pub smoothing_time_ms: f32,
    pub control_context: ControlContext,
}

impl MorphConfig {
    pub fn from_engine<A: DistortionAdapter>(engine: &MorphEngine<A>) -> Self {
        let (position_x, position_y) = engine
            .morph_position()
            .unwrap_or_else(|| engine.smoothed_position());
        Self {
            nodes: *engine.nodes(),
            active_node_count: engine.active_node_count(),
            mode: engine.mode(),
            position_x,
            position_y,
            smoothing_time_ms: engine.smoothing_time_ms(),
            control_context: engine.control_context(),
        }
    }

    /// Push the snapshot into `engine` through its setters (which clamp).
    pub fn apply_to<A: DistortionAdapter>(&self, engine: &mut MorphEngine<A>) {
        engine.set_nodes(&self.nodes);
        engine.set_active_node_count(self.active_node_count);
        engine.set_mode(self.mode);
        engine.set_smoothing_time_ms(self.smoothing_time_ms);
        engine.set_control_context(self.control_context);
        engine.set_morph_position(self.position_x, self.position_y);
    }
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            nodes: default_nodes(),
            active_node_count: MIN_ACTIVE_NODES,
            mode: MorphMode::default(),
            position_x: 0.0,
            position_y: 0.0,
            smoothing_time_ms: DEFAULT_SMOOTHING_MS,
            control_context: ControlContext::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{distortion::DistortionType, morph::budget::ProcessorBudget};

    #[test]
    fn test_apply_then_capture_matches() {
        let mut config = MorphConfig {
            active_node_count: 3,
            mode: MorphMode::Planar2D,
            position_x: 0.4,
            position_y: 0.6,
            smoothing_time_ms: 75.0,
            control_context: ControlContext::Automated,
            ..MorphConfig::default()
        };
        config.nodes[2] = MorphNode::new(2, DistortionType::Formant).with_position(0.5, 1.0);

        let mut engine = MorphEngine::new(ProcessorBudget::shared());
        engine.prepare(44_100.0, 128);
        config.apply_to(&mut engine);

        assert_eq!(MorphConfig::from_engine(&engine), config);
    }

    #[test]
    fn test_out_of_range_values_are_clamped_on_apply() {
        let config = MorphConfig {
            active_node_count: 12,
            smoothing_time_ms: 9_000.0,
            position_x: -3.0,
            ..MorphConfig::default()
        };
        let mut engine = MorphEngine::new(ProcessorBudget::shared());
        config.apply_to(&mut engine);

        let captured = MorphConfig::from_engine(&engine);
        assert_eq!(captured.active_node_count, MAX_MORPH_NODES);
        assert_eq!(captured.smoothing_time_ms, crate::MAX_SMOOTHING_MS);
        assert_eq!(captured.position_x, 0.0);
    }
}
