//! Shared state types for UI communication
//!
//! Node layout is sent once at init; everything that changes per callback is
//! a `Copy` snapshot so the audio thread never allocates.

use morph_dsp::{
    distortion::DistortionType,
    morph::{ControlContext, MorphEngine, MorphMode, MorphNode, MorphPath},
    MAX_MORPH_NODES,
};

/// Static information about a node (sent once, never in audio callback)
#[derive(Clone, Debug)]
pub struct NodeInfo {
    pub kind: DistortionType,
    pub x: f32,
    pub y: f32,
}

impl From<&MorphNode> for NodeInfo {
    fn from(node: &MorphNode) -> Self {
        Self {
            kind: node.distortion_type,
            x: node.pos_x,
            y: node.pos_y,
        }
    }
}

/// Engine state after one audio callback (allocation-free, Copy)
#[derive(Clone, Copy, Debug)]
pub struct PadSnapshot {
    pub weights: [f32; MAX_MORPH_NODES],
    /// Cursor after smoothing
    pub cursor: (f32, f32),
    pub mode: MorphMode,
    pub context: ControlContext,
    pub path: MorphPath,
    /// Processors rendered in the last block
    pub rendered: usize,
    /// Processors held from the budget
    pub granted: usize,
    pub smoothing: bool,
    pub smoothing_ms: f32,
    pub threshold: f32,
}

impl PadSnapshot {
    pub fn capture(engine: &MorphEngine) -> Self {
        Self {
            weights: *engine.weights().weights(),
            cursor: engine.smoothed_position(),
            mode: engine.mode(),
            context: engine.control_context(),
            path: engine.path(),
            rendered: engine.active_processor_count(),
            granted: engine.granted_processors(),
            smoothing: engine.is_smoothing(),
            smoothing_ms: engine.smoothing_time_ms(),
            threshold: engine.pruning_threshold(),
        }
    }

    pub fn path_label(&self) -> &'static str {
        match self.path {
            MorphPath::Interpolated => "interpolated",
            MorphPath::EnvelopeCoupled => "envelope-coupled",
            MorphPath::SampleBlend => "sample blend",
            MorphPath::CrossFamily => "cross-family",
        }
    }
}
