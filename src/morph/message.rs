#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer};

use crate::{
    morph::{node::MorphMode, node::MorphNode, smoothing::ControlContext},
    MAX_MORPH_NODES,
};

/// A configuration change sent to an engine from another thread.
///
/// Every variant mirrors one engine setter and is applied at the start of the
/// engine's next processing call.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MorphMessage {
    SetNode { slot: u8, node: MorphNode },
    SetMode(MorphMode),
    SetPosition { x: f32, y: f32 },
    SetRawWeights([f32; MAX_MORPH_NODES]),
    SetSmoothingTime { ms: f32 },
    SetActiveNodeCount(u8),
    SetControlContext(ControlContext),
    Reset,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<MorphMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<MorphMessage> {
    fn pop(&mut self) -> Option<MorphMessage> {
        Consumer::pop(self).ok()
    }
}

/// Control-side handle for an engine's message queue.
///
/// Pushing never blocks. When the queue is full the message is handed back.
#[cfg(feature = "rtrb")]
pub struct MorphController {
    tx: Producer<MorphMessage>,
}

#[cfg(feature = "rtrb")]
impl MorphController {
    pub fn new(tx: Producer<MorphMessage>) -> Self {
        Self { tx }
    }

    pub fn send(&mut self, msg: MorphMessage) -> Result<(), MorphMessage> {
        self.tx
            .push(msg)
            .map_err(|rtrb::PushError::Full(rejected)| rejected)
    }

    pub fn set_position(&mut self, x: f32, y: f32) -> Result<(), MorphMessage> {
        self.send(MorphMessage::SetPosition { x, y })
    }

    pub fn set_mode(&mut self, mode: MorphMode) -> Result<(), MorphMessage> {
        self.send(MorphMessage::SetMode(mode))
    }

    pub fn set_node(&mut self, slot: u8, node: MorphNode) -> Result<(), MorphMessage> {
        self.send(MorphMessage::SetNode { slot, node })
    }

    pub fn set_raw_weights(&mut self, weights: [f32; MAX_MORPH_NODES]) -> Result<(), MorphMessage> {
        self.send(MorphMessage::SetRawWeights(weights))
    }

    pub fn set_smoothing_time_ms(&mut self, ms: f32) -> Result<(), MorphMessage> {
        self.send(MorphMessage::SetSmoothingTime { ms })
    }

    pub fn set_active_node_count(&mut self, count: u8) -> Result<(), MorphMessage> {
        self.send(MorphMessage::SetActiveNodeCount(count))
    }

    pub fn set_control_context(&mut self, context: ControlContext) -> Result<(), MorphMessage> {
        self.send(MorphMessage::SetControlContext(context))
    }

    pub fn reset(&mut self) -> Result<(), MorphMessage> {
        self.send(MorphMessage::Reset)
    }

    /// Free slots left in the queue.
    pub fn slots(&self) -> usize {
        self.tx.slots()
    }
}
