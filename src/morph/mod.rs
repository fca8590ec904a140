//! The morph engine: blends 2-4 distortion nodes into one continuously
//! variable timbre.
//!
//! Leaves first:
//!
//! - [`node`]: morph nodes and modes (plain values)
//! - [`weights`]: cursor → normalized weight vector
//! - [`strategy`]: family → blending method, path resolution
//! - [`transition`]: cross-family activation zone and level compensation
//! - [`smoothing`]: position or weight smoothing per control context
//! - [`budget`]: process-wide processor cap
//! - [`engine`]: the orchestrator
//! - [`message`], [`config`]: cross-thread control and snapshots

pub mod budget;
pub mod config;
pub mod engine;
pub mod message;
pub mod node;
pub mod smoothing;
pub mod strategy;
pub mod transition;
pub mod weights;

pub use budget::ProcessorBudget;
pub use config::MorphConfig;
pub use engine::{EngineState, MorphEngine};
#[cfg(feature = "rtrb")]
pub use message::MorphController;
pub use message::{MessageReceiver, MorphMessage};
pub use node::{MorphMode, MorphNode};
pub use smoothing::{ControlContext, SmoothingController};
pub use strategy::{InterpolationMethod, MorphPath};
pub use transition::TransitionZoneController;
pub use weights::{compute_weights, compute_weights_with_threshold, MorphWeights};
