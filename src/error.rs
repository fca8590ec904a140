use thiserror::Error;

/// Errors raised while translating control-side input (host parameters, type
/// names, preset fields) into engine configuration.
///
/// Nothing on the audio path returns this: processing clamps instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MorphError {
    #[error("unknown distortion type `{0}`")]
    UnknownDistortionType(String),

    #[error("distortion type index {0} is out of range (0-25)")]
    DistortionIndexOutOfRange(u8),

    #[error("morph mode index {0} is out of range (0-2)")]
    MorphModeOutOfRange(u8),

    #[error("parameter `{name}` is not finite: {value}")]
    NonFiniteParameter { name: &'static str, value: f32 },
}
