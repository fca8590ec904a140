use std::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{dsp::sanitize::clamp_unit, MorphError};

/// Grouping of distortion algorithms that share one morph interpolation
/// method.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistortionFamily {
    Saturation,
    Wavefold,
    Digital,
    Rectify,
    Dynamic,
    Hybrid,
    Experimental,
}

impl DistortionFamily {
    pub const COUNT: usize = 7;

    pub const ALL: [DistortionFamily; Self::COUNT] = [
        DistortionFamily::Saturation,
        DistortionFamily::Wavefold,
        DistortionFamily::Digital,
        DistortionFamily::Rectify,
        DistortionFamily::Dynamic,
        DistortionFamily::Hybrid,
        DistortionFamily::Experimental,
    ];

    /// Position in [`DistortionFamily::ALL`], used for table lookups.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Bit for building family sets.
    #[inline]
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// The 26 distortion algorithms a morph node can select.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DistortionType {
    // Saturation
    #[default]
    SoftClip,
    HardClip,
    Tube,
    Tape,
    Fuzz,
    AsymmetricFuzz,
    // Wavefold
    SineFold,
    TriangleFold,
    SergeFold,
    // Rectify
    FullRectify,
    HalfRectify,
    // Digital
    Bitcrush,
    SampleReduce,
    Quantize,
    Aliasing,
    BitwiseMangler,
    // Dynamic
    Temporal,
    // Hybrid
    RingSaturation,
    FeedbackDist,
    AllpassResonant,
    // Experimental
    Chaos,
    Formant,
    Granular,
    Spectral,
    Fractal,
    Stochastic,
}

impl DistortionType {
    pub const COUNT: usize = 26;

    pub const ALL: [DistortionType; Self::COUNT] = [
        DistortionType::SoftClip,
        DistortionType::HardClip,
        DistortionType::Tube,
        DistortionType::Tape,
        DistortionType::Fuzz,
        DistortionType::AsymmetricFuzz,
        DistortionType::SineFold,
        DistortionType::TriangleFold,
        DistortionType::SergeFold,
        DistortionType::FullRectify,
        DistortionType::HalfRectify,
        DistortionType::Bitcrush,
        DistortionType::SampleReduce,
        DistortionType::Quantize,
        DistortionType::Aliasing,
        DistortionType::BitwiseMangler,
        DistortionType::Temporal,
        DistortionType::RingSaturation,
        DistortionType::FeedbackDist,
        DistortionType::AllpassResonant,
        DistortionType::Chaos,
        DistortionType::Formant,
        DistortionType::Granular,
        DistortionType::Spectral,
        DistortionType::Fractal,
        DistortionType::Stochastic,
    ];

    pub const fn family(self) -> DistortionFamily {
        use DistortionType::*;
        match self {
            SoftClip | HardClip | Tube | Tape | Fuzz | AsymmetricFuzz => {
                DistortionFamily::Saturation
            }
            SineFold | TriangleFold | SergeFold => DistortionFamily::Wavefold,
            FullRectify | HalfRectify => DistortionFamily::Rectify,
            Bitcrush | SampleReduce | Quantize | Aliasing | BitwiseMangler => {
                DistortionFamily::Digital
            }
            Temporal => DistortionFamily::Dynamic,
            RingSaturation | FeedbackDist | AllpassResonant => DistortionFamily::Hybrid,
            Chaos | Formant | Granular | Spectral | Fractal | Stochastic => {
                DistortionFamily::Experimental
            }
        }
    }

    pub const fn name(self) -> &'static str {
        use DistortionType::*;
        match self {
            SoftClip => "soft-clip",
            HardClip => "hard-clip",
            Tube => "tube",
            Tape => "tape",
            Fuzz => "fuzz",
            AsymmetricFuzz => "asymmetric-fuzz",
            SineFold => "sine-fold",
            TriangleFold => "triangle-fold",
            SergeFold => "serge-fold",
            FullRectify => "full-rectify",
            HalfRectify => "half-rectify",
            Bitcrush => "bitcrush",
            SampleReduce => "sample-reduce",
            Quantize => "quantize",
            Aliasing => "aliasing",
            BitwiseMangler => "bitwise-mangler",
            Temporal => "temporal",
            RingSaturation => "ring-saturation",
            FeedbackDist => "feedback",
            AllpassResonant => "allpass-resonant",
            Chaos => "chaos",
            Formant => "formant",
            Granular => "granular",
            Spectral => "spectral",
            Fractal => "fractal",
            Stochastic => "stochastic",
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Map a host-normalized `[0, 1]` parameter onto a type (evenly spaced
    /// steps, non-finite values clamp).
    pub fn from_normalized(value: f32) -> Self {
        let step = (clamp_unit(value) * (Self::COUNT - 1) as f32).round() as usize;
        Self::ALL[step.min(Self::COUNT - 1)]
    }

    pub fn to_normalized(self) -> f32 {
        self.index() as f32 / (Self::COUNT - 1) as f32
    }
}

impl TryFrom<u8> for DistortionType {
    type Error = MorphError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(MorphError::DistortionIndexOutOfRange(value))
    }
}

impl FromStr for DistortionType {
    type Err = MorphError;

    /// Accepts the kebab-case name, case-insensitively; `_` and ` ` count as `-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '_' | ' ' => '-',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| MorphError::UnknownDistortionType(s.to_string()))
    }
}

impl fmt::Display for DistortionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
