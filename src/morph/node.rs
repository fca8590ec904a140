#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    distortion::{CommonParams, DistortionType, TypeParams},
    dsp::sanitize::clamp_unit,
    MorphError, MAX_MORPH_NODES,
};

/// Geometric interpretation of the cursor.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MorphMode {
    /// Inverse-distance weighting along x; the cursor's y is ignored.
    #[default]
    Linear1D,
    /// Inverse-distance weighting on the unit square.
    Planar2D,
    /// Angle picks adjacent nodes, radius fades toward an even blend.
    Radial2D,
}

impl MorphMode {
    pub const COUNT: usize = 3;
    pub const ALL: [MorphMode; Self::COUNT] =
        [MorphMode::Linear1D, MorphMode::Planar2D, MorphMode::Radial2D];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            MorphMode::Linear1D => "linear-1d",
            MorphMode::Planar2D => "planar-2d",
            MorphMode::Radial2D => "radial-2d",
        }
    }

    /// Map a host parameter in [0, 1] onto a mode. NaN selects the first mode.
    pub fn from_normalized(value: f32) -> Self {
        let scaled = (clamp_unit(value) * Self::COUNT as f32) as usize;
        Self::ALL[scaled.min(Self::COUNT - 1)]
    }

    pub fn to_normalized(self) -> f32 {
        self.index() as f32 / (Self::COUNT - 1) as f32
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::COUNT]
    }
}

impl TryFrom<u8> for MorphMode {
    type Error = MorphError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(MorphError::MorphModeOutOfRange(value))
    }
}

impl std::fmt::Display for MorphMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One configured distortion plus its place in morph space.
///
/// A plain value: the engine copies nodes in with `set_nodes` and never hands
/// out mutable references to its copies.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphNode {
    /// Slot index, 0-3.
    pub id: u8,
    pub distortion_type: DistortionType,
    #[cfg_attr(feature = "serde", serde(default))]
    pub common: CommonParams,
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: TypeParams,
    /// Position in morph space, [0, 1].
    pub pos_x: f32,
    pub pos_y: f32,
}

impl MorphNode {
    /// Node at its slot's default position (the corners of the unit square).
    pub fn new(id: u8, distortion_type: DistortionType) -> Self {
        let (pos_x, pos_y) = Self::default_position(id as usize);
        Self {
            id: id.min(MAX_MORPH_NODES as u8 - 1),
            distortion_type,
            common: CommonParams::default(),
            params: TypeParams::default(),
            pos_x,
            pos_y,
        }
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.pos_x = clamp_unit(x);
        self.pos_y = clamp_unit(y);
        self
    }

    pub fn with_common(mut self, common: CommonParams) -> Self {
        self.common = common.clamped();
        self
    }

    pub fn with_params(mut self, params: TypeParams) -> Self {
        self.params = params.clamped();
        self
    }

    #[inline]
    pub fn position(&self) -> (f32, f32) {
        (self.pos_x, self.pos_y)
    }

    /// Copy with positions and parameters forced into range.
    pub fn clamped(&self) -> Self {
        Self {
            id: self.id.min(MAX_MORPH_NODES as u8 - 1),
            distortion_type: self.distortion_type,
            common: self.common.clamped(),
            params: self.params.clamped(),
            pos_x: clamp_unit(self.pos_x),
            pos_y: clamp_unit(self.pos_y),
        }
    }

    /// Slot layout used when nodes are created without explicit positions:
    /// 0 and 1 span the x axis so a two-node Linear1D morph works out of the box.
    pub fn default_position(slot: usize) -> (f32, f32) {
        match slot {
            0 => (0.0, 0.0),
            1 => (1.0, 0.0),
            2 => (0.0, 1.0),
            _ => (1.0, 1.0),
        }
    }
}

impl Default for MorphNode {
    fn default() -> Self {
        Self::new(0, DistortionType::default())
    }
}

/// The default four-slot layout: one node per corner.
pub fn default_nodes() -> [MorphNode; MAX_MORPH_NODES] {
    [
        MorphNode::new(0, DistortionType::SoftClip),
        MorphNode::new(1, DistortionType::Fuzz),
        MorphNode::new(2, DistortionType::SineFold),
        MorphNode::new(3, DistortionType::Bitcrush),
    ]
}
