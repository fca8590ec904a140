#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    distortion::{CommonParams, DistortionFamily, DistortionType, TypeParams},
    morph::{node::MorphNode, weights::MorphWeights},
    MAX_MORPH_NODES,
};

/*
Interpolation Strategy
======================

Blending two distortions can mean two very different things:

  1. Blend the SETTINGS. Two wavefolders with different drive and fold count
     can be collapsed into one wavefolder with in-between settings. One
     processor runs, whatever the weights.

  2. Blend the SOUNDS. A tube stage and a granular mangler have nothing in
     common to interpolate. Both must run on the same input and their outputs
     get mixed.

Each family declares which kind of blending it supports:

    Family         Method                     Processors
    ─────────────  ─────────────────────────  ──────────
    Saturation     Σ wᵢ·fᵢ(x) sample blend    one per node
    Wavefold       parameter interpolation    1
    Digital        parameter interpolation    1
    Rectify        parameter interpolation    1
    Dynamic        parameters + envelope      1
    Hybrid         parallel, equal-power      one per node
    Experimental   parallel, equal-power      one per node

When the weighted nodes span more than one family there is no shared method,
so the blend falls back to parallel processing with an equal-power crossfade.

The path is resolved once per block from the nodes that may carry weight in
that block. Inside the sample loop there is no family branching beyond one
match on the resolved path.
*/

/// How one family's nodes are blended with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMethod {
    /// Run every node, sum outputs by weight.
    SampleBlend,
    /// Interpolate parameters, run one shared processor.
    ParameterInterpolation,
    /// Parameter interpolation with an engine-level envelope follower.
    EnvelopeCoupled,
    /// Run every node, combine with equal-power gains.
    ParallelCrossfade,
}

const METHOD_TABLE: [InterpolationMethod; DistortionFamily::COUNT] = [
    InterpolationMethod::SampleBlend,            // Saturation
    InterpolationMethod::ParameterInterpolation, // Wavefold
    InterpolationMethod::ParameterInterpolation, // Digital
    InterpolationMethod::ParameterInterpolation, // Rectify
    InterpolationMethod::EnvelopeCoupled,        // Dynamic
    InterpolationMethod::ParallelCrossfade,      // Hybrid
    InterpolationMethod::ParallelCrossfade,      // Experimental
];

#[inline]
pub const fn method_for(family: DistortionFamily) -> InterpolationMethod {
    METHOD_TABLE[family.index()]
}

/// The processing path chosen for a block.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MorphPath {
    /// One shared processor configured with interpolated parameters.
    #[default]
    Interpolated,
    /// Like `Interpolated`, with the engine's envelope handed to the processor.
    EnvelopeCoupled,
    /// Per-node Saturation processors summed by weight.
    SampleBlend,
    /// Per-node processors combined through the transition zone.
    CrossFamily,
}

impl MorphPath {
    /// Resolve the path for a set of families.
    ///
    /// `families` must not be empty; an empty set resolves to `Interpolated`.
    pub fn resolve(families: impl IntoIterator<Item = DistortionFamily>) -> Self {
        let mut families = families.into_iter();
        let Some(first) = families.next() else {
            return MorphPath::Interpolated;
        };
        if families.any(|f| f != first) {
            return MorphPath::CrossFamily;
        }
        match method_for(first) {
            InterpolationMethod::SampleBlend => MorphPath::SampleBlend,
            InterpolationMethod::ParameterInterpolation => MorphPath::Interpolated,
            InterpolationMethod::EnvelopeCoupled => MorphPath::EnvelopeCoupled,
            InterpolationMethod::ParallelCrossfade => MorphPath::CrossFamily,
        }
    }

    /// True when a single shared processor does all the work.
    #[inline]
    pub fn uses_shared_processor(self) -> bool {
        matches!(self, MorphPath::Interpolated | MorphPath::EnvelopeCoupled)
    }

    #[inline]
    pub fn is_cross_family(self) -> bool {
        self == MorphPath::CrossFamily
    }

    /// Processors needed when `candidates` nodes may carry weight.
    #[inline]
    pub fn processor_demand(self, candidates: usize) -> usize {
        if self.uses_shared_processor() {
            1
        } else {
            candidates
        }
    }
}

/// Settings for the shared processor: weighted parameters plus the type of
/// the heaviest node.
///
/// Parameters glide with the weights but the type does not: when dominance
/// passes from one node to another the shared processor switches transfer
/// function at that point. Within a family the curves are close enough that
/// the step stays small.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolatedSettings {
    pub kind: DistortionType,
    pub common: CommonParams,
    pub params: TypeParams,
}

impl InterpolatedSettings {
    /// `paramₖ = Σ wᵢ·paramᵢ,ₖ` over the weighted nodes.
    pub fn from_weights(nodes: &[MorphNode; MAX_MORPH_NODES], weights: &MorphWeights) -> Self {
        let w = weights.weights();
        let weighted = || {
            nodes
                .iter()
                .zip(w.iter())
                .filter(|(_, &wi)| wi > 0.0)
        };
        Self {
            kind: nodes[weights.dominant()].distortion_type,
            common: CommonParams::interpolate(weighted().map(|(n, &wi)| (wi, &n.common))),
            params: TypeParams::interpolate(weighted().map(|(n, &wi)| (wi, &n.params))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distortion::DistortionType::*;

    fn nodes(types: [DistortionType; 4]) -> [MorphNode; 4] {
        let mut i = 0;
        types.map(|t| {
            let node = MorphNode::new(i, t);
            i += 1;
            node
        })
    }

    #[test]
    fn test_every_family_has_a_method() {
        assert_eq!(method_for(DistortionFamily::Saturation), InterpolationMethod::SampleBlend);
        assert_eq!(
            method_for(DistortionFamily::Rectify),
            InterpolationMethod::ParameterInterpolation
        );
        assert_eq!(method_for(DistortionFamily::Dynamic), InterpolationMethod::EnvelopeCoupled);
        assert_eq!(
            method_for(DistortionFamily::Experimental),
            InterpolationMethod::ParallelCrossfade
        );
    }

    #[test]
    fn test_resolve_same_family() {
        use DistortionFamily::*;
        assert_eq!(MorphPath::resolve([Wavefold, Wavefold]), MorphPath::Interpolated);
        assert_eq!(MorphPath::resolve([Digital; 4]), MorphPath::Interpolated);
        assert_eq!(MorphPath::resolve([Saturation; 3]), MorphPath::SampleBlend);
        assert_eq!(MorphPath::resolve([Dynamic]), MorphPath::EnvelopeCoupled);
        assert_eq!(MorphPath::resolve([Hybrid, Hybrid]), MorphPath::CrossFamily);
    }

    #[test]
    fn test_resolve_mixed_families_is_cross_family() {
        use DistortionFamily::*;
        assert_eq!(MorphPath::resolve([Saturation, Wavefold]), MorphPath::CrossFamily);
        assert_eq!(
            MorphPath::resolve([Digital, Digital, Rectify]),
            MorphPath::CrossFamily
        );
    }

    #[test]
    fn test_processor_demand() {
        assert_eq!(MorphPath::Interpolated.processor_demand(4), 1);
        assert_eq!(MorphPath::EnvelopeCoupled.processor_demand(2), 1);
        assert_eq!(MorphPath::SampleBlend.processor_demand(3), 3);
        assert_eq!(MorphPath::CrossFamily.processor_demand(4), 4);
    }

    #[test]
    fn test_interpolated_settings_blend_parameters() {
        let mut nodes = nodes([Bitcrush, Quantize, Bitcrush, Bitcrush]);
        nodes[0].common.drive = 2.0;
        nodes[1].common.drive = 6.0;
        nodes[0].params.bit_depth = 4.0;
        nodes[1].params.bit_depth = 12.0;

        let weights = MorphWeights::from_raw(&[0.25, 0.75], 2);
        let settings = InterpolatedSettings::from_weights(&nodes, &weights);
        assert_eq!(settings.kind, Quantize);
        assert!((settings.common.drive - 5.0).abs() < 1e-5);
        assert!((settings.params.bit_depth - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_interpolated_type_follows_dominance() {
        let nodes = nodes([SineFold, SergeFold, SineFold, SineFold]);

        let weights = MorphWeights::from_raw(&[0.51, 0.49], 2);
        let settings = InterpolatedSettings::from_weights(&nodes, &weights);
        assert_eq!(settings.kind, SineFold);

        let weights = MorphWeights::from_raw(&[0.49, 0.51], 2);
        let settings = InterpolatedSettings::from_weights(&nodes, &weights);
        assert_eq!(settings.kind, SergeFold);
    }
}
