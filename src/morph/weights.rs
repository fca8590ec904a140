use std::f32::consts::TAU;

use crate::{
    dsp::sanitize::clamp_unit,
    morph::node::{MorphMode, MorphNode},
    MAX_MORPH_NODES, MIN_ACTIVE_NODES, WEIGHT_EPSILON,
};

/*
Morph Weights
=============

Every morph ends in the same place: one weight per node, non-negative,
summing to 1. The weight says how much of that node's character is in the
output. How the cursor turns into weights depends on the mode.


Inverse-Distance Weighting (Linear1D, Planar2D)
-----------------------------------------------

Each node pulls with a strength that falls off with the square of its
distance to the cursor:

    wᵢ = 1 / dᵢ²          then divide by Σ wⱼ

    node A ●─────────●─────────────────● node B
                   cursor
                d_A = 0.3        d_B = 0.7
          raw:  11.1             2.04
          norm: 0.845            0.155

Linear1D measures distance along x only. Planar2D uses the full Euclidean
distance. Close to a node its weight approaches 1 quickly, which is what
makes corners feel "sticky".


Radial (Radial2D)
-----------------

The cursor is read in polar form around the centre (0.5, 0.5):

              angle picks the two
              neighbouring nodes
                    ● B
                  ╱
           ● A ─ ✛ ─ · ─ ✕ cursor
                    ╲      radius = how far from the centre
                    ● C

Nodes are sorted by their own angle. The cursor's angle falls between two
neighbours and is shared between them by angular fraction. The radius,
scaled so the inscribed circle is 1, fades from that pair toward an even
blend of every node:

    wᵢ = r · angularᵢ + (1 - r) / N


Degenerate Geometry
-------------------

    cursor on a node        that node gets 1, the rest 0 (no 1/0)
    cursor on several       they share equally
    every node in one spot  even split across all active nodes


Pruning
-------

Tiny weights cost a full processor and contribute nothing audible. After
any mode runs, weights below the threshold (0.001 normally, higher when the
processor budget is under pressure) are zeroed and the survivors rescaled so
the sum is exactly 1 again.
*/

/// Distances below this count as "on the node".
const COINCIDENCE_EPSILON: f32 = 1e-6;

const CENTER: f32 = 0.5;

/// Normalized weight per node slot.
///
/// Slots at or beyond `active_count` are always exactly zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphWeights {
    weights: [f32; MAX_MORPH_NODES],
    active_count: usize,
}

impl MorphWeights {
    /// Even split across `active_count` nodes.
    pub fn equal(active_count: usize) -> Self {
        let active_count = active_count.clamp(1, MAX_MORPH_NODES);
        let mut weights = [0.0; MAX_MORPH_NODES];
        let share = 1.0 / active_count as f32;
        for w in weights.iter_mut().take(active_count) {
            *w = share;
        }
        Self {
            weights,
            active_count,
        }
    }

    /// All weight on one slot.
    pub fn single(index: usize, active_count: usize) -> Self {
        let active_count = active_count.clamp(1, MAX_MORPH_NODES);
        let mut weights = [0.0; MAX_MORPH_NODES];
        weights[index.min(active_count - 1)] = 1.0;
        Self {
            weights,
            active_count,
        }
    }

    /// Build from externally supplied weights.
    ///
    /// Negative or non-finite entries become zero, slots past `active_count`
    /// are dropped, and the rest is normalized. An all-zero input falls back to
    /// an even split.
    pub fn from_raw(raw: &[f32], active_count: usize) -> Self {
        let active_count = active_count.clamp(1, MAX_MORPH_NODES);
        let mut weights = [0.0; MAX_MORPH_NODES];
        for (w, &r) in weights.iter_mut().zip(raw).take(active_count) {
            *w = if r.is_finite() { r.max(0.0) } else { 0.0 };
        }
        let mut out = Self {
            weights,
            active_count,
        };
        if !out.normalize() {
            out = Self::equal(active_count);
        }
        out
    }

    #[inline]
    pub fn weights(&self) -> &[f32; MAX_MORPH_NODES] {
        &self.weights
    }

    #[inline]
    pub fn get(&self, index: usize) -> f32 {
        self.weights.get(index).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn sum(&self) -> f32 {
        self.weights.iter().sum()
    }

    /// Slots carrying any weight.
    pub fn nonzero_count(&self) -> usize {
        self.weights.iter().filter(|w| **w > 0.0).count()
    }

    /// Slot with the largest weight (lowest index on ties).
    pub fn dominant(&self) -> usize {
        let mut best = 0;
        for (i, &w) in self.weights.iter().enumerate().take(self.active_count) {
            if w > self.weights[best] {
                best = i;
            }
        }
        best
    }

    /// Zero every weight below `threshold`, then renormalize.
    ///
    /// The dominant weight always survives, so the result is never empty.
    pub fn prune(&mut self, threshold: f32) {
        let dominant = self.dominant();
        for (i, w) in self.weights.iter_mut().enumerate() {
            if *w < threshold && i != dominant {
                *w = 0.0;
            }
        }
        if !self.normalize() {
            *self = Self::single(dominant, self.active_count);
        }
    }

    /// Keep only the `count` heaviest slots (at least one), then renormalize.
    pub fn retain_strongest(&mut self, count: usize) {
        let count = count.max(1);
        while self.nonzero_count() > count {
            let mut weakest = None;
            for (i, &w) in self.weights.iter().enumerate() {
                if w > 0.0 && weakest.map_or(true, |j: usize| w <= self.weights[j]) {
                    weakest = Some(i);
                }
            }
            match weakest {
                Some(i) => self.weights[i] = 0.0,
                None => break,
            }
        }
        self.normalize();
    }

    /// Scale so the weights sum to one. Returns false if the sum was zero.
    fn normalize(&mut self) -> bool {
        let sum: f32 = self.weights.iter().sum();
        if sum <= 0.0 || !sum.is_finite() {
            return false;
        }
        let inv = 1.0 / sum;
        for w in self.weights.iter_mut() {
            *w *= inv;
        }
        true
    }
}

impl Default for MorphWeights {
    fn default() -> Self {
        Self::single(0, MIN_ACTIVE_NODES)
    }
}

/// Weights for a cursor, pruned at the default [`WEIGHT_EPSILON`].
pub fn compute_weights(
    nodes: &[MorphNode],
    active_count: usize,
    mode: MorphMode,
    cursor_x: f32,
    cursor_y: f32,
) -> MorphWeights {
    compute_weights_with_threshold(nodes, active_count, mode, cursor_x, cursor_y, WEIGHT_EPSILON)
}

/// Weights for a cursor with an explicit pruning threshold.
///
/// `active_count` is clamped to [2, 4] and to the number of nodes given.
/// The cursor is clamped into the unit square (NaN goes to 0).
pub fn compute_weights_with_threshold(
    nodes: &[MorphNode],
    active_count: usize,
    mode: MorphMode,
    cursor_x: f32,
    cursor_y: f32,
    threshold: f32,
) -> MorphWeights {
    let count = active_count
        .clamp(MIN_ACTIVE_NODES, MAX_MORPH_NODES)
        .min(nodes.len());
    if count <= 1 {
        return MorphWeights::single(0, count.max(1));
    }

    let cx = clamp_unit(cursor_x);
    let cy = clamp_unit(cursor_y);

    let mut positions = [(0.0f32, 0.0f32); MAX_MORPH_NODES];
    for (p, node) in positions.iter_mut().zip(nodes).take(count) {
        *p = (clamp_unit(node.pos_x), clamp_unit(node.pos_y));
    }
    let positions = &positions[..count];

    let distance = |&(px, py): &(f32, f32)| match mode {
        MorphMode::Linear1D => (cx - px).abs(),
        MorphMode::Planar2D | MorphMode::Radial2D => (cx - px).hypot(cy - py),
    };

    let mut raw = [0.0f32; MAX_MORPH_NODES];

    // Cursor on one or more nodes
    let mut coincident = 0;
    for (w, p) in raw.iter_mut().zip(positions) {
        if distance(p) <= COINCIDENCE_EPSILON {
            *w = 1.0;
            coincident += 1;
        }
    }

    if coincident == 0 {
        if all_coincident(positions, mode) {
            return MorphWeights::equal(count);
        }
        match mode {
            MorphMode::Linear1D | MorphMode::Planar2D => {
                for (w, p) in raw.iter_mut().zip(positions) {
                    let d = distance(p);
                    *w = 1.0 / (d * d);
                }
            }
            MorphMode::Radial2D => radial_weights(positions, cx, cy, &mut raw),
        }
    }

    let mut weights = MorphWeights::from_raw(&raw[..count], count);
    weights.prune(threshold);
    weights
}

fn all_coincident(positions: &[(f32, f32)], mode: MorphMode) -> bool {
    let (x0, y0) = positions[0];
    positions.iter().all(|&(x, y)| match mode {
        MorphMode::Linear1D => (x - x0).abs() <= COINCIDENCE_EPSILON,
        _ => (x - x0).hypot(y - y0) <= COINCIDENCE_EPSILON,
    })
}

fn radial_weights(positions: &[(f32, f32)], cx: f32, cy: f32, out: &mut [f32; MAX_MORPH_NODES]) {
    let n = positions.len();
    let dx = cx - CENTER;
    let dy = cy - CENTER;
    let radius = (dx.hypot(dy) / CENTER).min(1.0);
    let cursor_angle = dy.atan2(dx).rem_euclid(TAU);

    // Node slots ordered by angle around the centre
    let mut angles = [0.0f32; MAX_MORPH_NODES];
    let mut order = [0usize; MAX_MORPH_NODES];
    for (i, &(px, py)) in positions.iter().enumerate() {
        angles[i] = (py - CENTER).atan2(px - CENTER).rem_euclid(TAU);
        order[i] = i;
    }
    let order = &mut order[..n];
    order.sort_unstable_by(|&a, &b| angles[a].total_cmp(&angles[b]).then(a.cmp(&b)));

    // Find the neighbouring pair whose arc contains the cursor angle
    let mut angular = [0.0f32; MAX_MORPH_NODES];
    for k in 0..n {
        let a = order[k];
        let b = order[(k + 1) % n];
        let mut span = (angles[b] - angles[a]).rem_euclid(TAU);
        if k + 1 == n && span == 0.0 {
            span = TAU;
        }
        let offset = (cursor_angle - angles[a]).rem_euclid(TAU);
        if offset <= span && span > 0.0 {
            let frac = offset / span;
            angular[a] += 1.0 - frac;
            angular[b] += frac;
            break;
        }
    }

    let even = 1.0 / n as f32;
    for i in 0..n {
        out[i] = radius * angular[i] + (1.0 - radius) * even;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distortion::DistortionType;

    fn corner_nodes() -> [MorphNode; 4] {
        crate::morph::node::default_nodes()
    }

    fn two_nodes() -> [MorphNode; 2] {
        [
            MorphNode::new(0, DistortionType::SoftClip),
            MorphNode::new(1, DistortionType::Fuzz),
        ]
    }

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-5, "{a} != {b}");
    }

    #[test]
    fn test_linear_endpoints_and_middle() {
        let nodes = two_nodes();
        let at = |x| compute_weights(&nodes, 2, MorphMode::Linear1D, x, 0.7);
        assert_eq!(at(0.0).weights(), &[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(at(1.0).weights(), &[0.0, 1.0, 0.0, 0.0]);
        let mid = at(0.5);
        assert_close(mid.get(0), 0.5);
        assert_close(mid.get(1), 0.5);
    }

    #[test]
    fn test_linear_ignores_y() {
        let nodes = two_nodes();
        let a = compute_weights(&nodes, 2, MorphMode::Linear1D, 0.3, 0.0);
        let b = compute_weights(&nodes, 2, MorphMode::Linear1D, 0.3, 1.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_planar_centre_of_corners_is_even() {
        let w = compute_weights(&corner_nodes(), 4, MorphMode::Planar2D, 0.5, 0.5);
        for i in 0..4 {
            assert_close(w.get(i), 0.25);
        }
    }

    #[test]
    fn test_radial_centre_is_even_and_edge_is_pairwise() {
        let nodes = corner_nodes();
        let centre = compute_weights(&nodes, 4, MorphMode::Radial2D, 0.5, 0.5);
        for i in 0..4 {
            assert_close(centre.get(i), 0.25);
        }

        // Right edge midpoint: halfway between the (1,0) and (1,1) corners,
        // radius exactly 1 so the other two nodes drop out.
        let edge = compute_weights(&nodes, 4, MorphMode::Radial2D, 1.0, 0.5);
        assert_close(edge.get(1), 0.5);
        assert_close(edge.get(3), 0.5);
        assert_eq!(edge.get(0), 0.0);
        assert_eq!(edge.get(2), 0.0);
    }

    #[test]
    fn test_cursor_on_node_takes_everything_in_every_mode() {
        let nodes = corner_nodes();
        for mode in MorphMode::ALL {
            for (i, node) in nodes.iter().enumerate() {
                if mode == MorphMode::Linear1D && i >= 2 {
                    // Slots 2/3 share x with 0/1 in the corner layout
                    continue;
                }
                let count = if mode == MorphMode::Linear1D { 2 } else { 4 };
                let w = compute_weights(&nodes, count, mode, node.pos_x, node.pos_y);
                assert_eq!(w.get(i), 1.0, "{mode} node {i}");
                assert_close(w.sum(), 1.0);
            }
        }
    }

    #[test]
    fn test_coincident_nodes_share_equally() {
        let mut nodes = corner_nodes();
        nodes[1] = nodes[1].with_position(0.0, 0.0);
        let w = compute_weights(&nodes, 4, MorphMode::Planar2D, 0.0, 0.0);
        assert_close(w.get(0), 0.5);
        assert_close(w.get(1), 0.5);
    }

    #[test]
    fn test_all_nodes_in_one_place_split_evenly() {
        let nodes = corner_nodes().map(|n| n.with_position(0.3, 0.3));
        for mode in MorphMode::ALL {
            let w = compute_weights(&nodes, 3, mode, 0.9, 0.1);
            for i in 0..3 {
                assert_close(w.get(i), 1.0 / 3.0);
            }
            assert_eq!(w.get(3), 0.0);
        }
    }

    #[test]
    fn test_sum_is_one_across_grid() {
        let nodes = corner_nodes().map(|n| {
            let (x, y) = n.position();
            n.with_position(0.15 + 0.7 * x, 0.1 + 0.6 * y)
        });
        for mode in MorphMode::ALL {
            for count in 2..=4 {
                for ix in 0..=20 {
                    for iy in 0..=20 {
                        let w = compute_weights(
                            &nodes,
                            count,
                            mode,
                            ix as f32 / 20.0,
                            iy as f32 / 20.0,
                        );
                        assert!((w.sum() - 1.0).abs() < 1e-5);
                        assert!(w.weights().iter().all(|v| *v >= 0.0));
                        assert!(w.weights()[count..].iter().all(|v| *v == 0.0));
                    }
                }
            }
        }
    }

    #[test]
    fn test_nan_cursor_is_clamped() {
        let nodes = two_nodes();
        let w = compute_weights(&nodes, 2, MorphMode::Planar2D, f32::NAN, f32::INFINITY);
        assert!(w.weights().iter().all(|v| v.is_finite()));
        assert_close(w.sum(), 1.0);
    }

    #[test]
    fn test_out_of_range_active_count_is_clamped() {
        let nodes = corner_nodes();
        let w = compute_weights(&nodes, 9, MorphMode::Planar2D, 0.2, 0.2);
        assert_eq!(w.active_count(), 4);
        let w = compute_weights(&nodes, 0, MorphMode::Planar2D, 0.2, 0.2);
        assert_eq!(w.active_count(), 2);
    }

    #[test]
    fn test_prune_zeroes_small_weights_and_renormalizes() {
        let mut w = MorphWeights::from_raw(&[0.7, 0.2995, 0.0005, 0.0], 4);
        w.prune(WEIGHT_EPSILON);
        assert_eq!(w.get(2), 0.0);
        assert_close(w.sum(), 1.0);
        assert_close(w.get(0) / w.get(1), 0.7 / 0.2995);
    }

    #[test]
    fn test_higher_threshold_prunes_more() {
        let nodes = corner_nodes();
        let normal = compute_weights(&nodes, 4, MorphMode::Planar2D, 0.2, 0.3);
        let strict =
            compute_weights_with_threshold(&nodes, 4, MorphMode::Planar2D, 0.2, 0.3, 0.2);
        assert!(strict.nonzero_count() < normal.nonzero_count());
        assert_close(strict.sum(), 1.0);
    }

    #[test]
    fn test_retain_strongest() {
        let mut w = MorphWeights::from_raw(&[0.1, 0.4, 0.2, 0.3], 4);
        w.retain_strongest(2);
        assert_eq!(w.nonzero_count(), 2);
        assert_close(w.get(1), 0.4 / 0.7);
        assert_close(w.get(3), 0.3 / 0.7);
    }

    #[test]
    fn test_raw_all_zero_falls_back_to_even() {
        let w = MorphWeights::from_raw(&[0.0, f32::NAN, -1.0], 3);
        assert_eq!(w, MorphWeights::equal(3));
    }

    #[test]
    fn test_deterministic() {
        let nodes = corner_nodes();
        for mode in MorphMode::ALL {
            let a = compute_weights(&nodes, 4, mode, 0.37, 0.81);
            let b = compute_weights(&nodes, 4, mode, 0.37, 0.81);
            assert_eq!(a, b);
        }
    }
}
