//! Mirroring of layer weights across a symmetry seam
//!
//! The seam plane sits at the origin, perpendicular to the chosen axis, with
//! a configurable band width inside which vertices count as lying on the
//! seam. Each vertex outside the band is paired with the vertex closest to
//! its reflection; vertices without a counterpart within tolerance are left
//! unchanged. Influence weights are routed through an influence mapping so
//! that, for example, a left arm's weights land on the right arm.

use crate::{
    buffer::WeightBuffer,
    layer::Layer,
    mesh::Influence,
    types::{PaintTarget, Vector3D},
};
use bitflags::bitflags;
use std::collections::HashMap;

/// Default positional tolerance for matching a vertex to its reflection
pub const DEFAULT_VERTEX_TOLERANCE: f32 = 1e-4;

/// Default positional tolerance for pairing influence pivots
pub const DEFAULT_INFLUENCE_TOLERANCE: f32 = 1e-3;

/// Axis perpendicular to the mirror seam plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MirrorAxis {
    /// Seam plane is the YZ plane
    X,
    /// Seam plane is the XZ plane
    Y,
    /// Seam plane is the XY plane
    Z,
}

impl MirrorAxis {
    /// Signed distance of a point from the seam plane
    pub fn component(&self, point: Vector3D) -> f32 {
        match self {
            MirrorAxis::X => point.x,
            MirrorAxis::Y => point.y,
            MirrorAxis::Z => point.z,
        }
    }

    /// Reflect a point across the seam plane
    pub fn mirror_point(&self, point: Vector3D) -> Vector3D {
        match self {
            MirrorAxis::X => Vector3D::new(-point.x, point.y, point.z),
            MirrorAxis::Y => Vector3D::new(point.x, -point.y, point.z),
            MirrorAxis::Z => Vector3D::new(point.x, point.y, -point.z),
        }
    }

    /// Lowercase axis name, e.g. `"x"`
    pub fn as_str(&self) -> &'static str {
        match self {
            MirrorAxis::X => "x",
            MirrorAxis::Y => "y",
            MirrorAxis::Z => "z",
        }
    }
}

/// Direction in which weights travel across the seam
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorDirection {
    /// Overwrite the positive side from the negative side
    NegativeToPositive,
    /// Overwrite the negative side from the positive side
    PositiveToNegative,
    /// Pick the direction from existing weight asymmetry: the side carrying
    /// the larger total weight becomes the source
    Guess,
    /// Swap both sides
    Flip,
}

bitflags! {
    /// Selects which channels of a layer a mirror pass touches
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MirrorFlags: u32 {
        /// Mirror the per-influence weight buffers
        const WEIGHTS = 1 << 0;
        /// Mirror the layer mask
        const MASK = 1 << 1;
        /// Mirror the dual-quaternion blend channel
        const DUAL_QUATERNION = 1 << 2;
    }
}

impl Default for MirrorFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// Parameters of a mirror pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorOptions {
    /// Axis perpendicular to the seam plane
    pub axis: MirrorAxis,
    /// Width of the seam band; vertices inside it mirror onto themselves
    pub width: f32,
    /// Channels to mirror
    pub flags: MirrorFlags,
    /// Copy direction
    pub direction: MirrorDirection,
    /// Tolerance for matching a vertex to its reflection
    pub vertex_tolerance: f32,
    /// Tolerance for pairing influence pivots geometrically
    pub influence_tolerance: f32,
}

impl MirrorOptions {
    /// Mirror options with defaults for everything but the axis
    pub fn new(axis: MirrorAxis) -> Self {
        Self {
            axis,
            width: 0.0,
            flags: MirrorFlags::all(),
            direction: MirrorDirection::PositiveToNegative,
            vertex_tolerance: DEFAULT_VERTEX_TOLERANCE,
            influence_tolerance: DEFAULT_INFLUENCE_TOLERANCE,
        }
    }

    /// Set the seam band width
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    /// Set the channels to mirror
    pub fn with_flags(mut self, flags: MirrorFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the copy direction
    pub fn with_direction(mut self, direction: MirrorDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Set the vertex matching tolerance
    pub fn with_vertex_tolerance(mut self, tolerance: f32) -> Self {
        self.vertex_tolerance = tolerance;
        self
    }
}

/// Outcome counts of a mirror pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorSummary {
    /// Vertices whose weights were overwritten
    pub mirrored: usize,
    /// Destination-side vertices with no counterpart within tolerance
    pub unmatched: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Negative,
    Seam,
    Positive,
}

/// Per-vertex seam classification and counterpart lookup
pub(crate) struct VertexPairing {
    pub side: Vec<Side>,
    pub counterpart: Vec<Option<usize>>,
}

fn quantize(point: Vector3D, cell: f32) -> (i64, i64, i64) {
    (
        (point.x / cell).floor() as i64,
        (point.y / cell).floor() as i64,
        (point.z / cell).floor() as i64,
    )
}

/// Pair every vertex with the vertex nearest to its reflection
pub(crate) fn build_vertex_pairing(
    positions: &[Vector3D],
    axis: MirrorAxis,
    width: f32,
    tolerance: f32,
) -> VertexPairing {
    let half_width = width.max(0.0) * 0.5;
    let cell = tolerance.max(1e-6) * 2.0;

    let mut grid: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
    for (vertex, position) in positions.iter().enumerate() {
        grid.entry(quantize(*position, cell)).or_default().push(vertex);
    }

    let mut side = Vec::with_capacity(positions.len());
    let mut counterpart = Vec::with_capacity(positions.len());

    for (vertex, position) in positions.iter().enumerate() {
        let distance = axis.component(*position);
        if distance.abs() <= half_width {
            side.push(Side::Seam);
            counterpart.push(Some(vertex));
            continue;
        }
        side.push(if distance > 0.0 {
            Side::Positive
        } else {
            Side::Negative
        });

        let target = axis.mirror_point(*position);
        let center = quantize(target, cell);
        let mut best: Option<(usize, f32)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let key = (center.0 + dx, center.1 + dy, center.2 + dz);
                    let Some(candidates) = grid.get(&key) else {
                        continue;
                    };
                    for &candidate in candidates {
                        let d = positions[candidate].distance(target);
                        if d <= tolerance && best.is_none_or(|(_, bd)| d < bd) {
                            best = Some((candidate, d));
                        }
                    }
                }
            }
        }
        counterpart.push(best.map(|(candidate, _)| candidate));
    }

    VertexPairing { side, counterpart }
}

/// Geometric influence pairing: each influence maps to the influence whose
/// pivot is nearest to its own pivot reflected across the seam plane
///
/// Influences with no reflected counterpart within tolerance (typically
/// center-line joints) map to themselves. Explicit overrides replace the
/// geometric guess per source slot.
pub(crate) fn influence_mapping(
    influences: &[Influence],
    axis: MirrorAxis,
    tolerance: f32,
    overrides: &HashMap<usize, usize>,
) -> Vec<usize> {
    let mut mapping: Vec<usize> = (0..influences.len()).collect();
    for (slot, influence) in influences.iter().enumerate() {
        if let Some(&target) = overrides.get(&slot) {
            mapping[slot] = target;
            continue;
        }
        let target = axis.mirror_point(influence.pivot);
        let mut best: Option<(usize, f32)> = None;
        for (candidate_slot, candidate) in influences.iter().enumerate() {
            let d = candidate.pivot.distance(target);
            if d <= tolerance && best.is_none_or(|(_, bd)| d < bd) {
                best = Some((candidate_slot, d));
            }
        }
        if let Some((candidate_slot, _)) = best {
            mapping[slot] = candidate_slot;
        }
    }
    mapping
}

/// Resolve a `Guess` direction from existing weight asymmetry
fn resolve_direction(layer: &Layer, pairing: &VertexPairing, options: &MirrorOptions) -> MirrorDirection {
    if options.direction != MirrorDirection::Guess {
        return options.direction;
    }

    let mut positive_total = 0.0f32;
    let mut negative_total = 0.0f32;
    for (vertex, side) in pairing.side.iter().enumerate() {
        let total = match side {
            Side::Positive => &mut positive_total,
            Side::Negative => &mut negative_total,
            Side::Seam => continue,
        };
        if options.flags.contains(MirrorFlags::WEIGHTS) {
            for buffer in layer.influence_buffers() {
                *total += buffer.value(vertex);
            }
        }
        if options.flags.contains(MirrorFlags::MASK) {
            *total += layer.buffer(PaintTarget::Mask).value(vertex);
        }
        if options.flags.contains(MirrorFlags::DUAL_QUATERNION) {
            *total += layer.buffer(PaintTarget::DualQuaternion).value(vertex);
        }
    }

    if negative_total > positive_total {
        MirrorDirection::NegativeToPositive
    } else {
        MirrorDirection::PositiveToNegative
    }
}

/// Whether `side` receives weights under the resolved direction
fn is_destination(side: Side, direction: MirrorDirection) -> bool {
    match direction {
        MirrorDirection::NegativeToPositive => side == Side::Positive,
        MirrorDirection::PositiveToNegative => side == Side::Negative,
        MirrorDirection::Flip => side != Side::Seam,
        MirrorDirection::Guess => unreachable!("direction resolved before application"),
    }
}

/// Mirror one layer's buffers in place
///
/// The replacement buffers are computed fully before being committed, so a
/// mirror pass either applies as a whole or not at all.
pub(crate) fn apply_mirror(
    layer: &mut Layer,
    pairing: &VertexPairing,
    slot_mapping: &[usize],
    options: &MirrorOptions,
    vertex_count: usize,
) -> MirrorSummary {
    let direction = resolve_direction(layer, pairing, options);
    let mut summary = MirrorSummary::default();

    // Dense copy of the influence channel for remapped reads
    let slot_count = layer.influence_buffers().len();
    let old_init: Vec<bool> = layer
        .influence_buffers()
        .iter()
        .map(WeightBuffer::is_initialized)
        .collect();
    let old_weights: Vec<Vec<f32>> = layer
        .influence_buffers()
        .iter()
        .map(|b| {
            let mut dense = vec![0.0; vertex_count];
            dense[..b.len().min(vertex_count)]
                .copy_from_slice(&b.values()[..b.len().min(vertex_count)]);
            dense
        })
        .collect();

    let mut new_weights = old_weights.clone();
    let mut new_init = old_init.clone();
    for (source, &destination) in slot_mapping.iter().enumerate() {
        if source < slot_count && old_init[source] && destination < slot_count {
            new_init[destination] = true;
        }
    }

    let old_mask = layer.buffer(PaintTarget::Mask).clone();
    let mut new_mask = old_mask.clone();
    let old_dq = layer.buffer(PaintTarget::DualQuaternion).clone();
    let mut new_dq = old_dq.clone();

    for vertex in 0..vertex_count.min(pairing.side.len()) {
        let side = pairing.side[vertex];
        if !is_destination(side, direction) && side != Side::Seam {
            continue;
        }
        // Seam vertices only change when influences swap sides, which only
        // happens in a flip
        if side == Side::Seam && direction != MirrorDirection::Flip {
            continue;
        }
        let Some(source) = pairing.counterpart[vertex] else {
            summary.unmatched += 1;
            continue;
        };

        if options.flags.contains(MirrorFlags::WEIGHTS) && slot_count > 0 {
            let mut incoming = vec![0.0f32; slot_count];
            for (slot, &destination) in slot_mapping.iter().enumerate() {
                if slot >= slot_count || destination >= slot_count {
                    continue;
                }
                incoming[destination] += old_weights[slot][source];
            }
            for slot in 0..slot_count {
                if new_init[slot] {
                    new_weights[slot][vertex] = incoming[slot];
                }
            }
        }
        if options.flags.contains(MirrorFlags::MASK) && old_mask.is_initialized() {
            new_mask.values_mut()[vertex] = old_mask.value(source);
        }
        if options.flags.contains(MirrorFlags::DUAL_QUATERNION) && old_dq.is_initialized() {
            new_dq.values_mut()[vertex] = old_dq.value(source);
        }
        summary.mirrored += 1;
    }

    // Commit
    if options.flags.contains(MirrorFlags::WEIGHTS) {
        let buffers: Vec<WeightBuffer> = new_weights
            .into_iter()
            .zip(new_init)
            .map(|(dense, initialized)| {
                if initialized {
                    let mut buffer = WeightBuffer::new();
                    buffer.replace_raw(dense);
                    buffer
                } else {
                    WeightBuffer::new()
                }
            })
            .collect();
        layer.replace_influence_buffers(buffers);
    }
    if options.flags.contains(MirrorFlags::MASK) {
        *layer.buffer_mut(PaintTarget::Mask) = new_mask;
    }
    if options.flags.contains(MirrorFlags::DUAL_QUATERNION) {
        *layer.buffer_mut(PaintTarget::DualQuaternion) = new_dq;
    }

    summary
}
