//! Flattening of the layer forest into deformer-ready weights
//!
//! Layers composite bottom-up: within a group, a layer's own buffers form
//! the base and its children blend on top in sibling order; the group result
//! then blends into the parent accumulator weighted by the layer's opacity
//! and mask. The dual-quaternion channel blends with the same law but only
//! layers that actually painted it contribute.

use crate::{buffer::WeightBuffer, layer::Layer};

/// Per-influence weight arrays ready for a skin deformer
///
/// Produced by [`crate::store::LayerStore::composite`]. Influence arrays are
/// indexed by influence slot; the dual-quaternion array is empty when no
/// enabled layer painted that channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeWeights {
    vertex_count: usize,
    influences: Vec<Vec<f32>>,
    dual_quaternion: Vec<f32>,
}

impl CompositeWeights {
    /// Number of vertices covered by each array
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of influence slots
    pub fn influence_count(&self) -> usize {
        self.influences.len()
    }

    /// Flattened weights for one influence slot
    pub fn influence_weights(&self, slot: usize) -> &[f32] {
        self.influences.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Flattened dual-quaternion blend weights; empty when never painted
    pub fn dual_quaternion_weights(&self) -> &[f32] {
        &self.dual_quaternion
    }

    /// Whether any layer contributed dual-quaternion blend weights
    pub fn has_dual_quaternion(&self) -> bool {
        !self.dual_quaternion.is_empty()
    }

    /// Weights of every influence at one vertex, as (slot, weight) pairs
    pub fn vertex_weights(&self, vertex: usize) -> Vec<(usize, f32)> {
        self.influences
            .iter()
            .enumerate()
            .map(|(slot, values)| (slot, values.get(vertex).copied().unwrap_or(0.0)))
            .collect()
    }

    /// Retain only the `limit` largest weights per vertex
    ///
    /// Dropped weights are redistributed over the retained ones so that each
    /// vertex's total weight is preserved. Ties are broken towards the lower
    /// influence slot. A limit of 0 means unlimited.
    pub(crate) fn apply_influence_limit(&mut self, limit: usize) {
        if limit == 0 || self.influences.len() <= limit {
            return;
        }

        for vertex in 0..self.vertex_count {
            let mut ranked: Vec<(usize, f32)> = self
                .influences
                .iter()
                .enumerate()
                .map(|(slot, values)| (slot, values[vertex]))
                .collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

            let total_before: f32 = ranked.iter().map(|(_, w)| w).sum();
            let total_kept: f32 = ranked.iter().take(limit).map(|(_, w)| w).sum();
            let scale = if total_kept > 0.0 {
                total_before / total_kept
            } else {
                0.0
            };

            for (rank, &(slot, weight)) in ranked.iter().enumerate() {
                self.influences[slot][vertex] = if rank < limit { weight * scale } else { 0.0 };
            }
        }
    }
}

/// A layer with its children resolved, in sibling order
pub(crate) struct LayerTreeNode<'a> {
    pub layer: &'a Layer,
    pub children: Vec<LayerTreeNode<'a>>,
}

struct Channels {
    influences: Vec<Vec<f32>>,
    dual_quaternion: Vec<f32>,
    dq_painted: bool,
}

impl Channels {
    fn zeros(vertex_count: usize, influence_count: usize) -> Self {
        Self {
            influences: vec![vec![0.0; vertex_count]; influence_count],
            dual_quaternion: vec![0.0; vertex_count],
            dq_painted: false,
        }
    }

    fn from_layer(layer: &Layer, vertex_count: usize, influence_count: usize) -> Self {
        let mut channels = Self::zeros(vertex_count, influence_count);
        for (slot, buffer) in layer.influence_buffers().iter().enumerate() {
            if slot >= influence_count || !buffer.is_initialized() {
                continue;
            }
            for (vertex, value) in buffer.values().iter().enumerate() {
                channels.influences[slot][vertex] = *value;
            }
        }
        let dq = layer.buffer(crate::types::PaintTarget::DualQuaternion);
        if dq.is_initialized() {
            for (vertex, value) in dq.values().iter().enumerate() {
                channels.dual_quaternion[vertex] = *value;
            }
            channels.dq_painted = true;
        }
        channels
    }

    /// Blend `other` on top of self, modulated by opacity and mask of `layer`
    fn blend(&mut self, other: &Channels, layer: &Layer, mask: &WeightBuffer) {
        let vertex_count = self.dual_quaternion.len();
        for vertex in 0..vertex_count {
            let weight = layer.opacity() * mask.sample_or(vertex, 1.0);
            if weight == 0.0 {
                continue;
            }
            for slot in 0..self.influences.len() {
                let below = self.influences[slot][vertex];
                let above = other.influences[slot][vertex];
                self.influences[slot][vertex] = below * (1.0 - weight) + above * weight;
            }
            if other.dq_painted {
                let below = self.dual_quaternion[vertex];
                let above = other.dual_quaternion[vertex];
                self.dual_quaternion[vertex] = below * (1.0 - weight) + above * weight;
            }
        }
        self.dq_painted |= other.dq_painted;
    }
}

/// Composite a group of sibling trees on top of an optional base layer
fn group_channels(
    nodes: &[LayerTreeNode<'_>],
    base: Option<&Layer>,
    vertex_count: usize,
    influence_count: usize,
) -> Channels {
    let mut accumulator = match base {
        Some(layer) => Channels::from_layer(layer, vertex_count, influence_count),
        None => Channels::zeros(vertex_count, influence_count),
    };

    for node in nodes {
        if !node.layer.is_enabled() {
            continue;
        }
        let effective = group_channels(&node.children, Some(node.layer), vertex_count, influence_count);
        let mask = node.layer.buffer(crate::types::PaintTarget::Mask);
        accumulator.blend(&effective, node.layer, mask);
    }

    accumulator
}

/// A layer's effective contribution: its own buffers with its children
/// composited on top, before the layer's opacity and mask are applied
pub(crate) struct FlattenedLayer {
    pub influences: Vec<Vec<f32>>,
    pub dual_quaternion: Vec<f32>,
    pub dq_painted: bool,
}

/// Flatten one layer subtree into its effective contribution
pub(crate) fn flatten_layer(
    node: &LayerTreeNode<'_>,
    vertex_count: usize,
    influence_count: usize,
) -> FlattenedLayer {
    let channels = group_channels(&node.children, Some(node.layer), vertex_count, influence_count);
    FlattenedLayer {
        influences: channels.influences,
        dual_quaternion: channels.dual_quaternion,
        dq_painted: channels.dq_painted,
    }
}

/// Flatten an ordered forest into composite weights
pub(crate) fn composite_forest(
    roots: &[LayerTreeNode<'_>],
    vertex_count: usize,
    influence_count: usize,
    influence_limit: usize,
) -> CompositeWeights {
    let channels = group_channels(roots, None, vertex_count, influence_count);
    let mut composite = CompositeWeights {
        vertex_count,
        influences: channels.influences,
        dual_quaternion: if channels.dq_painted {
            channels.dual_quaternion
        } else {
            Vec::new()
        },
    };
    composite.apply_influence_limit(influence_limit);
    composite
}
