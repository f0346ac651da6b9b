//! A single weight layer: metadata plus paint-target buffers
//!
//! Layers are owned and ordered by the store; this module holds the per-layer
//! state and the operations that only touch one layer's buffers (pruning,
//! weight snapshots). Anything that needs the mesh context or the forest
//! lives on [`crate::store::LayerStore`].

use crate::{
    buffer::WeightBuffer,
    error::{Error, Result},
    types::{LayerId, PaintTarget},
};
use serde::{Deserialize, Serialize};

/// Snapshot of every buffer a layer carries
///
/// Restoring a snapshot swaps it with the live buffers, so restoring twice
/// returns the layer to the state it had before the first restore.
#[derive(Debug, Clone)]
pub struct WeightsSnapshot {
    weights: Vec<WeightBuffer>,
    mask: WeightBuffer,
    dual_quaternion: WeightBuffer,
}

/// A named, orderable, enable/opacity-controlled set of weight buffers
#[derive(Debug, Clone)]
pub struct Layer {
    id: LayerId,
    name: String,
    opacity: f32,
    enabled: bool,
    parent: Option<LayerId>,
    weights: Vec<WeightBuffer>,
    mask: WeightBuffer,
    dual_quaternion: WeightBuffer,
    snapshot: Option<WeightsSnapshot>,
}

impl Layer {
    pub(crate) fn new<S: Into<String>>(id: LayerId, name: S) -> Self {
        Self {
            id,
            name: name.into(),
            opacity: 1.0,
            enabled: true,
            parent: None,
            weights: Vec::new(),
            mask: WeightBuffer::new(),
            dual_quaternion: WeightBuffer::new(),
            snapshot: None,
        }
    }

    /// Stable id of this layer
    pub fn id(&self) -> LayerId {
        self.id
    }

    /// Layer name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Layer opacity in `[0.0, 1.0]`
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Set opacity; out-of-range values are clamped into `[0.0, 1.0]`
    pub(crate) fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    /// Whether the layer participates in compositing
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Parent layer id, `None` for root layers
    pub fn parent(&self) -> Option<LayerId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<LayerId>) {
        self.parent = parent;
    }

    /// Number of influence buffers currently allocated
    pub fn weights_capacity(&self) -> usize {
        self.weights.len()
    }

    /// Grow the influence buffer table to hold at least `count` slots
    pub(crate) fn ensure_weights_capacity(&mut self, count: usize) {
        if self.weights.len() < count {
            self.weights.resize_with(count, WeightBuffer::new);
        }
    }

    /// Borrow the buffer addressed by a paint target
    ///
    /// Influence slots that were never written read as uninitialized.
    pub fn buffer(&self, target: PaintTarget) -> &WeightBuffer {
        static EMPTY: WeightBuffer = WeightBuffer::new();
        match target {
            PaintTarget::Influence(slot) => self.weights.get(slot).unwrap_or(&EMPTY),
            PaintTarget::Mask => &self.mask,
            PaintTarget::DualQuaternion => &self.dual_quaternion,
        }
    }

    pub(crate) fn buffer_mut(&mut self, target: PaintTarget) -> &mut WeightBuffer {
        match target {
            PaintTarget::Influence(slot) => {
                self.ensure_weights_capacity(slot + 1);
                &mut self.weights[slot]
            }
            PaintTarget::Mask => &mut self.mask,
            PaintTarget::DualQuaternion => &mut self.dual_quaternion,
        }
    }

    /// Whether the buffer addressed by `target` holds data
    pub fn has_paint_target(&self, target: PaintTarget) -> bool {
        self.buffer(target).is_initialized()
    }

    pub(crate) fn influence_buffers(&self) -> &[WeightBuffer] {
        &self.weights
    }

    pub(crate) fn replace_influence_buffers(&mut self, buffers: Vec<WeightBuffer>) {
        self.weights = buffers;
    }

    /// Zero influence weights below `threshold`, preserving per-vertex totals
    ///
    /// For each vertex the surviving weights are scaled so that the vertex's
    /// total weight is unchanged. Vertices whose surviving weights are all
    /// zero are left at zero. A threshold of 0.0 is a no-op.
    pub(crate) fn prune_weights(&mut self, threshold: f32) {
        let vertex_count = self
            .weights
            .iter()
            .map(WeightBuffer::len)
            .max()
            .unwrap_or(0);

        for vertex in 0..vertex_count {
            let mut total_before = 0.0f32;
            let mut total_kept = 0.0f32;
            for buffer in &self.weights {
                let value = buffer.value(vertex);
                total_before += value;
                if value >= threshold {
                    total_kept += value;
                }
            }

            let scale = if total_kept > 0.0 {
                total_before / total_kept
            } else {
                0.0
            };

            for buffer in &mut self.weights {
                if !buffer.is_initialized() || vertex >= buffer.len() {
                    continue;
                }
                let values = buffer.values_mut();
                if values[vertex] < threshold {
                    values[vertex] = 0.0;
                } else {
                    values[vertex] *= scale;
                }
            }
        }
    }

    /// Zero mask weights below `threshold`; no rescaling is applied
    pub(crate) fn prune_mask(&mut self, threshold: f32) {
        for value in self.mask.values_mut() {
            if *value < threshold {
                *value = 0.0;
            }
        }
    }

    /// Remember the current buffers for a later restore
    pub(crate) fn take_weights_snapshot(&mut self) {
        self.snapshot = Some(WeightsSnapshot {
            weights: self.weights.clone(),
            mask: self.mask.clone(),
            dual_quaternion: self.dual_quaternion.clone(),
        });
    }

    /// Swap the stored snapshot with the live buffers
    ///
    /// The previous live buffers become the new snapshot, so a second restore
    /// brings back the state present before the first one.
    pub(crate) fn restore_weights_snapshot(&mut self) -> Result<()> {
        let snapshot = self
            .snapshot
            .as_mut()
            .ok_or_else(|| Error::invalid_parameter("no weights snapshot taken for this layer"))?;
        std::mem::swap(&mut snapshot.weights, &mut self.weights);
        std::mem::swap(&mut snapshot.mask, &mut self.mask);
        std::mem::swap(&mut snapshot.dual_quaternion, &mut self.dual_quaternion);
        Ok(())
    }
}

/// Summary of a layer for listing and display purposes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerInfo {
    /// Stable layer id
    pub id: LayerId,
    /// Layer name
    pub name: String,
    /// Opacity in `[0.0, 1.0]`
    pub opacity: f32,
    /// Whether the layer participates in compositing
    pub enabled: bool,
    /// Parent layer id, `None` for root layers
    pub parent: Option<LayerId>,
    /// Position among siblings; 0 composites first
    pub index: usize,
}
