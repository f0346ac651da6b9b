//! The layer store: an ordered forest of weight layers over one mesh context
//!
//! The store owns every layer, maintains sibling order (index 0 composites
//! first), validates all per-vertex data against the mesh context, and keeps
//! a composite cache that is recomputed after each mutation unless a batch
//! scope is active.

use crate::{
    batch::UpdateSuspension,
    buffer::WeightBuffer,
    composite::{composite_forest, flatten_layer, CompositeWeights, LayerTreeNode},
    error::{Error, Result},
    layer::{Layer, LayerInfo},
    mesh::MeshContext,
    mirror::{apply_mirror, build_vertex_pairing, influence_mapping},
    mirror::{MirrorAxis, MirrorOptions, MirrorSummary},
    types::{LayerId, PaintTarget, Vector3D},
};
use std::collections::HashMap;

#[derive(Debug, Default)]
struct StoreData {
    /// Layers in document order; siblings' relative order is their order here
    layers: Vec<Layer>,
    next_id: u32,
    current_layer: Option<LayerId>,
    current_paint_target: Option<PaintTarget>,
    influence_limit: usize,
    mirror_overrides: HashMap<usize, usize>,
    mirror_axis: Option<MirrorAxis>,
    suspension: UpdateSuspension,
    composite_cache: Option<CompositeWeights>,
    recompute_count: u64,
}

impl StoreData {
    fn position(&self, id: LayerId) -> Result<usize> {
        self.layers
            .iter()
            .position(|layer| layer.id() == id)
            .ok_or(Error::InvalidLayerId { id })
    }

    fn layer(&self, id: LayerId) -> Result<&Layer> {
        self.layers
            .iter()
            .find(|layer| layer.id() == id)
            .ok_or(Error::InvalidLayerId { id })
    }

    fn layer_mut(&mut self, id: LayerId) -> Result<&mut Layer> {
        self.layers
            .iter_mut()
            .find(|layer| layer.id() == id)
            .ok_or(Error::InvalidLayerId { id })
    }

    /// Position of a layer among the siblings sharing its parent
    fn sibling_index(&self, id: LayerId) -> Result<usize> {
        let parent = self.layer(id)?.parent();
        Ok(self
            .layers
            .iter()
            .filter(|layer| layer.parent() == parent)
            .position(|layer| layer.id() == id)
            .expect("layer present in its own sibling list"))
    }

    /// Ids of a layer's direct children, in sibling order
    fn children_of(&self, id: LayerId) -> Vec<LayerId> {
        self.layers
            .iter()
            .filter(|layer| layer.parent() == Some(id))
            .map(Layer::id)
            .collect()
    }

    /// Ids of a layer and all its descendants
    fn subtree_ids(&self, id: LayerId) -> Vec<LayerId> {
        let mut ids = vec![id];
        let mut cursor = 0;
        while cursor < ids.len() {
            ids.extend(self.children_of(ids[cursor]));
            cursor += 1;
        }
        ids
    }
}

fn build_tree<'a>(layers: &'a [Layer], parent: Option<LayerId>) -> Vec<LayerTreeNode<'a>> {
    layers
        .iter()
        .filter(|layer| layer.parent() == parent)
        .map(|layer| LayerTreeNode {
            layer,
            children: build_tree(layers, Some(layer.id())),
        })
        .collect()
}

/// Ordered forest of weight layers attached to one mesh context
///
/// A store is constructed over a [`MeshContext`] and must be initialized via
/// [`LayerStore::init_layers`] before any layer operation; operations issued
/// earlier fail with [`Error::UninitializedStore`]. All operations are
/// synchronous and single-threaded; callers serialize access externally.
#[derive(Debug)]
pub struct LayerStore {
    mesh: MeshContext,
    data: Option<StoreData>,
}

impl LayerStore {
    /// Create a store over a mesh context, without layer data attached
    pub fn new(mesh: MeshContext) -> Self {
        Self { mesh, data: None }
    }

    /// The mesh context this store edits
    pub fn mesh(&self) -> &MeshContext {
        &self.mesh
    }

    /// Initialize layer data for the mesh; a no-op when already initialized
    pub fn init_layers(&mut self) {
        if self.data.is_none() {
            self.data = Some(StoreData {
                next_id: 1,
                ..StoreData::default()
            });
        }
    }

    /// Whether layer data has been initialized
    pub fn layers_available(&self) -> bool {
        self.data.is_some()
    }

    /// Number of vertices the store sees in the mesh
    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    fn data(&self) -> Result<&StoreData> {
        self.data.as_ref().ok_or(Error::UninitializedStore)
    }

    fn data_mut(&mut self) -> Result<&mut StoreData> {
        self.data.as_mut().ok_or(Error::UninitializedStore)
    }

    /// Record a composite-affecting mutation and recompute unless suspended
    fn touch(&mut self) {
        let recompute_now = match self.data.as_mut() {
            Some(data) => data.suspension.mark_dirty(),
            None => false,
        };
        if recompute_now {
            self.recompute();
        }
    }

    fn recompute(&mut self) {
        let vertex_count = self.mesh.vertex_count();
        let influence_count = self.mesh.influence_count();
        let Some(data) = self.data.as_mut() else {
            return;
        };
        let composite = {
            let roots = build_tree(&data.layers, None);
            composite_forest(&roots, vertex_count, influence_count, data.influence_limit)
        };
        data.composite_cache = Some(composite);
        data.recompute_count += 1;
        log::debug!(
            "recomposited {} layers (recompute #{})",
            data.layers.len(),
            data.recompute_count
        );
    }

    // ----- layer lifecycle -------------------------------------------------

    /// Create a new root layer and return its id
    ///
    /// Unless `force_empty` is set, the layer's influence buffers are
    /// populated from the skin weights captured by the mesh context.
    pub fn create_layer(&mut self, name: &str, force_empty: bool) -> Result<LayerId> {
        let buffers: Vec<WeightBuffer> = if force_empty {
            Vec::new()
        } else {
            (0..self.mesh.influence_count())
                .map(|slot| {
                    let initial = self.mesh.initial_weights(slot);
                    if initial.is_empty() {
                        WeightBuffer::new()
                    } else {
                        WeightBuffer::from_values(initial.iter().copied())
                    }
                })
                .collect()
        };

        let data = self.data_mut()?;
        let id = LayerId(data.next_id);
        data.next_id += 1;
        let mut layer = Layer::new(id, name);
        layer.replace_influence_buffers(buffers);
        data.layers.push(layer);
        self.touch();
        Ok(id)
    }

    /// Delete a layer; its children re-parent to the deleted layer's parent,
    /// keeping their relative order
    pub fn delete_layer(&mut self, id: LayerId) -> Result<()> {
        let data = self.data_mut()?;
        let position = data.position(id)?;
        let parent = data.layers[position].parent();
        for layer in &mut data.layers {
            if layer.parent() == Some(id) {
                layer.set_parent(parent);
            }
        }
        data.layers.remove(position);
        if data.current_layer == Some(id) {
            data.current_layer = None;
        }
        self.touch();
        Ok(())
    }

    /// Summaries of every layer, in document order
    pub fn list_layers(&self) -> Result<Vec<LayerInfo>> {
        let data = self.data()?;
        data.layers
            .iter()
            .map(|layer| {
                Ok(LayerInfo {
                    id: layer.id(),
                    name: layer.name().to_string(),
                    opacity: layer.opacity(),
                    enabled: layer.is_enabled(),
                    parent: layer.parent(),
                    index: data.sibling_index(layer.id())?,
                })
            })
            .collect()
    }

    /// Ids of every layer, in document order
    pub fn layer_ids(&self) -> Result<Vec<LayerId>> {
        Ok(self.data()?.layers.iter().map(Layer::id).collect())
    }

    /// Borrow a layer for reading
    pub fn layer(&self, id: LayerId) -> Result<&Layer> {
        self.data()?.layer(id)
    }

    // ----- layer metadata --------------------------------------------------

    /// Layer name by id
    pub fn layer_name(&self, id: LayerId) -> Result<&str> {
        Ok(self.data()?.layer(id)?.name())
    }

    /// Rename a layer
    pub fn set_layer_name(&mut self, id: LayerId, name: &str) -> Result<()> {
        self.data_mut()?.layer_mut(id)?.set_name(name);
        Ok(())
    }

    /// Layer opacity in `[0.0, 1.0]`
    pub fn layer_opacity(&self, id: LayerId) -> Result<f32> {
        Ok(self.data()?.layer(id)?.opacity())
    }

    /// Set layer opacity; out-of-range values are clamped into `[0.0, 1.0]`
    pub fn set_layer_opacity(&mut self, id: LayerId, opacity: f32) -> Result<()> {
        self.data_mut()?.layer_mut(id)?.set_opacity(opacity);
        self.touch();
        Ok(())
    }

    /// Whether a layer participates in compositing
    pub fn is_layer_enabled(&self, id: LayerId) -> Result<bool> {
        Ok(self.data()?.layer(id)?.is_enabled())
    }

    /// Turn a layer on or off
    pub fn set_layer_enabled(&mut self, id: LayerId, enabled: bool) -> Result<()> {
        self.data_mut()?.layer_mut(id)?.set_enabled(enabled);
        self.touch();
        Ok(())
    }

    /// Parent layer id, `None` for root layers
    pub fn layer_parent(&self, id: LayerId) -> Result<Option<LayerId>> {
        Ok(self.data()?.layer(id)?.parent())
    }

    /// Re-parent a layer; rejects unknown parents and parent cycles
    pub fn set_layer_parent(&mut self, id: LayerId, parent: Option<LayerId>) -> Result<()> {
        let data = self.data_mut()?;
        data.position(id)?;
        if let Some(parent_id) = parent {
            if parent_id == id {
                return Err(Error::invalid_parameter("layer cannot be its own parent"));
            }
            data.position(parent_id)?;
            // Walk up from the new parent; hitting `id` would close a cycle
            let mut ancestor = Some(parent_id);
            while let Some(current) = ancestor {
                if current == id {
                    return Err(Error::invalid_parameter(
                        "parent change would create a cycle",
                    ));
                }
                ancestor = data.layer(current)?.parent();
            }
        }
        data.layer_mut(id)?.set_parent(parent);
        self.touch();
        Ok(())
    }

    /// Position of a layer among its siblings; 0 composites first
    pub fn layer_index(&self, id: LayerId) -> Result<usize> {
        self.data()?.sibling_index(id)
    }

    /// Move a layer to a new position among its siblings
    ///
    /// Indices past the end of the sibling list clamp to the end.
    pub fn set_layer_index(&mut self, id: LayerId, index: usize) -> Result<()> {
        let data = self.data_mut()?;
        let position = data.position(id)?;
        let layer = data.layers.remove(position);
        let parent = layer.parent();

        let mut insert_at = data.layers.len();
        let mut seen = 0;
        for (vec_index, other) in data.layers.iter().enumerate() {
            if other.parent() == parent {
                if seen == index {
                    insert_at = vec_index;
                    break;
                }
                seen += 1;
            }
        }
        data.layers.insert(insert_at, layer);
        self.touch();
        Ok(())
    }

    // ----- cursors ---------------------------------------------------------

    /// The layer used as the default target by operations that accept one
    pub fn current_layer(&self) -> Result<Option<LayerId>> {
        Ok(self.data()?.current_layer)
    }

    /// Set or clear the current layer
    pub fn set_current_layer(&mut self, id: Option<LayerId>) -> Result<()> {
        let data = self.data_mut()?;
        if let Some(id) = id {
            data.position(id)?;
        }
        data.current_layer = id;
        Ok(())
    }

    /// The paint target subsequent weight edits address by default
    pub fn current_paint_target(&self) -> Result<Option<PaintTarget>> {
        Ok(self.data()?.current_paint_target)
    }

    /// Set or clear the current paint target
    pub fn set_current_paint_target(&mut self, target: Option<PaintTarget>) -> Result<()> {
        if let Some(PaintTarget::Influence(slot)) = target {
            if slot >= self.mesh.influence_count() {
                return Err(Error::invalid_influence(slot));
            }
        }
        self.data_mut()?.current_paint_target = target;
        Ok(())
    }

    fn resolve_layer(&self, id: Option<LayerId>) -> Result<LayerId> {
        match id {
            Some(id) => Ok(id),
            None => self
                .data()?
                .current_layer
                .ok_or_else(|| Error::invalid_parameter("no layer given and no current layer set")),
        }
    }

    // ----- weights ---------------------------------------------------------

    fn validate_target(&self, target: PaintTarget) -> Result<()> {
        if let PaintTarget::Influence(slot) = target {
            if slot >= self.mesh.influence_count() {
                return Err(Error::invalid_influence(slot));
            }
        }
        Ok(())
    }

    /// Weights of a paint target; empty slice when uninitialized
    pub fn influence_weights(&self, id: LayerId, target: PaintTarget) -> Result<&[f32]> {
        self.validate_target(target)?;
        Ok(self.data()?.layer(id)?.buffer(target).values())
    }

    /// Replace the weights of a paint target
    ///
    /// Values are clamped into `[0.0, 1.0]` on write. An empty slice resets
    /// the buffer to uninitialized; any other length must match the vertex
    /// count.
    pub fn set_influence_weights(
        &mut self,
        id: LayerId,
        target: PaintTarget,
        values: &[f32],
    ) -> Result<()> {
        self.validate_target(target)?;
        let vertex_count = self.mesh.vertex_count();
        if !values.is_empty() && values.len() != vertex_count {
            return Err(Error::dimension_mismatch(vertex_count, values.len()));
        }
        self.data_mut()?.layer_mut(id)?.buffer_mut(target).set(values);
        self.touch();
        Ok(())
    }

    /// Layer mask weights; empty when the mask is uninitialized
    pub fn layer_mask(&self, id: LayerId) -> Result<&[f32]> {
        self.influence_weights(id, PaintTarget::Mask)
    }

    /// Set the layer mask; an empty slice resets it to uninitialized
    pub fn set_layer_mask(&mut self, id: LayerId, values: &[f32]) -> Result<()> {
        self.set_influence_weights(id, PaintTarget::Mask, values)
    }

    /// Dual-quaternion blend weights; empty when never painted
    pub fn dual_quaternion_weights(&self, id: LayerId) -> Result<&[f32]> {
        self.influence_weights(id, PaintTarget::DualQuaternion)
    }

    /// Set the dual-quaternion blend weights
    pub fn set_dual_quaternion_weights(&mut self, id: LayerId, values: &[f32]) -> Result<()> {
        self.set_influence_weights(id, PaintTarget::DualQuaternion, values)
    }

    /// Whether the buffer addressed by `target` holds data
    pub fn has_paint_target(&self, id: LayerId, target: PaintTarget) -> Result<bool> {
        self.validate_target(target)?;
        Ok(self.data()?.layer(id)?.has_paint_target(target))
    }

    /// Pre-allocate a layer's influence buffer table for at least `count`
    /// influences
    pub fn ensure_weights_capacity(&mut self, id: LayerId, count: usize) -> Result<()> {
        if count > self.mesh.influence_count() {
            return Err(Error::invalid_influence(count.saturating_sub(1)));
        }
        self.data_mut()?.layer_mut(id)?.ensure_weights_capacity(count);
        Ok(())
    }

    /// Remember a layer's current weights for a later restore
    pub fn snapshot_layer_weights(&mut self, id: LayerId) -> Result<()> {
        self.data_mut()?.layer_mut(id)?.take_weights_snapshot();
        Ok(())
    }

    /// Swap a layer's stored snapshot with its live weights
    ///
    /// Restoring twice returns the layer to the state it had before the
    /// first restore.
    pub fn restore_layer_weights(&mut self, id: LayerId) -> Result<()> {
        self.data_mut()?.layer_mut(id)?.restore_weights_snapshot()?;
        self.touch();
        Ok(())
    }

    // ----- destructive layer operations ------------------------------------

    /// Zero influence weights below `threshold` on a layer, preserving each
    /// vertex's total weight; `None` targets the current layer
    pub fn prune_weights(&mut self, id: Option<LayerId>, threshold: f32) -> Result<()> {
        let id = self.resolve_layer(id)?;
        self.data_mut()?.layer_mut(id)?.prune_weights(threshold);
        self.touch();
        Ok(())
    }

    /// Zero mask weights below `threshold` on a layer, without rescaling;
    /// `None` targets the current layer
    pub fn prune_mask(&mut self, id: Option<LayerId>, threshold: f32) -> Result<()> {
        let id = self.resolve_layer(id)?;
        self.data_mut()?.layer_mut(id)?.prune_mask(threshold);
        self.touch();
        Ok(())
    }

    /// Merge a layer into the sibling directly below it in order
    ///
    /// The layer's effective contribution (its own buffers with children
    /// flattened) folds into the lower layer so that the store's flattened
    /// composite output is unchanged. The merged-away layer and its children
    /// are removed. The target sibling must not have children of its own.
    pub fn merge_down(&mut self, id: LayerId) -> Result<()> {
        let vertex_count = self.mesh.vertex_count();
        let influence_count = self.mesh.influence_count();

        let data = self.data_mut()?;
        let sibling_index = data.sibling_index(id)?;
        if sibling_index == 0 {
            return Err(Error::invalid_parameter("no layer below to merge into"));
        }
        let parent = data.layer(id)?.parent();
        let below_id = data
            .layers
            .iter()
            .filter(|layer| layer.parent() == parent)
            .nth(sibling_index - 1)
            .map(Layer::id)
            .expect("sibling below exists at index - 1");
        if !data.children_of(below_id).is_empty() {
            return Err(Error::invalid_parameter(
                "cannot merge onto a layer that has children",
            ));
        }

        // Effective contribution of the merged layer, children flattened
        let above = data.layer(id)?;
        let flattened = {
            let node = LayerTreeNode {
                layer: above,
                children: build_tree(&data.layers, Some(id)),
            };
            flatten_layer(&node, vertex_count, influence_count)
        };
        let above_enabled = above.is_enabled();
        let above_opacity = above.opacity();
        let above_mask = above.buffer(PaintTarget::Mask).clone();

        let below = data.layer(below_id)?;
        let below_enabled = below.is_enabled();
        let below_opacity = below.opacity();
        let below_mask = below.buffer(PaintTarget::Mask).clone();
        let below_dq = below.buffer(PaintTarget::DualQuaternion).clone();
        let below_dense: Vec<Vec<f32>> = (0..influence_count)
            .map(|slot| {
                let buffer = below.buffer(PaintTarget::Influence(slot));
                let mut dense = vec![0.0; vertex_count];
                for (vertex, value) in buffer.values().iter().enumerate() {
                    dense[vertex] = *value;
                }
                dense
            })
            .collect();

        // Fold the two blend steps into one so the flattened output is
        // unchanged: wm = wa + wb - wa*wb and M*wm = B*wb*(1-wa) + A*wa
        let mut merged = vec![vec![0.0f32; vertex_count]; influence_count];
        let mut merged_mask = vec![0.0f32; vertex_count];
        let merge_dq = flattened.dq_painted || below_dq.is_initialized();
        let mut merged_dq = vec![0.0f32; vertex_count];
        let mut mask_is_full = true;
        for vertex in 0..vertex_count {
            let wa = if above_enabled {
                above_opacity * above_mask.sample_or(vertex, 1.0)
            } else {
                0.0
            };
            let wb = if below_enabled {
                below_opacity * below_mask.sample_or(vertex, 1.0)
            } else {
                0.0
            };
            let wm = wa + wb - wa * wb;
            merged_mask[vertex] = wm;
            if wm != 1.0 {
                mask_is_full = false;
            }
            if wm <= 0.0 {
                continue;
            }
            for slot in 0..influence_count {
                let b = below_dense[slot][vertex];
                let a = flattened.influences[slot][vertex];
                merged[slot][vertex] = (b * wb * (1.0 - wa) + a * wa) / wm;
            }
            if merge_dq {
                let b = below_dq.value(vertex);
                let a = flattened.dual_quaternion[vertex];
                merged_dq[vertex] = (b * wb * (1.0 - wa) + a * wa) / wm;
            }
        }

        // Commit onto the lower layer and drop the merged subtree
        let removed = data.subtree_ids(id);
        let below = data.layer_mut(below_id)?;
        below.set_opacity(1.0);
        below.set_enabled(above_enabled || below_enabled);
        let buffers = merged
            .into_iter()
            .map(|dense| {
                let mut buffer = WeightBuffer::new();
                buffer.replace_raw(dense);
                buffer
            })
            .collect();
        below.replace_influence_buffers(buffers);
        if mask_is_full {
            below.buffer_mut(PaintTarget::Mask).clear();
        } else {
            below.buffer_mut(PaintTarget::Mask).set(&merged_mask);
        }
        if merge_dq {
            below.buffer_mut(PaintTarget::DualQuaternion).set(&merged_dq);
        }

        data.layers.retain(|layer| !removed.contains(&layer.id()));
        if data
            .current_layer
            .is_some_and(|current| removed.contains(&current))
        {
            data.current_layer = Some(below_id);
        }
        self.touch();
        Ok(())
    }

    // ----- influence table and limit ---------------------------------------

    /// Logical indexes of all influences in the mesh context
    pub fn influence_indexes(&self) -> Vec<usize> {
        self.mesh
            .influences()
            .iter()
            .map(|influence| influence.logical_index)
            .collect()
    }

    /// Paths of all influences in the mesh context
    pub fn influence_paths(&self) -> Vec<String> {
        self.mesh
            .influences()
            .iter()
            .map(|influence| influence.path.clone())
            .collect()
    }

    /// Pivot positions of all influences in the mesh context
    pub fn influence_pivots(&self) -> Vec<Vector3D> {
        self.mesh
            .influences()
            .iter()
            .map(|influence| influence.pivot)
            .collect()
    }

    /// Max influences retained per vertex after compositing; 0 is unlimited
    pub fn influence_limit(&self) -> Result<usize> {
        Ok(self.data()?.influence_limit)
    }

    /// Set the per-vertex influence limit; 0 removes the limit
    pub fn set_influence_limit(&mut self, limit: usize) -> Result<()> {
        self.data_mut()?.influence_limit = limit;
        self.touch();
        Ok(())
    }

    // ----- compositing -----------------------------------------------------

    /// The flattened weights for the skin deformer
    ///
    /// Serves the cached composite; inside a batch scope the cache may lag
    /// behind mutations until the outermost scope ends.
    pub fn composite(&mut self) -> Result<&CompositeWeights> {
        if !self.layers_available() {
            return Err(Error::UninitializedStore);
        }
        let needs_compute = self
            .data
            .as_ref()
            .is_none_or(|data| data.composite_cache.is_none());
        if needs_compute {
            self.recompute();
        }
        self.data
            .as_ref()
            .and_then(|data| data.composite_cache.as_ref())
            .ok_or(Error::UninitializedStore)
    }

    /// Number of composite recomputations performed so far
    pub fn recompute_count(&self) -> u64 {
        self.data
            .as_ref()
            .map(|data| data.recompute_count)
            .unwrap_or(0)
    }

    /// Run bulk edits with recomposition suspended
    ///
    /// Scopes nest: recomposition resumes, and runs exactly once, when the
    /// outermost scope ends. The suspension is released on the error path as
    /// well, so a failing body cannot leak a suspended store.
    pub fn batch_update<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        self.data_mut()?.suspension.enter();
        let result = f(self);
        let resume = self
            .data
            .as_mut()
            .map(|data| data.suspension.exit())
            .unwrap_or(false);
        if resume {
            self.recompute();
        }
        result
    }

    // ----- mirroring -------------------------------------------------------

    /// Mirror one layer's buffers across the seam plane
    ///
    /// Vertices without a counterpart within tolerance are skipped and
    /// counted in the returned summary. Requires vertex positions on the
    /// mesh context.
    pub fn mirror_layer(&mut self, id: LayerId, options: &MirrorOptions) -> Result<MirrorSummary> {
        if !self.mesh.has_positions() {
            return Err(Error::missing_mesh_data(
                "vertex positions are required for mirroring",
            ));
        }
        let vertex_count = self.mesh.vertex_count();
        let pairing = build_vertex_pairing(
            self.mesh.positions(),
            options.axis,
            options.width,
            options.vertex_tolerance,
        );
        let mapping = influence_mapping(
            self.mesh.influences(),
            options.axis,
            options.influence_tolerance,
            &self.data()?.mirror_overrides,
        );

        let influence_count = self.mesh.influence_count();
        let data = self.data_mut()?;
        let layer = data.layer_mut(id)?;
        // Weights may land on a slot the layer never painted
        layer.ensure_weights_capacity(influence_count);
        let summary = apply_mirror(layer, &pairing, &mapping, options, vertex_count);
        data.mirror_axis = Some(options.axis);
        self.touch();
        log::debug!(
            "mirrored layer {}: {} vertices written, {} without counterpart",
            id,
            summary.mirrored,
            summary.unmatched
        );
        Ok(summary)
    }

    /// Override the geometric influence pairing for specific influence slots
    ///
    /// Pairs are (source, destination) influence slots. Replaces any
    /// previously configured overrides.
    pub fn configure_mirror_mapping(&mut self, pairs: &[(usize, usize)]) -> Result<()> {
        let influence_count = self.mesh.influence_count();
        for &(source, destination) in pairs {
            if source >= influence_count {
                return Err(Error::invalid_influence(source));
            }
            if destination >= influence_count {
                return Err(Error::invalid_influence(destination));
            }
        }
        self.data_mut()?.mirror_overrides = pairs.iter().copied().collect();
        Ok(())
    }

    /// Axis used by the most recent mirror operation, if any
    pub fn mirror_axis(&self) -> Option<MirrorAxis> {
        self.data.as_ref().and_then(|data| data.mirror_axis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_influences(vertex_count: usize, influence_count: usize) -> LayerStore {
        let influences = (0..influence_count)
            .map(|i| crate::mesh::Influence::new(i, format!("joint{}", i), Vector3D::ZERO))
            .collect();
        let mut store = LayerStore::new(MeshContext::new(vertex_count).with_influences(influences));
        store.init_layers();
        store
    }

    #[test]
    fn test_operations_fail_before_init() {
        let mut store = LayerStore::new(MeshContext::new(3));
        assert!(matches!(
            store.create_layer("base", true),
            Err(Error::UninitializedStore)
        ));
        assert!(matches!(store.list_layers(), Err(Error::UninitializedStore)));
    }

    #[test]
    fn test_layer_ids_are_stable_and_unique() {
        let mut store = store_with_influences(3, 1);
        let first = store.create_layer("first", true).unwrap();
        let second = store.create_layer("second", true).unwrap();
        store.delete_layer(first).unwrap();
        let third = store.create_layer("third", true).unwrap();
        assert_ne!(second, third);
        assert_ne!(first, third);
    }

    #[test]
    fn test_delete_reparents_children() {
        let mut store = store_with_influences(3, 1);
        let group = store.create_layer("group", true).unwrap();
        let child = store.create_layer("child", true).unwrap();
        store.set_layer_parent(child, Some(group)).unwrap();
        store.delete_layer(group).unwrap();
        assert_eq!(store.layer_parent(child).unwrap(), None);
    }

    #[test]
    fn test_parent_cycle_rejected() {
        let mut store = store_with_influences(3, 1);
        let a = store.create_layer("a", true).unwrap();
        let b = store.create_layer("b", true).unwrap();
        store.set_layer_parent(b, Some(a)).unwrap();
        assert!(store.set_layer_parent(a, Some(b)).is_err());
        assert!(store.set_layer_parent(a, Some(a)).is_err());
    }

    #[test]
    fn test_set_layer_index_reorders_siblings() {
        let mut store = store_with_influences(3, 1);
        let a = store.create_layer("a", true).unwrap();
        let b = store.create_layer("b", true).unwrap();
        let c = store.create_layer("c", true).unwrap();
        assert_eq!(store.layer_index(c).unwrap(), 2);
        store.set_layer_index(c, 0).unwrap();
        assert_eq!(store.layer_index(c).unwrap(), 0);
        assert_eq!(store.layer_index(a).unwrap(), 1);
        assert_eq!(store.layer_index(b).unwrap(), 2);
    }

    #[test]
    fn test_current_layer_cleared_on_delete() {
        let mut store = store_with_influences(3, 1);
        let layer = store.create_layer("layer", true).unwrap();
        store.set_current_layer(Some(layer)).unwrap();
        store.delete_layer(layer).unwrap();
        assert_eq!(store.current_layer().unwrap(), None);
    }

    #[test]
    fn test_set_weights_validates_dimension() {
        let mut store = store_with_influences(4, 1);
        let layer = store.create_layer("layer", true).unwrap();
        let result = store.set_influence_weights(layer, PaintTarget::Influence(0), &[1.0]);
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch {
                expected: 4,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_set_weights_validates_influence_slot() {
        let mut store = store_with_influences(2, 1);
        let layer = store.create_layer("layer", true).unwrap();
        let result = store.set_influence_weights(layer, PaintTarget::Influence(3), &[1.0, 0.0]);
        assert!(matches!(result, Err(Error::InvalidInfluence { index: 3 })));
    }

    #[test]
    fn test_create_layer_populates_from_skin_weights() {
        let mesh = MeshContext::new(3)
            .with_influences(vec![crate::mesh::Influence::new(
                0,
                "joint0",
                Vector3D::ZERO,
            )])
            .with_skin_weights(vec![vec![0.1, 0.2, 0.3]])
            .unwrap();
        let mut store = LayerStore::new(mesh);
        store.init_layers();

        let populated = store.create_layer("populated", false).unwrap();
        assert_eq!(
            store
                .influence_weights(populated, PaintTarget::Influence(0))
                .unwrap(),
            &[0.1, 0.2, 0.3]
        );

        let empty = store.create_layer("empty", true).unwrap();
        assert!(store
            .influence_weights(empty, PaintTarget::Influence(0))
            .unwrap()
            .is_empty());
    }
}
