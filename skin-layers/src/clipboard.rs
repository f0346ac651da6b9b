//! Copy, cut and paste of paint-target weights between layers
//!
//! The clipboard captures selected buffers of one layer and can paste them
//! onto another layer of the same store, or of a different store with the
//! same vertex count. Paste supports replace, additive and subtractive
//! application; the combined values re-clamp into `[0.0, 1.0]` on write.

use crate::{
    error::{Error, Result},
    store::LayerStore,
    types::{LayerId, PaintTarget},
};

/// How pasted weights combine with a layer's existing weights
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteOperation {
    /// Add pasted weights to the existing values
    Add,
    /// Subtract pasted weights from the existing values
    Subtract,
    /// Replace the existing values
    Replace,
}

#[derive(Debug, Clone)]
struct ClipboardEntry {
    target: PaintTarget,
    values: Vec<f32>,
}

/// Holds copied weights between copy/cut and paste operations
#[derive(Debug, Clone, Default)]
pub struct WeightsClipboard {
    vertex_count: usize,
    entries: Vec<ClipboardEntry>,
}

impl WeightsClipboard {
    /// Create an empty clipboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the clipboard holds any weights
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paint targets currently held by the clipboard
    pub fn targets(&self) -> Vec<PaintTarget> {
        self.entries.iter().map(|entry| entry.target).collect()
    }

    /// Copy the given paint targets from a layer
    ///
    /// Uninitialized buffers are skipped; copying only uninitialized buffers
    /// fails, leaving the clipboard unchanged.
    pub fn copy(
        &mut self,
        store: &LayerStore,
        layer: LayerId,
        targets: &[PaintTarget],
    ) -> Result<()> {
        let mut entries = Vec::new();
        for &target in targets {
            let values = store.influence_weights(layer, target)?;
            if values.is_empty() {
                continue;
            }
            entries.push(ClipboardEntry {
                target,
                values: values.to_vec(),
            });
        }
        if entries.is_empty() {
            return Err(Error::invalid_parameter(
                "none of the requested paint targets hold weights",
            ));
        }
        self.vertex_count = store.vertex_count();
        self.entries = entries;
        Ok(())
    }

    /// Copy the given paint targets from a layer, then reset them on the layer
    pub fn cut(
        &mut self,
        store: &mut LayerStore,
        layer: LayerId,
        targets: &[PaintTarget],
    ) -> Result<()> {
        self.copy(store, layer, targets)?;
        store.batch_update(|store| {
            for entry in &self.entries {
                store.set_influence_weights(layer, entry.target, &[])?;
            }
            Ok(())
        })
    }

    /// Paste the held weights onto a layer
    ///
    /// The target store's vertex count must match the one the weights were
    /// copied from. For `Add` and `Subtract`, uninitialized destination
    /// buffers combine as zeros.
    pub fn paste(
        &self,
        store: &mut LayerStore,
        layer: LayerId,
        operation: PasteOperation,
    ) -> Result<()> {
        if self.entries.is_empty() {
            return Err(Error::invalid_parameter("clipboard is empty"));
        }
        if store.vertex_count() != self.vertex_count {
            return Err(Error::dimension_mismatch(
                store.vertex_count(),
                self.vertex_count,
            ));
        }
        // Validate every target up front so the paste applies as a whole
        for entry in &self.entries {
            if let PaintTarget::Influence(slot) = entry.target {
                if slot >= store.mesh().influence_count() {
                    return Err(Error::invalid_influence(slot));
                }
            }
        }

        store.batch_update(|store| {
            for entry in &self.entries {
                let combined: Vec<f32> = match operation {
                    PasteOperation::Replace => entry.values.clone(),
                    PasteOperation::Add | PasteOperation::Subtract => {
                        let existing = store.influence_weights(layer, entry.target)?;
                        entry
                            .values
                            .iter()
                            .enumerate()
                            .map(|(vertex, value)| {
                                let base = existing.get(vertex).copied().unwrap_or(0.0);
                                match operation {
                                    PasteOperation::Add => base + value,
                                    _ => base - value,
                                }
                            })
                            .collect()
                    }
                };
                store.set_influence_weights(layer, entry.target, &combined)?;
            }
            Ok(())
        })
    }
}
