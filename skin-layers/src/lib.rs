//! # Skin Layers
//!
//! A layered per-vertex skin weight store for mesh deformation pipelines.
//!
//! Weights are edited in named, orderable layers instead of directly on the
//! deformer: each layer carries per-influence weight buffers, a mask, a
//! dual-quaternion blend channel, an opacity and an enabled flag. Layers
//! form a forest per mesh and flatten into deformer-ready weights through
//! [`LayerStore::composite`].
//!
//! ## Features
//!
//! - **Layer forest**: named, nested, reorderable layers with opacity,
//!   masks and per-layer enable flags
//! - **Non-destructive editing**: merge-down, pruning and weight snapshots
//!   that never change the flattened result unexpectedly
//! - **Mirroring**: seam-plane vertex pairing with geometric influence
//!   matching and explicit overrides
//! - **Batch updates**: nested scopes that defer recomposition to the
//!   outermost edit
//! - **Transfer**: JSON / gzip-JSON export and import, resolved against the
//!   host scene by influence path
//!
//! ## Quick Start
//!
//! ```rust
//! use skin_layers::{Influence, LayerStore, MeshContext, PaintTarget, Vector3D};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mesh = MeshContext::new(3)
//!     .with_influences(vec![Influence::new(0, "|root|joint1", Vector3D::ZERO)]);
//! let mut store = LayerStore::new(mesh);
//! store.init_layers();
//!
//! let base = store.create_layer("Base", true)?;
//! store.set_influence_weights(base, PaintTarget::Influence(0), &[1.0, 0.5, 0.0])?;
//!
//! let composite = store.composite()?;
//! assert_eq!(composite.influence_weights(0), &[1.0, 0.5, 0.0]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The store owns all layer data and validates every per-vertex buffer
//! against its mesh context; the host only ever exchanges whole buffers and
//! flattened composites with it. The API is capability-oriented: one
//! operation per verb, each with typed parameters, rather than a single
//! entry point dispatching on flags.

#![warn(missing_docs)]

// Re-export common types for convenience
pub use crate::{
    buffer::WeightBuffer,
    composite::CompositeWeights,
    error::{Error, Result},
    layer::{Layer, LayerInfo},
    mesh::{Influence, MeshContext},
    store::LayerStore,
    types::*,
};

// Re-export mirroring functionality
pub use crate::mirror::{
    MirrorAxis, MirrorDirection, MirrorFlags, MirrorOptions, MirrorSummary,
    DEFAULT_INFLUENCE_TOLERANCE, DEFAULT_VERTEX_TOLERANCE,
};

// Re-export clipboard functionality
pub use crate::clipboard::{PasteOperation, WeightsClipboard};

// Re-export persistence functionality
pub use crate::io::{
    export_layers, read_document, read_document_from_path, resolve_influence_paths,
    write_document, write_document_to_path, FileFormat, InfluenceRecord, LayerRecord,
    LayersDocument, LayersTransfer, SceneDescription, WeightsRecord,
};

// Core modules
pub mod error;
pub mod store;
pub mod types;

// Component modules
pub mod buffer;
pub mod composite;
pub mod layer;
pub mod mesh;

// Editing operations
pub mod clipboard;
pub mod mirror;

// Persistence
pub mod io;

// Internal machinery
mod batch;
