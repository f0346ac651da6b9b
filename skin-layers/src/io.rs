//! Import and export of layer data as JSON documents
//!
//! A layers document carries the influence table (path and pivot per
//! influence) and every layer's metadata and buffers. Documents are written
//! as plain JSON or gzip-compressed JSON. Importing resolves influences
//! against a scene description by path; influences missing from the scene
//! degrade per item with a warning, and the operation only fails when
//! nothing matched at all.

use crate::{
    error::{Error, Result},
    store::LayerStore,
    types::{LayerId, PaintTarget},
};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// On-disk encoding of a layers document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Plain JSON
    Json,
    /// Gzip-compressed JSON
    CompressedJson,
}

impl FileFormat {
    /// Guess the format from a file name; `.gz` means compressed JSON
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let is_gz = path
            .as_ref()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
        if is_gz {
            FileFormat::CompressedJson
        } else {
            FileFormat::Json
        }
    }

    /// Conventional file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Json => "json",
            FileFormat::CompressedJson => "json.gz",
        }
    }
}

/// One influence of the exporting skin deformer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceRecord {
    /// Logical influence index on the exporting side
    pub index: usize,
    /// Full path of the influence object
    pub path: String,
    /// World-space pivot of the influence
    #[serde(default)]
    pub pivot: [f32; 3],
}

/// Weights of one influence within a layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightsRecord {
    /// Logical index of the influence these weights belong to
    pub influence: usize,
    /// Per-vertex weights
    pub weights: Vec<f32>,
}

/// One layer's metadata and buffers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
    /// Layer id in the exporting store
    pub id: u32,
    /// Layer name
    pub name: String,
    /// Opacity in `[0.0, 1.0]`
    pub opacity: f32,
    /// Whether the layer participates in compositing
    pub enabled: bool,
    /// Parent layer id in the exporting store
    pub parent: Option<u32>,
    /// Position among siblings
    pub index: usize,
    /// Mask weights; empty when uninitialized
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mask: Vec<f32>,
    /// Dual-quaternion blend weights; empty when uninitialized
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dq: Vec<f32>,
    /// Per-influence weights
    #[serde(default)]
    pub weights: Vec<WeightsRecord>,
}

/// A complete exported layer setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayersDocument {
    /// Vertex count of the exporting mesh
    pub vertex_count: usize,
    /// Influence table of the exporting skin deformer
    pub influences: Vec<InfluenceRecord>,
    /// Layers in document order
    pub layers: Vec<LayerRecord>,
}

/// Export a store's layers into a document
pub fn export_layers(store: &LayerStore) -> Result<LayersDocument> {
    let influences: Vec<InfluenceRecord> = store
        .mesh()
        .influences()
        .iter()
        .map(|influence| InfluenceRecord {
            index: influence.logical_index,
            path: influence.path.clone(),
            pivot: influence.pivot.to_array(),
        })
        .collect();

    let mut layers = Vec::new();
    for info in store.list_layers()? {
        let mut weights = Vec::new();
        for (slot, influence) in store.mesh().influences().iter().enumerate() {
            let values = store.influence_weights(info.id, PaintTarget::Influence(slot))?;
            if values.is_empty() {
                continue;
            }
            weights.push(WeightsRecord {
                influence: influence.logical_index,
                weights: values.to_vec(),
            });
        }
        layers.push(LayerRecord {
            id: info.id.0,
            name: info.name,
            opacity: info.opacity,
            enabled: info.enabled,
            parent: info.parent.map(|id| id.0),
            index: info.index,
            mask: store.layer_mask(info.id)?.to_vec(),
            dq: store.dual_quaternion_weights(info.id)?.to_vec(),
            weights,
        });
    }

    Ok(LayersDocument {
        vertex_count: store.vertex_count(),
        influences,
        layers,
    })
}

/// Write a document to a stream in the given format
pub fn write_document<W: Write>(
    document: &LayersDocument,
    writer: W,
    format: FileFormat,
) -> Result<()> {
    match format {
        FileFormat::Json => serde_json::to_writer(writer, document)?,
        FileFormat::CompressedJson => {
            let mut encoder = GzEncoder::new(writer, Compression::default());
            serde_json::to_writer(&mut encoder, document)?;
            encoder.finish()?;
        }
    }
    Ok(())
}

/// Read a document from a stream in the given format
pub fn read_document<R: Read>(reader: R, format: FileFormat) -> Result<LayersDocument> {
    let document = match format {
        FileFormat::Json => serde_json::from_reader(reader)?,
        FileFormat::CompressedJson => serde_json::from_reader(GzDecoder::new(reader))?,
    };
    Ok(document)
}

/// Write a document to a file, picking the format from the file name
pub fn write_document_to_path<P: AsRef<Path>>(
    document: &LayersDocument,
    path: P,
) -> Result<()> {
    let format = FileFormat::from_path(&path);
    let file = File::create(path)?;
    write_document(document, BufWriter::new(file), format)
}

/// Read a document from a file, picking the format from the file name
pub fn read_document_from_path<P: AsRef<Path>>(path: P) -> Result<LayersDocument> {
    let format = FileFormat::from_path(&path);
    let file = File::open(path)?;
    read_document(BufReader::new(file), format)
}

/// The set of object paths present in the host scene
///
/// Used to resolve imported influences before any skin binding happens; the
/// store itself never queries the scene.
#[derive(Debug, Clone, Default)]
pub struct SceneDescription {
    objects: HashSet<String>,
}

impl SceneDescription {
    /// Build a scene description from object paths
    pub fn from_objects<I, S>(objects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            objects: objects.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether an object path exists in the scene
    pub fn contains(&self, path: &str) -> bool {
        self.objects.contains(path)
    }
}

/// Resolve a document's influence paths against the scene
///
/// Influences missing from the scene are skipped with a warning. Fails with
/// [`Error::NoMatchingInfluences`] only when nothing matched, so a partially
/// matching document still imports.
pub fn resolve_influence_paths(
    document: &LayersDocument,
    scene: &SceneDescription,
) -> Result<Vec<String>> {
    let mut matched = Vec::new();
    for influence in &document.influences {
        if scene.contains(&influence.path) {
            matched.push(influence.path.clone());
        } else {
            let short_name = influence
                .path
                .rsplit('|')
                .next()
                .unwrap_or(influence.path.as_str());
            log::warn!("{} doesn't exist in the scene", short_name);
        }
    }
    if matched.is_empty() {
        return Err(Error::NoMatchingInfluences);
    }
    Ok(matched)
}

/// Rebuilds a document's layer forest on a target store
///
/// Source influences are routed onto the target's influence table by path,
/// so a permuted influence order transfers correctly. Unmatched source
/// influences are skipped per item with a warning.
#[derive(Debug, Clone)]
pub struct LayersTransfer {
    source: LayersDocument,
}

impl LayersTransfer {
    /// Create a transfer from an already-loaded document
    pub fn new(source: LayersDocument) -> Self {
        Self { source }
    }

    /// Load the source document from a file
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(read_document_from_path(path)?))
    }

    /// The source document
    pub fn source(&self) -> &LayersDocument {
        &self.source
    }

    /// Map source logical influence indices onto target influence slots
    fn influence_slot_mapping(&self, store: &LayerStore) -> Result<HashMap<usize, usize>> {
        let target_paths = store.influence_paths();
        let mut mapping = HashMap::new();
        for influence in &self.source.influences {
            let slot = target_paths.iter().position(|path| {
                path == &influence.path
                    || path.rsplit('|').next() == influence.path.rsplit('|').next()
            });
            match slot {
                Some(slot) => {
                    mapping.insert(influence.index, slot);
                }
                None => {
                    log::warn!(
                        "influence {} has no counterpart on the target mesh",
                        influence.path
                    );
                }
            }
        }
        if mapping.is_empty() {
            return Err(Error::NoMatchingInfluences);
        }
        Ok(mapping)
    }

    /// Rebuild the source layers on the target store
    ///
    /// The target must be initialized and have the same vertex count as the
    /// source document. Layers are created in document order inside a single
    /// batch scope, so recomposition runs once at the end.
    pub fn execute(&self, store: &mut LayerStore) -> Result<()> {
        if store.vertex_count() != self.source.vertex_count {
            return Err(Error::dimension_mismatch(
                store.vertex_count(),
                self.source.vertex_count,
            ));
        }
        // Validate every buffer length up front so a malformed document
        // cannot leave a half-built layer forest behind
        let vertex_count = self.source.vertex_count;
        for record in &self.source.layers {
            for buffer in [&record.mask, &record.dq]
                .into_iter()
                .chain(record.weights.iter().map(|w| &w.weights))
            {
                if !buffer.is_empty() && buffer.len() != vertex_count {
                    return Err(Error::dimension_mismatch(vertex_count, buffer.len()));
                }
            }
        }
        let mapping = self.influence_slot_mapping(store)?;

        store.batch_update(|store| {
            let mut id_map: HashMap<u32, LayerId> = HashMap::new();
            for record in &self.source.layers {
                let id = store.create_layer(&record.name, true)?;
                id_map.insert(record.id, id);
                store.set_layer_opacity(id, record.opacity)?;
                store.set_layer_enabled(id, record.enabled)?;
                if !record.mask.is_empty() {
                    store.set_layer_mask(id, &record.mask)?;
                }
                if !record.dq.is_empty() {
                    store.set_dual_quaternion_weights(id, &record.dq)?;
                }
                for weights in &record.weights {
                    let Some(&slot) = mapping.get(&weights.influence) else {
                        continue;
                    };
                    store.set_influence_weights(
                        id,
                        PaintTarget::Influence(slot),
                        &weights.weights,
                    )?;
                }
            }
            // Parents resolve in a second pass; a record may reference a
            // parent defined later in the document
            for record in &self.source.layers {
                let Some(parent) = record.parent else {
                    continue;
                };
                let (Some(&child_id), Some(&parent_id)) =
                    (id_map.get(&record.id), id_map.get(&parent))
                else {
                    log::warn!("layer {} references unknown parent {}", record.id, parent);
                    continue;
                };
                store.set_layer_parent(child_id, Some(parent_id))?;
            }
            Ok(())
        })
    }
}
