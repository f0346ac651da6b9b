//! Mesh context describing the geometry a layer store edits
//!
//! A context identifies the target mesh: its vertex count, optionally its
//! vertex positions and triangles (required for mirroring), the influence
//! table of the skin deformer, and a one-time capture of the deformer's
//! current weights taken when the context is built. A context may also be a
//! detached, in-memory reference mesh with no scene mesh behind it.

use crate::{
    error::{Error, Result},
    types::Vector3D,
};

/// A single influence (joint) of the skin deformer
///
/// `logical_index` is the index the host deformer knows the influence by;
/// the influence's position in the context table is what weight operations
/// address.
#[derive(Debug, Clone, PartialEq)]
pub struct Influence {
    /// Logical index of the influence on the host side
    pub logical_index: usize,
    /// Full path of the influence object, e.g. `|root|spine|arm_L`
    pub path: String,
    /// World-space pivot of the influence, used for geometric mirror pairing
    pub pivot: Vector3D,
}

impl Influence {
    /// Create a new influence entry
    pub fn new<S: Into<String>>(logical_index: usize, path: S, pivot: Vector3D) -> Self {
        Self {
            logical_index,
            path: path.into(),
            pivot,
        }
    }

    /// Last path component, e.g. `arm_L` for `|root|spine|arm_L`
    pub fn short_name(&self) -> &str {
        self.path.rsplit('|').next().unwrap_or(self.path.as_str())
    }
}

/// Identifies the mesh a layer store operates on
///
/// Exactly one context backs each store instance. All per-vertex data held by
/// the store is validated against this context's vertex count.
#[derive(Debug, Clone, Default)]
pub struct MeshContext {
    vertex_count: usize,
    positions: Vec<Vector3D>,
    triangles: Vec<[u32; 3]>,
    influences: Vec<Influence>,
    initial_weights: Vec<Vec<f32>>,
}

impl MeshContext {
    /// Create a minimal context with only a vertex count
    pub fn new(vertex_count: usize) -> Self {
        Self {
            vertex_count,
            ..Default::default()
        }
    }

    /// Attach vertex positions; the length must match the vertex count
    pub fn with_positions(mut self, positions: Vec<Vector3D>) -> Result<Self> {
        if positions.len() != self.vertex_count {
            return Err(Error::dimension_mismatch(self.vertex_count, positions.len()));
        }
        self.positions = positions;
        Ok(self)
    }

    /// Attach triangles; every vertex index must be in range
    pub fn with_triangles(mut self, triangles: Vec<[u32; 3]>) -> Result<Self> {
        for triangle in &triangles {
            for &index in triangle {
                if index as usize >= self.vertex_count {
                    return Err(Error::invalid_parameter(format!(
                        "triangle references vertex {} but mesh has {} vertices",
                        index, self.vertex_count
                    )));
                }
            }
        }
        self.triangles = triangles;
        Ok(self)
    }

    /// Attach the influence table of the skin deformer
    pub fn with_influences(mut self, influences: Vec<Influence>) -> Self {
        self.influences = influences;
        self
    }

    /// Capture the deformer's current weights, one buffer per influence slot
    ///
    /// These are the weights a non-force-empty layer is populated from at
    /// creation time. Each buffer must be empty or match the vertex count.
    pub fn with_skin_weights(mut self, weights: Vec<Vec<f32>>) -> Result<Self> {
        for buffer in &weights {
            if !buffer.is_empty() && buffer.len() != self.vertex_count {
                return Err(Error::dimension_mismatch(self.vertex_count, buffer.len()));
            }
        }
        self.initial_weights = weights;
        Ok(self)
    }

    /// Build a detached in-memory reference mesh from flat arrays
    ///
    /// `vertices` lists x y z for the first vertex, then the second, and so
    /// on; `triangles` lists three vertex ids per triangle.
    pub fn reference_from_arrays(vertices: &[f32], triangles: &[u32]) -> Result<Self> {
        if vertices.len() % 3 != 0 {
            return Err(Error::invalid_parameter(format!(
                "vertex array length {} is not a multiple of 3",
                vertices.len()
            )));
        }
        if triangles.len() % 3 != 0 {
            return Err(Error::invalid_parameter(format!(
                "triangle array length {} is not a multiple of 3",
                triangles.len()
            )));
        }

        let positions: Vec<Vector3D> = vertices
            .chunks_exact(3)
            .map(|c| Vector3D::new(c[0], c[1], c[2]))
            .collect();
        let triangles: Vec<[u32; 3]> = triangles
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();

        Self::new(positions.len())
            .with_positions(positions)?
            .with_triangles(triangles)
    }

    /// Number of vertices in the mesh
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Whether vertex positions are available
    pub fn has_positions(&self) -> bool {
        !self.positions.is_empty()
    }

    /// Vertex positions; empty when unavailable
    pub fn positions(&self) -> &[Vector3D] {
        &self.positions
    }

    /// Position of a single vertex
    pub fn position(&self, vertex: usize) -> Option<Vector3D> {
        self.positions.get(vertex).copied()
    }

    /// Triangles; empty when unavailable
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// The influence table
    pub fn influences(&self) -> &[Influence] {
        &self.influences
    }

    /// Number of influence slots
    pub fn influence_count(&self) -> usize {
        self.influences.len()
    }

    /// Captured skin weights for an influence slot; empty when not captured
    pub fn initial_weights(&self, slot: usize) -> &[f32] {
        self.initial_weights
            .get(slot)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Vertex positions as a flat float array (x y z per vertex)
    pub fn vertex_array(&self) -> Vec<f32> {
        self.positions
            .iter()
            .flat_map(|p| [p.x, p.y, p.z])
            .collect()
    }

    /// Triangles as a flat index array (three vertex ids per triangle)
    pub fn triangle_array(&self) -> Vec<u32> {
        self.triangles.iter().flatten().copied().collect()
    }
}
