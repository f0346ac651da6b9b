//! Common types and type aliases used throughout the layer store
//!
//! This module re-exports glam types for mathematical operations and defines
//! the small identifier and selector types shared by every other module.
//!
//! # Why glam?
//!
//! We use glam as our primary math library because:
//! - **Performance**: SIMD-optimized operations for vectors and matrices
//! - **Ecosystem**: Widely adopted in the Rust gamedev community (Bevy, wgpu, etc.)
//! - **API**: Clean, modern API with comprehensive mathematical operations

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export glam types as our primary math types
pub use glam::{Vec2 as Vector2D, Vec3 as Vector3D};

/// Stable identifier of a layer within a store
///
/// Ids are assigned on layer creation, are never reused during the lifetime
/// of a store, and survive reordering and re-parenting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub u32);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Selects which weight buffer within a layer an operation addresses
///
/// A layer carries one buffer per influence, a mask buffer modulating the
/// layer's contribution strength, and a dual-quaternion blend buffer consumed
/// by the deformer as a separate blend-mode channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaintTarget {
    /// Weights of a single influence, addressed by its slot in the
    /// mesh context's influence table
    Influence(usize),
    /// The layer mask
    Mask,
    /// The dual-quaternion blend channel
    DualQuaternion,
}

impl fmt::Display for PaintTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaintTarget::Influence(index) => write!(f, "{}", index),
            PaintTarget::Mask => write!(f, "mask"),
            PaintTarget::DualQuaternion => write!(f, "dq"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_id_display() {
        assert_eq!(LayerId(7).to_string(), "7");
    }

    #[test]
    fn test_paint_target_display() {
        assert_eq!(PaintTarget::Influence(3).to_string(), "3");
        assert_eq!(PaintTarget::Mask.to_string(), "mask");
        assert_eq!(PaintTarget::DualQuaternion.to_string(), "dq");
    }
}
