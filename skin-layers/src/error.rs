//! Error handling for layer store operations

use crate::types::LayerId;
use thiserror::Error;

/// Result type alias for layer store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during layer store operations
#[derive(Error, Debug)]
pub enum Error {
    /// An operation referenced a layer id that does not exist in the store
    #[error("invalid layer id: {id}")]
    InvalidLayerId { id: LayerId },

    /// An operation ran before layer data was initialized for the mesh
    #[error("layer data has not been initialized for this mesh")]
    UninitializedStore,

    /// A weight buffer's length does not match the mesh vertex count
    #[error("weight buffer length mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// An operation referenced an influence slot outside the influence table
    #[error("invalid influence index: {index}")]
    InvalidInfluence { index: usize },

    /// Invalid parameters or configuration
    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// The mesh context lacks data required by the operation
    #[error("mesh data unavailable: {message}")]
    MissingMeshData { message: String },

    /// No influences from an imported document matched the current scene
    #[error("no influences matched the current scene")]
    NoMatchingInfluences,

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or parsing failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a new invalid layer id error
    pub fn invalid_layer(id: LayerId) -> Self {
        Self::InvalidLayerId { id }
    }

    /// Create a new dimension mismatch error
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Create a new invalid influence error
    pub fn invalid_influence(index: usize) -> Self {
        Self::InvalidInfluence { index }
    }

    /// Create a new invalid parameter error
    pub fn invalid_parameter<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create a new missing mesh data error
    pub fn missing_mesh_data<S: Into<String>>(message: S) -> Self {
        Self::MissingMeshData {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = Error::invalid_layer(LayerId(12));
        assert!(matches!(error, Error::InvalidLayerId { .. }));
        assert_eq!(error.to_string(), "invalid layer id: 12");
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let error = Error::dimension_mismatch(100, 3);
        assert_eq!(
            error.to_string(),
            "weight buffer length mismatch: expected 100, got 3"
        );
    }

    #[test]
    fn test_invalid_parameter_message() {
        let error = Error::invalid_parameter("opacity out of range");
        assert_eq!(error.to_string(), "invalid parameter: opacity out of range");
    }
}
