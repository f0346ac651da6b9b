//! Per-vertex weight buffer storage
//!
//! A weight buffer is an ordered sequence of floats, one per mesh vertex.
//! An empty buffer means "uninitialized", which is distinct from all-zero:
//! an uninitialized mask contributes full strength, an uninitialized
//! dual-quaternion channel contributes nothing.

/// A per-vertex float buffer with values clamped to `[0.0, 1.0]` on write
///
/// Writes replace the buffer wholesale; there is no incremental update path,
/// so a buffer is never observable in a partially written state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightBuffer {
    values: Vec<f32>,
}

impl WeightBuffer {
    /// Create a new uninitialized buffer
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Create a buffer of `len` zeros
    pub fn zeros(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
        }
    }

    /// Create a buffer from values, clamping each into `[0.0, 1.0]`
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f32>,
    {
        Self {
            values: values.into_iter().map(|v| v.clamp(0.0, 1.0)).collect(),
        }
    }

    /// Whether the buffer holds data
    pub fn is_initialized(&self) -> bool {
        !self.values.is_empty()
    }

    /// Number of stored values (0 when uninitialized)
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the buffer is uninitialized
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow the stored values; empty slice when uninitialized
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Replace the buffer contents, clamping each value into `[0.0, 1.0]`
    ///
    /// Setting an empty slice resets the buffer to uninitialized.
    pub fn set(&mut self, values: &[f32]) {
        self.values.clear();
        self.values
            .extend(values.iter().map(|v| v.clamp(0.0, 1.0)));
    }

    /// Reset the buffer to uninitialized
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Value at `vertex`, or 0.0 when uninitialized or out of range
    pub fn value(&self, vertex: usize) -> f32 {
        self.values.get(vertex).copied().unwrap_or(0.0)
    }

    /// Value at `vertex`, or `default` when the buffer is uninitialized
    ///
    /// Used for mask sampling, where an uninitialized mask means full strength.
    pub fn sample_or(&self, vertex: usize, default: f32) -> f32 {
        if self.values.is_empty() {
            default
        } else {
            self.value(vertex)
        }
    }

    /// Sum of all stored values
    pub fn total(&self) -> f32 {
        self.values.iter().sum()
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    pub(crate) fn replace_raw(&mut self, values: Vec<f32>) {
        self.values = values;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_clamps_values() {
        let mut buffer = WeightBuffer::new();
        buffer.set(&[-0.5, 0.25, 1.5]);
        assert_eq!(buffer.values(), &[0.0, 0.25, 1.0]);
    }

    #[test]
    fn test_empty_set_resets_to_uninitialized() {
        let mut buffer = WeightBuffer::from_values([0.5, 0.5]);
        assert!(buffer.is_initialized());
        buffer.set(&[]);
        assert!(!buffer.is_initialized());
        assert!(buffer.values().is_empty());
    }

    #[test]
    fn test_sample_or_defaults_when_uninitialized() {
        let buffer = WeightBuffer::new();
        assert_eq!(buffer.sample_or(3, 1.0), 1.0);

        let buffer = WeightBuffer::from_values([0.25, 0.75]);
        assert_eq!(buffer.sample_or(1, 1.0), 0.75);
        // Initialized buffers do not fall back for out-of-range vertices
        assert_eq!(buffer.sample_or(5, 1.0), 0.0);
    }

    #[test]
    fn test_total() {
        let buffer = WeightBuffer::from_values([0.25, 0.5, 0.25]);
        assert_eq!(buffer.total(), 1.0);
    }
}
