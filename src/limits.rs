//! Work caps applied to every harness run

use crate::error::{Error, Result};

/// Inputs shorter than this are not worth parsing
pub const MIN_INPUT_LEN: usize = 4;

/// Inputs longer than this are rejected to keep fuzzing throughput up
pub const MAX_INPUT_LEN: usize = 1024 * 1024;

/// Largest view handed out by a single stream read
pub const MAX_CHUNK: usize = 64 * 1024;

/// Maximum number of archive entries inspected per run
pub const MAX_UNITS: usize = 100;

/// Maximum payload bytes pulled from a single entry
pub const MAX_BYTES_PER_UNIT: usize = 8 * 1024;

/// Maximum attributes inspected per element
pub const MAX_ATTRIBUTES: usize = 100;

/// Maximum extra fields inspected per archive entry
pub const MAX_EXTRA_FIELDS: usize = 10;

/// Caps bounding the work of one harness invocation
///
/// The defaults match the reference caps used by the fuzz targets. Tests and
/// the replay tool can tighten or loosen individual caps through the
/// builder methods.
///
/// # Example
///
/// ```
/// use fuzzbound::Limits;
///
/// let limits = Limits::new().with_max_units(10).with_max_chunk(512);
/// assert_eq!(limits.max_units(), 10);
/// assert!(limits.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    min_input_len: usize,
    max_input_len: usize,
    max_chunk: usize,
    max_units: usize,
    max_bytes_per_unit: usize,
    max_attributes: usize,
    max_extra_fields: usize,
    max_nodes: Option<usize>,
}

impl Limits {
    /// Create limits with the reference caps
    pub fn new() -> Self {
        Self {
            min_input_len: MIN_INPUT_LEN,
            max_input_len: MAX_INPUT_LEN,
            max_chunk: MAX_CHUNK,
            max_units: MAX_UNITS,
            max_bytes_per_unit: MAX_BYTES_PER_UNIT,
            max_attributes: MAX_ATTRIBUTES,
            max_extra_fields: MAX_EXTRA_FIELDS,
            max_nodes: None,
        }
    }

    /// Set the minimum accepted input length
    pub fn with_min_input_len(mut self, len: usize) -> Self {
        self.min_input_len = len;
        self
    }

    /// Set the maximum accepted input length
    pub fn with_max_input_len(mut self, len: usize) -> Self {
        self.max_input_len = len;
        self
    }

    /// Set the largest chunk a single stream read may return
    pub fn with_max_chunk(mut self, len: usize) -> Self {
        self.max_chunk = len;
        self
    }

    /// Set the maximum number of archive entries visited
    pub fn with_max_units(mut self, count: usize) -> Self {
        self.max_units = count;
        self
    }

    /// Set the payload byte budget per entry
    pub fn with_max_bytes_per_unit(mut self, bytes: usize) -> Self {
        self.max_bytes_per_unit = bytes;
        self
    }

    /// Set the maximum attributes inspected per element
    pub fn with_max_attributes(mut self, count: usize) -> Self {
        self.max_attributes = count;
        self
    }

    /// Set the maximum extra fields inspected per entry
    pub fn with_max_extra_fields(mut self, count: usize) -> Self {
        self.max_extra_fields = count;
        self
    }

    /// Cap the number of markup nodes visited (unbounded by default)
    pub fn with_max_nodes(mut self, count: Option<usize>) -> Self {
        self.max_nodes = count;
        self
    }

    /// Minimum accepted input length
    pub fn min_input_len(&self) -> usize {
        self.min_input_len
    }

    /// Maximum accepted input length
    pub fn max_input_len(&self) -> usize {
        self.max_input_len
    }

    /// Largest chunk a single stream read may return
    pub fn max_chunk(&self) -> usize {
        self.max_chunk
    }

    /// Maximum number of archive entries visited
    pub fn max_units(&self) -> usize {
        self.max_units
    }

    /// Payload byte budget per entry
    pub fn max_bytes_per_unit(&self) -> usize {
        self.max_bytes_per_unit
    }

    /// Maximum attributes inspected per element
    pub fn max_attributes(&self) -> usize {
        self.max_attributes
    }

    /// Maximum extra fields inspected per entry
    pub fn max_extra_fields(&self) -> usize {
        self.max_extra_fields
    }

    /// Optional cap on markup nodes
    pub fn max_nodes(&self) -> Option<usize> {
        self.max_nodes
    }

    /// Check that the limits describe a usable configuration
    ///
    /// A zero chunk size would make every stream read look like end of input,
    /// and an empty size window can never accept anything.
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk == 0 {
            return Err(Error::setup("max_chunk must be greater than zero"));
        }
        if self.min_input_len > self.max_input_len {
            return Err(Error::setup(format!(
                "min_input_len ({}) exceeds max_input_len ({})",
                self.min_input_len, self.max_input_len
            )));
        }
        Ok(())
    }

    /// Apply the size gate to an input
    pub fn check_input(&self, data: &[u8]) -> Result<()> {
        let len = data.len();
        if len < self.min_input_len {
            return Err(Error::InputTooShort {
                len,
                min: self.min_input_len,
            });
        }
        if len > self.max_input_len {
            return Err(Error::InputTooLarge {
                len,
                max: self.max_input_len,
            });
        }
        Ok(())
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_caps() {
        let limits = Limits::default();
        assert_eq!(limits.min_input_len(), 4);
        assert_eq!(limits.max_input_len(), 1_048_576);
        assert_eq!(limits.max_chunk(), 65_536);
        assert_eq!(limits.max_units(), 100);
        assert_eq!(limits.max_bytes_per_unit(), 8192);
        assert_eq!(limits.max_attributes(), 100);
        assert_eq!(limits.max_extra_fields(), 10);
        assert_eq!(limits.max_nodes(), None);
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn test_size_gate_boundaries() {
        let limits = Limits::new();
        assert!(limits.check_input(&[]).unwrap_err().is_rejection());
        assert!(limits.check_input(&[0; 3]).is_err());
        assert!(limits.check_input(&[0; 4]).is_ok());
        assert!(limits.check_input(&vec![0; MAX_INPUT_LEN]).is_ok());

        let err = limits.check_input(&vec![0; MAX_INPUT_LEN + 1]).unwrap_err();
        assert!(matches!(err, Error::InputTooLarge { len, .. } if len == MAX_INPUT_LEN + 1));
    }

    #[test]
    fn test_validate_rejects_zero_chunk() {
        let err = Limits::new().with_max_chunk(0).validate().unwrap_err();
        assert_eq!(err.code(), "E4001");
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let limits = Limits::new().with_min_input_len(10).with_max_input_len(5);
        assert!(limits.validate().is_err());
    }
}
