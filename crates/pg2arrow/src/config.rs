//! Writer configuration.

use std::path::PathBuf;

/// Default soft upper bound on a record batch's in-memory size before it
/// is flushed: 1 GiB.
pub const DEFAULT_SEGMENT_SIZE_BYTES: usize = 1024 * 1024 * 1024;

/// Default initial capacity for each column region's growable buffer,
/// matching [`arrow_format::buffer::INITIAL_CAPACITY`].
pub const DEFAULT_INITIAL_BUFFER_CAPACITY: usize = 2 * 1024 * 1024;

/// Configuration for an [`crate::writer::ArrowFileWriter`].
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Soft upper bound on a record batch's estimated in-memory size
    /// before it is flushed to disk (default 1 GiB).
    pub segment_size_bytes: usize,
    /// Initial capacity handed to each column region's growable buffer
    /// (default 2 MiB).
    pub initial_buffer_capacity: usize,
    /// Destination file path.
    pub output_path: PathBuf,
    /// Reserved hook for dictionary-batch emission (Non-goal: dictionary
    /// compression is not implemented). Leaving this `false` is a no-op;
    /// setting it `true` with a dictionary-encoded field fails at write
    /// time, since there is no encoder for that case.
    pub emit_dictionary_batches: bool,
}

impl EncoderConfig {
    /// Create a configuration for the given output path with every other
    /// field at its documented default.
    #[must_use]
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            segment_size_bytes: DEFAULT_SEGMENT_SIZE_BYTES,
            initial_buffer_capacity: DEFAULT_INITIAL_BUFFER_CAPACITY,
            output_path: output_path.into(),
            emit_dictionary_batches: false,
        }
    }

    /// Set the soft upper bound on a batch's estimated in-memory size.
    #[must_use]
    pub fn segment_size_bytes(mut self, bytes: usize) -> Self {
        self.segment_size_bytes = bytes;
        self
    }

    /// Set each column buffer's initial capacity.
    #[must_use]
    pub fn initial_buffer_capacity(mut self, bytes: usize) -> Self {
        self.initial_buffer_capacity = bytes;
        self
    }

    /// Opt into emitting dictionary batches for dictionary-encoded fields.
    #[must_use]
    pub fn emit_dictionary_batches(mut self, emit: bool) -> Self {
        self.emit_dictionary_batches = emit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = EncoderConfig::new("out.arrow");
        assert_eq!(config.segment_size_bytes, DEFAULT_SEGMENT_SIZE_BYTES);
        assert_eq!(config.initial_buffer_capacity, DEFAULT_INITIAL_BUFFER_CAPACITY);
        assert!(!config.emit_dictionary_batches);
    }

    #[test]
    fn builder_overrides_segment_size() {
        let config = EncoderConfig::new("out.arrow").segment_size_bytes(4096);
        assert_eq!(config.segment_size_bytes, 4096);
    }
}
