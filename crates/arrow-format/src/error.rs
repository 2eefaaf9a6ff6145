//! Error types produced while building flat-table metadata.

use thiserror::Error;

/// Failures that can occur while assembling the Arrow IPC flat-table
/// metadata (vtables, messages, footer). Decoding the resulting bytes back
/// is `pg2arrow-reader`'s concern, with its own `ReaderError`.
#[derive(Debug, Error)]
pub enum FlatBufferError {
    /// A field index passed to a builder method exceeds the table's declared
    /// attribute count.
    #[error("field index {index} out of range (table has {nattrs} attributes)")]
    FieldOutOfRange {
        /// The offending field index.
        index: usize,
        /// The table's declared attribute count.
        nattrs: usize,
    },
}
