//! The top-level error type aggregating every layer below this crate.

use thiserror::Error;

/// Fatal errors that can abort an encode or a read-back.
#[derive(Debug, Error)]
pub enum WriterError {
    /// A source catalog column could not be mapped to a columnar type.
    #[error(transparent)]
    Resolve(#[from] arrow_types::ResolveError),

    /// A row value could not be ingested into its column.
    #[error(transparent)]
    Ingest(#[from] pg_row_ingest::IngestError),

    /// A vtable/flat-table invariant was violated while building metadata,
    /// or the reader encountered a corrupt or unsupported block.
    #[error(transparent)]
    FlatBuffer(#[from] arrow_format::FlatBufferError),

    /// A column's resolved type has no supported record-batch encoding
    /// (`Null`, `Union`, `List`, unresolved dictionary encoding).
    #[error("column type {0:?} has no record-batch encoding")]
    UnsupportedColumnType(arrow_format::DataType),

    /// Short write, a non-`EINTR` write failure, or any other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
