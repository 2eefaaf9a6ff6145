//! Errors produced while ingesting row values into column buffers.

use thiserror::Error;

/// Failures encountered while feeding a decoded wire value into a column's
/// `put_value` handler.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A `numeric` value's sign field marked it `NaN`, which has no
    /// representation as a fixed-precision 128-bit decimal.
    #[error("NaN unrepresentable in fixed-precision decimal")]
    DecimalNaN,

    /// A `numeric` value contained a base-10000 digit outside `0..NBASE`.
    #[error("numeric digit out of range: {digit}")]
    DecimalDigitOutOfRange {
        /// The offending digit.
        digit: i32,
    },

    /// The wire payload for a `numeric` value was too short to contain its
    /// declared header.
    #[error("truncated numeric payload: expected at least {expected} bytes, found {found}")]
    TruncatedNumeric {
        /// Minimum bytes required for the numeric header.
        expected: usize,
        /// Bytes actually available.
        found: usize,
    },

    /// A composite row's embedded length/type-id framing did not match its
    /// outer payload, or a subfield's wire type id disagreed with the
    /// resolved schema.
    #[error("binary composite record corruption")]
    CompositeCorruption,

    /// A fixed-width value arrived with a size other than its type's
    /// declared width.
    #[error("unexpected value size: expected {expected}, found {found}")]
    UnexpectedValueSize {
        /// The type's declared width.
        expected: usize,
        /// The size actually delivered.
        found: usize,
    },

    /// Array (list) column values are a reserved, unimplemented code path.
    #[error("list columns are not implemented")]
    ListNotImplemented,

    /// A column's resolved type has no emit-path support (`Null`, `Union`,
    /// dictionary-backed columns outside the structural hook).
    #[error("column type {0:?} cannot be ingested")]
    UnsupportedColumnType(arrow_format::DataType),

    /// Underlying buffer growth failure (mmap/I/O).
    #[error("buffer I/O error: {0}")]
    Io(#[from] std::io::Error),
}
