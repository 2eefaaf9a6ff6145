//! Errors raised while opening or decoding a file this crate wrote.

use thiserror::Error;

/// Failure modes when opening or walking an on-disk file.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// The leading or trailing 6-byte signature did not read `ARROW1`.
    #[error("bad magic signature")]
    BadMagic,

    /// The file's `Message`/`Footer` metadata version is not one this crate
    /// understands.
    #[error("unsupported metadata version {0}")]
    UnsupportedVersion(i16),

    /// A metadata table or body region ran past the end of the mapped file.
    #[error("truncated file: expected at least {expected} bytes, found {found}")]
    Truncated {
        /// Minimum byte length the read required.
        expected: usize,
        /// Bytes actually available.
        found: usize,
    },

    /// A vtable field index was out of range for the table being decoded —
    /// only possible if the file was written by an incompatible version.
    #[error("field {index} out of range for a table with {nattrs} declared fields")]
    FieldOutOfRange {
        /// The field index the decoder tried to read.
        index: usize,
        /// The table's declared field count.
        nattrs: usize,
    },

    /// A table field required for this message to make sense (the
    /// footer's schema, a message's nested header table) was in range but
    /// absent from the vtable — the file is well-formed flatbuffer-wise
    /// but missing data this format requires.
    #[error("required field {field} is absent from {table}")]
    MissingRequiredField {
        /// The table kind being decoded (e.g. `"Footer"`, `"Message"`).
        table: &'static str,
        /// The field index that was absent.
        field: usize,
    },

    /// A string field's bytes were not valid UTF-8.
    #[error("invalid UTF-8 in string field: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// The file is well-formed but uses a `DataType`/`Type` union tag this
    /// crate does not recognize.
    #[error("unknown type tag {0}")]
    UnknownTypeTag(u8),

    /// I/O error opening or mapping the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
