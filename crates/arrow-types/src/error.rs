//! Errors produced while resolving a source catalog type to a columnar type.

use thiserror::Error;

/// Failures encountered while mapping a [`crate::catalog::ColumnCatalog`]
/// entry onto a columnar [`arrow_format::DataType`].
///
/// Array (`elemtype` present) and composite (`composite_rel_id` present)
/// columns always resolve successfully to `List`/`Struct` types — the
/// "not implemented" failure for list columns, and the "binary composite
/// record corruption" failure for malformed composite payloads, surface at
/// ingest time in `pg-row-ingest`, not here (§4.2/§4.3 bind a handler at
/// resolution time but only invoke, and can only fail, it per row).
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No mapping exists for this source type, and its byte length does not
    /// fall back to a recognizable fixed-width integer or `-1` (variable
    /// length).
    #[error("type not supported: {type_name} (namespace {type_namespace}, byte_length {byte_length})")]
    UnsupportedType {
        /// The unresolvable type's name.
        type_name: String,
        /// The type's namespace.
        type_namespace: String,
        /// The catalog's reported byte length.
        byte_length: i16,
    },
}
