//! # arrow-types
//!
//! Maps a source database's per-column type-catalog descriptor onto the
//! columnar format's type variants (`arrow_format::DataType`), following the
//! priority order (composite, array, well-known `pg_catalog` name,
//! byte-length fallback) laid out by the system this crate sits in.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod resolve;

pub use catalog::{ColumnCatalog, TypeClass};
pub use error::ResolveError;
pub use resolve::{decode_decimal_modifier, resolve, ResolvedColumn, DEFAULT_DECIMAL_PRECISION, DEFAULT_DECIMAL_SCALE};
