//! Encodes a stream of binary-format database result rows into a columnar
//! Arrow IPC file.
//!
//! Ties together [`arrow_types`]'s catalog-to-columnar type resolution,
//! [`pg_row_ingest`]'s per-row decoding, and [`arrow_format`]'s flat-table
//! metadata encoding into a single [`writer::ArrowFileWriter`] driver.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod batch;
pub mod config;
pub mod error;
pub mod schema;
pub mod writer;

pub use config::EncoderConfig;
pub use error::WriterError;
pub use writer::{ArrowFileWriter, RowValues};
