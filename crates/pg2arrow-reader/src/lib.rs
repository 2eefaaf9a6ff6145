//! Mmap-backed reader for the files `pg2arrow` writes: decodes the footer,
//! the schema, and every record batch's columns, for round-trip testing
//! and development diagnostics.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod batch;
pub mod error;
pub mod flatbuf;
pub mod message;
pub mod reader;

pub use batch::ColumnView;
pub use error::ReaderError;
pub use reader::{ArrowFileReader, RecordBatchView};
