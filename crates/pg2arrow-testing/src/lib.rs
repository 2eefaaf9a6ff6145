//! Synthetic binary-row builders for exercising `pg2arrow` without a live
//! database connection.
//!
//! Mirrors the source database's result-row wire format closely enough to
//! drive [`pg_row_ingest`]'s column ingesters directly: big-endian scalars,
//! the `numeric` digit-group format, and the 2000-01-01 epoch used by
//! `date`/`timestamp`. Not a protocol implementation — just enough encoding
//! to produce realistic test input.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod catalog;
pub mod rows;

pub use catalog::{composite_column, int4_column, numeric_column, text_column, timestamptz_column};
pub use rows::{date_from_ymd, encode_composite, encode_numeric, timestamp_from_ymd_hms, RowBuilder, ScalarValue};
