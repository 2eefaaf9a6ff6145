//! # pg-row-ingest
//!
//! Turns decoded binary-format result rows into per-column buffers ready
//! for the columnar file format's record-batch framing: a validity bitmap,
//! a values region (inline values or offsets), and — for text/binary
//! columns — an extra-bytes region.
//!
//! This crate owns value-level concerns only: byte-order conversion,
//! epoch rebasing, `numeric` decoding, composite-row splitting, and
//! running statistics. Record-batch assembly (`FieldNode`/`Buffer`
//! descriptors, body layout, file framing) is driven by the writer crate
//! sitting on top of this one.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod datetime;
pub mod decimal;
pub mod error;
pub mod ingester;
pub mod stats;

pub use datetime::{rebase_date_to_unix, rebase_timestamp_to_unix, EPOCH_DIFF_DAYS, USECS_PER_DAY};
pub use decimal::decode_numeric;
pub use error::IngestError;
pub use ingester::{ColumnIngester, ColumnSnapshot};
pub use stats::RunningStats;
