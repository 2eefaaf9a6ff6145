//! # arrow-format
//!
//! Vtable-based flat-table encoding and file framing for the Arrow IPC file
//! format: the growable column buffer, the schema type tree, and the
//! constructors that turn a [`schema::Schema`] or record batch into the
//! on-wire flat-table bytes the format specifies.
//!
//! This crate is intentionally I/O-agnostic beyond the growable buffer's
//! anonymous mapping: it has no opinion on where the bytes it produces end
//! up. `pg2arrow` drives the file-level framing (magic, message stream,
//! footer, tail) on top of the constructors here.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod buffer;
pub mod error;
pub mod flatbuf;
pub mod message;
pub mod schema;

pub use buffer::{align4, align8, GrowableBuffer};
pub use error::FlatBufferError;
pub use flatbuf::{FlatTable, TableBuilder};
pub use message::{
    buffer_bytes, create_arrow_dictionary_batch, create_arrow_field, create_arrow_footer, create_arrow_message,
    create_arrow_record_batch, create_arrow_schema, field_node_bytes, Block, MessageHeader, MAGIC, METADATA_VERSION,
};
pub use schema::{DataType, DateUnit, DictionaryEncoding, Field, FloatPrecision, Schema, TimeUnit, UnionMode};
