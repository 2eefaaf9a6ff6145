//! Constructors for the Arrow IPC metadata tables (Field, Schema,
//! RecordBatch, Message, Footer) and the file-level framing around them.

use crate::flatbuf::{FlatTable, TableBuilder};
use crate::schema::{DataType, DictionaryEncoding, Field, FloatPrecision, Schema, TimeUnit, UnionMode};

/// 8-byte magic at the start (and embedded in the tail) of every file.
pub const MAGIC: &[u8; 6] = b"ARROW1";

/// Metadata version this crate reads and writes (Arrow's "V4", wire code 3).
pub const METADATA_VERSION: i16 = 3;

/// `Message.header` discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum MessageHeader {
    /// A Schema message; written exactly once, before any record batch.
    Schema = 1,
    /// A DictionaryBatch message (structural hook; never emitted by the
    /// writer in this crate family, see `EncoderConfig::emit_dictionary_batches`).
    DictionaryBatch = 2,
    /// A RecordBatch message.
    RecordBatch = 3,
}

/// One entry in the footer's block index: the on-disk location of a
/// Message and its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// Byte offset of the Message's `metaLength` word from the start of
    /// the file.
    pub offset: i64,
    /// Length of the Message's metadata region (the flat-table bytes,
    /// 8-byte padded), matching the `metaLength` word written at `offset`.
    pub meta_data_length: i32,
    /// Length of the body that follows the metadata, 8-byte padded.
    pub body_length: i64,
}

fn float_precision_code(p: FloatPrecision) -> i16 {
    match p {
        FloatPrecision::Half => 0,
        FloatPrecision::Single => 1,
        FloatPrecision::Double => 2,
    }
}

fn time_unit_code(u: TimeUnit) -> i16 {
    match u {
        TimeUnit::Second => 0,
        TimeUnit::Millisecond => 1,
        TimeUnit::Microsecond => 2,
        TimeUnit::Nanosecond => 3,
    }
}

/// `Type` union discriminant, mirroring the order types are declared in
/// [`DataType`].
fn type_tag(dt: &DataType) -> u8 {
    match dt {
        DataType::Null => 1,
        DataType::Int { .. } => 2,
        DataType::FloatingPoint(_) => 3,
        DataType::Binary => 4,
        DataType::Utf8 => 5,
        DataType::Bool => 6,
        DataType::Decimal { .. } => 7,
        DataType::Date(_) => 8,
        DataType::Time { .. } => 9,
        DataType::Timestamp { .. } => 10,
        DataType::Interval(_) => 11,
        DataType::List => 12,
        DataType::Struct => 13,
        DataType::Union { .. } => 14,
        DataType::FixedSizeBinary { .. } => 15,
        DataType::FixedSizeList { .. } => 16,
        DataType::Map { .. } => 17,
    }
}

/// Build the `Type` sub-table for one [`DataType`] variant.
fn create_arrow_type(dt: &DataType) -> FlatTable {
    match dt {
        DataType::Null | DataType::Utf8 | DataType::Binary | DataType::Bool | DataType::List | DataType::Struct => {
            // No payload fields.
            TableBuilder::new(0).flatten()
        }
        DataType::Int { bit_width, is_signed } => {
            let mut b = TableBuilder::new(2);
            b.add_i32(0, *bit_width as i32).expect("field 0 in range");
            b.add_bool(1, *is_signed).expect("field 1 in range");
            b.flatten()
        }
        DataType::FloatingPoint(precision) => {
            let mut b = TableBuilder::new(1);
            b.add_i16(0, float_precision_code(*precision)).expect("field 0 in range");
            b.flatten()
        }
        DataType::Decimal { precision, scale } => {
            let mut b = TableBuilder::new(2);
            b.add_i32(0, *precision as i32).expect("field 0 in range");
            b.add_i32(1, *scale as i32).expect("field 1 in range");
            b.flatten()
        }
        DataType::Date(unit) => {
            let mut b = TableBuilder::new(1);
            let code = match unit {
                crate::schema::DateUnit::Day => 0i16,
                crate::schema::DateUnit::Millisecond => 1i16,
            };
            b.add_i16(0, code).expect("field 0 in range");
            b.flatten()
        }
        DataType::Time { unit, bit_width } => {
            let mut b = TableBuilder::new(2);
            b.add_i16(0, time_unit_code(*unit)).expect("field 0 in range");
            b.add_i32(1, *bit_width as i32).expect("field 1 in range");
            b.flatten()
        }
        DataType::Timestamp { unit, timezone } => {
            let mut b = TableBuilder::new(2);
            b.add_i16(0, time_unit_code(*unit)).expect("field 0 in range");
            if let Some(tz) = timezone {
                b.add_string(1, tz).expect("field 1 in range");
            }
            b.flatten()
        }
        DataType::Interval(unit) => {
            let mut b = TableBuilder::new(1);
            b.add_i16(0, time_unit_code(*unit)).expect("field 0 in range");
            b.flatten()
        }
        DataType::Union { mode, type_ids } => {
            let mut b = TableBuilder::new(2);
            b.add_i16(
                0,
                match mode {
                    UnionMode::Sparse => 0,
                    UnionMode::Dense => 1,
                },
            )
            .expect("field 0 in range");
            let mut ids = Vec::with_capacity(type_ids.len() * 4);
            for id in type_ids {
                ids.extend_from_slice(&id.to_le_bytes());
            }
            if !ids.is_empty() {
                b.add_struct_vector(1, 4, &ids).expect("field 1 in range");
            }
            b.flatten()
        }
        DataType::FixedSizeBinary { byte_width } => {
            let mut b = TableBuilder::new(1);
            b.add_i32(0, *byte_width).expect("field 0 in range");
            b.flatten()
        }
        DataType::FixedSizeList { list_size } => {
            let mut b = TableBuilder::new(1);
            b.add_i32(0, *list_size).expect("field 0 in range");
            b.flatten()
        }
        DataType::Map { keys_sorted } => {
            let mut b = TableBuilder::new(1);
            b.add_bool(0, *keys_sorted).expect("field 0 in range");
            b.flatten()
        }
    }
}

fn create_dictionary_encoding(enc: &DictionaryEncoding) -> FlatTable {
    let mut b = TableBuilder::new(3);
    b.add_i64(0, enc.id).expect("field 0 in range");
    b.add_i32(1, enc.index_bit_width as i32).expect("field 1 in range");
    b.add_bool(2, enc.is_ordered).expect("field 2 in range");
    b.flatten()
}

/// Build the `Field` table for one column, recursing into children.
///
/// Field layout: 0 name, 1 nullable, 2 type_tag, 3 type, 4 dictionary,
/// 5 children, 6 custom_metadata.
pub fn create_arrow_field(field: &Field) -> FlatTable {
    let type_table = create_arrow_type(&field.data_type);
    let child_tables: Vec<FlatTable> = field.children.iter().map(create_arrow_field).collect();

    let mut b = TableBuilder::new(7);
    b.add_string(0, &field.name).expect("field 0 in range");
    b.add_bool(1, field.nullable).expect("field 1 in range");
    b.add_u8(2, type_tag(&field.data_type)).expect("field 2 in range");
    b.add_offset(3, &type_table).expect("field 3 in range");
    if let Some(enc) = &field.dictionary {
        let dict_table = create_dictionary_encoding(enc);
        b.add_offset(4, &dict_table).expect("field 4 in range");
    }
    if !child_tables.is_empty() {
        b.add_vector_of_tables(5, &child_tables).expect("field 5 in range");
    }
    if !field.metadata.is_empty() {
        let kv_tables: Vec<FlatTable> = field
            .metadata
            .iter()
            .map(|(k, v)| create_key_value(k, v))
            .collect();
        b.add_vector_of_tables(6, &kv_tables).expect("field 6 in range");
    }
    b.flatten()
}

fn create_key_value(key: &str, value: &str) -> FlatTable {
    let mut b = TableBuilder::new(2);
    b.add_string(0, key).expect("field 0 in range");
    b.add_string(1, value).expect("field 1 in range");
    b.flatten()
}

/// Build the `Schema` table. Layout: 0 endianness (0 = little), 1 fields,
/// 2 custom_metadata.
pub fn create_arrow_schema(schema: &Schema) -> FlatTable {
    let field_tables: Vec<FlatTable> = schema.fields.iter().map(create_arrow_field).collect();
    let mut b = TableBuilder::new(3);
    // endianness 0 (little) is the default and therefore never written.
    b.add_i16(0, 0).expect("field 0 in range");
    if !field_tables.is_empty() {
        b.add_vector_of_tables(1, &field_tables).expect("field 1 in range");
    }
    if !schema.metadata.is_empty() {
        let kv_tables: Vec<FlatTable> = schema
            .metadata
            .iter()
            .map(|(k, v)| create_key_value(k, v))
            .collect();
        b.add_vector_of_tables(2, &kv_tables).expect("field 2 in range");
    }
    b.flatten()
}

/// One `FieldNode` struct: `{length: i64, null_count: i64}`, 16 bytes.
pub fn field_node_bytes(length: i64, null_count: i64) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[0..8].copy_from_slice(&length.to_le_bytes());
    out[8..16].copy_from_slice(&null_count.to_le_bytes());
    out
}

/// One `Buffer` struct: `{offset: i64, length: i64}`, 16 bytes.
pub fn buffer_bytes(offset: i64, length: i64) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[0..8].copy_from_slice(&offset.to_le_bytes());
    out[8..16].copy_from_slice(&length.to_le_bytes());
    out
}

/// Build the `RecordBatch` table.
///
/// Layout: 0 length, 1 nodes (FieldNode vector), 2 buffers (Buffer vector).
///
/// The original C implementation this format was distilled from writes
/// both the FieldNode vector and the Buffer vector into table index 1 (a
/// bug carried by at least one historical revision of that source); this
/// crate always uses index 2 for the buffer vector.
pub fn create_arrow_record_batch(length: i64, field_nodes: &[u8], buffers: &[u8]) -> FlatTable {
    let mut b = TableBuilder::new(3);
    b.add_i64(0, length).expect("field 0 in range");
    b.add_struct_vector(1, 16, field_nodes).expect("field 1 in range");
    b.add_struct_vector(2, 16, buffers).expect("field 2 in range");
    b.flatten()
}

/// Build the `DictionaryBatch` table: 0 id, 1 data (RecordBatch offset),
/// 2 isDelta.
pub fn create_arrow_dictionary_batch(id: i64, record_batch: &FlatTable, is_delta: bool) -> FlatTable {
    let mut b = TableBuilder::new(3);
    b.add_i64(0, id).expect("field 0 in range");
    b.add_offset(1, record_batch).expect("field 1 in range");
    b.add_bool(2, is_delta).expect("field 2 in range");
    b.flatten()
}

/// Build the top-level `Message` table: 0 version, 1 header_type,
/// 2 header, 3 bodyLength.
pub fn create_arrow_message(header_type: MessageHeader, header: &FlatTable, body_length: i64) -> FlatTable {
    let mut b = TableBuilder::new(4);
    b.add_i16(0, METADATA_VERSION).expect("field 0 in range");
    b.add_u8(1, header_type as u8).expect("field 1 in range");
    b.add_offset(2, header).expect("field 2 in range");
    b.add_i64(3, body_length).expect("field 3 in range");
    b.flatten()
}

/// Build the `Footer` table: 0 version, 1 schema, 2 dictionaries,
/// 3 recordBatches, 4 custom_metadata.
pub fn create_arrow_footer(schema: &FlatTable, dictionaries: &[Block], record_batches: &[Block]) -> FlatTable {
    let mut b = TableBuilder::new(5);
    b.add_i16(0, METADATA_VERSION).expect("field 0 in range");
    b.add_offset(1, schema).expect("field 1 in range");
    if !dictionaries.is_empty() {
        let bytes = blocks_to_bytes(dictionaries);
        b.add_struct_vector(2, 24, &bytes).expect("field 2 in range");
    }
    if !record_batches.is_empty() {
        let bytes = blocks_to_bytes(record_batches);
        b.add_struct_vector(3, 24, &bytes).expect("field 3 in range");
    }
    b.flatten()
}

fn blocks_to_bytes(blocks: &[Block]) -> Vec<u8> {
    let mut out = Vec::with_capacity(blocks.len() * 24);
    for block in blocks {
        out.extend_from_slice(&block.offset.to_le_bytes());
        out.extend_from_slice(&(block.meta_data_length as i32).to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes()); // padding
        out.extend_from_slice(&block.body_length.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DataType, Field, Schema};

    #[test]
    fn schema_with_one_int_field_flattens() {
        let schema = Schema::new(vec![Field::new(
            "id",
            DataType::Int {
                bit_width: 32,
                is_signed: true,
            },
        )]);
        let table = create_arrow_schema(&schema);
        assert!(table.len() > table.vlen);
    }

    #[test]
    fn record_batch_uses_buffer_index_two() {
        let nodes = field_node_bytes(4, 1);
        let buffers = buffer_bytes(0, 8);
        let table = create_arrow_record_batch(4, &nodes, &buffers);
        // field 1 (nodes) and field 2 (buffers) must both be present and
        // point to distinct storage.
        let off1 = u16::from_le_bytes([table.as_bytes()[4 + 2], table.as_bytes()[4 + 3]]);
        let off2 = u16::from_le_bytes([table.as_bytes()[4 + 4], table.as_bytes()[4 + 5]]);
        assert_ne!(off1, 0);
        assert_ne!(off2, 0);
        assert_ne!(off1, off2);
    }
}
