//! Decodes the metadata tables `arrow_format::message` builds: `Schema`,
//! `Field`, `Type`, `RecordBatch`, `Footer`. Each function mirrors its
//! `create_arrow_*` counterpart field-for-field.

use arrow_format::{
    DataType, DateUnit, DictionaryEncoding, Field, FloatPrecision, Schema, TimeUnit, UnionMode, METADATA_VERSION,
};

use crate::error::ReaderError;
use crate::flatbuf::TableCursor;

fn float_precision_from_code(code: i16) -> FloatPrecision {
    match code {
        1 => FloatPrecision::Single,
        2 => FloatPrecision::Double,
        _ => FloatPrecision::Half,
    }
}

fn time_unit_from_code(code: i16) -> TimeUnit {
    match code {
        1 => TimeUnit::Millisecond,
        2 => TimeUnit::Microsecond,
        3 => TimeUnit::Nanosecond,
        _ => TimeUnit::Second,
    }
}

/// Decode a `Type` sub-table given its union discriminant (`Field`'s
/// `type_tag` field).
pub fn decode_arrow_type(type_tag: u8, cursor: &TableCursor<'_>) -> Result<DataType, ReaderError> {
    Ok(match type_tag {
        1 => DataType::Null,
        2 => DataType::Int {
            bit_width: cursor.get_i32(0)? as u8,
            is_signed: cursor.get_bool(1)?,
        },
        3 => DataType::FloatingPoint(float_precision_from_code(cursor.get_i16(0)?)),
        4 => DataType::Binary,
        5 => DataType::Utf8,
        6 => DataType::Bool,
        7 => DataType::Decimal {
            precision: cursor.get_i32(0)? as u16,
            scale: cursor.get_i32(1)? as u16,
        },
        8 => DataType::Date(match cursor.get_i16(0)? {
            1 => DateUnit::Millisecond,
            _ => DateUnit::Day,
        }),
        9 => DataType::Time {
            unit: time_unit_from_code(cursor.get_i16(0)?),
            bit_width: cursor.get_i32(1)? as u8,
        },
        10 => DataType::Timestamp {
            unit: time_unit_from_code(cursor.get_i16(0)?),
            timezone: cursor.get_string(1)?,
        },
        11 => DataType::Interval(time_unit_from_code(cursor.get_i16(0)?)),
        12 => DataType::List,
        13 => DataType::Struct,
        14 => {
            let mode = match cursor.get_i16(0)? {
                1 => UnionMode::Dense,
                _ => UnionMode::Sparse,
            };
            let ids_bytes = cursor.get_struct_vector(1, 4)?;
            let type_ids = ids_bytes
                .chunks_exact(4)
                .map(|c| i32::from_le_bytes(c.try_into().expect("chunk is 4 bytes")))
                .collect();
            DataType::Union { mode, type_ids }
        }
        15 => DataType::FixedSizeBinary {
            byte_width: cursor.get_i32(0)?,
        },
        16 => DataType::FixedSizeList {
            list_size: cursor.get_i32(0)?,
        },
        17 => DataType::Map {
            keys_sorted: cursor.get_bool(0)?,
        },
        other => return Err(ReaderError::UnknownTypeTag(other)),
    })
}

fn decode_dictionary_encoding(cursor: &TableCursor<'_>) -> Result<DictionaryEncoding, ReaderError> {
    Ok(DictionaryEncoding {
        id: cursor.get_i64(0)?,
        index_bit_width: cursor.get_i32(1)? as u8,
        is_ordered: cursor.get_bool(2)?,
    })
}

/// Decode a `Field` table, recursing into children.
///
/// Layout: 0 name, 1 nullable, 2 type_tag, 3 type, 4 dictionary, 5 children,
/// 6 custom_metadata.
pub fn decode_arrow_field(cursor: &TableCursor<'_>) -> Result<Field, ReaderError> {
    let name = cursor.get_string(0)?.unwrap_or_default();
    let nullable = cursor.get_bool(1)?;
    let type_tag = cursor.get_u8(2)?;
    let type_cursor = cursor
        .get_table(3)?
        .ok_or(ReaderError::MissingRequiredField { table: "Field", field: 3 })?;
    let data_type = decode_arrow_type(type_tag, &type_cursor)?;
    let dictionary = cursor.get_table(4)?.map(|tc| decode_dictionary_encoding(&tc)).transpose()?;
    let children = cursor
        .get_vector_of_tables(5)?
        .iter()
        .map(decode_arrow_field)
        .collect::<Result<Vec<_>, _>>()?;
    let metadata = cursor
        .get_vector_of_tables(6)?
        .iter()
        .map(decode_key_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Field {
        name,
        nullable,
        data_type,
        dictionary,
        children,
        metadata,
    })
}

fn decode_key_value(cursor: &TableCursor<'_>) -> Result<(String, String), ReaderError> {
    Ok((
        cursor.get_string(0)?.unwrap_or_default(),
        cursor.get_string(1)?.unwrap_or_default(),
    ))
}

/// Decode the `Schema` table. Layout: 0 endianness, 1 fields, 2
/// custom_metadata.
pub fn decode_arrow_schema(cursor: &TableCursor<'_>) -> Result<Schema, ReaderError> {
    let fields = cursor
        .get_vector_of_tables(1)?
        .iter()
        .map(decode_arrow_field)
        .collect::<Result<Vec<_>, _>>()?;
    let metadata = cursor
        .get_vector_of_tables(2)?
        .iter()
        .map(decode_key_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Schema { fields, metadata })
}

/// One decoded `RecordBatch` table: row count plus the raw `FieldNode` and
/// `Buffer` descriptor bytes (16 bytes each), in pre-order.
pub struct DecodedRecordBatch {
    /// Shared row count across every top-level column.
    pub length: i64,
    /// Packed `FieldNode{length, null_count}` structs.
    pub field_nodes: Vec<u8>,
    /// Packed `Buffer{offset, length}` structs.
    pub buffers: Vec<u8>,
}

/// Decode a `RecordBatch` table. Layout: 0 length, 1 nodes, 2 buffers.
pub fn decode_arrow_record_batch(cursor: &TableCursor<'_>) -> Result<DecodedRecordBatch, ReaderError> {
    Ok(DecodedRecordBatch {
        length: cursor.get_i64(0)?,
        field_nodes: cursor.get_struct_vector(1, 16)?.to_vec(),
        buffers: cursor.get_struct_vector(2, 16)?.to_vec(),
    })
}

/// One entry in the footer's block index, as read back from disk.
#[derive(Debug, Clone, Copy)]
pub struct DecodedBlock {
    /// Byte offset of the block's `metaLength` word from the start of the
    /// file.
    pub offset: i64,
    /// Length of the block's padded metadata region.
    pub meta_data_length: i32,
    /// Length of the padded body that follows the metadata.
    pub body_length: i64,
}

fn decode_blocks(bytes: &[u8]) -> Vec<DecodedBlock> {
    bytes
        .chunks_exact(24)
        .map(|c| DecodedBlock {
            offset: i64::from_le_bytes(c[0..8].try_into().expect("chunk is 24 bytes")),
            meta_data_length: i32::from_le_bytes(c[8..12].try_into().expect("chunk is 24 bytes")),
            body_length: i64::from_le_bytes(c[16..24].try_into().expect("chunk is 24 bytes")),
        })
        .collect()
}

/// The fully decoded `Footer` table: its metadata version, schema, and the
/// dictionary/record-batch block indexes.
pub struct DecodedFooter {
    /// Metadata version the file declares.
    pub version: i16,
    /// The file-level schema.
    pub schema: Schema,
    /// Dictionary-batch blocks (always empty; see
    /// `EncoderConfig::emit_dictionary_batches`).
    pub dictionaries: Vec<DecodedBlock>,
    /// Record-batch blocks, in on-disk order.
    pub record_batches: Vec<DecodedBlock>,
}

/// Decode the `Footer` table. Layout: 0 version, 1 schema, 2 dictionaries,
/// 3 recordBatches, 4 custom_metadata.
pub fn decode_arrow_footer(cursor: &TableCursor<'_>) -> Result<DecodedFooter, ReaderError> {
    let version = cursor.get_i16(0)?;
    if version != METADATA_VERSION {
        return Err(ReaderError::UnsupportedVersion(version));
    }
    let schema_cursor = cursor.get_table(1)?.ok_or(ReaderError::MissingRequiredField {
        table: "Footer",
        field: 1,
    })?;
    let schema = decode_arrow_schema(&schema_cursor)?;
    let dictionaries = decode_blocks(cursor.get_struct_vector(2, 24)?);
    let record_batches = decode_blocks(cursor.get_struct_vector(3, 24)?);
    Ok(DecodedFooter {
        version,
        schema,
        dictionaries,
        record_batches,
    })
}
