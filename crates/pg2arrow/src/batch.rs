//! Builds the `FieldNode`/`Buffer` descriptor vectors and body bytes for
//! one record batch from a tree of column ingesters.

use arrow_format::{align8, buffer_bytes, field_node_bytes, DataType};
use pg_row_ingest::ColumnIngester;

use crate::error::WriterError;

/// One fully assembled record batch, ready to be handed to
/// [`arrow_format::create_arrow_record_batch`] and written to disk.
pub struct AssembledBatch {
    /// Number of rows in the batch (the top-level columns' shared row count).
    pub length: i64,
    /// Packed `FieldNode{length, null_count}` structs, one per column in
    /// pre-order.
    pub field_nodes: Vec<u8>,
    /// Packed `Buffer{offset, length}` structs, one per emitted region, in
    /// the same pre-order.
    pub buffers: Vec<u8>,
    /// The concatenation of every emitted region's padded bytes.
    pub body: Vec<u8>,
}

/// Estimate the in-memory size of the current batch: the sum, across every
/// column (recursively for `Struct`), of the 8-byte-aligned usage of each
/// region the column will eventually emit. Drives the writer's
/// batch-overflow decision.
pub fn estimate_size(columns: &[ColumnIngester]) -> usize {
    columns.iter().map(estimate_column_size).sum()
}

fn estimate_column_size(column: &ColumnIngester) -> usize {
    let nullmap = if column.null_count() > 0 {
        align8(column.nullmap().usage())
    } else {
        0
    };
    let values = align8(column.values().usage());
    let extra = column.extra().map_or(0, |buf| align8(buf.usage()));
    let children: usize = column.children().iter().map(estimate_column_size).sum();
    nullmap + values + extra + children
}

/// Assemble one record batch from the top-level column ingesters.
pub fn assemble(columns: &[ColumnIngester]) -> Result<AssembledBatch, WriterError> {
    let length = columns.first().map_or(0, |c| c.row_count() as i64);
    let mut field_nodes = Vec::new();
    let mut buffers = Vec::new();
    let mut body = Vec::new();
    let mut body_offset: i64 = 0;
    for column in columns {
        visit(column, &mut field_nodes, &mut buffers, &mut body, &mut body_offset)?;
    }
    Ok(AssembledBatch {
        length,
        field_nodes,
        buffers,
        body,
    })
}

fn visit(
    column: &ColumnIngester,
    field_nodes: &mut Vec<u8>,
    buffers: &mut Vec<u8>,
    body: &mut Vec<u8>,
    body_offset: &mut i64,
) -> Result<(), WriterError> {
    field_nodes.extend_from_slice(&field_node_bytes(column.row_count() as i64, column.null_count() as i64));

    let validity_bytes: &[u8] = if column.null_count() > 0 {
        column.nullmap().as_slice()
    } else {
        &[]
    };

    match column.data_type() {
        DataType::Utf8 | DataType::Binary => {
            push_region(buffers, body, body_offset, validity_bytes);
            push_region(buffers, body, body_offset, column.values().as_slice());
            let extra = column
                .extra()
                .expect("Utf8/Binary ingesters always carry an extra buffer");
            push_region(buffers, body, body_offset, extra.as_slice());
        }
        DataType::Struct => {
            push_region(buffers, body, body_offset, validity_bytes);
            for child in column.children() {
                visit(child, field_nodes, buffers, body, body_offset)?;
            }
        }
        DataType::List | DataType::Null | DataType::Union { .. } => {
            return Err(WriterError::UnsupportedColumnType(column.data_type().clone()));
        }
        _ => {
            push_region(buffers, body, body_offset, validity_bytes);
            push_region(buffers, body, body_offset, column.values().as_slice());
        }
    }
    Ok(())
}

fn push_region(buffers: &mut Vec<u8>, body: &mut Vec<u8>, body_offset: &mut i64, bytes: &[u8]) {
    let padded = align8(bytes.len());
    buffers.extend_from_slice(&buffer_bytes(*body_offset, padded as i64));
    body.extend_from_slice(bytes);
    body.resize(body.len() + (padded - bytes.len()), 0);
    *body_offset += padded as i64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_types::ResolvedColumn;

    fn int_column() -> ColumnIngester {
        ColumnIngester::new(&ResolvedColumn {
            name: "id".to_string(),
            data_type: DataType::Int {
                bit_width: 32,
                is_signed: true,
            },
            source_type_id: 23,
            children: Vec::new(),
        })
        .unwrap()
    }

    #[test]
    fn single_int_column_emits_two_buffers() {
        let mut col = int_column();
        col.put_value(Some(&1i32.to_be_bytes())).unwrap();
        col.put_value(Some(&2i32.to_be_bytes())).unwrap();
        col.put_value(None).unwrap();
        col.put_value(Some(&3i32.to_be_bytes())).unwrap();

        let columns = vec![col];
        let batch = assemble(&columns).unwrap();
        assert_eq!(batch.length, 4);
        // two Buffer descriptors (16 bytes each) = 32 bytes
        assert_eq!(batch.buffers.len(), 32);
        // validity (padded to 8) + values (4*4=16, padded to 16)
        assert_eq!(batch.body.len(), 8 + 16);
        // validity: row 2 (index 2) is null, every other row present -> 0b1011
        assert_eq!(batch.body[0], 0b1011);
        let values = &batch.body[8..24];
        assert_eq!(i32::from_le_bytes(values[0..4].try_into().unwrap()), 1);
        assert_eq!(i32::from_le_bytes(values[4..8].try_into().unwrap()), 2);
        assert_eq!(i32::from_le_bytes(values[8..12].try_into().unwrap()), 0);
        assert_eq!(i32::from_le_bytes(values[12..16].try_into().unwrap()), 3);
    }

    #[test]
    fn text_column_emits_monotonic_offsets() {
        let mut col = ColumnIngester::new(&ResolvedColumn {
            name: "name".to_string(),
            data_type: DataType::Utf8,
            source_type_id: 25,
            children: Vec::new(),
        })
        .unwrap();
        col.put_value(Some(b"a")).unwrap();
        col.put_value(Some(b"")).unwrap();
        col.put_value(None).unwrap();
        col.put_value(Some(b"bc")).unwrap();

        let columns = vec![col];
        let batch = assemble(&columns).unwrap();
        assert_eq!(batch.length, 4);
        // validity: row 2 is null -> 0b1011
        assert_eq!(batch.body[0], 0b1011);

        // three Buffer descriptors (validity, offsets, extra)
        assert_eq!(batch.buffers.len(), 48);
        let offsets_offset = i64::from_le_bytes(batch.buffers[16..24].try_into().unwrap()) as usize;
        let extra_offset = i64::from_le_bytes(batch.buffers[32..40].try_into().unwrap()) as usize;
        let extra_length = i64::from_le_bytes(batch.buffers[40..48].try_into().unwrap()) as usize;

        let offsets_bytes = &batch.body[offsets_offset..offsets_offset + 20];
        let offsets: Vec<i32> = offsets_bytes
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(offsets, vec![0, 1, 1, 1, 3]);

        let extra = &batch.body[extra_offset..extra_offset + 3];
        assert_eq!(extra, b"abc");
        assert_eq!(extra_length, 3);
    }

    #[test]
    fn body_offsets_are_eight_byte_aligned() {
        let mut col = int_column();
        col.put_value(Some(&1i32.to_be_bytes())).unwrap();
        let columns = vec![col];
        let batch = assemble(&columns).unwrap();
        let validity_offset = i64::from_le_bytes(batch.buffers[0..8].try_into().unwrap());
        let values_offset = i64::from_le_bytes(batch.buffers[16..24].try_into().unwrap());
        assert_eq!(validity_offset % 8, 0);
        assert_eq!(values_offset % 8, 0);
    }

    #[test]
    fn list_column_is_rejected() {
        let col = ColumnIngester::new(&ResolvedColumn {
            name: "tags".to_string(),
            data_type: DataType::List,
            source_type_id: 25,
            children: Vec::new(),
        })
        .unwrap();
        let columns = vec![col];
        let err = assemble(&columns).unwrap_err();
        assert!(matches!(err, WriterError::UnsupportedColumnType(DataType::List)));
    }
}
