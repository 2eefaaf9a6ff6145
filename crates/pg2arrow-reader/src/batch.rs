//! Walks a decoded record batch's `FieldNode`/`Buffer` descriptors in
//! lockstep with the schema tree, mirroring `pg2arrow::batch`'s write-side
//! `visit` in reverse.

use arrow_format::{DataType, Field};

use crate::error::ReaderError;
use crate::message::DecodedRecordBatch;

/// One column's view into a record batch's body: the validity bitmap (if
/// any nulls), the values region, the extra-bytes region (`Utf8`/`Binary`
/// only), and — for `Struct` — the decoded subfield columns.
pub struct ColumnView<'a> {
    /// The field this view decodes, including its name and resolved type.
    pub field: &'a Field,
    /// Rows in this column.
    pub length: i64,
    /// Nulls in this column.
    pub null_count: i64,
    /// The validity bitmap, present whenever `null_count > 0`.
    pub validity: Option<&'a [u8]>,
    /// Offsets (`Utf8`/`Binary`) or inline values (everything else); empty
    /// for `Struct`.
    pub values: &'a [u8],
    /// The concatenated `Utf8`/`Binary` payload bytes.
    pub extra: Option<&'a [u8]>,
    /// Decoded subfield columns, populated only for `Struct`.
    pub children: Vec<ColumnView<'a>>,
}

struct Walker<'a> {
    body: &'a [u8],
    field_nodes: &'a [u8],
    buffers: &'a [u8],
    node_index: usize,
    buffer_index: usize,
}

fn read_field_node(bytes: &[u8], index: usize) -> (i64, i64) {
    let base = index * 16;
    let length = i64::from_le_bytes(bytes[base..base + 8].try_into().expect("16-byte FieldNode"));
    let null_count = i64::from_le_bytes(bytes[base + 8..base + 16].try_into().expect("16-byte FieldNode"));
    (length, null_count)
}

fn read_buffer(bytes: &[u8], index: usize) -> (i64, i64) {
    let base = index * 16;
    let offset = i64::from_le_bytes(bytes[base..base + 8].try_into().expect("16-byte Buffer"));
    let length = i64::from_le_bytes(bytes[base + 8..base + 16].try_into().expect("16-byte Buffer"));
    (offset, length)
}

impl<'a> Walker<'a> {
    fn next_node(&mut self) -> Result<(i64, i64), ReaderError> {
        let count = self.field_nodes.len() / 16;
        if self.node_index >= count {
            return Err(ReaderError::Truncated {
                expected: self.node_index + 1,
                found: count,
            });
        }
        let node = read_field_node(self.field_nodes, self.node_index);
        self.node_index += 1;
        Ok(node)
    }

    fn next_buffer(&mut self) -> Result<&'a [u8], ReaderError> {
        let count = self.buffers.len() / 16;
        if self.buffer_index >= count {
            return Err(ReaderError::Truncated {
                expected: self.buffer_index + 1,
                found: count,
            });
        }
        let (offset, length) = read_buffer(self.buffers, self.buffer_index);
        self.buffer_index += 1;
        let start = offset as usize;
        let end = start + length as usize;
        self.body.get(start..end).ok_or(ReaderError::Truncated {
            expected: end,
            found: self.body.len(),
        })
    }

    fn visit(&mut self, field: &'a Field) -> Result<ColumnView<'a>, ReaderError> {
        let (length, null_count) = self.next_node()?;
        // The writer always emits a validity Buffer descriptor, even with
        // length 0 when null_count == 0 (it still occupies a slot in the
        // pre-order buffer vector) — consume it unconditionally to stay in
        // lockstep, but only expose it when there are nulls to describe.
        let validity_buffer = self.next_buffer()?;
        let validity = if null_count > 0 { Some(validity_buffer) } else { None };

        match &field.data_type {
            DataType::Utf8 | DataType::Binary => {
                let values = self.next_buffer()?;
                let extra = self.next_buffer()?;
                Ok(ColumnView {
                    field,
                    length,
                    null_count,
                    validity,
                    values,
                    extra: Some(extra),
                    children: Vec::new(),
                })
            }
            DataType::Struct => {
                let children = field
                    .children
                    .iter()
                    .map(|child| self.visit(child))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ColumnView {
                    field,
                    length,
                    null_count,
                    validity,
                    values: &[],
                    extra: None,
                    children,
                })
            }
            _ => {
                let values = self.next_buffer()?;
                Ok(ColumnView {
                    field,
                    length,
                    null_count,
                    validity,
                    values,
                    extra: None,
                    children: Vec::new(),
                })
            }
        }
    }
}

/// Walk a decoded record batch's descriptors against `fields` (the schema's
/// top-level fields, in the same pre-order the writer emitted them).
pub fn columns<'a>(fields: &'a [Field], batch: &'a DecodedRecordBatch, body: &'a [u8]) -> Result<Vec<ColumnView<'a>>, ReaderError> {
    let mut walker = Walker {
        body,
        field_nodes: &batch.field_nodes,
        buffers: &batch.buffers,
        node_index: 0,
        buffer_index: 0,
    };
    fields.iter().map(|f| walker.visit(f)).collect()
}
