//! Vtable-based sparse flat-table encoding.
//!
//! A table is a 4-byte `soffset` pointing backward to its vtable, followed
//! by inline field storage. The vtable is `{vtable_len: u16, table_len: u16,
//! offset[nattrs]: u16}`; a zero offset means the field is absent and takes
//! its zero/default value. Binary and nested-table fields are stored as
//! forward 32-bit relative offsets, patched in at [`TableBuilder::flatten`]
//! time once every payload's final position is known.

use crate::error::FlatBufferError;

fn align_to(pos: usize, align: usize) -> usize {
    (pos + align - 1) & !(align - 1)
}

struct Deferred {
    /// Byte position within `fields` of the 4-byte placeholder to patch.
    patch_at: usize,
    /// The payload to relocate after the field-storage region.
    payload: Vec<u8>,
    /// Extra displacement applied to the relative offset once relocated;
    /// used by `add_offset` to land on a nested table's root rather than
    /// the start of its vtable.
    shift: usize,
}

/// Incrementally builds one flat table.
pub struct TableBuilder {
    nattrs: usize,
    /// Per-field byte offset from the table root (the soffset word), 0 if
    /// the field was omitted. The root's own soffset occupies the first 4
    /// bytes, so the first field's offset is never less than 4.
    offsets: Vec<u16>,
    /// Inline field storage, not including the 4-byte soffset word that
    /// precedes it once flattened; a position recorded here at `p` lands at
    /// table-root-relative offset `4 + p`.
    fields: Vec<u8>,
    deferred: Vec<Deferred>,
}

/// A finished, immutable flat table: vtable header followed by the table
/// root (soffset + inline fields) and any relocated payloads.
#[derive(Clone)]
pub struct FlatTable {
    bytes: Vec<u8>,
    /// Byte length of the vtable header (`vtable_len` field's value) —
    /// equivalently, the offset of the table root within `bytes`.
    pub(crate) vlen: usize,
}

impl FlatTable {
    /// The table's serialized bytes (vtable header followed by the table
    /// root and any relocated payloads).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total serialized length.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the table serialized to zero bytes (never true for a table
    /// built through [`TableBuilder`], since the vtable header itself is
    /// never empty).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Byte length of the vtable header, i.e. the offset of the table root
    /// (the soffset word) within [`FlatTable::as_bytes`]. Callers writing a
    /// table as a file-level block (Message, Footer) need this to compute
    /// the block's `rootOffset` word.
    pub fn vtable_len(&self) -> usize {
        self.vlen
    }
}

impl TableBuilder {
    /// Start a new table with `nattrs` declared field slots.
    pub fn new(nattrs: usize) -> Self {
        Self {
            nattrs,
            offsets: vec![0u16; nattrs],
            fields: Vec::new(),
            deferred: Vec::new(),
        }
    }

    fn check_field(&self, field: usize) -> Result<(), FlatBufferError> {
        if field >= self.nattrs {
            return Err(FlatBufferError::FieldOutOfRange {
                index: field,
                nattrs: self.nattrs,
            });
        }
        Ok(())
    }

    fn place_scalar(&mut self, field: usize, bytes: &[u8], align: usize) -> Result<(), FlatBufferError> {
        self.check_field(field)?;
        let pos = align_to(self.fields.len(), align);
        self.fields.resize(pos, 0);
        self.fields.extend_from_slice(bytes);
        self.offsets[field] = (4 + pos) as u16;
        Ok(())
    }

    /// Add a scalar field, omitting it entirely when `value` is the type's
    /// zero default (the sparse-encoding contract).
    pub fn add_u8(&mut self, field: usize, value: u8) -> Result<(), FlatBufferError> {
        if value == 0 {
            return self.check_field(field);
        }
        self.place_scalar(field, &[value], 1)
    }

    /// See [`TableBuilder::add_u8`].
    pub fn add_bool(&mut self, field: usize, value: bool) -> Result<(), FlatBufferError> {
        self.add_u8(field, value as u8)
    }

    /// See [`TableBuilder::add_u8`].
    pub fn add_i16(&mut self, field: usize, value: i16) -> Result<(), FlatBufferError> {
        if value == 0 {
            return self.check_field(field);
        }
        self.place_scalar(field, &value.to_le_bytes(), 2)
    }

    /// See [`TableBuilder::add_u8`].
    pub fn add_u16(&mut self, field: usize, value: u16) -> Result<(), FlatBufferError> {
        if value == 0 {
            return self.check_field(field);
        }
        self.place_scalar(field, &value.to_le_bytes(), 2)
    }

    /// See [`TableBuilder::add_u8`].
    pub fn add_i32(&mut self, field: usize, value: i32) -> Result<(), FlatBufferError> {
        if value == 0 {
            return self.check_field(field);
        }
        self.place_scalar(field, &value.to_le_bytes(), 4)
    }

    /// See [`TableBuilder::add_u8`].
    pub fn add_u32(&mut self, field: usize, value: u32) -> Result<(), FlatBufferError> {
        if value == 0 {
            return self.check_field(field);
        }
        self.place_scalar(field, &value.to_le_bytes(), 4)
    }

    /// See [`TableBuilder::add_u8`].
    pub fn add_i64(&mut self, field: usize, value: i64) -> Result<(), FlatBufferError> {
        if value == 0 {
            return self.check_field(field);
        }
        self.place_scalar(field, &value.to_le_bytes(), 8)
    }

    /// Add a raw binary payload referenced by a forward 32-bit relative
    /// offset. `shift` is added to the relative offset once the payload's
    /// final position is known; pass 0 for plain binary/string blobs, and
    /// a sub-table's `vlen` for [`TableBuilder::add_offset`].
    pub fn add_binary_with_shift(
        &mut self,
        field: usize,
        payload: Vec<u8>,
        shift: usize,
    ) -> Result<(), FlatBufferError> {
        self.check_field(field)?;
        if payload.is_empty() && shift == 0 {
            return Ok(());
        }
        let pos = align_to(self.fields.len(), 4);
        self.fields.resize(pos, 0);
        self.fields.extend_from_slice(&0u32.to_le_bytes());
        self.offsets[field] = (4 + pos) as u16;
        self.deferred.push(Deferred {
            patch_at: pos,
            payload,
            shift,
        });
        Ok(())
    }

    /// Add a raw binary field (no forward shift).
    pub fn add_binary(&mut self, field: usize, payload: Vec<u8>) -> Result<(), FlatBufferError> {
        self.add_binary_with_shift(field, payload, 0)
    }

    /// Add a UTF-8 string field: `{u32 length, bytes, NUL}` padded to 4,
    /// omitted entirely when the string is empty.
    pub fn add_string(&mut self, field: usize, s: &str) -> Result<(), FlatBufferError> {
        if s.is_empty() {
            return self.check_field(field);
        }
        let mut payload = Vec::with_capacity(4 + s.len() + 1);
        payload.extend_from_slice(&(s.len() as u32).to_le_bytes());
        payload.extend_from_slice(s.as_bytes());
        payload.push(0);
        while payload.len() % 4 != 0 {
            payload.push(0);
        }
        self.add_binary(field, payload)
    }

    /// Add a nested, already-flattened sub-table as an offset field.
    pub fn add_offset(&mut self, field: usize, sub: &FlatTable) -> Result<(), FlatBufferError> {
        self.add_binary_with_shift(field, sub.bytes.clone(), sub.vlen)
    }

    /// Add a vector of nested, already-flattened sub-tables:
    /// `{u32 count, u32 relative_offset[count]}` followed by the
    /// concatenation of the elements' bytes.
    pub fn add_vector_of_tables(&mut self, field: usize, elements: &[FlatTable]) -> Result<(), FlatBufferError> {
        if elements.is_empty() {
            return self.check_field(field);
        }
        // Build the vector header with placeholder offsets, to be patched
        // once the element payloads are appended after it.
        let mut vector = Vec::new();
        vector.extend_from_slice(&(elements.len() as u32).to_le_bytes());
        let header_len = vector.len() + elements.len() * 4;
        vector.resize(header_len, 0);

        let mut tail = Vec::new();
        for (i, element) in elements.iter().enumerate() {
            let slot_pos = 4 + i * 4;
            // Position of this element's root within the combined payload.
            let elem_root = header_len + tail.len() + element.vlen;
            let rel = (elem_root - slot_pos) as u32;
            vector[slot_pos..slot_pos + 4].copy_from_slice(&rel.to_le_bytes());
            tail.extend_from_slice(&element.bytes);
        }
        vector.extend_from_slice(&tail);
        self.add_binary(field, vector)
    }

    /// Add a vector of fixed-size plain structs (as opposed to tables):
    /// `{u32 count}` followed directly by the packed struct bytes, with no
    /// per-element offset indirection. Used for the RecordBatch FieldNode
    /// and Buffer vectors, whose elements are plain `{i64, i64}` pairs.
    pub fn add_struct_vector(&mut self, field: usize, item_size: usize, items: &[u8]) -> Result<(), FlatBufferError> {
        if items.is_empty() {
            return self.check_field(field);
        }
        debug_assert_eq!(items.len() % item_size, 0);
        let count = (items.len() / item_size) as u32;
        let mut payload = Vec::with_capacity(4 + items.len());
        payload.extend_from_slice(&count.to_le_bytes());
        payload.extend_from_slice(items);
        self.add_binary(field, payload)
    }

    /// Finish the table: close the gap between the vtable header and the
    /// field-storage region, write the table's soffset, and relocate every
    /// deferred binary payload, patching its forward offset.
    pub fn flatten(self) -> FlatTable {
        let vlen = 4 + self.offsets.len() * 2;
        let table_len = 4 + self.fields.len();

        let mut out = Vec::with_capacity(vlen + table_len);
        out.extend_from_slice(&(vlen as u16).to_le_bytes());
        out.extend_from_slice(&(table_len as u16).to_le_bytes());
        for off in &self.offsets {
            out.extend_from_slice(&off.to_le_bytes());
        }
        out.extend_from_slice(&(vlen as u32).to_le_bytes());
        out.extend_from_slice(&self.fields);

        let fields_start = vlen + 4;
        for deferred in &self.deferred {
            let patch_field_pos = fields_start + deferred.patch_at;
            let payload_pos = out.len();
            let rel = (payload_pos - patch_field_pos + deferred.shift) as u32;
            out[patch_field_pos..patch_field_pos + 4].copy_from_slice(&rel.to_le_bytes());
            out.extend_from_slice(&deferred.payload);
        }

        FlatTable { bytes: out, vlen }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_field_is_omitted_when_zero() {
        let mut b = TableBuilder::new(2);
        b.add_i32(0, 0).unwrap();
        b.add_i32(1, 42).unwrap();
        let t = b.flatten();
        // vlen = 4 + 2*2 = 8; offset[0] must be 0 (absent)
        let vlen = u16::from_le_bytes([t.as_bytes()[0], t.as_bytes()[1]]);
        assert_eq!(vlen, 8);
        let off0 = u16::from_le_bytes([t.as_bytes()[4], t.as_bytes()[5]]);
        let off1 = u16::from_le_bytes([t.as_bytes()[6], t.as_bytes()[7]]);
        assert_eq!(off0, 0);
        assert_ne!(off1, 0);
    }

    #[test]
    fn string_round_trip_position() {
        let mut b = TableBuilder::new(1);
        b.add_string(0, "hi").unwrap();
        let t = b.flatten();
        assert!(t.len() > t.vlen);
    }

    #[test]
    fn nested_offset_lands_on_table_root() {
        let mut inner = TableBuilder::new(1);
        inner.add_i32(0, 7).unwrap();
        let inner_table = inner.flatten();

        let mut outer = TableBuilder::new(1);
        outer.add_offset(0, &inner_table).unwrap();
        let outer_table = outer.flatten();
        assert!(outer_table.len() > outer_table.vlen);
    }
}
