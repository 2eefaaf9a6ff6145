//! The inverse of `arrow_format::flatbuf::TableBuilder`: reads a vtable-based
//! sparse table back out of a byte slice.
//!
//! A [`TableCursor`] borrows the whole mapped file and a table's root
//! position within it; every accessor mirrors one of `TableBuilder`'s
//! `add_*` methods.

use crate::error::ReaderError;

/// A read-only view of one flat table, positioned at its root (the 4-byte
/// soffset word) within `data`.
#[derive(Clone, Copy)]
pub struct TableCursor<'a> {
    data: &'a [u8],
    root: usize,
    vlen: usize,
    nattrs: usize,
}

impl<'a> TableCursor<'a> {
    /// Open a table whose root sits at `root` within `data`, reading its
    /// vtable header (found by walking the backward soffset at `root`).
    pub fn at(data: &'a [u8], root: usize) -> Result<Self, ReaderError> {
        let soffset = read_u32(data, root)? as usize;
        let vtable_start = root.checked_sub(soffset).ok_or(ReaderError::Truncated {
            expected: soffset,
            found: root,
        })?;
        let vlen = read_u16(data, vtable_start)? as usize;
        if vtable_start + vlen > data.len() {
            return Err(ReaderError::Truncated {
                expected: vtable_start + vlen,
                found: data.len(),
            });
        }
        let nattrs = (vlen.saturating_sub(4)) / 2;
        Ok(Self {
            data,
            root,
            vlen,
            nattrs,
        })
    }

    fn field_offset(&self, field: usize) -> Result<Option<usize>, ReaderError> {
        if field >= self.nattrs {
            return Ok(None);
        }
        let vtable_start = self.root - self.vlen;
        let slot = read_u16(self.data, vtable_start + 4 + field * 2)? as usize;
        if slot == 0 {
            return Ok(None);
        }
        Ok(Some(self.root + slot))
    }

    /// `bool`, defaulting to `false` when absent.
    pub fn get_bool(&self, field: usize) -> Result<bool, ReaderError> {
        Ok(self.get_u8(field)? != 0)
    }

    /// `u8`, defaulting to `0` when absent.
    pub fn get_u8(&self, field: usize) -> Result<u8, ReaderError> {
        match self.field_offset(field)? {
            None => Ok(0),
            Some(pos) => read_u8(self.data, pos),
        }
    }

    /// `i16`, defaulting to `0` when absent.
    pub fn get_i16(&self, field: usize) -> Result<i16, ReaderError> {
        match self.field_offset(field)? {
            None => Ok(0),
            Some(pos) => Ok(read_u16(self.data, pos)? as i16),
        }
    }

    /// `i32`, defaulting to `0` when absent.
    pub fn get_i32(&self, field: usize) -> Result<i32, ReaderError> {
        match self.field_offset(field)? {
            None => Ok(0),
            Some(pos) => Ok(read_u32(self.data, pos)? as i32),
        }
    }

    /// `i64`, defaulting to `0` when absent.
    pub fn get_i64(&self, field: usize) -> Result<i64, ReaderError> {
        match self.field_offset(field)? {
            None => Ok(0),
            Some(pos) => Ok(read_u64(self.data, pos)? as i64),
        }
    }

    fn forward_target(&self, field: usize) -> Result<Option<usize>, ReaderError> {
        let Some(pos) = self.field_offset(field)? else {
            return Ok(None);
        };
        let rel = read_u32(self.data, pos)? as usize;
        Ok(Some(pos + rel))
    }

    /// A nested table field (`add_offset`), or `None` if absent.
    pub fn get_table(&self, field: usize) -> Result<Option<TableCursor<'a>>, ReaderError> {
        match self.forward_target(field)? {
            None => Ok(None),
            Some(target) => Ok(Some(TableCursor::at(self.data, target)?)),
        }
    }

    /// A UTF-8 string field (`add_string`), or `None` if absent.
    pub fn get_string(&self, field: usize) -> Result<Option<String>, ReaderError> {
        match self.forward_target(field)? {
            None => Ok(None),
            Some(target) => {
                let len = read_u32(self.data, target)? as usize;
                let start = target + 4;
                let bytes = slice(self.data, start, len)?;
                Ok(Some(std::str::from_utf8(bytes)?.to_string()))
            }
        }
    }

    /// A raw binary field (`add_binary`), or `None` if absent.
    pub fn get_binary(&self, field: usize) -> Result<Option<&'a [u8]>, ReaderError> {
        match self.forward_target(field)? {
            None => Ok(None),
            Some(target) => {
                let len = read_u32(self.data, target)? as usize;
                let start = target + 4;
                Ok(Some(slice(self.data, start, len)?))
            }
        }
    }

    /// A vector of nested tables (`add_vector_of_tables`).
    pub fn get_vector_of_tables(&self, field: usize) -> Result<Vec<TableCursor<'a>>, ReaderError> {
        let Some(target) = self.forward_target(field)? else {
            return Ok(Vec::new());
        };
        let count = read_u32(self.data, target)? as usize;
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let slot = target + 4 + i * 4;
            let rel = read_u32(self.data, slot)? as usize;
            out.push(TableCursor::at(self.data, slot + rel)?);
        }
        Ok(out)
    }

    /// A vector of fixed-size plain structs (`add_struct_vector`): the raw
    /// packed bytes, `count * item_size` long.
    pub fn get_struct_vector(&self, field: usize, item_size: usize) -> Result<&'a [u8], ReaderError> {
        let Some(target) = self.forward_target(field)? else {
            return Ok(&[]);
        };
        let count = read_u32(self.data, target)? as usize;
        slice(self.data, target + 4, count * item_size)
    }
}

fn slice(data: &[u8], start: usize, len: usize) -> Result<&[u8], ReaderError> {
    data.get(start..start + len).ok_or(ReaderError::Truncated {
        expected: start + len,
        found: data.len(),
    })
}

fn read_u8(data: &[u8], pos: usize) -> Result<u8, ReaderError> {
    Ok(slice(data, pos, 1)?[0])
}

fn read_u16(data: &[u8], pos: usize) -> Result<u16, ReaderError> {
    Ok(u16::from_le_bytes(slice(data, pos, 2)?.try_into().expect("len checked")))
}

fn read_u32(data: &[u8], pos: usize) -> Result<u32, ReaderError> {
    Ok(u32::from_le_bytes(slice(data, pos, 4)?.try_into().expect("len checked")))
}

fn read_u64(data: &[u8], pos: usize) -> Result<u64, ReaderError> {
    Ok(u64::from_le_bytes(slice(data, pos, 8)?.try_into().expect("len checked")))
}
