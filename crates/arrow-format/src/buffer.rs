//! A one-way-growing byte region backed by an anonymous memory mapping.
//!
//! Column ingesters use one of these per logical region (validity bitmap,
//! values, variable-length extra bytes). The buffer never shrinks; `clear`
//! only resets the used-byte count so the mapping's capacity is reused
//! across record batches.

use std::io;

use memmap2::{MmapMut, MmapOptions};

/// Initial capacity for a freshly created [`GrowableBuffer`]: 2 MiB.
pub const INITIAL_CAPACITY: usize = 2 * 1024 * 1024;

/// A growable, page-backed byte buffer.
///
/// `usage` tracks how many of the mapped bytes are live; `capacity` is the
/// mapping's current size. Growth doubles the mapping (or grows to fit a
/// single oversized request) and copies the used prefix into the new
/// mapping.
pub struct GrowableBuffer {
    map: MmapMut,
    usage: usize,
}

impl GrowableBuffer {
    /// Create a new buffer with the default initial capacity.
    pub fn new() -> io::Result<Self> {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Create a new buffer with an explicit initial capacity.
    pub fn with_capacity(capacity: usize) -> io::Result<Self> {
        let capacity = capacity.max(1);
        // SAFETY: an anonymous mapping has no backing file and cannot alias
        // foreign memory; it is released when `map` is dropped.
        #[allow(unsafe_code)]
        let map = unsafe { MmapOptions::new().len(capacity).map_anon()? };
        Ok(Self { map, usage: 0 })
    }

    /// Number of live bytes currently stored.
    pub fn usage(&self) -> usize {
        self.usage
    }

    /// Current mapping capacity.
    pub fn capacity(&self) -> usize {
        self.map.len()
    }

    /// Live byte contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.map[..self.usage]
    }

    /// Ensure at least `additional` more bytes can be appended without a
    /// further grow.
    pub fn reserve(&mut self, additional: usize) -> io::Result<()> {
        let required = self.usage + additional;
        if required <= self.capacity() {
            return Ok(());
        }
        let mut new_capacity = self.capacity().max(INITIAL_CAPACITY);
        while new_capacity < required {
            new_capacity *= 2;
        }
        // SAFETY: same invariants as `with_capacity`.
        #[allow(unsafe_code)]
        let mut new_map = unsafe { MmapOptions::new().len(new_capacity).map_anon()? };
        new_map[..self.usage].copy_from_slice(&self.map[..self.usage]);
        self.map = new_map;
        Ok(())
    }

    /// Append raw bytes, growing the mapping if necessary.
    pub fn append(&mut self, src: &[u8]) -> io::Result<()> {
        self.reserve(src.len())?;
        let end = self.usage + src.len();
        self.map[self.usage..end].copy_from_slice(src);
        self.usage = end;
        Ok(())
    }

    /// Append `n` zero bytes, growing the mapping if necessary.
    pub fn append_zero(&mut self, n: usize) -> io::Result<()> {
        self.reserve(n)?;
        let end = self.usage + n;
        self.map[self.usage..end].fill(0);
        self.usage = end;
        Ok(())
    }

    /// Append a little-endian `u32`.
    pub fn append_u32_le(&mut self, v: u32) -> io::Result<()> {
        self.append(&v.to_le_bytes())
    }

    /// Set bit `i` (growing the bitmap region as needed), within a bitmap
    /// interpretation of this buffer's bytes.
    pub fn setbit(&mut self, i: usize) -> io::Result<()> {
        let byte = i / 8;
        if byte + 1 > self.usage {
            self.append_zero(byte + 1 - self.usage)?;
        }
        self.map[byte] |= 1 << (i % 8);
        Ok(())
    }

    /// Clear bit `i` (growing the bitmap region as needed).
    pub fn clrbit(&mut self, i: usize) -> io::Result<()> {
        let byte = i / 8;
        if byte + 1 > self.usage {
            self.append_zero(byte + 1 - self.usage)?;
        }
        self.map[byte] &= !(1 << (i % 8));
        Ok(())
    }

    /// Reset the used-byte count to zero; capacity is retained.
    pub fn clear(&mut self) {
        self.usage = 0;
    }

    /// Roll the used-byte count back to an earlier value, discarding
    /// anything appended since. Used to undo a row's writes across every
    /// column when a batch-overflow retry needs the row back out.
    ///
    /// # Panics
    ///
    /// Panics if `usage` is greater than the buffer's current usage.
    pub fn truncate(&mut self, usage: usize) {
        assert!(usage <= self.usage, "truncate target exceeds current usage");
        self.usage = usage;
    }
}

/// Round `n` up to the next multiple of 8, the alignment the Arrow IPC
/// format requires for both metadata and body regions.
pub fn align8(n: usize) -> usize {
    (n + 7) & !7
}

/// Round `n` up to the next multiple of 4.
pub fn align4(n: usize) -> usize {
    (n + 3) & !3
}
