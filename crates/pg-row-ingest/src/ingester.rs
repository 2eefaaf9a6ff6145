//! Per-column ingestion: turning a decoded wire value into the right
//! validity-bitmap / values / extra-bytes writes for a column's type.

use std::io;

use arrow_format::{DataType, DateUnit, FloatPrecision, GrowableBuffer};
use arrow_types::ResolvedColumn;
use bytes::Buf;

use crate::datetime::{rebase_date_to_unix, rebase_timestamp_to_unix};
use crate::decimal::decode_numeric;
use crate::error::IngestError;
use crate::stats::RunningStats;

/// A point-in-time snapshot of a [`ColumnIngester`]'s region sizes,
/// recursively including any struct subfields, taken before appending a
/// row so the append can be undone if it overflows the batch threshold.
#[derive(Debug, Clone)]
pub struct ColumnSnapshot {
    row_count: usize,
    null_count: usize,
    nullmap_usage: usize,
    values_usage: usize,
    extra_usage: Option<usize>,
    children: Vec<ColumnSnapshot>,
}

/// Per-column ingestion state: one instance per column (recursively, one
/// per struct subfield), holding the validity bitmap, the values region,
/// and — for variable-length columns — the extra-bytes region.
pub struct ColumnIngester {
    name: String,
    data_type: DataType,
    source_type_id: u32,
    row_count: usize,
    null_count: usize,
    nullmap: GrowableBuffer,
    values: GrowableBuffer,
    extra: Option<GrowableBuffer>,
    stats: Option<RunningStats>,
    children: Vec<ColumnIngester>,
}

impl ColumnIngester {
    /// Build a fresh ingester tree from a resolved column, recursing into
    /// `Struct` subfields, with each region's buffer starting at the
    /// default initial capacity ([`arrow_format::buffer::INITIAL_CAPACITY`]).
    pub fn new(resolved: &ResolvedColumn) -> io::Result<Self> {
        Self::with_capacity(resolved, arrow_format::buffer::INITIAL_CAPACITY)
    }

    /// As [`ColumnIngester::new`], but with an explicit initial capacity for
    /// every region's buffer (propagated to struct subfields). Used by
    /// [`crate::writer::ArrowFileWriter`] to honor
    /// `EncoderConfig::initial_buffer_capacity`.
    pub fn with_capacity(resolved: &ResolvedColumn, capacity: usize) -> io::Result<Self> {
        let extra = match resolved.data_type {
            DataType::Utf8 | DataType::Binary => Some(GrowableBuffer::with_capacity(capacity)?),
            _ => None,
        };
        let mut values = GrowableBuffer::with_capacity(capacity)?;
        if matches!(resolved.data_type, DataType::Utf8 | DataType::Binary) {
            values.append_u32_le(0)?;
        }
        let children = resolved
            .children
            .iter()
            .map(|child| ColumnIngester::with_capacity(child, capacity))
            .collect::<io::Result<Vec<_>>>()?;
        Ok(Self {
            name: resolved.name.clone(),
            data_type: resolved.data_type.clone(),
            source_type_id: resolved.source_type_id,
            row_count: 0,
            null_count: 0,
            nullmap: GrowableBuffer::with_capacity(capacity)?,
            values,
            extra,
            stats: RunningStats::for_type(&resolved.data_type),
            children,
        })
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The column's resolved type.
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Number of rows ingested so far.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of nulls ingested so far.
    pub fn null_count(&self) -> usize {
        self.null_count
    }

    /// The validity bitmap region.
    pub fn nullmap(&self) -> &GrowableBuffer {
        &self.nullmap
    }

    /// The values region (offsets, for `Utf8`/`Binary`; inline values for
    /// everything else; empty for `Struct`).
    pub fn values(&self) -> &GrowableBuffer {
        &self.values
    }

    /// The extra-bytes region, present only for `Utf8`/`Binary` columns.
    pub fn extra(&self) -> Option<&GrowableBuffer> {
        self.extra.as_ref()
    }

    /// Running min/max, present only for signed-integer and
    /// floating-point columns.
    pub fn stats(&self) -> Option<&RunningStats> {
        self.stats.as_ref()
    }

    /// Resolved child ingesters, populated only for `Struct` columns.
    pub fn children(&self) -> &[ColumnIngester] {
        &self.children
    }

    /// Undo every row appended since this snapshot was taken, across this
    /// column and, recursively, any struct subfields. Used to retry a row
    /// that triggered a batch-size overflow.
    pub fn truncate_to(&mut self, snapshot: &ColumnSnapshot) {
        self.row_count = snapshot.row_count;
        self.null_count = snapshot.null_count;
        self.nullmap.truncate(snapshot.nullmap_usage);
        self.values.truncate(snapshot.values_usage);
        if let (Some(extra), Some(usage)) = (&mut self.extra, snapshot.extra_usage) {
            extra.truncate(usage);
        }
        for (child, child_snapshot) in self.children.iter_mut().zip(snapshot.children.iter()) {
            child.truncate_to(child_snapshot);
        }
    }

    /// A snapshot of this column's region sizes, and recursively of any
    /// struct subfields, for later `truncate_to`.
    pub fn snapshot(&self) -> ColumnSnapshot {
        ColumnSnapshot {
            row_count: self.row_count,
            null_count: self.null_count,
            nullmap_usage: self.nullmap.usage(),
            values_usage: self.values.usage(),
            extra_usage: self.extra.as_ref().map(GrowableBuffer::usage),
            children: self.children.iter().map(ColumnIngester::snapshot).collect(),
        }
    }

    /// Reset this column (and, recursively, any struct subfields) back to
    /// its freshly-created state: zero rows, zero nulls, empty nullmap, and
    /// — for `Utf8`/`Binary` — the values region holding just the
    /// pre-appended leading zero offset. Buffer capacity is retained.
    ///
    /// Called after a record batch's buffers have been written out, so the
    /// next batch starts from the same state `ColumnIngester::new` left it
    /// in.
    pub fn reset(&mut self) -> io::Result<()> {
        self.row_count = 0;
        self.null_count = 0;
        self.nullmap.clear();
        self.values.clear();
        if matches!(self.data_type, DataType::Utf8 | DataType::Binary) {
            self.values.append_u32_le(0)?;
        }
        if let Some(extra) = &mut self.extra {
            extra.clear();
        }
        for child in &mut self.children {
            child.reset()?;
        }
        Ok(())
    }

    /// Ingest one row's decoded wire value: `None` for SQL NULL, `Some`
    /// for the value's raw (big-endian) wire bytes.
    pub fn put_value(&mut self, addr: Option<&[u8]>) -> Result<(), IngestError> {
        let row_index = self.row_count;
        match addr {
            None => self.put_null(row_index)?,
            Some(bytes) => self.put_present(row_index, bytes)?,
        }
        self.row_count += 1;
        Ok(())
    }

    fn put_null(&mut self, row_index: usize) -> Result<(), IngestError> {
        self.nullmap.clrbit(row_index)?;
        self.null_count += 1;
        match &self.data_type {
            DataType::Utf8 | DataType::Binary => {
                let offset = self.extra.as_ref().map_or(0, GrowableBuffer::usage) as u32;
                self.values.append_u32_le(offset)?;
            }
            DataType::Struct => {
                for child in &mut self.children {
                    child.put_value(None)?;
                }
            }
            DataType::List => return Err(IngestError::ListNotImplemented),
            other => {
                let width = inline_width(other)?;
                self.values.append_zero(width)?;
            }
        }
        Ok(())
    }

    fn put_present(&mut self, row_index: usize, bytes: &[u8]) -> Result<(), IngestError> {
        self.nullmap.setbit(row_index)?;
        match self.data_type.clone() {
            DataType::Bool => {
                expect_size(bytes, 1)?;
                self.values.append(bytes)?;
            }
            DataType::Int { bit_width, is_signed } => {
                let width = usize::from(bit_width / 8);
                expect_size(bytes, width)?;
                append_be_to_le(&mut self.values, bytes)?;
                if is_signed {
                    if let Some(stats) = &mut self.stats {
                        stats.update_int(decode_be_signed(bytes));
                    }
                }
            }
            DataType::FloatingPoint(precision) => {
                let width = match precision {
                    FloatPrecision::Half => 2,
                    FloatPrecision::Single => 4,
                    FloatPrecision::Double => 8,
                };
                expect_size(bytes, width)?;
                append_be_to_le(&mut self.values, bytes)?;
                if let Some(stats) = &mut self.stats {
                    let v = match precision {
                        FloatPrecision::Single => {
                            f64::from(f32::from_be_bytes(bytes.try_into().expect("size checked above")))
                        }
                        FloatPrecision::Double => f64::from_be_bytes(bytes.try_into().expect("size checked above")),
                        FloatPrecision::Half => 0.0,
                    };
                    stats.update_float(v);
                }
            }
            DataType::Decimal { scale, .. } => {
                let value = decode_numeric(bytes, scale)?;
                self.values.append(&value.to_le_bytes())?;
            }
            DataType::Date(DateUnit::Day) => {
                expect_size(bytes, 4)?;
                let raw = i32::from_be_bytes(bytes.try_into().expect("size checked above"));
                let rebased = rebase_date_to_unix(raw);
                self.values.append(&rebased.to_le_bytes())?;
            }
            DataType::Time { .. } => {
                expect_size(bytes, 8)?;
                append_be_to_le(&mut self.values, bytes)?;
            }
            DataType::Timestamp { .. } => {
                expect_size(bytes, 8)?;
                let raw = i64::from_be_bytes(bytes.try_into().expect("size checked above"));
                let rebased = rebase_timestamp_to_unix(raw);
                self.values.append(&rebased.to_le_bytes())?;
            }
            DataType::Utf8 | DataType::Binary => {
                let extra = self
                    .extra
                    .as_mut()
                    .expect("Utf8/Binary ingesters always carry an extra buffer");
                extra.append(bytes)?;
                self.values.append_u32_le(extra.usage() as u32)?;
            }
            DataType::Struct => {
                let fields = decode_composite_fields(bytes, &self.children, self.source_type_id)?;
                for (child, field) in self.children.iter_mut().zip(fields) {
                    child.put_value(field)?;
                }
            }
            DataType::List => return Err(IngestError::ListNotImplemented),
            other => return Err(IngestError::UnsupportedColumnType(other)),
        }
        Ok(())
    }
}

fn expect_size(bytes: &[u8], expected: usize) -> Result<(), IngestError> {
    if bytes.len() != expected {
        return Err(IngestError::UnexpectedValueSize {
            expected,
            found: bytes.len(),
        });
    }
    Ok(())
}

fn append_be_to_le(buf: &mut GrowableBuffer, bytes: &[u8]) -> Result<(), IngestError> {
    match bytes.len() {
        1 => buf.append(bytes)?,
        2 => buf.append(&i16::from_be_bytes(bytes.try_into().expect("len checked")).to_le_bytes())?,
        4 => buf.append(&i32::from_be_bytes(bytes.try_into().expect("len checked")).to_le_bytes())?,
        8 => buf.append(&i64::from_be_bytes(bytes.try_into().expect("len checked")).to_le_bytes())?,
        other => {
            return Err(IngestError::UnexpectedValueSize {
                expected: other,
                found: other,
            })
        }
    }
    Ok(())
}

fn decode_be_signed(bytes: &[u8]) -> i64 {
    match bytes.len() {
        2 => i64::from(i16::from_be_bytes(bytes.try_into().expect("len checked"))),
        4 => i64::from(i32::from_be_bytes(bytes.try_into().expect("len checked"))),
        8 => i64::from_be_bytes(bytes.try_into().expect("len checked")),
        _ => 0,
    }
}

fn inline_width(data_type: &DataType) -> Result<usize, IngestError> {
    Ok(match data_type {
        DataType::Bool => 1,
        DataType::Int { bit_width, .. } => usize::from(*bit_width / 8),
        DataType::FloatingPoint(FloatPrecision::Half) => 2,
        DataType::FloatingPoint(FloatPrecision::Single) => 4,
        DataType::FloatingPoint(FloatPrecision::Double) => 8,
        DataType::Decimal { .. } => 16,
        DataType::Date(DateUnit::Day) => 4,
        DataType::Date(DateUnit::Millisecond) => 8,
        DataType::Time { bit_width, .. } => usize::from(*bit_width / 8),
        DataType::Timestamp { .. } => 8,
        other => return Err(IngestError::UnsupportedColumnType(other.clone())),
    })
}

/// Split a composite (row-type) wire payload into one optional slice per
/// child column, validating the embedded field count and type ids against
/// the resolved schema.
///
/// Wire format: `{int32 n_fields, repeated: {int32 atttypid, int32 attlen,
/// bytes value}}`, where `attlen == -1` marks a null field.
fn decode_composite_fields<'a>(
    addr: &'a [u8],
    children: &[ColumnIngester],
    _composite_type_id: u32,
) -> Result<Vec<Option<&'a [u8]>>, IngestError> {
    let mut cursor = addr;
    if cursor.len() < 4 {
        return Err(IngestError::CompositeCorruption);
    }
    let n_fields = cursor.get_i32();
    if n_fields < 0 || n_fields as usize != children.len() {
        return Err(IngestError::CompositeCorruption);
    }

    let mut fields = Vec::with_capacity(children.len());
    for child in children {
        if cursor.len() < 8 {
            return Err(IngestError::CompositeCorruption);
        }
        let atttypid = cursor.get_i32() as u32;
        if atttypid != child.source_type_id {
            return Err(IngestError::CompositeCorruption);
        }
        let attlen = cursor.get_i32();
        if attlen < 0 {
            fields.push(None);
            continue;
        }
        let len = attlen as usize;
        if cursor.len() < len {
            return Err(IngestError::CompositeCorruption);
        }
        let (value, rest) = cursor.split_at(len);
        cursor = rest;
        fields.push(Some(value));
    }
    if !cursor.is_empty() {
        return Err(IngestError::CompositeCorruption);
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_types::resolve::DEFAULT_DECIMAL_SCALE;

    fn resolved(name: &str, data_type: DataType) -> ResolvedColumn {
        ResolvedColumn {
            name: name.to_string(),
            data_type,
            source_type_id: 0,
            children: Vec::new(),
        }
    }

    #[test]
    fn int4_round_trips_big_endian_to_little_endian() {
        let resolved = resolved(
            "n",
            DataType::Int {
                bit_width: 32,
                is_signed: true,
            },
        );
        let mut ingester = ColumnIngester::new(&resolved).unwrap();
        ingester.put_value(Some(&42i32.to_be_bytes())).unwrap();
        assert_eq!(ingester.values().as_slice(), &42i32.to_le_bytes());
        assert_eq!(ingester.row_count(), 1);
        assert_eq!(ingester.null_count(), 0);
        let stats = ingester.stats().unwrap();
        assert_eq!(*stats, RunningStats::Int { min: 42, max: 42 });
    }

    #[test]
    fn null_row_clears_bitmap_and_advances_row_count() {
        let resolved = resolved("n", DataType::Int { bit_width: 32, is_signed: true });
        let mut ingester = ColumnIngester::new(&resolved).unwrap();
        ingester.put_value(None).unwrap();
        assert_eq!(ingester.row_count(), 1);
        assert_eq!(ingester.null_count(), 1);
        assert_eq!(ingester.values().as_slice(), &[0, 0, 0, 0]);
    }

    #[test]
    fn utf8_appends_cumulative_offsets() {
        let resolved = resolved("s", DataType::Utf8);
        let mut ingester = ColumnIngester::new(&resolved).unwrap();
        ingester.put_value(Some(b"hi")).unwrap();
        ingester.put_value(Some(b"there")).unwrap();
        let offsets = ingester.values().as_slice();
        assert_eq!(offsets.len(), 12); // 3 u32 offsets: 0, 2, 7
        assert_eq!(u32::from_le_bytes(offsets[0..4].try_into().unwrap()), 0);
        assert_eq!(u32::from_le_bytes(offsets[4..8].try_into().unwrap()), 2);
        assert_eq!(u32::from_le_bytes(offsets[8..12].try_into().unwrap()), 7);
        assert_eq!(ingester.extra().unwrap().as_slice(), b"hithere");
    }

    #[test]
    fn unexpected_width_is_rejected() {
        let resolved = resolved("n", DataType::Int { bit_width: 32, is_signed: true });
        let mut ingester = ColumnIngester::new(&resolved).unwrap();
        let err = ingester.put_value(Some(&[0u8, 1, 2])).unwrap_err();
        assert!(matches!(err, IngestError::UnexpectedValueSize { expected: 4, found: 3 }));
    }

    #[test]
    fn list_column_is_not_implemented() {
        let resolved = resolved("tags", DataType::List);
        let mut ingester = ColumnIngester::new(&resolved).unwrap();
        let err = ingester.put_value(Some(b"x")).unwrap_err();
        assert!(matches!(err, IngestError::ListNotImplemented));
    }

    #[test]
    fn decimal_uses_resolved_scale() {
        let resolved = resolved(
            "amount",
            DataType::Decimal {
                precision: 30,
                scale: DEFAULT_DECIMAL_SCALE,
            },
        );
        let mut ingester = ColumnIngester::new(&resolved).unwrap();
        let wire = {
            let mut out = Vec::new();
            out.extend_from_slice(&1i16.to_be_bytes()); // ndigits
            out.extend_from_slice(&0i16.to_be_bytes()); // weight
            out.extend_from_slice(&0u16.to_be_bytes()); // sign
            out.extend_from_slice(&0u16.to_be_bytes()); // dscale
            out.extend_from_slice(&1234i16.to_be_bytes());
            out
        };
        ingester.put_value(Some(&wire)).unwrap();
        let stored = i128::from_le_bytes(ingester.values().as_slice().try_into().unwrap());
        assert_eq!(stored, 1234 * 10i128.pow(u32::from(DEFAULT_DECIMAL_SCALE)));
    }

    #[test]
    fn composite_validates_field_count_and_type_ids() {
        let mut point = resolved("point", DataType::Struct);
        point.source_type_id = 9999;
        point.children = vec![
            {
                let mut c = resolved("x", DataType::Int { bit_width: 32, is_signed: true });
                c.source_type_id = 23;
                c
            },
            {
                let mut c = resolved("y", DataType::Int { bit_width: 32, is_signed: true });
                c.source_type_id = 23;
                c
            },
        ];
        let mut ingester = ColumnIngester::new(&point).unwrap();

        let mut wire = Vec::new();
        wire.extend_from_slice(&2i32.to_be_bytes());
        wire.extend_from_slice(&23i32.to_be_bytes());
        wire.extend_from_slice(&4i32.to_be_bytes());
        wire.extend_from_slice(&1i32.to_be_bytes());
        wire.extend_from_slice(&23i32.to_be_bytes());
        wire.extend_from_slice(&4i32.to_be_bytes());
        wire.extend_from_slice(&2i32.to_be_bytes());
        ingester.put_value(Some(&wire)).unwrap();

        assert_eq!(ingester.children()[0].values().as_slice(), &1i32.to_le_bytes());
        assert_eq!(ingester.children()[1].values().as_slice(), &2i32.to_le_bytes());
    }

    #[test]
    fn truncate_to_undoes_struct_children_row_counts() {
        let mut point = resolved("point", DataType::Struct);
        point.children = vec![{
            let mut c = resolved("x", DataType::Int { bit_width: 32, is_signed: true });
            c.source_type_id = 23;
            c
        }];
        let mut ingester = ColumnIngester::new(&point).unwrap();

        let row = |x: i32| {
            let mut wire = Vec::new();
            wire.extend_from_slice(&1i32.to_be_bytes());
            wire.extend_from_slice(&23i32.to_be_bytes());
            wire.extend_from_slice(&4i32.to_be_bytes());
            wire.extend_from_slice(&x.to_be_bytes());
            wire
        };

        ingester.put_value(Some(&row(1))).unwrap();
        let snapshot = ingester.snapshot();
        ingester.put_value(Some(&row(2))).unwrap();
        assert_eq!(ingester.children()[0].row_count(), 2);

        ingester.truncate_to(&snapshot);
        assert_eq!(ingester.row_count(), 1, "parent row_count undone");
        assert_eq!(
            ingester.children()[0].row_count(),
            1,
            "struct child row_count must be undone alongside its parent, not left at the overflowing row"
        );
        assert_eq!(ingester.children()[0].values().as_slice(), &1i32.to_le_bytes());
    }

    #[test]
    fn composite_field_count_mismatch_is_corruption() {
        let mut point = resolved("point", DataType::Struct);
        point.children = vec![{
            let mut c = resolved("x", DataType::Int { bit_width: 32, is_signed: true });
            c.source_type_id = 23;
            c
        }];
        let mut ingester = ColumnIngester::new(&point).unwrap();
        let mut wire = Vec::new();
        wire.extend_from_slice(&2i32.to_be_bytes());
        let err = ingester.put_value(Some(&wire)).unwrap_err();
        assert!(matches!(err, IngestError::CompositeCorruption));
    }

    proptest::proptest! {
        /// For any sequence of null/non-null text rows, the emitted offsets
        /// buffer has `row_count + 1` entries, is non-decreasing, and its
        /// last entry equals `extra`'s final length.
        #[test]
        fn utf8_offsets_are_monotonic_and_match_extra_length(rows in proptest::collection::vec(proptest::option::of(".{0,12}"), 0..32)) {
            let resolved = resolved("s", DataType::Utf8);
            let mut ingester = ColumnIngester::new(&resolved).unwrap();
            for row in &rows {
                ingester.put_value(row.as_ref().map(|s| s.as_bytes())).unwrap();
            }

            let values = ingester.values().as_slice();
            proptest::prop_assert_eq!(values.len(), 4 * (rows.len() + 1));
            let offsets: Vec<u32> = values
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
                .collect();
            proptest::prop_assert_eq!(offsets[0], 0);
            for w in offsets.windows(2) {
                proptest::prop_assert!(w[1] >= w[0]);
            }
            let extra_len = ingester.extra().unwrap().usage() as u32;
            proptest::prop_assert_eq!(*offsets.last().unwrap(), extra_len);
        }
    }
}
