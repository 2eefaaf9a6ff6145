//! Synthetic wire-row builders.
//!
//! Each [`ScalarValue`] variant encodes to the same big-endian wire bytes
//! `pg_row_ingest::ColumnIngester::put_value` expects, so a [`RowBuilder`]'s
//! output can be fed straight into `ColumnIngester` or `ArrowFileWriter`
//! without going through any actual database driver.

use bytes::{BufMut, BytesMut};
use chrono::NaiveDate;

/// Source epoch for `date`/`timestamp` wire values (2000-01-01, *not* Unix).
fn source_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).expect("valid date")
}

/// Build a [`ScalarValue::Date`] from a calendar date, converting to the
/// source wire epoch's day count.
#[must_use]
pub fn date_from_ymd(year: i32, month: u32, day: u32) -> ScalarValue {
    let date = NaiveDate::from_ymd_opt(year, month, day).expect("valid date");
    ScalarValue::Date((date - source_epoch()).num_days() as i32)
}

/// Build a [`ScalarValue::Timestamp`] from a calendar date and time-of-day,
/// converting to the source wire epoch's microsecond count.
#[must_use]
pub fn timestamp_from_ymd_hms(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> ScalarValue {
    let datetime = NaiveDate::from_ymd_opt(year, month, day)
        .expect("valid date")
        .and_hms_opt(hour, min, sec)
        .expect("valid time");
    let epoch = source_epoch().and_hms_opt(0, 0, 0).expect("valid time");
    let micros = (datetime - epoch).num_microseconds().expect("fits in i64 microseconds");
    ScalarValue::Timestamp(micros)
}

/// One column value, before wire-encoding. `Null` carries no bytes; every
/// other variant encodes to the big-endian layout the real wire format uses.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    /// SQL NULL.
    Null,
    /// `bool`.
    Bool(bool),
    /// `int2`/`int4`/`int8`, tagged with its width in bytes (2, 4, or 8).
    Int(i64, u8),
    /// `float4`/`float8`, tagged with its width in bytes (4 or 8).
    Float(f64, u8),
    /// `text`/`varchar`/`bpchar`.
    Text(String),
    /// Arbitrary `bytea`.
    Binary(Vec<u8>),
    /// `numeric`, as an unscaled integer plus its number of decimal places.
    /// `Numeric(123_400, 2)` encodes `1234.00`.
    Numeric(i128, u16),
    /// `date`, as days since 2000-01-01 (the source wire epoch, *not* Unix).
    Date(i32),
    /// `timestamp`/`timestamptz`, as microseconds since 2000-01-01.
    Timestamp(i64),
    /// A composite (row) value: one `(atttypid, value)` pair per subfield,
    /// in declaration order.
    Composite(Vec<(u32, ScalarValue)>),
}

impl ScalarValue {
    /// Encode this value to its wire bytes, or `None` for `Null`.
    #[must_use]
    pub fn encode(&self) -> Option<Vec<u8>> {
        match self {
            Self::Null => None,
            Self::Bool(v) => Some(vec![u8::from(*v)]),
            Self::Int(v, width) => Some(match width {
                2 => (*v as i16).to_be_bytes().to_vec(),
                4 => (*v as i32).to_be_bytes().to_vec(),
                8 => v.to_be_bytes().to_vec(),
                other => panic!("unsupported integer width {other}"),
            }),
            Self::Float(v, width) => Some(match width {
                4 => (*v as f32).to_be_bytes().to_vec(),
                8 => v.to_be_bytes().to_vec(),
                other => panic!("unsupported float width {other}"),
            }),
            Self::Text(s) => Some(s.as_bytes().to_vec()),
            Self::Binary(b) => Some(b.clone()),
            Self::Numeric(unscaled, scale) => Some(encode_numeric(*unscaled, *scale)),
            Self::Date(days) => Some(days.to_be_bytes().to_vec()),
            Self::Timestamp(micros) => Some(micros.to_be_bytes().to_vec()),
            Self::Composite(fields) => Some(encode_composite(fields)),
        }
    }
}

/// Encode an unscaled integer as the source database's `numeric` wire
/// format: a header of four `i16` fields followed by base-10000 digit
/// groups, matching what `pg_row_ingest::decode_numeric` expects.
///
/// `unscaled` is the value already scaled by `10^scale` (so
/// `encode_numeric(123_400, 2)` encodes `1234.00`); decoding the result with
/// `target_scale == scale` reproduces `unscaled` exactly.
#[must_use]
pub fn encode_numeric(unscaled: i128, scale: u16) -> Vec<u8> {
    let negative = unscaled < 0;
    let magnitude = unscaled.unsigned_abs();

    let mut digits: Vec<u16> = Vec::new();
    let weight;

    if magnitude == 0 {
        weight = 0;
    } else {
        let scale_pow = 10u128.pow(u32::from(scale));
        let int_digits = magnitude / scale_pow;
        let frac_part = magnitude % scale_pow;

        let ascale = u32::from(scale.div_ceil(4)) * 4;
        let frac_chunks = (ascale / 4) as usize;
        let frac_digits_val = frac_part * 10u128.pow(ascale - u32::from(scale));

        let mut int_groups = Vec::new();
        let mut v = int_digits;
        while v > 0 {
            int_groups.push((v % 10_000) as u16);
            v /= 10_000;
        }
        int_groups.reverse();

        let mut frac_groups = vec![0u16; frac_chunks];
        let mut v = frac_digits_val;
        for group in frac_groups.iter_mut().rev() {
            *group = (v % 10_000) as u16;
            v /= 10_000;
        }

        weight = int_groups.len() as i32 - 1;
        digits = int_groups;
        digits.extend(frac_groups);
    }

    let mut out = BytesMut::new();
    out.put_i16(digits.len() as i16);
    out.put_i16(weight as i16);
    out.put_u16(if negative { 0x4000 } else { 0x0000 });
    out.put_u16(scale);
    for g in digits {
        out.put_i16(g as i16);
    }
    out.to_vec()
}

/// Encode a composite (row) value as `{i32 n_fields, repeated: {i32
/// atttypid, i32 attlen, bytes}}`, `attlen == -1` marking a null field.
#[must_use]
pub fn encode_composite(fields: &[(u32, ScalarValue)]) -> Vec<u8> {
    let mut out = BytesMut::new();
    out.put_i32(fields.len() as i32);
    for (atttypid, value) in fields {
        out.put_i32(*atttypid as i32);
        match value.encode() {
            None => {
                out.put_i32(-1);
            }
            Some(bytes) => {
                out.put_i32(bytes.len() as i32);
                out.put_slice(&bytes);
            }
        }
    }
    out.to_vec()
}

/// Accumulates rows of [`ScalarValue`]s and hands back the `Option<&[u8]>`
/// slices `ArrowFileWriter::append_row` expects, one row at a time.
///
/// Owns the encoded bytes so the borrowed slices handed to the writer stay
/// valid for the row's lifetime.
#[derive(Default)]
pub struct RowBuilder {
    rows: Vec<Vec<Option<Vec<u8>>>>,
}

impl RowBuilder {
    /// Start with no rows.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one row of column values.
    pub fn push_row(&mut self, values: Vec<ScalarValue>) -> &mut Self {
        self.rows.push(values.iter().map(ScalarValue::encode).collect());
        self
    }

    /// Borrow every row as `Option<&[u8]>` slices, suitable for
    /// `ArrowFileWriter::append_row`/`append`.
    #[must_use]
    pub fn as_rows(&self) -> Vec<Vec<Option<&[u8]>>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|v| v.as_deref()).collect())
            .collect()
    }

    /// Number of rows accumulated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows have been accumulated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_round_trips_via_be_bytes() {
        let encoded = ScalarValue::Int(42, 4).encode().unwrap();
        assert_eq!(i32::from_be_bytes(encoded.try_into().unwrap()), 42);
    }

    #[test]
    fn numeric_encodes_integer_with_zero_scale() {
        let wire = encode_numeric(1234, 0);
        // ndigits=1, weight=0, sign=0, dscale=0, digit=1234
        assert_eq!(&wire[0..2], &1i16.to_be_bytes());
        assert_eq!(&wire[2..4], &0i16.to_be_bytes());
        assert_eq!(&wire[8..10], &1234i16.to_be_bytes());
    }

    #[test]
    fn numeric_negative_sets_sign_bit() {
        let wire = encode_numeric(-500, 2);
        assert_eq!(u16::from_be_bytes(wire[4..6].try_into().unwrap()), 0x4000);
    }

    #[test]
    fn composite_encodes_field_count_and_lengths() {
        let fields = vec![(23u32, ScalarValue::Int(1, 4)), (23u32, ScalarValue::Null)];
        let wire = encode_composite(&fields);
        assert_eq!(i32::from_be_bytes(wire[0..4].try_into().unwrap()), 2);
        // second field's attlen is -1 (null)
        let second_field_start = 4 + 8 + 4; // n_fields + (atttypid+attlen+4 bytes value) + atttypid
        assert_eq!(
            i32::from_be_bytes(wire[second_field_start..second_field_start + 4].try_into().unwrap()),
            -1
        );
    }

    #[test]
    fn numeric_round_trips_through_decode_numeric() {
        // 12345.67 scaled by 10^2.
        let wire = encode_numeric(1_234_567, 2);
        assert_eq!(pg_row_ingest::decode_numeric(&wire, 2).unwrap(), 1_234_567);
    }

    #[test]
    fn date_from_ymd_matches_source_epoch_offset() {
        // The source epoch day itself encodes as 0.
        assert_eq!(date_from_ymd(2000, 1, 1), ScalarValue::Date(0));
        assert_eq!(date_from_ymd(2000, 1, 2), ScalarValue::Date(1));
    }

    #[test]
    fn timestamp_from_ymd_hms_matches_source_epoch_offset() {
        assert_eq!(timestamp_from_ymd_hms(2000, 1, 1, 0, 0, 0), ScalarValue::Timestamp(0));
        assert_eq!(
            timestamp_from_ymd_hms(2000, 1, 1, 0, 0, 1),
            ScalarValue::Timestamp(1_000_000)
        );
    }

    #[test]
    fn row_builder_preserves_null_as_none() {
        let mut builder = RowBuilder::new();
        builder.push_row(vec![ScalarValue::Int(1, 4), ScalarValue::Null]);
        let rows = builder.as_rows();
        assert_eq!(rows.len(), 1);
        assert!(rows[0][1].is_none());
    }
}
