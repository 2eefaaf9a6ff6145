//! Decoding the `numeric` wire format into a fixed-point `i128`.
//!
//! The wire format is a header of four `i16` fields followed by `ndigits`
//! base-10000 digits: `{ndigits, weight, sign, dscale, digit[0..ndigits]}`.
//! `weight` is the base-10000 exponent of `digit[0]`; digits after the
//! integer part (`i > weight`) are fractional.

use bytes::Buf;

use crate::error::IngestError;

const NBASE: i64 = 10_000;
const DEC_DIGITS: u32 = 4;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;

/// Decode a `numeric` wire payload into an `i128` scaled by `10^target_scale`.
///
/// Fractional digits beyond `target_scale` are truncated, not rounded,
/// matching the source format's own emit-time behavior.
pub fn decode_numeric(mut buf: &[u8], target_scale: u16) -> Result<i128, IngestError> {
    if buf.len() < 8 {
        return Err(IngestError::TruncatedNumeric {
            expected: 8,
            found: buf.len(),
        });
    }
    let ndigits_raw = buf.get_i16();
    let weight = i32::from(buf.get_i16());
    let sign = buf.get_u16();
    let _dscale = buf.get_u16();

    if sign == NUMERIC_NAN {
        return Err(IngestError::DecimalNaN);
    }
    if ndigits_raw < 0 {
        return Err(IngestError::CompositeCorruption);
    }
    let ndigits = ndigits_raw as usize;

    let expected = ndigits * 2;
    if buf.len() < expected {
        return Err(IngestError::TruncatedNumeric {
            expected: 8 + expected,
            found: 8 + buf.len(),
        });
    }

    let mut digits = Vec::with_capacity(ndigits);
    for _ in 0..ndigits {
        let d = i32::from(buf.get_i16());
        if !(0..NBASE as i32).contains(&d) {
            return Err(IngestError::DecimalDigitOutOfRange { digit: d });
        }
        digits.push(i64::from(d));
    }

    let ndigits_i32 = ndigits as i32;
    let mut i = 0i32;
    let mut int_part: i128 = 0;
    while i <= weight && i < ndigits_i32 {
        int_part = int_part * i128::from(NBASE) + i128::from(digits[i as usize]);
        i += 1;
    }
    while i <= weight {
        int_part *= i128::from(NBASE);
        i += 1;
    }

    let mut frac_digits: i128 = 0;
    let mut frac_chunks: u32 = 0;
    while i < ndigits_i32 {
        frac_digits = frac_digits * i128::from(NBASE) + i128::from(digits[i as usize]);
        frac_chunks += 1;
        i += 1;
    }
    let ascale = frac_chunks * DEC_DIGITS;
    let scaled_frac = rescale(frac_digits, ascale, u32::from(target_scale));

    let scale_factor = 10i128.pow(u32::from(target_scale));
    let mut value = int_part * scale_factor + scaled_frac;
    if sign == NUMERIC_NEG {
        value = -value;
    }
    Ok(value)
}

fn rescale(value: i128, from_scale: u32, to_scale: u32) -> i128 {
    match from_scale.cmp(&to_scale) {
        std::cmp::Ordering::Equal => value,
        std::cmp::Ordering::Less => value * 10i128.pow(to_scale - from_scale),
        std::cmp::Ordering::Greater => value / 10i128.pow(from_scale - to_scale),
    }
}
