#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pg_row_ingest::decode_numeric;

/// A `numeric` wire payload plus the target scale the caller is resolving
/// the column to, mirroring how `ColumnIngester::put_value` invokes this.
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    target_scale: u16,
    wire: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    // Must only ever return Err or a valid i128, never panic, regardless of
    // how the header or digit groups are corrupted.
    let _ = decode_numeric(&input.wire, input.target_scale);
});
