#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pg2arrow_reader::flatbuf::TableCursor;

/// A root position paired with arbitrary table bytes, so the fuzzer can
/// drive `TableCursor::at` into both in-bounds and out-of-bounds starts.
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    root: u16,
    data: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    let root = input.root as usize;
    if root >= input.data.len() {
        return;
    }
    let Ok(cursor) = TableCursor::at(&input.data, root) else {
        return;
    };

    // Every accessor must return Ok/None/Err, never panic, for any field
    // index, including ones past the table's declared field count.
    for field in 0..8 {
        let _ = cursor.get_bool(field);
        let _ = cursor.get_u8(field);
        let _ = cursor.get_i16(field);
        let _ = cursor.get_i32(field);
        let _ = cursor.get_i64(field);
        let _ = cursor.get_table(field);
        let _ = cursor.get_string(field);
        let _ = cursor.get_binary(field);
        let _ = cursor.get_vector_of_tables(field);
        let _ = cursor.get_struct_vector(field, 16);
    }
});
