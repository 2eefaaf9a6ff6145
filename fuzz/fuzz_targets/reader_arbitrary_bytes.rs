#![no_main]

use libfuzzer_sys::fuzz_target;
use pg2arrow_reader::ArrowFileReader;
use std::io::Write;

fuzz_target!(|data: &[u8]| {
    let Ok(mut tmp) = tempfile::NamedTempFile::new() else {
        return;
    };
    if tmp.write_all(data).is_err() {
        return;
    }

    // Whatever the bytes are, opening and walking the file must only ever
    // return Err, never panic.
    if let Ok(reader) = ArrowFileReader::open(tmp.path()) {
        let _ = reader.record_batches();
    }
});
