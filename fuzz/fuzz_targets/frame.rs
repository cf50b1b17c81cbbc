#![no_main]

use libfuzzer_sys::fuzz_target;
use stacktally::parse::parse_frame;

fuzz_target!(|data: &[u8]| {
    if let Ok(line) = std::str::from_utf8(data) {
        parse_frame(line);
    }
});
