#![no_main]

use libfuzzer_sys::fuzz_target;
use stacktally::aggregate::Tally;
use stacktally::parse::Parser;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let trace = Parser::default().parse(&raw);
    let mut tally = Tally::default();
    tally.add_trace(trace.frames());
    assert!(tally.sites().total() <= trace.len());
    assert_eq!(tally.calls().total(), trace.len());
});
