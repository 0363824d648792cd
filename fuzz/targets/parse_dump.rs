#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use phdump::{DumpParser, MemoryIndex};

fuzz_target!(|data: &[u8]| {
    let total = data.len() as u64;
    let mut parser = DumpParser::new(Cursor::new(data));

    // Разбор может завершиться ошибкой, но не паникой.
    if let Ok(stats) = parser.parse(&mut MemoryIndex::new()) {
        assert_eq!(stats.bytes_read, parser.bytes_read());
    }
    assert!(parser.bytes_read() <= total);
});
