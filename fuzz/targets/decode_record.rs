#![no_main]

use std::io::Cursor;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use phdump::{
    dump::{decode::read_record, ByteCursor, ParsingContext},
    Header,
};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    flags: u8,
    base: u64,
    classes: Vec<u64>,
    data: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    // Заголовок и кэш задаются фаззером, чтобы короткие объекты не
    // отбрасывались сразу промахом кэша.
    let header = Header::from_flags(6, input.flags as u32, None);
    let mut ctx = ParsingContext::new();
    ctx.set_last_address(input.base);
    for class in input.classes.iter().take(8) {
        ctx.record_class_address(*class);
    }

    let mut cursor = ByteCursor::new(Cursor::new(&input.data));
    while let Ok(Some(record)) = read_record(&mut cursor, &header, &mut ctx) {
        assert_eq!(ctx.last_address(), record.address());
    }
});
