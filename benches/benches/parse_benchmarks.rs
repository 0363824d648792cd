use std::{hint::black_box, io::Cursor};

use byteorder::{BigEndian, WriteBytesExt};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use phdump::{
    dump::{read_string, ByteCursor},
    DumpParser, Header, IndexMode, MemoryIndex, Platform,
};

const RECORDS: usize = 100_000;

fn header() -> Header {
    Header {
        version: 6,
        platform: Platform::Bits64,
        hashed: false,
        j9_vm: true,
        jvm_version: None,
    }
}

/// Тело дампа: классы, средние и короткие объекты, массивы примитивов
/// в пропорции, близкой к реальным дампам.
fn synthetic_body(records: usize) -> Vec<u8> {
    let mut buf = vec![0x02];
    let mut written = 0;
    let mut class_no = 0u32;

    while written < records {
        // класс с двумя int-ссылками
        let name = format!("bench/Class{class_no}");
        buf.extend_from_slice(&[0x06, 0x20, 0x10]);
        buf.write_u32::<BigEndian>(16).unwrap();
        buf.write_u64::<BigEndian>(0x1000).unwrap();
        buf.write_u16::<BigEndian>(name.len() as u16).unwrap();
        buf.extend_from_slice(name.as_bytes());
        buf.write_u32::<BigEndian>(2).unwrap();
        buf.write_i32::<BigEndian>(-4).unwrap();
        buf.write_i32::<BigEndian>(8).unwrap();
        class_no += 1;

        // средний объект с одной байтовой ссылкой
        buf.extend_from_slice(&[0x48, 0x04]);
        buf.write_u64::<BigEndian>(0x2000 + class_no as u64).unwrap();
        buf.push(0x02);

        // короткие объекты из слотов 0 и 1
        for _ in 0..4 {
            buf.extend_from_slice(&[0x88, 0x04, 0x01]);
            buf.extend_from_slice(&[0xA0, 0x04]);
        }

        // byte[] и длинный массив char
        buf.extend_from_slice(&[0x30, 0x04, 0x20, 0x00, 0x00, 0x00, 0x0A]);
        buf.extend_from_slice(&[0x07, 0x30]);
        buf.write_i64::<BigEndian>(0x04).unwrap();
        buf.write_u64::<BigEndian>(0x400).unwrap();
        buf.write_u32::<BigEndian>(0x204).unwrap();

        written += 12;
    }

    buf.push(0x03);
    buf
}

fn bench_read_body(c: &mut Criterion) {
    let body = synthetic_body(RECORDS);
    let header = header();

    let mut group = c.benchmark_group("read_body");
    group.throughput(Throughput::Bytes(body.len() as u64));
    group.sample_size(20);

    for mode in [IndexMode::Memory, IndexMode::Classes, IndexMode::Spill] {
        group.bench_with_input(BenchmarkId::from_parameter(mode), &body, |b, body| {
            b.iter(|| {
                let mut index = phdump::build_index(mode, None).unwrap();
                let mut parser = DumpParser::new(Cursor::new(black_box(body.as_slice())));
                parser.read_body(&header, &mut index).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_memory_index_lookup(c: &mut Criterion) {
    let body = synthetic_body(RECORDS);
    let mut index = MemoryIndex::new();
    DumpParser::new(Cursor::new(body.as_slice()))
        .read_body(&header(), &mut index)
        .unwrap();

    c.bench_function("memory_index class_name_of", |b| {
        let mut address = 0u64;
        b.iter(|| {
            address = (address + 4) % (RECORDS as u64 * 8);
            black_box(index.class_name_of(black_box(address)))
        })
    });
}

fn bench_read_string(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_string");

    for (label, text) in [
        ("ascii", "sun/reflect/GeneratedSerializationConstructorAccessor99066".to_string()),
        ("cyrillic", "ru/parse/dump/Объект".repeat(3)),
    ] {
        let mut buf = Vec::new();
        buf.write_u16::<BigEndian>(text.chars().count() as u16)
            .unwrap();
        buf.extend_from_slice(text.as_bytes());

        group.throughput(Throughput::Bytes(buf.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(label), &buf, |b, buf| {
            b.iter(|| {
                let mut cursor = ByteCursor::new(Cursor::new(black_box(buf.as_slice())));
                read_string(&mut cursor).unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_read_body,
    bench_memory_index_lookup,
    bench_read_string
);
criterion_main!(benches);
