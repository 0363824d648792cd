//! Сборщик синтетических PHD дампов для интеграционных тестов.

#![allow(dead_code)]

use byteorder::{BigEndian, WriteBytesExt};

pub const MAGIC: &str = "portable heap dump";

/// Флаги заголовка.
pub const FLAG_64_BIT: u32 = 0x1;
pub const FLAG_HASHED: u32 = 0x2;
pub const FLAG_J9: u32 = 0x4;

/// Заголовок из реального дампа IBM J9 (64 бит, без хэшей).
pub const REAL_HEADER: &[u8] = &[
    0x00, 0x12, 0x70, 0x6F, 0x72, 0x74, 0x61, 0x62, 0x6C, 0x65, 0x20, 0x68, 0x65, 0x61, 0x70,
    0x20, 0x64, 0x75, 0x6D, 0x70, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0x05, 0x01, 0x04,
    0x00, 0x45, 0x4A, 0x52, 0x45, 0x20, 0x31, 0x2E, 0x38, 0x2E, 0x30, 0x20, 0x4C, 0x69, 0x6E,
    0x75, 0x78, 0x20, 0x61, 0x6D, 0x64, 0x36, 0x34, 0x2D, 0x36, 0x34, 0x20, 0x62, 0x75, 0x69,
    0x6C, 0x64, 0x20, 0x20, 0x28, 0x70, 0x78, 0x61, 0x36, 0x34, 0x38, 0x30, 0x73, 0x72, 0x34,
    0x66, 0x70, 0x35, 0x2D, 0x32, 0x30, 0x31, 0x37, 0x30, 0x34, 0x32, 0x31, 0x5F, 0x30, 0x31,
    0x28, 0x53, 0x52, 0x34, 0x20, 0x46, 0x50, 0x35, 0x29, 0x20, 0x29, 0x02,
];

pub const REAL_JVM_VERSION: &str =
    "JRE 1.8.0 Linux amd64-64 build  (pxa6480sr4fp5-20170421_01(SR4 FP5) )";

/// Начало тела того же дампа: 25 записей и завершающий тег.
pub const REAL_BODY: &[u8] = &[
    0x02, 0x27, 0x00, 0x00, 0x00, 0x00, 0x88, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x0F, 0x00, 0x00, 0x00, 0x0A, 0x24, 0x0A, 0x12, 0x00, 0x00, 0x00, 0x0C, 0x24,
    0x0C, 0x20, 0x00, 0x00, 0x00, 0x12, 0x4A, 0x12, 0x00, 0x00, 0x00, 0x06, 0x5B, 0x39, 0xCD,
    0xE0, 0x00, 0x03, 0x2C, 0x3C, 0x24, 0x06, 0x15, 0x00, 0x00, 0x00, 0x0E, 0x8A, 0x0E, 0x00,
    0x03, 0x2C, 0x3A, 0x24, 0x06, 0x07, 0x00, 0x00, 0x00, 0x06, 0x24, 0x06, 0x20, 0x00, 0x00,
    0x00, 0x12, 0x24, 0x12, 0x09, 0x00, 0x00, 0x00, 0x08, 0x24, 0x08, 0x20, 0x00, 0x00, 0x00,
    0x12, 0x24, 0x12, 0x20, 0x00, 0x00, 0x00, 0x12, 0x40, 0x12, 0x00, 0x00, 0x00, 0x06, 0x5B,
    0x3D, 0x02, 0x30, 0xA0, 0x06, 0x8A, 0x06, 0x00, 0x03, 0x2B, 0xF6, 0x8A, 0x06, 0x00, 0x03,
    0x2B, 0xFA, 0xA0, 0x06, 0x8A, 0x06, 0x00, 0x03, 0x2B, 0xFA, 0x4A, 0x06, 0x00, 0x00, 0x00,
    0x06, 0x5F, 0x62, 0x73, 0xE0, 0x00, 0x03, 0x2C, 0x06, 0x8A, 0x04, 0x00, 0x03, 0x2C, 0x08,
    0xCA, 0x06, 0x00, 0x03, 0x2C, 0x10, 0x8A, 0x04, 0x00, 0x03, 0x2C, 0x12, 0x8A, 0x06, 0x00,
    0x03, 0x2C, 0x12, 0xA0, 0x06, 0x40, 0x06, 0x00, 0x00, 0x00, 0x06, 0x49, 0xCF, 0x30, 0xF8,
    0x8A, 0x04, 0x00, 0x03, 0x2C, 0x14, 0x03,
];

/// Запись класса из того же дампа без тегового байта, с хвостом следующей
/// записи.
pub const REAL_CLASS: &[u8] = &[
    0xA8, 0xFD, 0xC0, 0xF7, 0x46, 0x00, 0x00, 0x00, 0x08, 0xEE, 0x22, 0x5E, 0x62, 0x00, 0x00,
    0x00, 0x06, 0x53, 0xBB, 0xC2, 0x48, 0x00, 0x3B, 0x73, 0x75, 0x6E, 0x2F, 0x72, 0x65, 0x66,
    0x6C, 0x65, 0x63, 0x74, 0x2F, 0x47, 0x65, 0x6E, 0x65, 0x72, 0x61, 0x74, 0x65, 0x64, 0x53,
    0x65, 0x72, 0x69, 0x61, 0x6C, 0x69, 0x7A, 0x61, 0x74, 0x69, 0x6F, 0x6E, 0x43, 0x6F, 0x6E,
    0x73, 0x74, 0x72, 0x75, 0x63, 0x74, 0x6F, 0x72, 0x41, 0x63, 0x63, 0x65, 0x73, 0x73, 0x6F,
    0x72, 0x31, 0x30, 0x30, 0x31, 0x38, 0x32, 0x00, 0x00, 0x00, 0x07, 0xFF, 0xFF, 0xFB, 0xC4,
    0xFF, 0xFF, 0xFB, 0xC4, 0x9A, 0xED, 0xF9, 0x88, 0x9D, 0xB9, 0x1A, 0x6A, 0x9A, 0xEE, 0x18,
    0x48, 0x9C, 0xCD, 0x7C, 0x9E, 0x9A, 0xED, 0xF9, 0x88, 0x06, 0x68, 0x9E, 0xEA, 0x00, 0x00,
    0x00, 0x08, 0xB4, 0x10, 0xC8, 0x72, 0x00, 0x00, 0x00, 0x06, 0x53, 0xBB, 0xC2, 0x48,
];

/// Кол-во байт записи класса `REAL_CLASS` до хвоста.
pub const REAL_CLASS_LEN: usize = REAL_CLASS.len() - 20;

/// Построитель дампа. Пишет поля в big-endian в порядке вызовов.
#[derive(Debug, Default)]
pub struct DumpBuilder {
    buf: Vec<u8>,
    word64: bool,
}

impl DumpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Заголовок с флагами и необязательной версией JVM.
    pub fn header(
        mut self,
        version: u32,
        flags: u32,
        jvm: Option<&str>,
    ) -> Self {
        self.word64 = flags & FLAG_64_BIT != 0;
        self = self.string(MAGIC);
        self.buf.write_u32::<BigEndian>(version).unwrap();
        self.buf.write_u32::<BigEndian>(flags).unwrap();
        self.buf.push(0x01);
        if let Some(jvm) = jvm {
            self.buf.push(0x04);
            self = self.string(jvm);
        }
        self.buf.push(0x02);
        self
    }

    pub fn body_start(mut self) -> Self {
        self.buf.push(0x02);
        self
    }

    pub fn body_end(mut self) -> Self {
        self.buf.push(0x03);
        self
    }

    /// Строка с 16-битным префиксом кол-ва символов.
    pub fn string(
        mut self,
        s: &str,
    ) -> Self {
        self.buf
            .write_u16::<BigEndian>(s.chars().count() as u16)
            .unwrap();
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    pub fn u8(
        mut self,
        v: u8,
    ) -> Self {
        self.buf.push(v);
        self
    }

    pub fn i16(
        mut self,
        v: i16,
    ) -> Self {
        self.buf.write_i16::<BigEndian>(v).unwrap();
        self
    }

    pub fn u32(
        mut self,
        v: u32,
    ) -> Self {
        self.buf.write_u32::<BigEndian>(v).unwrap();
        self
    }

    pub fn i32(
        mut self,
        v: i32,
    ) -> Self {
        self.buf.write_i32::<BigEndian>(v).unwrap();
        self
    }

    /// Поле шириной в word платформы из заголовка.
    pub fn word(
        mut self,
        v: u64,
    ) -> Self {
        if self.word64 {
            self.buf.write_u64::<BigEndian>(v).unwrap();
        } else {
            self.buf.write_u32::<BigEndian>(v as u32).unwrap();
        }
        self
    }

    pub fn raw(
        mut self,
        bytes: &[u8],
    ) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Класс с байтовым зазором и int-ссылками, без хэша.
    pub fn class(
        self,
        gap: i8,
        super_class: u64,
        name: &str,
        references: &[i32],
    ) -> Self {
        let mut b = self
            .u8(0x06)
            .u8(0x20)
            .u8(gap as u8)
            .u32(16)
            .word(super_class)
            .string(name)
            .u32(references.len() as u32);
        for r in references {
            b = b.i32(*r);
        }
        b
    }

    /// Средний объект с байтовым зазором и байтовыми ссылками (до 7).
    pub fn medium_object(
        self,
        gap: i8,
        class: u64,
        references: &[i8],
    ) -> Self {
        let tag = 0x40 | ((references.len() as u8 & 0x7) << 3);
        let mut b = self.u8(tag).u8(gap as u8).word(class);
        for r in references {
            b = b.u8(*r as u8);
        }
        b
    }

    /// Короткий объект без ссылок, класс из слота `slot`.
    pub fn short_object(
        self,
        slot: u8,
        gap: i8,
    ) -> Self {
        self.u8(0x80 | ((slot & 0x3) << 5)).u8(gap as u8)
    }

    /// Короткий массив примитивов с байтовыми зазором и длиной.
    pub fn byte_array(
        self,
        gap: i8,
        length: u8,
        size_words: u32,
    ) -> Self {
        self.u8(0x20 | (4 << 2))
            .u8(gap as u8)
            .u8(length)
            .u32(size_words)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}
