//! Декодеры заголовка и записей тела PHD дампа.
//!
//! Каждая запись начинается с тегового байта. Старшие биты выбирают
//! семейство записи, остальные биты (или отдельный байт флагов у длинных
//! форм) задают ширину полей. Все декодеры работают с одним курсором и
//! одним [`ParsingContext`], который передаётся явно.

use std::io::Read;

use phdump_error::{bail, ensure, PhdError, PhdResult};

use super::{
    context::{offset_address, ParsingContext},
    cursor::ByteCursor,
    records::{
        Address, ClassRecord, Header, ObjectArrayRecord, ObjectRecord, PrimitiveArrayRecord,
        PrimitiveType, Record,
    },
    string::read_string,
    tags::{
        DUMP_MAGIC, GAP_UNIT, HEADER_TAG_END, HEADER_TAG_J9_NOOP, HEADER_TAG_J9_NOOP_2,
        HEADER_TAG_JVM_VERSION, MEDIUM_OBJECT_BIT, PRIMITIVE_ARRAY_BIT, SHORT_OBJECT_BIT,
        TAG_BODY_END, TAG_BODY_START, TAG_CLASS, TAG_HEADER_START, TAG_LONG_OBJECT,
        TAG_LONG_PRIMITIVE_ARRAY, TAG_OBJECT_ARRAY, TAG_OBJECT_ARRAY_V5,
    },
};

/// Верхняя граница предварительного резервирования под ссылки. Кол-во
/// ссылок приходит из потока и не должно управлять аллокацией напрямую.
const MAX_PREALLOCATED_REFERENCES: u64 = 4096;

/// Ширина знакового поля, заданная 2-битным кодом.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measurement {
    Byte,
    Short,
    Int,
    Long,
}

/// Ширина зазора коротких и средних объектов (1 бит).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapSize {
    Byte,
    Short,
}

/// Версия записи массива объектов.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectArrayVersion {
    /// Тег 5: фактическая длина равна кол-ву ссылок.
    V4,
    /// Тег 8: фактическая длина берётся из хвостового поля.
    V5,
}

/// Разобранный байт флагов длинных форм записей.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LongFlags {
    gap: Measurement,
    reference: Measurement,
    hashed_and_moved: bool,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Measurement {
    /// Ширина по младшим двум битам `bits`.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0 => Self::Byte,
            1 => Self::Short,
            2 => Self::Int,
            _ => Self::Long,
        }
    }

    pub const fn width(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Short => 2,
            Self::Int => 4,
            Self::Long => 8,
        }
    }
}

impl GapSize {
    pub const fn from_bit(bit: u8) -> Self {
        if bit & 0x1 == 0 {
            Self::Byte
        } else {
            Self::Short
        }
    }
}

impl LongFlags {
    /// Флаги длинного объекта и массива объектов: hashed-and-moved в бите 1.
    fn object(flag: u8) -> Self {
        Self {
            gap: Measurement::from_bits(flag >> 6),
            reference: Measurement::from_bits(flag >> 4),
            hashed_and_moved: (flag >> 1) & 0x1 == 1,
        }
    }

    /// Флаги класса: hashed-and-moved в бите 3.
    fn class(flag: u8) -> Self {
        Self {
            gap: Measurement::from_bits(flag >> 6),
            reference: Measurement::from_bits(flag >> 4),
            hashed_and_moved: (flag >> 3) & 0x1 == 1,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Заголовок и тело
////////////////////////////////////////////////////////////////////////////////

/// Читает заголовок дампа.
pub fn read_header<R: Read>(cursor: &mut ByteCursor<R>) -> PhdResult<Header> {
    let title_at = cursor.bytes_read();
    let title = read_string(cursor)?;
    ensure!(
        title == DUMP_MAGIC,
        PhdError::InvalidMagic {
            got: title,
            offset: Some(title_at),
        }
    );

    let version = cursor.read_u32()?;
    let flags = cursor.read_u32()?;

    let tag = cursor.read_u8()?;
    ensure!(
        tag == TAG_HEADER_START,
        PhdError::InvalidHeaderTag {
            tag,
            offset: Some(cursor.bytes_read() - 1),
        }
    );

    let mut jvm_version = None;
    loop {
        match cursor.read_u8()? {
            HEADER_TAG_J9_NOOP | HEADER_TAG_J9_NOOP_2 => {}
            HEADER_TAG_END => break,
            HEADER_TAG_JVM_VERSION => jvm_version = Some(read_string(cursor)?),
            tag => bail!(PhdError::InvalidHeaderTag {
                tag,
                offset: Some(cursor.bytes_read() - 1),
            }),
        }
    }

    Ok(Header::from_flags(version, flags, jvm_version))
}

/// Читает открывающий тег тела.
pub fn open_body<R: Read>(cursor: &mut ByteCursor<R>) -> PhdResult<()> {
    let tag = cursor.read_u8()?;
    ensure!(
        tag == TAG_BODY_START,
        PhdError::InvalidBodyTag {
            tag,
            offset: Some(cursor.bytes_read() - 1),
        }
    );
    Ok(())
}

/// Читает одну запись тела. Возвращает `None` на завершающем теге.
pub fn read_record<R: Read>(
    cursor: &mut ByteCursor<R>,
    header: &Header,
    ctx: &mut ParsingContext,
) -> PhdResult<Option<Record>> {
    let tag = cursor.read_u8()?;

    let record = if tag & SHORT_OBJECT_BIT != 0 {
        read_short_object(cursor, header, ctx, tag)?.into()
    } else if tag & MEDIUM_OBJECT_BIT != 0 {
        read_medium_object(cursor, header, ctx, tag)?.into()
    } else if tag & PRIMITIVE_ARRAY_BIT != 0 {
        read_short_primitive_array(cursor, header, ctx, tag)?.into()
    } else {
        match tag {
            TAG_LONG_OBJECT => read_long_object(cursor, header, ctx)?.into(),
            TAG_OBJECT_ARRAY => {
                read_object_array(cursor, header, ctx, ObjectArrayVersion::V4)?.into()
            }
            TAG_CLASS => read_class(cursor, header, ctx)?.into(),
            TAG_LONG_PRIMITIVE_ARRAY => read_long_primitive_array(cursor, header, ctx)?.into(),
            TAG_OBJECT_ARRAY_V5 => {
                read_object_array(cursor, header, ctx, ObjectArrayVersion::V5)?.into()
            }
            TAG_BODY_END => return Ok(None),
            _ => bail!(PhdError::InvalidTag {
                tag,
                offset: Some(cursor.bytes_read() - 1),
            }),
        }
    };

    Ok(Some(record))
}

////////////////////////////////////////////////////////////////////////////////
// Объекты
////////////////////////////////////////////////////////////////////////////////

/// Короткий объект: класс берётся из кэша по 2-битному номеру слота.
///
/// Биты `tag & 0x7f`: `[6:5]` слот кэша, `[4:3]` кол-во ссылок,
/// `[2]` ширина зазора, `[1:0]` ширина ссылок.
pub fn read_short_object<R: Read>(
    cursor: &mut ByteCursor<R>,
    header: &Header,
    ctx: &mut ParsingContext,
    tag: u8,
) -> PhdResult<ObjectRecord> {
    let flag = tag & 0x7f;
    let slot = ((flag >> 5) & 0x3) as usize;
    let reference_count = ((flag >> 3) & 0x3) as u64;
    let gap_size = GapSize::from_bit(flag >> 2);
    let reference_width = Measurement::from_bits(flag);

    let gap = read_object_gap(cursor, gap_size)?;
    let class_address = ctx
        .class_address_at(slot)
        .map_err(|e| e.with_offset(cursor.bytes_read()))?;
    let hash = read_short_hash(cursor, header)?;
    let address = next_address(cursor, ctx, gap)?;
    let references = read_references(cursor, address, reference_count, reference_width)?;

    Ok(ObjectRecord {
        address,
        class_address,
        hash,
        references,
    })
}

/// Средний объект: адрес класса записан явно и попадает в кэш.
///
/// Биты `tag & 0x3f`: `[5:3]` кол-во ссылок, `[2]` ширина зазора,
/// `[1:0]` ширина ссылок.
pub fn read_medium_object<R: Read>(
    cursor: &mut ByteCursor<R>,
    header: &Header,
    ctx: &mut ParsingContext,
    tag: u8,
) -> PhdResult<ObjectRecord> {
    let flag = tag & 0x3f;
    let reference_count = ((flag >> 3) & 0x7) as u64;
    let gap_size = GapSize::from_bit(flag >> 2);
    let reference_width = Measurement::from_bits(flag);

    let gap = read_object_gap(cursor, gap_size)?;
    let class_address = cursor.read_unsigned_word(header.platform)?;
    ctx.record_class_address(class_address);
    let hash = read_short_hash(cursor, header)?;
    let address = next_address(cursor, ctx, gap)?;
    let references = read_references(cursor, address, reference_count, reference_width)?;

    Ok(ObjectRecord {
        address,
        class_address,
        hash,
        references,
    })
}

/// Длинный объект (тег 4) с отдельным байтом флагов и 32-битным кол-вом
/// ссылок.
pub fn read_long_object<R: Read>(
    cursor: &mut ByteCursor<R>,
    header: &Header,
    ctx: &mut ParsingContext,
) -> PhdResult<ObjectRecord> {
    let flags = LongFlags::object(cursor.read_u8()?);

    let gap = read_signed(cursor, flags.gap)?;
    let class_address = cursor.read_unsigned_word(header.platform)?;
    ctx.record_class_address(class_address);
    let hash = read_hash(cursor, header, flags.hashed_and_moved)?;
    let address = next_address(cursor, ctx, gap)?;
    let reference_count = cursor.read_u32()? as u64;
    let references = read_references(cursor, address, reference_count, flags.reference)?;

    Ok(ObjectRecord {
        address,
        class_address,
        hash,
        references,
    })
}

/// Массив объектов (теги 5 и 8). Класс элементов в кэш не попадает.
pub fn read_object_array<R: Read>(
    cursor: &mut ByteCursor<R>,
    header: &Header,
    ctx: &mut ParsingContext,
    version: ObjectArrayVersion,
) -> PhdResult<ObjectArrayRecord> {
    let flags = LongFlags::object(cursor.read_u8()?);

    let gap = read_signed(cursor, flags.gap)?;
    let class_address = cursor.read_unsigned_word(header.platform)?;
    let hash = read_hash(cursor, header, flags.hashed_and_moved)?;
    let address = next_address(cursor, ctx, gap)?;
    let reference_count = cursor.read_u32()? as u64;
    let references = read_references(cursor, address, reference_count, flags.reference)?;
    let size = read_size_in_words(cursor)?;

    let actual_length = match version {
        ObjectArrayVersion::V4 => references.len() as u64,
        ObjectArrayVersion::V5 => cursor.read_u32()? as u64,
    };

    Ok(ObjectArrayRecord {
        address,
        class_address,
        hash,
        size,
        actual_length,
        references,
    })
}

/// Класс (тег 6).
///
/// Порядок полей: зазор, размер экземпляра, хэш, адрес суперкласса, имя,
/// кол-во ссылок, ссылки. Собственный адрес класса помещается в кэш.
pub fn read_class<R: Read>(
    cursor: &mut ByteCursor<R>,
    header: &Header,
    ctx: &mut ParsingContext,
) -> PhdResult<ClassRecord> {
    let flags = LongFlags::class(cursor.read_u8()?);

    let gap = read_signed(cursor, flags.gap)?;
    let instance_size = cursor.read_u32()?;
    let hash = read_hash(cursor, header, flags.hashed_and_moved)?;
    let super_class_address = cursor.read_unsigned_word(header.platform)?;
    let name = read_string(cursor)?;
    let address = next_address(cursor, ctx, gap)?;
    ctx.record_class_address(address);
    let reference_count = cursor.read_u32()? as u64;
    let references = read_references(cursor, address, reference_count, flags.reference)?;

    Ok(ClassRecord {
        address,
        super_class_address,
        instance_size,
        name,
        hash,
        references,
    })
}

////////////////////////////////////////////////////////////////////////////////
// Массивы примитивов
////////////////////////////////////////////////////////////////////////////////

/// Короткий массив примитивов: биты `tag & 0x1f` задают тип `[4:2]` и общую
/// ширину зазора и длины `[1:0]`.
pub fn read_short_primitive_array<R: Read>(
    cursor: &mut ByteCursor<R>,
    header: &Header,
    ctx: &mut ParsingContext,
    tag: u8,
) -> PhdResult<PrimitiveArrayRecord> {
    let flag = tag & 0x1f;
    let element_type = PrimitiveType::from_code(flag >> 2);

    let (gap, length) = match Measurement::from_bits(flag) {
        Measurement::Byte => (cursor.read_i8()? as i64, cursor.read_u8()? as u64),
        Measurement::Short => (cursor.read_i16()? as i64, cursor.read_u16()? as u64),
        Measurement::Int => (cursor.read_i32()? as i64, cursor.read_u32()? as u64),
        Measurement::Long => (cursor.read_i64()?, cursor.read_i64()? as u64),
    };
    let hash = read_short_hash(cursor, header)?;
    let size = read_size_in_words(cursor)?;
    let address = next_address(cursor, ctx, gap)?;

    Ok(PrimitiveArrayRecord {
        address,
        element_type,
        length,
        hash,
        size,
    })
}

/// Длинный массив примитивов (тег 7).
///
/// Байт флагов: `[7:5]` тип, `[4]` ширина зазора и длины (байт или
/// word платформы), `[1]` hashed-and-moved.
pub fn read_long_primitive_array<R: Read>(
    cursor: &mut ByteCursor<R>,
    header: &Header,
    ctx: &mut ParsingContext,
) -> PhdResult<PrimitiveArrayRecord> {
    let flag = cursor.read_u8()?;
    let element_type = PrimitiveType::from_code(flag >> 5);
    let word_sized = (flag >> 4) & 0x1 == 1;
    let hashed_and_moved = (flag >> 1) & 0x1 == 1;

    let (gap, length) = if word_sized {
        (
            cursor.read_signed_word(header.platform)?,
            cursor.read_unsigned_word(header.platform)?,
        )
    } else {
        (cursor.read_i8()? as i64, cursor.read_u8()? as u64)
    };
    let hash = read_hash(cursor, header, hashed_and_moved)?;
    let size = read_size_in_words(cursor)?;
    let address = next_address(cursor, ctx, gap)?;

    Ok(PrimitiveArrayRecord {
        address,
        element_type,
        length,
        hash,
        size,
    })
}

////////////////////////////////////////////////////////////////////////////////
// Вспомогательные функции
////////////////////////////////////////////////////////////////////////////////

/// Знаковое поле заданной ширины.
pub fn read_signed<R: Read>(
    cursor: &mut ByteCursor<R>,
    width: Measurement,
) -> PhdResult<i64> {
    Ok(match width {
        Measurement::Byte => cursor.read_i8()? as i64,
        Measurement::Short => cursor.read_i16()? as i64,
        Measurement::Int => cursor.read_i32()? as i64,
        Measurement::Long => cursor.read_i64()?,
    })
}

fn read_object_gap<R: Read>(
    cursor: &mut ByteCursor<R>,
    size: GapSize,
) -> PhdResult<i64> {
    Ok(match size {
        GapSize::Byte => cursor.read_i8()? as i64,
        GapSize::Short => cursor.read_i16()? as i64,
    })
}

/// Хэш записей с длинной формой: 16 бит при хэшированном дампе, иначе 32
/// бита только для перемещённых объектов.
fn read_hash<R: Read>(
    cursor: &mut ByteCursor<R>,
    header: &Header,
    hashed_and_moved: bool,
) -> PhdResult<i32> {
    if header.hashed {
        Ok(cursor.read_i16()? as i32)
    } else if hashed_and_moved {
        cursor.read_i32()
    } else {
        Ok(0)
    }
}

/// Хэш коротких форм: только 16-битный путь.
fn read_short_hash<R: Read>(
    cursor: &mut ByteCursor<R>,
    header: &Header,
) -> PhdResult<i32> {
    read_hash(cursor, header, false)
}

/// Размер в 4-байтовых словах, переведённый в байты.
fn read_size_in_words<R: Read>(cursor: &mut ByteCursor<R>) -> PhdResult<u64> {
    Ok(cursor.read_u32()? as u64 * GAP_UNIT as u64)
}

fn next_address<R: Read>(
    cursor: &ByteCursor<R>,
    ctx: &mut ParsingContext,
    gap: i64,
) -> PhdResult<Address> {
    Ok(ctx
        .advance(gap)
        .map_err(|e| e.with_offset(cursor.bytes_read()))?)
}

/// Ссылки отсчитываются от адреса самой записи и не сдвигают базу цепочки.
fn read_references<R: Read>(
    cursor: &mut ByteCursor<R>,
    base: Address,
    count: u64,
    width: Measurement,
) -> PhdResult<Vec<Address>> {
    let mut references = Vec::with_capacity(count.min(MAX_PREALLOCATED_REFERENCES) as usize);
    for _ in 0..count {
        let gap = read_signed(cursor, width)?;
        let address =
            offset_address(base, gap).map_err(|e| e.with_offset(cursor.bytes_read()))?;
        references.push(address);
    }
    Ok(references)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use phdump_error::{ErrorKind, StackError};
    use rstest::rstest;

    use super::*;
    use crate::dump::records::Platform;

    fn cursor(bytes: &[u8]) -> ByteCursor<Cursor<Vec<u8>>> {
        ByteCursor::new(Cursor::new(bytes.to_vec()))
    }

    fn header(
        platform: Platform,
        hashed: bool,
    ) -> Header {
        Header {
            version: 6,
            platform,
            hashed,
            j9_vm: true,
            jvm_version: None,
        }
    }

    fn phd_error(err: StackError) -> PhdError {
        err.downcast_ref::<PhdError>().cloned().unwrap()
    }

    /// Тест проверяет таблицу ширины знаковых полей.
    #[rstest]
    #[case(0, &[0xFE], -2)]
    #[case(1, &[0xFF, 0xFE], -2)]
    #[case(2, &[0x00, 0x03, 0x2C, 0x3C], 0x32C3C)]
    #[case(3, &[0x00, 0x00, 0x00, 0x00, 0x88, 0x00, 0x00, 0x00], 0x8800_0000)]
    fn test_read_signed_widths(
        #[case] bits: u8,
        #[case] bytes: &[u8],
        #[case] expected: i64,
    ) {
        let width = Measurement::from_bits(bits);
        assert_eq!(width.width(), bytes.len());
        let mut c = cursor(bytes);
        assert_eq!(read_signed(&mut c, width).unwrap(), expected);
        assert_eq!(c.bytes_read(), bytes.len() as u64);
    }

    /// Тест проверяет разбор минимального заголовка без версии JVM.
    #[test]
    fn test_read_header_minimal() {
        let mut bytes = vec![0x00, 0x12];
        bytes.extend_from_slice(DUMP_MAGIC.as_bytes());
        bytes.extend_from_slice(&[0, 0, 0, 5, 0, 0, 0, 2, 0x01, 0x01, 0x03, 0x02]);

        let h = read_header(&mut cursor(&bytes)).unwrap();
        assert_eq!(h.version, 5);
        assert_eq!(h.platform, Platform::Bits32);
        assert!(h.hashed);
        assert!(!h.j9_vm);
        assert_eq!(h.jvm_version, None);
    }

    /// Тест проверяет отказ на неверной магической строке.
    #[test]
    fn test_read_header_bad_magic() {
        let mut c = cursor(&[0x00, 0x04, b'j', b'u', b'n', b'k']);
        let err = phd_error(read_header(&mut c).unwrap_err());
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(matches!(err, PhdError::InvalidMagic { ref got, offset: Some(0) } if got == "junk"));
    }

    /// Тест проверяет отказ на неизвестном теге записи заголовка.
    #[test]
    fn test_read_header_unknown_entry() {
        let mut bytes = vec![0x00, 0x12];
        bytes.extend_from_slice(DUMP_MAGIC.as_bytes());
        bytes.extend_from_slice(&[0, 0, 0, 6, 0, 0, 0, 1, 0x01, 0x07]);

        let err = phd_error(read_header(&mut cursor(&bytes)).unwrap_err());
        assert_eq!(
            err,
            PhdError::InvalidHeaderTag {
                tag: 0x07,
                offset: Some(29),
            }
        );
    }

    /// Тест проверяет отказ на неверном открывающем теге тела.
    #[test]
    fn test_open_body_rejects_wrong_tag() {
        assert!(open_body(&mut cursor(&[0x02])).is_ok());
        let err = phd_error(open_body(&mut cursor(&[0x01])).unwrap_err());
        assert!(matches!(err, PhdError::InvalidBodyTag { tag: 0x01, .. }));
    }

    /// Тест проверяет, что короткий объект берёт класс из нужного слота и
    /// не изменяет кэш.
    #[test]
    fn test_short_object_uses_cache_slot() {
        let mut ctx = ParsingContext::new();
        ctx.record_class_address(0x100);
        ctx.record_class_address(0x200);

        // слот 1, одна ссылка шириной в байт, зазор в байт
        let tag = 0x80 | (1 << 5) | (1 << 3);
        let mut c = cursor(&[0x04, 0x02]);
        let obj = read_short_object(&mut c, &header(Platform::Bits64, false), &mut ctx, tag)
            .unwrap();

        assert_eq!(obj.class_address, 0x100);
        assert_eq!(obj.address, 0x10);
        assert_eq!(obj.references, vec![0x18]);
        assert_eq!(ctx.cached_classes(), vec![0x200, 0x100]);
    }

    /// Тест проверяет ошибку поиска при пустом кэше.
    #[test]
    fn test_short_object_cache_miss() {
        let mut ctx = ParsingContext::new();
        let mut c = cursor(&[0x01]);
        let err = read_short_object(&mut c, &header(Platform::Bits64, false), &mut ctx, 0x80)
            .unwrap_err();
        let err = phd_error(err);
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert_eq!(err.offset(), Some(1));
    }

    /// Тест проверяет средний объект с 16-битным зазором и 32-битной
    /// платформой.
    #[test]
    fn test_medium_object_32bit() {
        let mut ctx = ParsingContext::new();
        // две ссылки шириной в short, зазор short
        let tag = 0x40 | (2 << 3) | (1 << 2) | 1;
        let mut c = cursor(&[
            0x01, 0x00, // зазор 256
            0xCA, 0xFE, 0xBA, 0xBE, // класс
            0x12, 0x34, // хэш
            0x00, 0x01, 0xFF, 0xFF, // ссылки +1, -1
        ]);
        let obj = read_medium_object(&mut c, &header(Platform::Bits32, true), &mut ctx, tag)
            .unwrap();

        assert_eq!(obj.address, 0x400);
        assert_eq!(obj.class_address, 0xCAFE_BABE);
        assert_eq!(obj.hash, 0x1234);
        assert_eq!(obj.references, vec![0x404, 0x3FC]);
        assert_eq!(ctx.cached_classes(), vec![0xCAFE_BABE]);
        assert_eq!(c.bytes_read(), 12);
    }

    /// Тест проверяет политику хэша длинного объекта.
    #[rstest]
    #[case::no_hash(false, 0x00, &[], 0)]
    #[case::moved(false, 0x02, &[0xFF, 0xFF, 0xFF, 0xFE], -2)]
    #[case::hashed_ignores_moved(true, 0x02, &[0x00, 0x07], 7)]
    #[case::hashed(true, 0x00, &[0xFF, 0xF0], -16)]
    fn test_long_object_hash_policy(
        #[case] hashed: bool,
        #[case] flag: u8,
        #[case] hash_bytes: &[u8],
        #[case] expected: i32,
    ) {
        let mut bytes = vec![flag, 0x02];
        bytes.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0x10, 0x00]);
        bytes.extend_from_slice(hash_bytes);
        bytes.extend_from_slice(&[0, 0, 0, 0]);

        let mut ctx = ParsingContext::new();
        let mut c = cursor(&bytes);
        let obj = read_long_object(&mut c, &header(Platform::Bits64, hashed), &mut ctx).unwrap();

        assert_eq!(obj.hash, expected);
        assert_eq!(obj.address, 8);
        assert_eq!(obj.class_address, 0x1000);
        assert!(obj.references.is_empty());
        assert_eq!(c.bytes_read(), bytes.len() as u64);
    }

    /// Тест проверяет массивы объектов v4 и v5.
    #[rstest]
    #[case(ObjectArrayVersion::V4, &[], 2)]
    #[case(ObjectArrayVersion::V5, &[0x00, 0x00, 0x00, 0x09], 9)]
    fn test_object_array_versions(
        #[case] version: ObjectArrayVersion,
        #[case] trailer: &[u8],
        #[case] actual_length: u64,
    ) {
        // зазор int, ссылки byte
        let mut bytes = vec![0x80, 0x00, 0x00, 0x00, 0x10];
        bytes.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0x20, 0x00]);
        bytes.extend_from_slice(&[0, 0, 0, 2, 0x01, 0x02]);
        bytes.extend_from_slice(&[0, 0, 0, 6]);
        bytes.extend_from_slice(trailer);

        let mut ctx = ParsingContext::new();
        let mut c = cursor(&bytes);
        let arr =
            read_object_array(&mut c, &header(Platform::Bits64, false), &mut ctx, version).unwrap();

        assert_eq!(arr.address, 0x40);
        assert_eq!(arr.class_address, 0x2000);
        assert_eq!(arr.references, vec![0x44, 0x48]);
        assert_eq!(arr.size, 24);
        assert_eq!(arr.declared_length(), 2);
        assert_eq!(arr.actual_length, actual_length);
        assert!(ctx.cached_classes().is_empty());
        assert_eq!(c.bytes_read(), bytes.len() as u64);
    }

    /// Тест проверяет ширину зазора и длины короткого массива примитивов.
    #[rstest]
    #[case(0, &[0x02, 0x05], 5)]
    #[case(1, &[0x00, 0x02, 0x01, 0x00], 256)]
    #[case(2, &[0x00, 0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00], 65536)]
    #[case(3, &[0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 3], 3)]
    fn test_short_primitive_array_widths(
        #[case] measurement: u8,
        #[case] fields: &[u8],
        #[case] length: u64,
    ) {
        let tag = 0x20 | (6 << 2) | measurement;
        let mut bytes = fields.to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 4]);

        let mut ctx = ParsingContext::new();
        let mut c = cursor(&bytes);
        let arr =
            read_short_primitive_array(&mut c, &header(Platform::Bits64, false), &mut ctx, tag)
                .unwrap();

        assert_eq!(arr.element_type, PrimitiveType::Int);
        assert_eq!(arr.address, 8);
        assert_eq!(arr.length, length);
        assert_eq!(arr.size, 16);
        assert_eq!(c.bytes_read(), bytes.len() as u64);
    }

    /// Тест проверяет длинный массив примитивов с word-полями.
    #[test]
    fn test_long_primitive_array_word_sized() {
        // тип long, word-поля, hashed-and-moved
        let flag = (7 << 5) | (1 << 4) | 0x02;
        let mut c = cursor(&[
            flag, 0x00, 0x00, 0x00, 0x04, // зазор
            0x00, 0x00, 0x01, 0x00, // длина
            0x00, 0x00, 0x00, 0x2A, // хэш
            0x00, 0x00, 0x02, 0x02, // размер в словах
        ]);
        let mut ctx = ParsingContext::new();
        let arr = read_long_primitive_array(&mut c, &header(Platform::Bits32, false), &mut ctx)
            .unwrap();

        assert_eq!(arr.element_type, PrimitiveType::Long);
        assert_eq!(arr.address, 16);
        assert_eq!(arr.length, 256);
        assert_eq!(arr.hash, 42);
        assert_eq!(arr.size, 0x808);
    }

    /// Тест проверяет, что класс попадает в кэш, а ссылки считаются от его
    /// адреса.
    #[test]
    fn test_class_record() {
        let mut bytes = vec![0x00, 0x03]; // зазор byte, ссылки byte
        bytes.extend_from_slice(&[0, 0, 0, 24]);
        bytes.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0x40]);
        bytes.extend_from_slice(&[0x00, 0x10]);
        bytes.extend_from_slice(b"java/lang/Object");
        bytes.extend_from_slice(&[0, 0, 0, 1, 0xFF]);

        let mut ctx = ParsingContext::new();
        ctx.set_last_address(0x100);
        let class = read_class(&mut cursor(&bytes), &header(Platform::Bits64, false), &mut ctx)
            .unwrap();

        assert_eq!(class.address, 0x10C);
        assert_eq!(class.instance_size, 24);
        assert_eq!(class.super_class_address, 0x40);
        assert_eq!(class.name, "java/lang/Object");
        assert_eq!(class.references, vec![0x108]);
        assert_eq!(ctx.class_address_at(0).unwrap(), 0x10C);
        assert_eq!(ctx.last_address(), 0x10C);
    }

    /// Тест проверяет отказ на неизвестном теге записи.
    #[test]
    fn test_unknown_record_tag() {
        let mut ctx = ParsingContext::new();
        let err = read_record(
            &mut cursor(&[0x11]),
            &header(Platform::Bits64, false),
            &mut ctx,
        )
        .unwrap_err();
        assert_eq!(
            phd_error(err),
            PhdError::InvalidTag {
                tag: 0x11,
                offset: Some(0),
            }
        );
    }

    /// Тест проверяет, что завершающий тег не является ошибкой.
    #[test]
    fn test_end_of_body() {
        let mut ctx = ParsingContext::new();
        let rec = read_record(
            &mut cursor(&[0x03]),
            &header(Platform::Bits64, false),
            &mut ctx,
        )
        .unwrap();
        assert!(rec.is_none());
    }
}
