//! Константы бинарного формата PHD.
//!
//! Все многобайтовые поля в формате big-endian. Используется модулями
//! `decode` и `streaming`.

/// Заголовок дампа, с которого начинается каждый файл.
pub const DUMP_MAGIC: &str = "portable heap dump";

/// Открывающий тег заголовка (следует сразу за флагами).
pub const TAG_HEADER_START: u8 = 1;
/// Открывающий тег тела дампа.
pub const TAG_BODY_START: u8 = 2;

/// Записи заголовка J9, не несущие данных.
pub const HEADER_TAG_J9_NOOP: u8 = 1;
/// Конец заголовка.
pub const HEADER_TAG_END: u8 = 2;
/// Ещё одна запись J9 без данных.
pub const HEADER_TAG_J9_NOOP_2: u8 = 3;
/// Строка с версией JVM.
pub const HEADER_TAG_JVM_VERSION: u8 = 4;

/// Флаги заголовка.
pub const FLAG_64_BIT: u32 = 0x1;
pub const FLAG_HASHED: u32 = 0x2;
pub const FLAG_J9_VM: u32 = 0x4;

/// Короткий объект: класс берётся из кэша.
pub const SHORT_OBJECT_BIT: u8 = 0x80;
/// Средний объект: адрес класса записан явно.
pub const MEDIUM_OBJECT_BIT: u8 = 0x40;
/// Короткий массив примитивов.
pub const PRIMITIVE_ARRAY_BIT: u8 = 0x20;

/// Маркер конца тела дампа.
pub const TAG_BODY_END: u8 = 3;
/// Длинный объект.
pub const TAG_LONG_OBJECT: u8 = 4;
/// Массив объектов (PHD v4).
pub const TAG_OBJECT_ARRAY: u8 = 5;
/// Класс.
pub const TAG_CLASS: u8 = 6;
/// Длинный массив примитивов.
pub const TAG_LONG_PRIMITIVE_ARRAY: u8 = 7;
/// Массив объектов (PHD v5) с хвостовым полем фактической длины.
pub const TAG_OBJECT_ARRAY_V5: u8 = 8;

/// Единица, на которую умножается любой адресный зазор. Не зависит от
/// разрядности платформы.
pub const GAP_UNIT: i64 = 4;

/// Кол-во слотов MRU-кэша адресов классов.
pub const CLASS_CACHE_SLOTS: usize = 4;
