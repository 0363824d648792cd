//! Декодирование Portable Heap Dump (PHD), бинарного снимка кучи JVM
//! семейства J9.
//!
//! Поток состоит из заголовка и тела. Тело - последовательность записей
//! классов, объектов, массивов объектов и массивов примитивов, за которой
//! следует завершающий тег. Адреса записей сжаты дельта-кодированием, а
//! классы коротких объектов берутся из кэша на 4 слота, поэтому записи
//! декодируются строго последовательно.
//!
//! Точка входа - [`DumpParser`].

pub mod context;
pub mod cursor;
pub mod decode;
pub mod records;
pub mod streaming;
pub mod string;
pub mod tags;

pub use context::ParsingContext;
pub use cursor::ByteCursor;
pub use records::{
    Address, ClassRecord, Header, ObjectArrayRecord, ObjectRecord, Platform, PrimitiveArrayRecord,
    PrimitiveType, Record, RecordKind,
};
pub use streaming::{
    DumpParser, NoopListener, ParseListener, ParserOptions, ParsingStatistics,
    DEFAULT_PROGRESS_INTERVAL, DEFAULT_READ_BUFFER_SIZE,
};
pub use string::read_string;
