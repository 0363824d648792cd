//! Типы записей, восстанавливаемых из PHD дампа.
//!
//! Все записи неизменяемы после декодирования. Дальнейшим временем жизни
//! управляет индекс ([`crate::index::IndexSink`]).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::tags::{FLAG_64_BIT, FLAG_HASHED, FLAG_J9_VM};

/// Абсолютный адрес в куче. Первичный ключ любой записи.
pub type Address = u64;

/// Разрядность платформы, снявшей дамп.
///
/// Определяет ширину явных "word"-полей (адреса классов, длинные зазоры),
/// но не множитель зазоров, который всегда равен 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "32-bit")]
    Bits32,
    #[serde(rename = "64-bit")]
    Bits64,
}

/// Заголовок дампа. Разбирается один раз на поток.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub version: u32,
    pub platform: Platform,
    /// Если установлен, каждая запись несёт 16-битный хэш.
    pub hashed: bool,
    pub j9_vm: bool,
    pub jvm_version: Option<String>,
}

/// Тип элементов массива примитивов (3-битный код).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean,
    Char,
    Float,
    Double,
    Byte,
    Short,
    Int,
    Long,
}

/// Класс Java.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub address: Address,
    pub super_class_address: Address,
    /// Размер экземпляра в байтах.
    pub instance_size: u32,
    /// Полное имя класса в нотации JVM (`java/lang/String`).
    pub name: String,
    pub hash: i32,
    pub references: Vec<Address>,
}

/// Экземпляр объекта.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub address: Address,
    pub class_address: Address,
    pub hash: i32,
    pub references: Vec<Address>,
}

/// Массив объектов.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectArrayRecord {
    pub address: Address,
    /// Адрес класса элементов.
    pub class_address: Address,
    pub hash: i32,
    /// Размер в байтах.
    pub size: u64,
    /// Фактическая длина массива. В формате v4 совпадает с кол-вом ссылок,
    /// в v5 берётся из хвостового поля записи как есть.
    pub actual_length: u64,
    pub references: Vec<Address>,
}

/// Массив примитивов.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveArrayRecord {
    pub address: Address,
    pub element_type: PrimitiveType,
    pub length: u64,
    pub hash: i32,
    /// Размер в байтах.
    pub size: u64,
}

/// Любая запись тела дампа.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    Class(ClassRecord),
    Object(ObjectRecord),
    ObjectArray(ObjectArrayRecord),
    PrimitiveArray(PrimitiveArrayRecord),
}

/// Вид записи, используется для поиска в индексе и статистики.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Class,
    Object,
    ObjectArray,
    PrimitiveArray,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Platform {
    /// Ширина "word"-поля в байтах.
    pub const fn word_size(self) -> usize {
        match self {
            Self::Bits32 => 4,
            Self::Bits64 => 8,
        }
    }
}

impl Header {
    /// Собирает заголовок из версии и 32-битного поля флагов.
    pub fn from_flags(
        version: u32,
        flags: u32,
        jvm_version: Option<String>,
    ) -> Self {
        let platform = if flags & FLAG_64_BIT != 0 {
            Platform::Bits64
        } else {
            Platform::Bits32
        };
        Self {
            version,
            platform,
            hashed: flags & FLAG_HASHED != 0,
            j9_vm: flags & FLAG_J9_VM != 0,
            jvm_version,
        }
    }
}

impl PrimitiveType {
    /// Тип по 3-битному коду. Старшие биты игнорируются.
    pub fn from_code(code: u8) -> Self {
        match code & 0x7 {
            0 => Self::Boolean,
            1 => Self::Char,
            2 => Self::Float,
            3 => Self::Double,
            4 => Self::Byte,
            5 => Self::Short,
            6 => Self::Int,
            _ => Self::Long,
        }
    }

    /// Размер одного элемента в байтах.
    pub const fn element_size(self) -> usize {
        match self {
            Self::Boolean | Self::Byte => 1,
            Self::Char | Self::Short => 2,
            Self::Float | Self::Int => 4,
            Self::Double | Self::Long => 8,
        }
    }

    /// Имя типа в нотации Java.
    pub const fn java_name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Char => "char",
            Self::Float => "float",
            Self::Double => "double",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
        }
    }
}

impl ObjectArrayRecord {
    /// Кол-во ссылок, объявленное в записи.
    pub fn declared_length(&self) -> u64 {
        self.references.len() as u64
    }
}

impl Record {
    /// Адрес записи.
    pub fn address(&self) -> Address {
        match self {
            Self::Class(c) => c.address,
            Self::Object(o) => o.address,
            Self::ObjectArray(a) => a.address,
            Self::PrimitiveArray(a) => a.address,
        }
    }

    /// Вид записи.
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Class(_) => RecordKind::Class,
            Self::Object(_) => RecordKind::Object,
            Self::ObjectArray(_) => RecordKind::ObjectArray,
            Self::PrimitiveArray(_) => RecordKind::PrimitiveArray,
        }
    }

    /// Исходящие ссылки записи (у массивов примитивов их нет).
    pub fn references(&self) -> &[Address] {
        match self {
            Self::Class(c) => &c.references,
            Self::Object(o) => &o.references,
            Self::ObjectArray(a) => &a.references,
            Self::PrimitiveArray(_) => &[],
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for Platform {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Bits32 => write!(f, "32-bit"),
            Self::Bits64 => write!(f, "64-bit"),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Self::Class => "class",
            Self::Object => "object",
            Self::ObjectArray => "object array",
            Self::PrimitiveArray => "primitive array",
        };
        write!(f, "{name}")
    }
}

impl From<ClassRecord> for Record {
    fn from(c: ClassRecord) -> Self {
        Self::Class(c)
    }
}

impl From<ObjectRecord> for Record {
    fn from(o: ObjectRecord) -> Self {
        Self::Object(o)
    }
}

impl From<ObjectArrayRecord> for Record {
    fn from(a: ObjectArrayRecord) -> Self {
        Self::ObjectArray(a)
    }
}

impl From<PrimitiveArrayRecord> for Record {
    fn from(a: PrimitiveArrayRecord) -> Self {
        Self::PrimitiveArray(a)
    }
}
