use std::fmt;

use num_enum::TryFromPrimitive;

/// Коды статуса для категоризации ошибок.
///
/// # Диапазоны:
/// - 0xxx: Успех
/// - 1xxx: Общие ошибки
/// - 2xxx: Ошибки данных и поиска
/// - 5xxx: Индекс / хранилище
/// - 6xxx: IO
/// - 8xxx: Ошибки формата дампа
///
/// `num_enum::TryFromPrimitive` даёт нативную реализацию `TryFrom<u32>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 0xxx: Успех ===
    Success = 0,

    // === 1xxx: Общие ошибки ===
    Unknown = 1000,
    Unsupported = 1001,
    Internal = 1003,
    InvalidArgs = 1004,

    // === 2xxx: Ошибки данных ===
    NotFound = 2000,
    IndexOutOfBounds = 2006,
    WrongType = 2007,
    InvalidData = 2009,

    // === 5xxx: Индекс / хранилище ===
    StorageUnavailable = 5000,
    SerializationFailed = 5003,
    DeserializationFailed = 5004,

    // === 6xxx: IO ===
    Io = 6000,
    PermissionDenied = 6001,
    UnexpectedEof = 6007,

    // === 8xxx: Формат дампа ===
    InvalidMagic = 8000,
    InvalidTag = 8001,
    InvalidUtf8 = 8004,
    InvalidAddress = 8005,
    ParseError = 8009,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Пытается получить вариант `StatusCode` из `u32`.
    ///
    /// Возвращает `None`, если значение не соответствует ни одному варианту.
    pub fn from_u32(v: u32) -> Option<Self> {
        Self::try_from(v).ok()
    }

    /// Вернёт `true`, если переданный `code` означает успешный результат.
    pub fn is_success(code: u32) -> bool {
        Self::Success as u32 == code
    }

    /// Ошибка формата дампа (диапазон 8xxx).
    pub fn is_format_error(&self) -> bool {
        (8000..=8999).contains(&self.code())
    }

    /// Ошибка индекса или хранилища (диапазон 5xxx).
    pub fn is_storage_error(&self) -> bool {
        (5000..=5999).contains(&self.code())
    }

    /// Требуется ли логировать как критическую ошибку.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Self::Internal | Self::StorageUnavailable | Self::SerializationFailed
        )
    }

    /// Рекомендуемый уровень логирования для данного кода.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::Success => LogLevel::Trace,
            Self::NotFound => LogLevel::Debug,
            Self::InvalidArgs | Self::WrongType => LogLevel::Info,
            Self::Internal | Self::StorageUnavailable | Self::SerializationFailed => {
                LogLevel::Error
            }
            _ => LogLevel::Warn,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
