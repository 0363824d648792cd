use std::any::Any;

use crate::{ErrorExt, StatusCode};

/// Основная ошибка разбора PHD дампа.
///
/// Каждый вариант хранит смещение (кол-во байт, прочитанных к моменту
/// обнаружения ошибки). Все ошибки фатальны: после них граница записей в
/// потоке потеряна.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhdError {
    /// Заголовок не начинается со строки `"portable heap dump"`
    InvalidMagic { got: String, offset: Option<u64> },

    /// Неверный открывающий тег заголовка или неизвестный тег записи заголовка
    InvalidHeaderTag { tag: u8, offset: Option<u64> },

    /// Неверный открывающий тег тела дампа
    InvalidBodyTag { tag: u8, offset: Option<u64> },

    /// Неизвестный тег записи в теле дампа
    InvalidTag { tag: u8, offset: Option<u64> },

    /// Недопустимый ведущий или продолжающий байт UTF-8
    InvalidUtf8 { byte: u8, offset: Option<u64> },

    /// Вычисленный адрес записи отрицателен
    NegativeAddress {
        base: u64,
        gap: i64,
        offset: Option<u64>,
    },

    /// Вычисленный адрес не помещается в 64 бита
    AddressOverflow {
        base: u64,
        gap: i64,
        offset: Option<u64>,
    },

    /// Поток закончился раньше, чем ожидалось
    UnexpectedEof {
        expected_bytes: u64,
        got_bytes: u64,
        offset: Option<u64>,
    },

    /// Запрошен слот кэша классов за пределами заполненной части
    ClassCacheMiss {
        slot: usize,
        filled: usize,
        offset: Option<u64>,
    },
}

/// Категория ошибки разбора.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Нарушение формата: магия, теги, UTF-8, адреса.
    Format,
    /// Недостаточно байт в источнике.
    Truncation,
    /// Несогласованность кэша классов.
    Lookup,
}

impl PhdError {
    /// Категория ошибки.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnexpectedEof { .. } => ErrorKind::Truncation,
            Self::ClassCacheMiss { .. } => ErrorKind::Lookup,
            _ => ErrorKind::Format,
        }
    }

    /// Смещение в потоке, на котором обнаружена ошибка.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Self::InvalidMagic { offset, .. }
            | Self::InvalidHeaderTag { offset, .. }
            | Self::InvalidBodyTag { offset, .. }
            | Self::InvalidTag { offset, .. }
            | Self::InvalidUtf8 { offset, .. }
            | Self::NegativeAddress { offset, .. }
            | Self::AddressOverflow { offset, .. }
            | Self::UnexpectedEof { offset, .. }
            | Self::ClassCacheMiss { offset, .. } => *offset,
        }
    }

    /// Добавляет контекст offset к ошибке.
    pub fn with_offset(
        mut self,
        at: u64,
    ) -> Self {
        match &mut self {
            Self::InvalidMagic { offset, .. }
            | Self::InvalidHeaderTag { offset, .. }
            | Self::InvalidBodyTag { offset, .. }
            | Self::InvalidTag { offset, .. }
            | Self::InvalidUtf8 { offset, .. }
            | Self::NegativeAddress { offset, .. }
            | Self::AddressOverflow { offset, .. }
            | Self::UnexpectedEof { offset, .. }
            | Self::ClassCacheMiss { offset, .. } => *offset = Some(at),
        }
        self
    }

    /// Возвращает подсказку для пользователя.
    pub fn recovery_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidMagic { .. } => Some("The file is not a portable heap dump"),
            Self::UnexpectedEof { .. } => Some("Dump may be truncated. Check file integrity"),
            Self::ClassCacheMiss { .. } => {
                Some("Dump is inconsistent: object refers to a class that was never announced")
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for PhdError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::InvalidMagic { got, offset } => {
                write!(
                    f,
                    "Invalid dump title: expected \"portable heap dump\", got {got:?}"
                )?;
                write_offset(f, *offset)
            }
            Self::InvalidHeaderTag { tag, offset } => {
                write!(f, "Header has an invalid format: tag 0x{tag:02X}")?;
                write_offset(f, *offset)
            }
            Self::InvalidBodyTag { tag, offset } => {
                write!(f, "Body has an invalid format: opening tag 0x{tag:02X}")?;
                write_offset(f, *offset)
            }
            Self::InvalidTag { tag, offset } => {
                write!(f, "Unrecognized record tag 0x{tag:02X}")?;
                write_offset(f, *offset)
            }
            Self::InvalidUtf8 { byte, offset } => {
                write!(f, "Invalid UTF-8 byte 0x{byte:02X}")?;
                write_offset(f, *offset)
            }
            Self::NegativeAddress { base, gap, offset } => {
                write!(
                    f,
                    "Negative address: base 0x{base:X}, address gap {gap}"
                )?;
                write_offset(f, *offset)
            }
            Self::AddressOverflow { base, gap, offset } => {
                write!(
                    f,
                    "Address overflow: base 0x{base:X}, address gap {gap}"
                )?;
                write_offset(f, *offset)
            }
            Self::UnexpectedEof {
                expected_bytes,
                got_bytes,
                offset,
            } => {
                write!(f, "Unexpected end of dump")?;
                if *expected_bytes > 0 {
                    write!(f, " (expected {expected_bytes} bytes, got {got_bytes})")?;
                }
                write_offset(f, *offset)
            }
            Self::ClassCacheMiss {
                slot,
                filled,
                offset,
            } => {
                write!(
                    f,
                    "Class cache size is {filled}, but requested slot {slot}"
                )?;
                write_offset(f, *offset)
            }
        }
    }
}

/// Вспомогательная функция для форматирования смещения.
fn write_offset(
    f: &mut std::fmt::Formatter<'_>,
    offset: Option<u64>,
) -> std::fmt::Result {
    if let Some(o) = offset {
        write!(f, " [offset: 0x{o:X}]")?;
    }
    Ok(())
}

impl std::error::Error for PhdError {}

impl ErrorExt for PhdError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidMagic { .. } => StatusCode::InvalidMagic,
            Self::InvalidHeaderTag { .. } | Self::InvalidBodyTag { .. } | Self::InvalidTag { .. } => {
                StatusCode::InvalidTag
            }
            Self::InvalidUtf8 { .. } => StatusCode::InvalidUtf8,
            Self::NegativeAddress { .. } | Self::AddressOverflow { .. } => {
                StatusCode::InvalidAddress
            }
            Self::UnexpectedEof { .. } => StatusCode::UnexpectedEof,
            Self::ClassCacheMiss { .. } => StatusCode::IndexOutOfBounds,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn client_message(&self) -> String {
        match self {
            Self::InvalidMagic { .. } => "Not a portable heap dump".to_string(),
            Self::UnexpectedEof { .. } => "Incomplete heap dump".to_string(),
            Self::ClassCacheMiss { .. } => "Inconsistent heap dump".to_string(),
            _ => "Corrupted heap dump".to_string(),
        }
    }

    fn log_message(&self) -> String {
        let mut msg = format!("{:?}", self);
        if let Some(hint) = self.recovery_hint() {
            msg.push_str(&format!(" | Hint: {hint}"));
        }
        msg
    }
}
