//! Декодер строк дампа.
//!
//! Строка кодируется как `u16` big-endian префикс `L` и следующие за ним
//! байты UTF-8. Префикс задаёт кол-во символов, а не байт, поэтому полный
//! размер заранее неизвестен: сначала читаются `L` байт, а байты, которых
//! не хватило многобайтовым последовательностям, дочитываются по мере
//! исчерпания окна.

use std::io::Read;

use phdump_error::{bail, ensure, PhdError, PhdResult};

use super::cursor::ByteCursor;

/// Максимальная длина одной последовательности UTF-8.
const MAX_SEQUENCE_LEN: usize = 4;

/// Читает строку в текущей позиции курсора.
///
/// `L == 0` даёт пустую строку без дальнейшего чтения. Недопустимый ведущий
/// или продолжающий байт приводит к [`PhdError::InvalidUtf8`].
pub fn read_string<R: Read>(cursor: &mut ByteCursor<R>) -> PhdResult<String> {
    let symbols = cursor.read_u16()? as usize;
    if symbols == 0 {
        return Ok(String::new());
    }

    let start = cursor.bytes_read();
    cursor.reserve_scratch(symbols * MAX_SEQUENCE_LEN);
    cursor.read_block(symbols)?;

    let mut held = symbols;
    let mut pending = 0usize;
    let mut left_in_sequence = 0usize;
    let mut byte_index = 0usize;
    let mut symbol_index = 0usize;

    while symbol_index < symbols {
        let byte = cursor.block(held)[byte_index];
        let offset = Some(start + byte_index as u64);

        if left_in_sequence == 0 {
            let Some(len) = sequence_len(byte) else {
                bail!(PhdError::InvalidUtf8 { byte, offset });
            };
            left_in_sequence = len;
            pending += len - 1;
        } else {
            ensure!(
                is_continuation(byte),
                PhdError::InvalidUtf8 { byte, offset }
            );
        }

        left_in_sequence -= 1;
        if left_in_sequence == 0 {
            symbol_index += 1;
        }

        byte_index += 1;
        if byte_index == held {
            if pending == 0 {
                break;
            }
            cursor.extend_block(held, pending)?;
            held += pending;
            pending = 0;
        }
    }

    // Структура последовательностей уже проверена; overlong-формы и
    // суррогаты заменяются на U+FFFD.
    Ok(String::from_utf8_lossy(cursor.block(held)).into_owned())
}

/// Длина последовательности по ведущему байту.
fn sequence_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC0..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF7 => Some(4),
        _ => None,
    }
}

#[inline]
fn is_continuation(byte: u8) -> bool {
    (0x80..=0xBF).contains(&byte)
}
