//! Последовательное чтение big-endian примитивов из произвольного `Read`.
//!
//! Курсор никогда не возвращается назад. Все чтения идут через один
//! переиспользуемый буфер, который растёт по требованию и не сжимается.

use std::io::{self, Read};

use byteorder::{BigEndian, ByteOrder};
use phdump_error::{ensure, PhdError, PhdResult};

use super::records::Platform;

/// Начальный размер буфера чтения.
const INITIAL_SCRATCH_SIZE: usize = 1024;

/// Курсор поверх источника байт.
pub struct ByteCursor<R: Read> {
    inner: R,
    scratch: Vec<u8>,
    bytes_read: u64,
}

impl<R: Read> ByteCursor<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            scratch: vec![0; INITIAL_SCRATCH_SIZE],
            bytes_read: 0,
        }
    }

    /// Сколько байт потреблено с начала потока.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Текущий размер буфера чтения.
    pub fn scratch_capacity(&self) -> usize {
        self.scratch.len()
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Потребляет курсор и возвращает источник.
    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn read_u8(&mut self) -> PhdResult<u8> {
        self.fill(0, 1)?;
        Ok(self.scratch[0])
    }

    pub fn read_i8(&mut self) -> PhdResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> PhdResult<u16> {
        self.fill(0, 2)?;
        Ok(BigEndian::read_u16(&self.scratch))
    }

    pub fn read_i16(&mut self) -> PhdResult<i16> {
        self.fill(0, 2)?;
        Ok(BigEndian::read_i16(&self.scratch))
    }

    pub fn read_u32(&mut self) -> PhdResult<u32> {
        self.fill(0, 4)?;
        Ok(BigEndian::read_u32(&self.scratch))
    }

    pub fn read_i32(&mut self) -> PhdResult<i32> {
        self.fill(0, 4)?;
        Ok(BigEndian::read_i32(&self.scratch))
    }

    pub fn read_u64(&mut self) -> PhdResult<u64> {
        self.fill(0, 8)?;
        Ok(BigEndian::read_u64(&self.scratch))
    }

    pub fn read_i64(&mut self) -> PhdResult<i64> {
        self.fill(0, 8)?;
        Ok(BigEndian::read_i64(&self.scratch))
    }

    /// Беззнаковое "word"-поле: 4 или 8 байт в зависимости от платформы.
    pub fn read_unsigned_word(
        &mut self,
        platform: Platform,
    ) -> PhdResult<u64> {
        match platform {
            Platform::Bits32 => Ok(self.read_u32()? as u64),
            Platform::Bits64 => self.read_u64(),
        }
    }

    /// Знаковое "word"-поле: 4 или 8 байт в зависимости от платформы.
    pub fn read_signed_word(
        &mut self,
        platform: Platform,
    ) -> PhdResult<i64> {
        match platform {
            Platform::Bits32 => Ok(self.read_i32()? as i64),
            Platform::Bits64 => self.read_i64(),
        }
    }

    /// Читает ровно `len` байт в начало буфера и возвращает их.
    pub fn read_block(
        &mut self,
        len: usize,
    ) -> PhdResult<&[u8]> {
        self.fill(0, len)?;
        Ok(&self.scratch[..len])
    }

    /// Дочитывает `extra` байт вслед за уже прочитанными `held` байтами
    /// буфера и возвращает всё окно `[0, held + extra)`.
    pub(crate) fn extend_block(
        &mut self,
        held: usize,
        extra: usize,
    ) -> PhdResult<&[u8]> {
        self.fill(held, extra)?;
        Ok(&self.scratch[..held + extra])
    }

    /// Окно уже прочитанных байт без нового чтения.
    pub(crate) fn block(
        &self,
        len: usize,
    ) -> &[u8] {
        &self.scratch[..len]
    }

    /// Гарантирует, что буфер вмещает не меньше `len` байт.
    pub(crate) fn reserve_scratch(
        &mut self,
        len: usize,
    ) {
        if self.scratch.len() < len {
            self.scratch.resize(len, 0);
        }
    }

    /// Заполняет `scratch[at..at + len]` из источника.
    fn fill(
        &mut self,
        at: usize,
        len: usize,
    ) -> PhdResult<()> {
        self.reserve_scratch(at + len);

        let start = self.bytes_read;
        let mut got = 0;
        while got < len {
            match self.inner.read(&mut self.scratch[at + got..at + len]) {
                Ok(0) => break,
                Ok(n) => got += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.bytes_read += got as u64;

        ensure!(
            got == len,
            PhdError::UnexpectedEof {
                expected_bytes: len as u64,
                got_bytes: got as u64,
                offset: Some(start),
            }
        );
        Ok(())
    }
}
