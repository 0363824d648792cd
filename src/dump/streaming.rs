//! Потоковый парсер PHD дампа.
//!
//! Парсер читает заголовок, затем в цикле декодирует записи тела и
//! передаёт каждую в [`IndexSink`]. В памяти одновременно находится только
//! одна запись, поэтому размер дампа ограничен лишь индексом.
//!
//! # События
//!
//! Через [`ParseListener`] вызывающий код получает:
//! - `on_header()` - заголовок разобран;
//! - `on_progress()` - прочитана очередная порция байт.

use std::{
    fmt,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use phdump_error::{PhdResult, ResultExt};
use serde::Serialize;
use tracing::{debug, info, trace};

use super::{
    context::ParsingContext,
    cursor::ByteCursor,
    decode,
    records::{Header, Record, RecordKind},
};
use crate::index::IndexSink;

/// Размер буфера чтения файла по умолчанию.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// Интервал сообщений о прогрессе по умолчанию.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100 * 1024 * 1024;

/// Наблюдатель за ходом разбора.
pub trait ParseListener {
    /// Вызывается один раз после разбора заголовка.
    fn on_header(
        &mut self,
        _bytes_read: u64,
        _header: &Header,
    ) {
    }

    /// Вызывается каждый раз, когда прочитан очередной интервал байт.
    fn on_progress(
        &mut self,
        _bytes_read: u64,
        _stats: &ParsingStatistics,
    ) {
    }
}

/// Наблюдатель, который ничего не делает.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

/// Параметры парсера.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Размер `BufReader` при открытии файла через [`DumpParser::open`].
    pub read_buffer_size: usize,
    /// Шаг сообщений о прогрессе в байтах; `0` отключает их.
    pub progress_interval_bytes: u64,
}

/// Итог разбора дампа.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsingStatistics {
    pub header: Header,
    pub classes: u64,
    pub objects: u64,
    pub object_arrays: u64,
    pub primitive_arrays: u64,
    /// Сколько байт прочитано на момент формирования статистики.
    pub bytes_read: u64,
}

/// Потоковый парсер дампа поверх произвольного `Read`.
///
/// Источник принадлежит парсеру и освобождается при его уничтожении, в
/// том числе после ошибки.
pub struct DumpParser<R: Read> {
    cursor: ByteCursor<R>,
    options: ParserOptions,
    next_progress_at: u64,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl ParsingStatistics {
    pub fn new(header: Header) -> Self {
        Self {
            header,
            classes: 0,
            objects: 0,
            object_arrays: 0,
            primitive_arrays: 0,
            bytes_read: 0,
        }
    }

    /// Общее кол-во записей всех видов.
    pub fn total_records(&self) -> u64 {
        self.classes + self.objects + self.object_arrays + self.primitive_arrays
    }

    /// Кол-во записей заданного вида.
    pub fn count(
        &self,
        kind: RecordKind,
    ) -> u64 {
        match kind {
            RecordKind::Class => self.classes,
            RecordKind::Object => self.objects,
            RecordKind::ObjectArray => self.object_arrays,
            RecordKind::PrimitiveArray => self.primitive_arrays,
        }
    }

    fn increment(
        &mut self,
        kind: RecordKind,
    ) {
        match kind {
            RecordKind::Class => self.classes += 1,
            RecordKind::Object => self.objects += 1,
            RecordKind::ObjectArray => self.object_arrays += 1,
            RecordKind::PrimitiveArray => self.primitive_arrays += 1,
        }
    }
}

impl DumpParser<BufReader<File>> {
    /// Открывает файл дампа с буфером размера `options.read_buffer_size`.
    pub fn open(
        path: impl AsRef<Path>,
        options: ParserOptions,
    ) -> PhdResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        debug!(path = %path.display(), buffer = options.read_buffer_size, "Opened dump");
        let reader = BufReader::with_capacity(options.read_buffer_size, file);
        Ok(Self::with_options(reader, options))
    }
}

impl<R: Read> DumpParser<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, ParserOptions::default())
    }

    pub fn with_options(
        reader: R,
        options: ParserOptions,
    ) -> Self {
        let next_progress_at = options.progress_interval_bytes;
        Self {
            cursor: ByteCursor::new(reader),
            options,
            next_progress_at,
        }
    }

    /// Сколько байт потреблено. Доступно и после ошибки разбора.
    pub fn bytes_read(&self) -> u64 {
        self.cursor.bytes_read()
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Потребляет парсер и возвращает источник.
    pub fn into_inner(self) -> R {
        self.cursor.into_inner()
    }

    /// Разбирает весь дамп: заголовок и тело.
    pub fn parse<S: IndexSink + ?Sized>(
        &mut self,
        sink: &mut S,
    ) -> PhdResult<ParsingStatistics> {
        self.parse_with_listener(sink, &mut NoopListener)
    }

    /// Разбирает весь дамп, сообщая о ходе разбора наблюдателю.
    pub fn parse_with_listener<S, L>(
        &mut self,
        sink: &mut S,
        listener: &mut L,
    ) -> PhdResult<ParsingStatistics>
    where
        S: IndexSink + ?Sized,
        L: ParseListener + ?Sized,
    {
        let header = self.read_header()?;
        listener.on_header(self.bytes_read(), &header);
        self.read_body_with_listener(&header, sink, listener)
    }

    /// Читает заголовок дампа.
    pub fn read_header(&mut self) -> PhdResult<Header> {
        let start = self.bytes_read();
        let header = decode::read_header(&mut self.cursor)?;
        debug!(
            version = header.version,
            platform = %header.platform,
            hashed = header.hashed,
            j9_vm = header.j9_vm,
            jvm = header.jvm_version.as_deref().unwrap_or("-"),
            bytes = self.bytes_read() - start,
            "Header parsed"
        );
        Ok(header)
    }

    /// Читает тело дампа до завершающего тега.
    pub fn read_body<S: IndexSink + ?Sized>(
        &mut self,
        header: &Header,
        sink: &mut S,
    ) -> PhdResult<ParsingStatistics> {
        self.read_body_with_listener(header, sink, &mut NoopListener)
    }

    /// Читает тело дампа, сообщая о прогрессе наблюдателю.
    ///
    /// Любая ошибка декодера прерывает разбор и возвращается как есть;
    /// частичная статистика при этом не возвращается.
    pub fn read_body_with_listener<S, L>(
        &mut self,
        header: &Header,
        sink: &mut S,
        listener: &mut L,
    ) -> PhdResult<ParsingStatistics>
    where
        S: IndexSink + ?Sized,
        L: ParseListener + ?Sized,
    {
        decode::open_body(&mut self.cursor)?;
        debug!(offset = self.bytes_read(), "Entered the body");

        let mut ctx = ParsingContext::new();
        let mut stats = ParsingStatistics::new(header.clone());

        while let Some(record) = decode::read_record(&mut self.cursor, header, &mut ctx)? {
            let kind = record.kind();
            trace!(kind = %kind, address = record.address(), "Record decoded");

            match record {
                Record::Class(class) => sink.save_class(class)?,
                other => sink.save(other.address(), other)?,
            }
            stats.increment(kind);

            self.report_progress(&mut stats, listener);
        }

        sink.flush()?;
        stats.bytes_read = self.bytes_read();
        info!(
            bytes = stats.bytes_read,
            records = stats.total_records(),
            "Exited the body"
        );
        Ok(stats)
    }

    fn report_progress<L: ParseListener + ?Sized>(
        &mut self,
        stats: &mut ParsingStatistics,
        listener: &mut L,
    ) {
        let interval = self.options.progress_interval_bytes;
        let bytes_read = self.bytes_read();
        if interval == 0 || bytes_read < self.next_progress_at {
            return;
        }

        info!(bytes = bytes_read, records = stats.total_records(), "Bytes read");
        stats.bytes_read = bytes_read;
        listener.on_progress(bytes_read, stats);
        self.next_progress_at = (bytes_read / interval + 1) * interval;
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            progress_interval_bytes: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl ParseListener for NoopListener {}

impl<F> ParseListener for F
where
    F: FnMut(u64, &ParsingStatistics),
{
    fn on_progress(
        &mut self,
        bytes_read: u64,
        stats: &ParsingStatistics,
    ) {
        self(bytes_read, stats)
    }
}

impl fmt::Display for ParsingStatistics {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let h = &self.header;
        writeln!(f, "PHD version:      {}", h.version)?;
        writeln!(f, "Platform:         {}", h.platform)?;
        writeln!(f, "Hashed:           {}", h.hashed)?;
        writeln!(f, "J9 VM:            {}", h.j9_vm)?;
        if let Some(jvm) = &h.jvm_version {
            writeln!(f, "JVM version:      {jvm}")?;
        }
        writeln!(f, "Classes:          {}", self.classes)?;
        writeln!(f, "Objects:          {}", self.objects)?;
        writeln!(f, "Object arrays:    {}", self.object_arrays)?;
        writeln!(f, "Primitive arrays: {}", self.primitive_arrays)?;
        writeln!(f, "Total records:    {}", self.total_records())?;
        write!(f, "Bytes read:       {}", self.bytes_read)
    }
}
