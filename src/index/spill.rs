use std::{
    collections::HashMap,
    fs::File,
    io::{BufWriter, Read, Seek, SeekFrom, Write},
    path::Path,
};

use phdump_error::{IndexError, PhdResult};
use tempfile::NamedTempFile;
use tracing::debug;

use super::IndexSink;
use crate::dump::{Address, ClassRecord, Record, RecordKind};

/// Положение сериализованной записи во временном файле.
#[derive(Debug, Clone, Copy)]
struct SpillEntry {
    offset: u64,
    len: u32,
    kind: RecordKind,
}

/// Индекс с выгрузкой на диск.
///
/// Классы хранятся в памяти. Объекты и массивы сериализуются `bincode` и
/// дописываются во временный файл, в памяти остаётся только карта
/// адрес → смещение. Файл удаляется вместе с индексом.
pub struct SpillIndex {
    classes: HashMap<Address, ClassRecord>,
    entries: HashMap<Address, SpillEntry>,
    writer: BufWriter<File>,
    /// Отдельный дескриптор со своей позицией чтения.
    reader: File,
    end: u64,
    dirty: bool,
    _file: NamedTempFile,
}

impl SpillIndex {
    /// Создаёт индекс во временном каталоге системы.
    pub fn new() -> PhdResult<Self> {
        let file = NamedTempFile::new().map_err(IndexError::from)?;
        Self::from_temp(file)
    }

    /// Создаёт индекс в каталоге `dir`.
    pub fn in_dir(dir: &Path) -> PhdResult<Self> {
        let file = NamedTempFile::new_in(dir).map_err(IndexError::from)?;
        Self::from_temp(file)
    }

    fn from_temp(file: NamedTempFile) -> PhdResult<Self> {
        let writer = file.as_file().try_clone().map_err(IndexError::from)?;
        let reader = file.reopen().map_err(IndexError::from)?;
        debug!(path = %file.path().display(), "Spill index created");

        Ok(Self {
            classes: HashMap::new(),
            entries: HashMap::new(),
            writer: BufWriter::new(writer),
            reader,
            end: 0,
            dirty: false,
            _file: file,
        })
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Кол-во выгруженных записей.
    pub fn spilled_count(&self) -> usize {
        self.entries.len()
    }

    /// Сколько байт записано во временный файл.
    pub fn spilled_bytes(&self) -> u64 {
        self.end
    }

    fn read_back(
        &mut self,
        address: Address,
        entry: SpillEntry,
    ) -> PhdResult<Record> {
        if self.dirty {
            self.writer.flush().map_err(IndexError::from)?;
            self.dirty = false;
        }

        let mut buf = vec![0; entry.len as usize];
        self.reader
            .seek(SeekFrom::Start(entry.offset))
            .map_err(IndexError::from)?;
        self.reader.read_exact(&mut buf).map_err(IndexError::from)?;

        let record = bincode::deserialize(&buf).map_err(|e| IndexError::Deserialization {
            address,
            reason: e.to_string(),
        })?;
        Ok(record)
    }
}

impl IndexSink for SpillIndex {
    fn save(
        &mut self,
        address: Address,
        record: Record,
    ) -> PhdResult<()> {
        if let Record::Class(class) = record {
            self.classes.insert(address, class);
            return Ok(());
        }

        let kind = record.kind();
        let bytes = bincode::serialize(&record).map_err(|e| IndexError::Serialization {
            address,
            reason: e.to_string(),
        })?;
        self.writer.write_all(&bytes).map_err(IndexError::from)?;

        // Повторная запись адреса оставляет старые байты в файле
        // недостижимыми.
        self.entries.insert(
            address,
            SpillEntry {
                offset: self.end,
                len: bytes.len() as u32,
                kind,
            },
        );
        self.end += bytes.len() as u64;
        self.dirty = true;
        Ok(())
    }

    fn save_class(
        &mut self,
        class: ClassRecord,
    ) -> PhdResult<()> {
        self.classes.insert(class.address, class);
        Ok(())
    }

    fn find(
        &mut self,
        address: Address,
        kind: RecordKind,
    ) -> PhdResult<Option<Record>> {
        if kind == RecordKind::Class {
            return Ok(self.classes.get(&address).cloned().map(Record::Class));
        }
        match self.entries.get(&address).copied() {
            Some(entry) if entry.kind == kind => self.read_back(address, entry).map(Some),
            _ => Ok(None),
        }
    }

    fn flush(&mut self) -> PhdResult<()> {
        self.writer.flush().map_err(IndexError::from)?;
        self.dirty = false;
        debug!(
            records = self.entries.len(),
            bytes = self.end,
            "Spill index flushed"
        );
        Ok(())
    }
}
