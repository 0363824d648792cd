//! Индексы, в которые парсер складывает декодированные записи.
//!
//! Дампы обычно больше доступной памяти, поэтому парсер не хранит записи
//! сам, а передаёт каждую в [`IndexSink`]. Реализация решает, что держать
//! в памяти, что выгружать на диск, а что отбрасывать.

mod class_only;
mod memory;
mod spill;

use std::{fmt, path::Path};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub use class_only::ClassOnlyIndex;
pub use memory::MemoryIndex;
use phdump_error::PhdResult;
pub use spill::SpillIndex;

use crate::dump::{Address, ClassRecord, Record, RecordKind};

/// Хранилище записей, индексированное по адресу.
///
/// Парсер вызывает методы строго из одного потока и по порядку записей в
/// дампе. Повторный `save` того же адреса заменяет прежнее значение.
pub trait IndexSink {
    /// Сохраняет объект или массив по адресу.
    fn save(
        &mut self,
        address: Address,
        record: Record,
    ) -> PhdResult<()>;

    /// Сохраняет класс. Классы дополнительно доступны для поиска по адресу
    /// класса.
    fn save_class(
        &mut self,
        class: ClassRecord,
    ) -> PhdResult<()>;

    /// Ищет запись заданного вида.
    fn find(
        &mut self,
        address: Address,
        kind: RecordKind,
    ) -> PhdResult<Option<Record>>;

    /// Вызывается после завершающего тега тела.
    fn flush(&mut self) -> PhdResult<()> {
        Ok(())
    }
}

/// Способ хранения записей.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IndexMode {
    /// Все записи в памяти.
    #[default]
    Memory,
    /// Только классы, остальные записи отбрасываются.
    Classes,
    /// Классы в памяти, остальное во временном файле.
    Spill,
}

/// Создаёт индекс выбранного вида. `spill_dir` используется только для
/// [`IndexMode::Spill`].
pub fn build_index(
    mode: IndexMode,
    spill_dir: Option<&Path>,
) -> PhdResult<Box<dyn IndexSink>> {
    let index: Box<dyn IndexSink> = match mode {
        IndexMode::Memory => Box::new(MemoryIndex::new()),
        IndexMode::Classes => Box::new(ClassOnlyIndex::new()),
        IndexMode::Spill => Box::new(match spill_dir {
            Some(dir) => SpillIndex::in_dir(dir)?,
            None => SpillIndex::new()?,
        }),
    };
    Ok(index)
}

impl<S: IndexSink + ?Sized> IndexSink for Box<S> {
    fn save(
        &mut self,
        address: Address,
        record: Record,
    ) -> PhdResult<()> {
        (**self).save(address, record)
    }

    fn save_class(
        &mut self,
        class: ClassRecord,
    ) -> PhdResult<()> {
        (**self).save_class(class)
    }

    fn find(
        &mut self,
        address: Address,
        kind: RecordKind,
    ) -> PhdResult<Option<Record>> {
        (**self).find(address, kind)
    }

    fn flush(&mut self) -> PhdResult<()> {
        (**self).flush()
    }
}

impl fmt::Display for IndexMode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Classes => write!(f, "classes"),
            Self::Spill => write!(f, "spill"),
        }
    }
}
