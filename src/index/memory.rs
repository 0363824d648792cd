use dashmap::DashMap;
use phdump_error::PhdResult;

use super::IndexSink;
use crate::dump::{Address, ClassRecord, Record, RecordKind};

/// Индекс, который держит все записи в памяти.
///
/// Таблицы построены на `DashMap`, поэтому после разбора индекс можно
/// читать из нескольких потоков через `&self`.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    classes: DashMap<Address, ClassRecord>,
    records: DashMap<Address, Record>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Класс по адресу.
    pub fn class(
        &self,
        address: Address,
    ) -> Option<ClassRecord> {
        self.classes.get(&address).map(|entry| entry.clone())
    }

    /// Объект или массив по адресу, независимо от вида.
    pub fn record(
        &self,
        address: Address,
    ) -> Option<Record> {
        self.records.get(&address).map(|entry| entry.clone())
    }

    /// Имя класса записи, если класс известен.
    pub fn class_name_of(
        &self,
        address: Address,
    ) -> Option<String> {
        let class_address = match &*self.records.get(&address)? {
            Record::Object(o) => o.class_address,
            Record::ObjectArray(a) => a.class_address,
            Record::Class(_) | Record::PrimitiveArray(_) => return None,
        };
        self.classes.get(&class_address).map(|c| c.name.clone())
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.records.is_empty()
    }
}

impl IndexSink for MemoryIndex {
    fn save(
        &mut self,
        address: Address,
        record: Record,
    ) -> PhdResult<()> {
        match record {
            Record::Class(class) => {
                self.classes.insert(address, class);
            }
            other => {
                self.records.insert(address, other);
            }
        }
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
        Ok(match kind {
            RecordKind::Class => self.class(address).map(Record::Class),
            _ => self.record(address).filter(|r| r.kind() == kind),
        })
    }
}
