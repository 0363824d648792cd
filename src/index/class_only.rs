use std::collections::HashMap;

use phdump_error::PhdResult;

use super::IndexSink;
use crate::dump::{Address, ClassRecord, Record, RecordKind};

/// Начальная ёмкость таблицы классов.
const INITIAL_CAPACITY: usize = 100_000;

/// Минимальный индекс: хранит только классы.
///
/// Объекты и массивы принимаются и молча отбрасываются, учитывается
/// только их кол-во. Подходит для быстрой сводки по дампу.
#[derive(Debug)]
pub struct ClassOnlyIndex {
    classes: HashMap<Address, ClassRecord>,
    dropped: u64,
}

impl ClassOnlyIndex {
    pub fn new() -> Self {
        Self {
            classes: HashMap::with_capacity(INITIAL_CAPACITY),
            dropped: 0,
        }
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Сколько записей было отброшено.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Итератор по классам в произвольном порядке.
    pub fn classes(&self) -> impl Iterator<Item = &ClassRecord> {
        self.classes.values()
    }
}

impl Default for ClassOnlyIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexSink for ClassOnlyIndex {
    fn save(
        &mut self,
        _address: Address,
        record: Record,
    ) -> PhdResult<()> {
        match record {
            Record::Class(class) => self.save_class(class),
            _ => {
                self.dropped += 1;
                Ok(())
            }
        }
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
        if kind != RecordKind::Class {
            return Ok(None);
        }
        Ok(self.classes.get(&address).cloned().map(Record::Class))
    }
}
