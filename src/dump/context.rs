//! Изменяемое состояние сессии разбора.
//!
//! Записи тела связаны в цепочку: адрес каждой записи кодируется как
//! смещение от адреса предыдущей, а короткие объекты ссылаются на класс по
//! номеру слота в кэше недавно встреченных классов. Поэтому записи можно
//! декодировать только строго по порядку.

use std::num::NonZeroUsize;

use lru::LruCache;
use phdump_error::PhdError;

use super::{
    records::Address,
    tags::{CLASS_CACHE_SLOTS, GAP_UNIT},
};

const CACHE_CAPACITY: NonZeroUsize = NonZeroUsize::MIN.saturating_add(CLASS_CACHE_SLOTS - 1);

/// Состояние, которое передаётся через все декодеры записей.
pub struct ParsingContext {
    last_address: Address,
    /// MRU-кэш адресов классов. Значения не нужны, важен только порядок.
    class_cache: LruCache<Address, ()>,
}

impl ParsingContext {
    pub fn new() -> Self {
        Self {
            last_address: 0,
            class_cache: LruCache::new(CACHE_CAPACITY),
        }
    }

    /// База для вычисления адреса следующей записи.
    pub fn last_address(&self) -> Address {
        self.last_address
    }

    pub fn set_last_address(
        &mut self,
        address: Address,
    ) {
        self.last_address = address;
    }

    /// Помещает адрес класса в начало кэша. Повторная вставка только
    /// переносит адрес вперёд, самый старый адрес вытесняется.
    pub fn record_class_address(
        &mut self,
        address: Address,
    ) {
        self.class_cache.put(address, ());
    }

    /// Адрес класса в слоте `slot` (0 - самый свежий).
    pub fn class_address_at(
        &self,
        slot: usize,
    ) -> Result<Address, PhdError> {
        self.class_cache
            .iter()
            .nth(slot)
            .map(|(address, _)| *address)
            .ok_or(PhdError::ClassCacheMiss {
                slot,
                filled: self.class_cache.len(),
                offset: None,
            })
    }

    /// Содержимое кэша от самого свежего к самому старому.
    pub fn cached_classes(&self) -> Vec<Address> {
        self.class_cache.iter().map(|(a, _)| *a).collect()
    }

    /// Вычисляет адрес следующей записи и сдвигает базу на него.
    pub fn advance(
        &mut self,
        gap: i64,
    ) -> Result<Address, PhdError> {
        let address = offset_address(self.last_address, gap)?;
        self.last_address = address;
        Ok(address)
    }
}

impl Default for ParsingContext {
    fn default() -> Self {
        Self::new()
    }
}

/// `base + gap * 4` с проверкой выхода за пределы `u64`.
///
/// Используется и для цепочки адресов записей, и для ссылок, которые
/// отсчитываются от адреса самой записи.
pub fn offset_address(
    base: Address,
    gap: i64,
) -> Result<Address, PhdError> {
    let target = base as i128 + gap as i128 * GAP_UNIT as i128;
    if target < 0 {
        return Err(PhdError::NegativeAddress {
            base,
            gap,
            offset: None,
        });
    }
    Address::try_from(target).map_err(|_| PhdError::AddressOverflow {
        base,
        gap,
        offset: None,
    })
}
