use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки индекса, в который парсер складывает разобранные записи.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Index I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize record at 0x{address:X}: {reason}")]
    Serialization { address: u64, reason: String },

    #[error("Failed to read back record at 0x{address:X}: {reason}")]
    Deserialization { address: u64, reason: String },
}

impl ErrorExt for IndexError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Io(_) => StatusCode::StorageUnavailable,
            Self::Serialization { .. } => StatusCode::SerializationFailed,
            Self::Deserialization { .. } => StatusCode::DeserializationFailed,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
