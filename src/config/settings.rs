use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::{
    dump::{ParserOptions, DEFAULT_PROGRESS_INTERVAL, DEFAULT_READ_BUFFER_SIZE},
    index::IndexMode,
    logging::{LogFormat, LoggingConfig},
};

/// Настройки приложения.
///
/// Источники по возрастанию приоритета: значения по умолчанию, TOML файл
/// (если указан), переменные окружения с префиксом `PHDUMP_`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Размер буфера чтения файла дампа.
    pub read_buffer_size: usize,
    /// Шаг сообщений о прогрессе; `0` отключает их.
    pub progress_interval_bytes: u64,
    pub index_mode: IndexMode,
    /// Каталог временных файлов для `index_mode = "spill"`.
    pub spill_dir: Option<PathBuf>,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Settings {
    /// Загружает настройки без файла.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Загружает настройки, добавляя обязательный TOML файл `path`.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // Добавляем значения по умолчанию
            .set_default("read_buffer_size", DEFAULT_READ_BUFFER_SIZE as i64)?
            .set_default("progress_interval_bytes", DEFAULT_PROGRESS_INTERVAL as i64)?
            .set_default("index_mode", IndexMode::default().to_string())?
            .set_default("log_level", "info")?
            .set_default("log_format", LogFormat::default().to_string())?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        let cfg = builder
            // Переменные окружения с префиксом PHDUMP_
            .add_source(Environment::with_prefix("PHDUMP").try_parsing(true))
            .build()?;

        cfg.try_deserialize()
    }

    /// Параметры потокового парсера.
    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            read_buffer_size: self.read_buffer_size,
            progress_interval_bytes: self.progress_interval_bytes,
        }
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            format: self.log_format,
            ..Default::default()
        }
    }
}
