use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Формат вывода логов.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

/// Настройки логирования.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Уровень (`info`) или полная директива `EnvFilter`
    /// (`phdump=debug,warn`).
    pub level: String,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub with_target: bool,
}

const KNOWN_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

impl LoggingConfig {
    /// Директива для `EnvFilter`. Голый уровень относится ко всем целям.
    pub fn build_filter_directive(&self) -> String {
        self.level.trim().to_lowercase()
    }

    /// Проверяет уровень. Директивы с `=` проверяются при сборке фильтра.
    pub fn validate(&self) -> Result<(), String> {
        let directive = self.build_filter_directive();
        if directive.contains('=') || KNOWN_LEVELS.contains(&directive.as_str()) {
            Ok(())
        } else {
            Err(format!("Unknown log level: {}", self.level))
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            with_ansi: true,
            with_target: false,
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown log format: {other}")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Compact => write!(f, "compact"),
            Self::Json => write!(f, "json"),
        }
    }
}
