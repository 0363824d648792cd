pub mod config;
mod filters;
mod formatter;

pub use config::{LogFormat, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Инициализация логирования с конфигурацией.
///
/// Устанавливает глобальный subscriber, поэтому успешно вызывается один
/// раз на процесс.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    config.validate()?;

    let env_filter = filters::build_filter_from_config(&config);
    let fmt_layer = formatter::build_formatter_from_config(&config);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.level,
        log_format = %config.format,
        "Logging system initialized"
    );

    Ok(())
}
