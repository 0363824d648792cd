use std::io::{self, Stderr};

use tracing_subscriber::{fmt, layer::Layer as LayerTrait, registry::LookupSpan};

use crate::logging::config::{LogFormat, LoggingConfig};

/// Собирает fmt-слой выбранного формата. Логи пишутся в stderr, stdout
/// остаётся для результата.
pub fn build_formatter_from_config<S>(config: &LoggingConfig) -> Box<dyn LayerTrait<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let writer: fn() -> Stderr = io::stderr;

    match config.format {
        LogFormat::Json => Box::new(
            fmt::layer()
                .event_format(fmt::format().json().with_current_span(true))
                .with_writer(writer)
                .with_ansi(false)
                .with_target(config.with_target),
        ),
        LogFormat::Pretty => Box::new(
            fmt::layer()
                .event_format(fmt::format().pretty())
                .with_writer(writer)
                .with_ansi(config.with_ansi)
                .with_target(config.with_target),
        ),
        LogFormat::Compact => Box::new(
            fmt::layer()
                .event_format(fmt::format().compact())
                .with_writer(writer)
                .with_ansi(config.with_ansi)
                .with_target(config.with_target),
        ),
    }
}
