//! CLI для разбора PHD дампов.
//!
//! Читает дамп, складывает записи в выбранный индекс и печатает сводку.

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use phdump::{
    build_index, logging::init_logging, DumpParser, IndexMode, ParsingStatistics, Settings,
};
use tracing::{debug, error};

/// Аргументы командной строки.
#[derive(Parser)]
#[command(name = "phdump")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Decode a J9 portable heap dump and print its statistics", long_about = None)]
struct Cli {
    /// Путь к файлу дампа
    #[arg(help = "Path to the .phd file")]
    file: PathBuf,
    /// TOML файл настроек
    #[arg(short, long, env = "PHDUMP_CONFIG", help = "Settings file (TOML)")]
    config: Option<PathBuf>,
    /// Переопределяет index_mode из настроек
    #[arg(long, value_enum, help = "Where decoded records are kept")]
    index: Option<IndexMode>,
    /// Формат вывода статистики
    #[arg(long, value_enum, default_value = "pretty")]
    format: OutputFormat,
    /// Подробные логи (debug)
    #[arg(short, long)]
    verbose: bool,
    /// Только ошибки
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Формат вывода.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutputFormat {
    /// Человекочитаемый формат
    Pretty,
    /// JSON формат
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut settings = Settings::load_from(cli.config.as_deref()).context("Failed to load settings")?;
    if let Some(mode) = cli.index {
        settings.index_mode = mode;
    }
    if cli.verbose {
        settings.log_level = "debug".to_string();
    } else if cli.quiet {
        settings.log_level = "error".to_string();
    }

    init_logging(settings.logging_config())
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to initialize logging")?;
    debug!(?settings, "Settings loaded");

    let stats = parse_file(cli, &settings)?;

    match cli.format {
        OutputFormat::Pretty => println!("{stats}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
    }
    Ok(())
}

fn parse_file(
    cli: &Cli,
    settings: &Settings,
) -> Result<ParsingStatistics> {
    let mut index = build_index(settings.index_mode, settings.spill_dir.as_deref())
        .with_context(|| format!("Failed to create {} index", settings.index_mode))?;

    let mut parser = DumpParser::open(&cli.file, settings.parser_options())
        .with_context(|| format!("Failed to open {}", cli.file.display()))?;

    match parser.parse(&mut index) {
        Ok(stats) => Ok(stats),
        Err(e) => {
            let bytes_read = parser.bytes_read();
            error!(bytes_read, error = %e, "Dump parsing failed");
            Err(anyhow::Error::new(e)
                .context(format!("Failed to parse {} after {bytes_read} bytes", cli.file.display())))
        }
    }
}
