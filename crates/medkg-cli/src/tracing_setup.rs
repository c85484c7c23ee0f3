use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

const DEFAULT_FILTER: &str = "info,cozo=error,tokenizers=error,candle_transformers=error";

/// Where the rolling log lives: the platform data dir, or `./logs` when there is none.
pub fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("medkg").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// `RUST_LOG` if set and valid, otherwise the default filter.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber: a daily rolling file log filtered by `RUST_LOG`, plus
/// warnings and errors on stderr. Keep the returned guard alive until exit so buffered lines
/// are flushed.
pub fn init_tracing() -> std::io::Result<WorkerGuard> {
    let filter = env_filter();

    let dir = log_dir();
    std::fs::create_dir_all(&dir)?;
    let file_appender = tracing_appender::rolling::daily(&dir, "medkg.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(false)
        .with_writer(non_blocking_file);

    let console_layer = fmt::layer()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .with_filter(LevelFilter::WARN);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    Ok(guard)
}
