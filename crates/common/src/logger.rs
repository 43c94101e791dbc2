use crate::config::AppConfig;
use crate::error::CatalogSearchError;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

const LOG_FILE_NAME: &str = "catalogsearch.log";

/// Initialize logging for a long-running process (`serve`, `worker`)
///
/// Console and an append-only file under `config.log_dir` share one filter;
/// `RUST_LOG` takes precedence over `config.log_level`.
pub fn setup_logging(config: &AppConfig) -> Result<PathBuf, CatalogSearchError> {
    let (log_file, log_file_path) = open_log_file(&config.log_dir)?;
    let env_filter = build_filter(&config.log_level);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(env_filter.clone());

    let file_layer = fmt::layer()
        .with_writer(log_file)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CatalogSearchError::config(format!("Failed to install subscriber: {}", e)))?;

    tracing::info!(
        level = %config.log_level,
        log_file = %log_file_path.display(),
        "Logging initialized"
    );

    Ok(log_file_path)
}

/// Console-only logging for one-shot commands such as `backfill`
pub fn setup_console_logging(log_level: &str) -> Result<(), CatalogSearchError> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(build_filter(log_level))
        .try_init()
        .map_err(|e| CatalogSearchError::config(format!("Failed to install subscriber: {}", e)))?;

    tracing::debug!("Console logging initialized: level={}", log_level);

    Ok(())
}

fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(parse_log_level(log_level).as_str().to_lowercase()))
}

fn open_log_file(log_dir: &Path) -> Result<(File, PathBuf), CatalogSearchError> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        CatalogSearchError::config(format!(
            "Failed to create log directory {}: {}",
            log_dir.display(),
            e
        ))
    })?;

    let path = log_dir.join(LOG_FILE_NAME);
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| {
            CatalogSearchError::config(format!(
                "Failed to open log file {}: {}",
                path.display(),
                e
            ))
        })?;

    Ok((file, path))
}

/// Parse string to tracing Level
pub fn parse_log_level(level: &str) -> Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to INFO", level);
            Level::INFO
        }
    }
}
