//! Logging and tracing setup for the binary.
//!
//! Human-readable events go to stderr, filtered by `-q`/`-v`, `RUST_LOG` or the
//! configured `log_level`. When a log location can be resolved, the same
//! events are also written as JSON lines through a non-blocking appender.
//!
//! Log file location, first match wins:
//! 1. `RICH_DOC_LOG_PATH` (full file path)
//! 2. `RICH_DOC_LOG_DIR` (directory; file is `rich-doc.jsonl`)
//! 3. `log_dir` from configuration
//! 4. `<platform data dir>/rich-doc/logs`

use std::path::PathBuf;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_PATH_ENV: &str = "RICH_DOC_LOG_PATH";
const LOG_DIR_ENV: &str = "RICH_DOC_LOG_DIR";
const LOG_FILE_NAME: &str = "rich-doc.jsonl";

/// Where file logs go.
#[derive(Debug, Clone, Default)]
pub struct ObservabilityConfig {
    /// Directory holding the log file.
    pub log_dir: Option<PathBuf>,
    /// Log file name inside `log_dir`.
    pub file_name: String,
}

impl ObservabilityConfig {
    /// Resolve the log location from the environment, then `config_log_dir`,
    /// then the platform data directory.
    pub fn from_env_with_overrides(config_log_dir: Option<PathBuf>) -> Self {
        if let Some(path) = std::env::var_os(LOG_PATH_ENV).map(PathBuf::from)
            && let Some(file_name) = path.file_name().and_then(|n| n.to_str())
        {
            return Self {
                file_name: file_name.to_string(),
                log_dir: Some(
                    path.parent()
                        .filter(|dir| !dir.as_os_str().is_empty())
                        .map_or_else(|| PathBuf::from("."), PathBuf::from),
                ),
            };
        }

        let log_dir = std::env::var_os(LOG_DIR_ENV)
            .map(PathBuf::from)
            .or(config_log_dir)
            .or_else(|| {
                rich_doc_core::config::user_data_local_dir()
                    .map(|dir| dir.join("logs").into_std_path_buf())
            });

        Self {
            log_dir,
            file_name: LOG_FILE_NAME.to_string(),
        }
    }
}

/// Build the event filter. `RUST_LOG` wins, then `-q`, then `-v`, then the
/// configured level.
pub fn env_filter(quiet: bool, verbose: u8, config_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => config_level,
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    EnvFilter::new(level)
}

/// Install the global subscriber. Keep the returned guard alive until exit so
/// buffered file logs are flushed.
pub fn init_observability(
    config: &ObservabilityConfig,
    filter: EnvFilter,
) -> anyhow::Result<Option<WorkerGuard>> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let mut file_error = None;
    let (file_layer, guard) = match config.log_dir.as_deref().map(|dir| {
        std::fs::create_dir_all(dir)?;
        RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(&config.file_name)
            .build(dir)
            .map_err(std::io::Error::other)
    }) {
        Some(Ok(appender)) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        Some(Err(e)) => {
            file_error = Some(e);
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    if let Some(e) = file_error {
        tracing::warn!(error = %e, dir = ?config.log_dir, "file logging disabled");
    }
    Ok(guard)
}
