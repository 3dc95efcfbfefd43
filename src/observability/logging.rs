//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber from `LoggingConfig`
//! - Honor `RUST_LOG` over the configured level when present
//!
//! # Output styles
//! - `console`: human-readable, stdout
//! - `json`: one JSON object per line, stdout (also forced by `release`)
//! - `file`: plain text appended to `logging.path`

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file {path}: {source}")]
    File {
        path: String,
        source: std::io::Error,
    },

    #[error("a global subscriber is already installed")]
    AlreadyInstalled,
}

enum Output {
    Console,
    Json,
    File(File),
}

/// Install the global subscriber.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let output = match config.style.as_str() {
        "file" => Output::File(open_log_file(&config.path)?),
        "json" => Output::Json,
        _ if config.release => Output::Json,
        "console" | "" => Output::Console,
        other => {
            eprintln!("unknown log style '{}', using console", other);
            Output::Console
        }
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match output {
        Output::Console => registry.with(fmt::layer()).try_init(),
        Output::Json => registry.with(fmt::layer().json()).try_init(),
        Output::File(file) => registry
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .try_init(),
    };

    installed.map_err(|_| LoggingError::AlreadyInstalled)
}

fn open_log_file(path: &str) -> Result<File, LoggingError> {
    let to_error = |source| LoggingError::File {
        path: path.to_string(),
        source,
    };

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(to_error)?;
        }
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_error)
}
