//! Logging configuration.
//!
//! The library only ever emits through `tracing` macros; embedding
//! applications pick where that output goes. Services that own a terminal
//! use [`init_stderr_logging`]; long-running hosts use [`init_file_logging`],
//! which appends across runs so a restart never wipes the trail of earlier
//! batches.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log file location.
pub const LOG_PATH_ENV: &str = "COURIER_LOG";

/// Initializes logging to a file, appending to any previous run's output.
///
/// The location comes from `COURIER_LOG` when set, otherwise from
/// [`get_log_path`]. Failure to set up the file degrades to no logging
/// rather than failing the host, and a subscriber installed earlier by the
/// embedding application is left in place.
pub fn init_file_logging() {
    let log_path = get_log_path();

    let log_file = match open_log_file(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file {}: {e}", log_path.display());
            return;
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_writer(log_file)
        .with_ansi(false)
        .try_init();
}

/// Initializes logging to stderr, for services and test output capture.
pub fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .try_init();
}

/// Returns the path for the log file.
///
/// Precedence: the `COURIER_LOG` environment variable, then the XDG state
/// directory (`~/.local/state/courier/courier.log` on Linux), then the
/// platform config directory, then the temp directory.
pub fn get_log_path() -> PathBuf {
    if let Ok(path) = std::env::var(LOG_PATH_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(state_dir) = dirs::state_dir() {
        return state_dir.join("courier").join("courier.log");
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("courier").join("courier.log");
    }

    std::env::temp_dir().join("courier.log")
}

/// Opens the log file in append mode, creating parent directories as needed.
fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
