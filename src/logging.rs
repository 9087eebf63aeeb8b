//! Log setup for the `workbench` binary.
//!
//! Results go to stdout and notifications to stderr. Logs share stderr at
//! `warn` by default; `--log-file` moves them into the state directory at
//! `info`. `RUST_LOG` overrides either level.

use std::fs::{self, File};
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

/// Where log records are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// Interleaved with notifications on stderr.
    Stderr,
    /// `workbench.log` under the state directory, truncated per run.
    File,
}

impl LogTarget {
    /// Picks the target for the `--log-file` flag.
    pub fn from_flag(log_file: bool) -> Self {
        if log_file {
            Self::File
        } else {
            Self::Stderr
        }
    }

    fn default_directive(self) -> &'static str {
        match self {
            Self::Stderr => "warn",
            Self::File => "info",
        }
    }
}

/// Installs the global subscriber. A log file that cannot be created falls
/// back to stderr.
pub fn init(target: LogTarget) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(target.default_directive()));

    if target == LogTarget::File {
        match open_log_file() {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(file)
                    .with_ansi(false)
                    .init();
                return;
            }
            Err(e) => eprintln!("Warning: logging to stderr, {e}"),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_log_file() -> std::io::Result<File> {
    let path = log_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    File::create(&path)
}

/// Path of the log file used by [`LogTarget::File`].
pub fn log_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::config_dir)
        .map(|dir| dir.join("db-workbench"))
        .unwrap_or_else(std::env::temp_dir)
        .join("workbench.log")
}
