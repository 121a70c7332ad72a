//! Runner error types.

use std::io;
use std::path::PathBuf;

use pinrepl_shell::ShellError;
use thiserror::Error;

/// Errors that end the program.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config file is not valid YAML for [`RunnerConfig`](crate::RunnerConfig).
    #[error("invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Auto-detection found no port.
    #[error("no serial ports available")]
    NoPorts,

    /// Opening or configuring the port failed.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Terminal or file failure inside the shell.
    #[error(transparent)]
    Shell(#[from] ShellError),

    /// Other I/O failure, including link reads and writes.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;
