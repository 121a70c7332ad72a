//! Error types for the shell.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop the shell or a file-backed operation.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The alias file could not be written.
    #[error("failed to save aliases to {path}: {source}")]
    AliasFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The history file could not be opened or appended to.
    #[error("history file {path}: {source}")]
    HistoryFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An outcome could not be rendered as JSON.
    #[error("failed to render JSON: {0}")]
    Render(#[from] serde_json::Error),
}

/// Result type alias for shell operations.
pub type ShellResult<T> = Result<T, ShellError>;

/// A malformed local command line. Reported to the user, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    /// Wrong arguments to a local command.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// `repeat`/`rvd` count was not a number.
    #[error("count must be integer: {0}")]
    BadCount(String),
}
