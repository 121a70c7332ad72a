//! Line history backed by an append-only file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{ShellError, ShellResult};

/// Interactive history: earlier sessions' lines plus this one's.
#[derive(Debug)]
pub struct History {
    entries: Vec<String>,
    file: Option<(PathBuf, File)>,
}

impl History {
    /// History that is not persisted.
    pub fn in_memory() -> Self {
        History {
            entries: Vec::new(),
            file: None,
        }
    }

    /// Load `path` if it exists and append new lines to it.
    pub fn open(path: impl Into<PathBuf>) -> ShellResult<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => text.lines().map(str::to_string).collect(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(ShellError::HistoryFile { path, source }),
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| ShellError::HistoryFile {
                path: path.clone(),
                source,
            })?;

        log::debug!("history: {} entries from {}", entries.len(), path.display());
        Ok(History {
            entries,
            file: Some((path, file)),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(|(path, _)| path.as_path())
    }

    /// Record a line.
    pub fn push(&mut self, line: &str) -> ShellResult<()> {
        self.entries.push(line.to_string());
        if let Some((path, file)) = &mut self.file {
            writeln!(file, "{}", line).map_err(|source| ShellError::HistoryFile {
                path: path.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}
