//! Persistent user aliases.
//!
//! Aliases live in a JSON object mapping alias name to command name. A
//! missing or unreadable file is treated as empty so that a damaged file
//! never keeps the shell from starting.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{ShellError, ShellResult};

/// User alias file on disk.
#[derive(Debug, Clone)]
pub struct AliasStore {
    path: PathBuf,
}

impl AliasStore {
    /// A store backed by `path`. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        AliasStore { path: path.into() }
    }

    /// The alias file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the alias map.
    pub fn load(&self) -> BTreeMap<String, String> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                log::warn!("ignoring alias file {}: {}", self.path.display(), e);
                return BTreeMap::new();
            }
        };

        match serde_json::from_str(&text) {
            Ok(aliases) => aliases,
            Err(e) => {
                log::warn!("ignoring malformed alias file {}: {}", self.path.display(), e);
                BTreeMap::new()
            }
        }
    }

    /// Replace the file contents with `aliases`.
    pub fn save(&self, aliases: &BTreeMap<String, String>) -> ShellResult<()> {
        let text = serde_json::to_string_pretty(aliases)?;
        fs::write(&self.path, text).map_err(|source| ShellError::AliasFile {
            path: self.path.clone(),
            source,
        })?;
        log::debug!("saved {} aliases to {}", aliases.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = AliasStore::new(dir.path().join("aliases.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = AliasStore::new(dir.path().join("aliases.json"));

        let mut aliases = BTreeMap::new();
        aliases.insert("led".to_string(), "digitalwrite".to_string());
        aliases.insert("pot".to_string(), "analogread".to_string());
        store.save(&aliases).unwrap();

        assert_eq!(store.load(), aliases);
        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\"led\": \"digitalwrite\""));
    }

    #[test]
    fn test_malformed_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(AliasStore::new(path).load().is_empty());
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = AliasStore::new(dir.path().join("nope").join("aliases.json"));
        assert!(matches!(
            store.save(&BTreeMap::new()),
            Err(ShellError::AliasFile { .. })
        ));
    }
}
