//! Runner configuration.
//!
//! Settings come from three places, later ones winning: built-in defaults,
//! an optional YAML file, and the command line.
//!
//! ```yaml
//! port: /dev/ttyACM0
//! baud: 115200
//! quiet_timeout_ms: 30
//! json: true
//! aliases_file: /home/me/.pinrepl_aliases.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pinrepl_protocol::{
    FrameTiming, DEFAULT_BAUD, DEFAULT_OVERALL_TIMEOUT, DEFAULT_QUIET_TIMEOUT, DEFAULT_SETTLE_DELAY,
};
use pinrepl_shell::{ShellOptions, DEFAULT_REPEAT_DELAY};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::error::{RunnerError, RunnerResult};

/// Alias file name in the home directory.
pub const ALIASES_FILE_NAME: &str = ".pinrepl_aliases.json";

/// History file name in the home directory.
pub const HISTORY_FILE_NAME: &str = ".pinrepl_history";

/// Per-read timeout while opening the port.
pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_millis(100);

/// All runner settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Serial port; auto-detected when unset.
    pub port: Option<String>,
    /// Line speed.
    pub baud: u32,
    /// Budget for one complete reply.
    pub overall_timeout_ms: u64,
    /// Silence that ends a reply after a terminator byte.
    pub quiet_timeout_ms: u64,
    /// Wait after opening the port, while the board reboots.
    pub settle_ms: u64,
    /// Per-read timeout while opening the port.
    pub open_timeout_ms: u64,
    /// Print outcomes as JSON.
    pub json: bool,
    /// Defaults to `~/.pinrepl_aliases.json`.
    pub aliases_file: Option<PathBuf>,
    /// Defaults to `~/.pinrepl_history`.
    pub history_file: Option<PathBuf>,
    /// Pause between `repeat`/`rvd` iterations.
    pub repeat_delay_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            port: None,
            baud: DEFAULT_BAUD,
            overall_timeout_ms: DEFAULT_OVERALL_TIMEOUT.as_millis() as u64,
            quiet_timeout_ms: DEFAULT_QUIET_TIMEOUT.as_millis() as u64,
            settle_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            open_timeout_ms: DEFAULT_OPEN_TIMEOUT.as_millis() as u64,
            json: false,
            aliases_file: None,
            history_file: None,
            repeat_delay_ms: DEFAULT_REPEAT_DELAY.as_millis() as u64,
        }
    }
}

impl RunnerConfig {
    /// Parse a YAML document.
    pub fn from_yaml(text: &str, path: &Path) -> RunnerResult<Self> {
        serde_yaml::from_str(text).map_err(|source| RunnerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a YAML config file.
    pub fn load(path: &Path) -> RunnerResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| RunnerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text, path)
    }

    /// Load the explicit file if given, else the default file if it exists,
    /// else the defaults.
    pub fn discover(explicit: Option<&Path>) -> RunnerResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => {
                tracing::debug!("using config {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(port) = &cli.port {
            self.port = Some(port.clone());
        }
        if let Some(baud) = cli.baud {
            self.baud = baud;
        }
        self.json |= cli.json;
    }

    /// Frame reader timeouts.
    pub fn timing(&self) -> FrameTiming {
        FrameTiming::new(
            Duration::from_millis(self.overall_timeout_ms),
            Duration::from_millis(self.quiet_timeout_ms),
        )
    }

    /// Wait after opening the port.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Per-read timeout while opening the port.
    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }

    /// Options for the shell session.
    pub fn shell_options(&self) -> ShellOptions {
        ShellOptions {
            json: self.json,
            repeat_delay: Duration::from_millis(self.repeat_delay_ms),
            timing: self.timing(),
        }
    }

    /// Alias file, falling back to the home directory.
    pub fn aliases_path(&self) -> Option<PathBuf> {
        self.aliases_file
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(ALIASES_FILE_NAME)))
    }

    /// History file, falling back to the home directory.
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_file
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(HISTORY_FILE_NAME)))
    }
}

/// `<config dir>/pinrepl/config.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pinrepl").join("config.yaml"))
}
