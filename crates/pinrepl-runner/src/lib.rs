//! # pinrepl-runner
//!
//! Command-line front end for the pin REPL. Parses arguments, loads the
//! YAML config, opens the serial port (or the simulated board) and hands
//! the link to the shell.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod serial;

pub use app::{run, run_session};
pub use cli::Cli;
pub use config::RunnerConfig;
pub use error::{RunnerError, RunnerResult};
pub use serial::{detect_port, list_ports, select_port, PortEntry, SerialLink};
