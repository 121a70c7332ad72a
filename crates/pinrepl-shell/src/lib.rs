//! Pin REPL shell
//!
//! This crate provides the user-facing layer on top of `pinrepl-protocol`:
//! a line language of local commands, persistent user aliases, history, and
//! rendering of command outcomes as plain text or JSON.
//!
//! # Line Language
//!
//! - **Local commands**: `help`, `exit`, `aliases`, `alias add|rm`,
//!   `history`, `json`, `run <file>`, `repeat <n> <cmd>`, `rvd <n> <cmd>`
//! - **Device commands**: anything else, resolved through the alias layer
//!   and sent to the device
//!
//! # Example
//!
//! ```
//! use pinrepl_protocol::SimulatedDevice;
//! use pinrepl_shell::{Shell, ShellOptions};
//!
//! let mut shell = Shell::new(SimulatedDevice::new(), ShellOptions::default());
//! let mut out = Vec::new();
//! shell.handle_line("on 13", &mut out).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "ok: true\n");
//! ```

mod alias_store;
mod commands;
mod error;
mod history;
mod output;
mod shell;

pub use alias_store::*;
pub use commands::*;
pub use error::*;
pub use history::*;
pub use output::*;
pub use shell::*;
