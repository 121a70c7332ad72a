//! Pin REPL serial protocol
//!
//! This crate provides the host side of a small request/response protocol for
//! driving the pins of a microcontroller over a serial link.
//!
//! # Protocol Overview
//!
//! Every request is an opcode byte followed by zero, one or two argument
//! bytes; the argument count is fixed per opcode. Every reply is a payload of
//! command-defined length followed by one terminator byte:
//!
//! - `0xFF`: success
//! - `0xFE`: error (the payload is empty)
//!
//! Replies carry no length prefix and no escaping, so a payload byte can equal
//! a terminator value. The frame reader in [`frame`] uses a quiet timeout to
//! decide where a reply ends.
//!
//! | Opcode | Command        | Args          | Success payload      |
//! |--------|----------------|---------------|----------------------|
//! | 0      | `nop`          | none          | none                 |
//! | 1      | `info`         | none          | device info record   |
//! | 2      | `digitalread`  | pin           | 1 byte               |
//! | 3      | `digitalwrite` | pin, level    | none                 |
//! | 4      | `analogread`   | pin           | u16 little-endian    |
//! | 5      | `analogwrite`  | pin, duty     | none                 |
//! | 6      | `pinmode`      | pin, mode     | none                 |
//! | 7      | `reset`        | none          | none                 |
//!
//! # Example
//!
//! ```
//! use pinrepl_protocol::{Aliases, CommandTable, Dispatcher, FrameTiming, Reply, SimulatedDevice};
//!
//! let table = CommandTable::new();
//! let aliases = Aliases::builtin();
//! let dispatcher = Dispatcher::new(&table, &aliases, FrameTiming::default());
//!
//! let mut device = SimulatedDevice::new();
//! device.set_analog_input(14, 512);
//!
//! let outcome = dispatcher.execute(&mut device, "ar", &["14"]);
//! assert_eq!(outcome.reply(), Some(&Reply::AnalogRead { value: 512 }));
//! ```

pub mod alias;
pub mod commands;
mod constants;
pub mod dispatch;
mod error;
pub mod frame;
mod mock;
mod responses;
pub mod sim;
mod types;

pub use alias::*;
pub use commands::*;
pub use constants::*;
pub use dispatch::*;
pub use error::*;
pub use frame::*;
pub use mock::*;
pub use responses::*;
pub use sim::*;
pub use types::*;
