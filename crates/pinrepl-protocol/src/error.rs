//! Protocol error types.

use std::io;

use thiserror::Error;

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, CommandError>;

/// A bad or missing argument token. Raised before any byte is written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    /// A required token was not supplied.
    #[error("{command} requires {what}")]
    Missing {
        /// Command being encoded.
        command: &'static str,
        /// Description of the missing tokens.
        what: &'static str,
    },

    /// A token that must be numeric did not parse as an integer.
    #[error("not an integer: {token:?}")]
    NotAnInteger {
        /// The offending token.
        token: String,
    },

    /// A pin number outside 0-255.
    #[error("pin out of range 0-255: {token}")]
    PinOutOfRange {
        /// The offending token.
        token: String,
    },

    /// A shortcut alias was used without its argument.
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Location of an overrun inside a length-prefixed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOverrun {
    /// Field being read when the payload ran out.
    pub field: &'static str,
    /// Offset of that field within the payload.
    pub offset: usize,
    /// Bytes the field needs.
    pub needed: usize,
    /// Bytes left in the payload at that offset.
    pub remaining: usize,
}

impl std::fmt::Display for RecordOverrun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} needs {} bytes at offset {}, {} remaining",
            self.field, self.needed, self.offset, self.remaining
        )
    }
}

/// Failure turning a frame into a structured reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The terminator reported a device-side failure.
    #[error("device error")]
    Device,

    /// The payload is shorter than the reply layout requires.
    #[error("short payload: expected at least {expected} bytes, got {actual}")]
    ShortPayload {
        /// Minimum payload length.
        expected: usize,
        /// Payload length received.
        actual: usize,
    },

    /// A field or length-prefixed section ran past the end of the payload.
    #[error("parse fail: {0}")]
    Overrun(RecordOverrun),
}

/// Failure assembling a frame from the link.
#[derive(Error, Debug)]
pub enum FrameError {
    /// The overall timeout elapsed without a complete frame. `partial`
    /// holds whatever arrived, possibly nothing.
    #[error("timed out after {} bytes", partial.len())]
    Timeout {
        /// Bytes received before giving up.
        partial: Vec<u8>,
    },

    /// The link itself failed.
    #[error("link I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Every way a single command execution can fail.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The name did not resolve to a command after alias lookup.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The argument tokens could not be encoded. Nothing was sent.
    #[error("arg build error: {0}")]
    Argument(#[from] ArgumentError),

    /// Nothing at all arrived within the overall timeout.
    #[error("no response")]
    NoResponse,

    /// Some bytes arrived but never formed a complete frame.
    #[error("incomplete response: {} bytes before timeout", partial.len())]
    LinkTimeout {
        /// Bytes received before giving up.
        partial: Vec<u8>,
    },

    /// The device answered with the error terminator.
    #[error("device error")]
    Device,

    /// The frame was complete but its payload too short for the command.
    #[error("short payload: expected at least {expected} bytes, got {actual}")]
    ShortPayload {
        /// Minimum payload length.
        expected: usize,
        /// Payload length received.
        actual: usize,
    },

    /// A structured payload was ill-formed.
    #[error("parse fail: {0}")]
    DecodeFailure(RecordOverrun),

    /// Writing to or reading from the link failed.
    #[error("link error: {0}")]
    Link(#[from] io::Error),
}

impl From<DecodeError> for CommandError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Device => CommandError::Device,
            DecodeError::ShortPayload { expected, actual } => {
                CommandError::ShortPayload { expected, actual }
            }
            DecodeError::Overrun(overrun) => CommandError::DecodeFailure(overrun),
        }
    }
}

impl From<FrameError> for CommandError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Timeout { partial } if partial.is_empty() => CommandError::NoResponse,
            FrameError::Timeout { partial } => CommandError::LinkTimeout { partial },
            FrameError::Io(e) => CommandError::Link(e),
        }
    }
}
