//! Scripted link for deterministic testing of the frame reader and
//! dispatcher.
//!
//! [`ScriptedLink`] replays a queue of incoming bytes, gaps and errors, and
//! records everything written to it. A read with nothing queued behaves
//! like a serial port with no data: it waits out its timeout and returns
//! `None`.
//!
//! # Example
//!
//! ```
//! use pinrepl_protocol::{read_frame, FrameTiming, ScriptedLink};
//! use std::time::Duration;
//!
//! let mut link = ScriptedLink::new();
//! link.push_bytes(&[0x05, 0x00, 0xFF]);
//!
//! let timing = FrameTiming::new(Duration::from_millis(50), Duration::from_millis(2));
//! let frame = read_frame(&mut link, timing).unwrap();
//! assert_eq!(frame.payload(), &[0x05, 0x00]);
//! ```

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crate::frame::Link;

/// One scripted event on the device → host direction.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Incoming {
    /// A byte available immediately.
    Byte(u8),
    /// One read's worth of silence.
    Gap,
    /// The next read fails.
    Error(io::ErrorKind),
}

/// A [`Link`] that plays back a script.
#[derive(Debug, Default)]
pub struct ScriptedLink {
    /// Queued device → host events.
    incoming: VecDeque<Incoming>,
    /// Reply queued after every write, if set.
    auto_reply: Option<Vec<u8>>,
    /// Log of all writes.
    written: Vec<Vec<u8>>,
    /// Number of `clear_buffers` calls.
    clears: usize,
}

impl ScriptedLink {
    /// Create an empty, silent link.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a link that answers every write with `reply`.
    pub fn replying(reply: &[u8]) -> Self {
        ScriptedLink {
            auto_reply: Some(reply.to_vec()),
            ..Self::default()
        }
    }

    /// Queue bytes that arrive back to back.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.incoming.extend(bytes.iter().copied().map(Incoming::Byte));
    }

    /// Queue one read timeout's worth of silence.
    pub fn push_gap(&mut self) {
        self.incoming.push_back(Incoming::Gap);
    }

    /// Queue a read failure.
    pub fn push_error(&mut self, kind: io::ErrorKind) {
        self.incoming.push_back(Incoming::Error(kind));
    }

    /// All writes, one entry per `write_all` call.
    pub fn written(&self) -> &[Vec<u8>] {
        &self.written
    }

    /// Number of queued events not yet read.
    pub fn pending(&self) -> usize {
        self.incoming.len()
    }

    /// Number of times the buffers were cleared.
    pub fn clears(&self) -> usize {
        self.clears
    }
}

impl Link for ScriptedLink {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.written.push(data.to_vec());
        if let Some(reply) = self.auto_reply.clone() {
            self.push_bytes(&reply);
        }
        Ok(())
    }

    fn read_byte(&mut self, timeout: Duration) -> io::Result<Option<u8>> {
        match self.incoming.pop_front() {
            Some(Incoming::Byte(byte)) => Ok(Some(byte)),
            Some(Incoming::Error(kind)) => Err(io::Error::new(kind, "scripted link error")),
            Some(Incoming::Gap) | None => {
                std::thread::sleep(timeout);
                Ok(None)
            }
        }
    }

    fn clear_buffers(&mut self) -> io::Result<()> {
        self.clears += 1;
        self.incoming.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_in_order() {
        let mut link = ScriptedLink::new();
        link.push_bytes(&[1, 2]);
        link.push_gap();
        link.push_bytes(&[3]);

        let timeout = Duration::from_millis(1);
        assert_eq!(link.read_byte(timeout).unwrap(), Some(1));
        assert_eq!(link.read_byte(timeout).unwrap(), Some(2));
        assert_eq!(link.read_byte(timeout).unwrap(), None);
        assert_eq!(link.read_byte(timeout).unwrap(), Some(3));
        assert_eq!(link.read_byte(timeout).unwrap(), None);
        assert_eq!(link.pending(), 0);
    }

    #[test]
    fn test_auto_reply_per_write() {
        let mut link = ScriptedLink::replying(&[7, 0xFF]);
        link.write_all(&[2, 2]).unwrap();
        link.write_all(&[2, 2]).unwrap();

        assert_eq!(link.written(), &[vec![2, 2], vec![2, 2]]);
        assert_eq!(link.pending(), 4);
    }

    #[test]
    fn test_clear_drops_pending() {
        let mut link = ScriptedLink::new();
        link.push_bytes(&[1, 2, 3]);
        link.clear_buffers().unwrap();
        assert_eq!(link.pending(), 0);
        assert_eq!(link.clears(), 1);
    }
}
