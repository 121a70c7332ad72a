//! Frame reading over an unframed byte stream.
//!
//! Replies have no length prefix and no escaping:
//!
//! ```text
//! +---------------------------+------------+
//! | payload (command-defined) | 0xFF/0xFE  |
//! +---------------------------+------------+
//! ```
//!
//! The end of a frame is inferred from a terminator-valued byte followed
//! by quiescence on the link. A payload byte that happens to equal 0xFF or
//! 0xFE and is followed by a pause longer than the quiet timeout ends the
//! frame early; the reader does not try to tell the two apart.

use std::io;
use std::time::{Duration, Instant};

use bytes::{BufMut, Bytes, BytesMut};

use crate::constants::*;
use crate::error::FrameError;
use crate::types::Terminator;

/// A half-duplex byte link to the device.
///
/// Implemented by the serial port in the runner and by the scripted and
/// simulated links used in tests.
pub trait Link {
    /// Write all bytes and flush them to the device.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read one byte, waiting at most `timeout`. `Ok(None)` means nothing
    /// arrived in time.
    fn read_byte(&mut self, timeout: Duration) -> io::Result<Option<u8>>;

    /// Discard anything pending in either direction.
    fn clear_buffers(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<L: Link + ?Sized> Link for &mut L {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write_all(data)
    }

    fn read_byte(&mut self, timeout: Duration) -> io::Result<Option<u8>> {
        (**self).read_byte(timeout)
    }

    fn clear_buffers(&mut self) -> io::Result<()> {
        (**self).clear_buffers()
    }
}

impl<L: Link + ?Sized> Link for Box<L> {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write_all(data)
    }

    fn read_byte(&mut self, timeout: Duration) -> io::Result<Option<u8>> {
        (**self).read_byte(timeout)
    }

    fn clear_buffers(&mut self) -> io::Result<()> {
        (**self).clear_buffers()
    }
}

/// The two timeouts that bound frame assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTiming {
    /// Total budget for one frame.
    pub overall: Duration,
    /// Per-read timeout; a read that times out counts as quiescence.
    pub quiet: Duration,
}

impl Default for FrameTiming {
    fn default() -> Self {
        FrameTiming {
            overall: DEFAULT_OVERALL_TIMEOUT,
            quiet: DEFAULT_QUIET_TIMEOUT,
        }
    }
}

impl FrameTiming {
    /// Create timing from explicit durations.
    pub fn new(overall: Duration, quiet: Duration) -> Self {
        FrameTiming { overall, quiet }
    }
}

/// One complete reply: a non-empty byte run whose last byte is a terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Bytes,
    terminator: Terminator,
}

impl Frame {
    /// Wrap raw bytes, or `None` if they do not end in a terminator.
    pub fn new(bytes: impl Into<Bytes>) -> Option<Self> {
        let bytes = bytes.into();
        let terminator = Terminator::from_byte(*bytes.last()?)?;
        Some(Frame { bytes, terminator })
    }

    /// Everything before the terminator.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[..self.bytes.len() - 1]
    }

    /// The final status byte.
    pub fn terminator(&self) -> Terminator {
        self.terminator
    }

    /// Split into payload and terminator.
    pub fn split(&self) -> (&[u8], Terminator) {
        (self.payload(), self.terminator)
    }

    /// The whole frame as received.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Frame length including the terminator.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; a frame holds at least its terminator.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Read one frame from the link.
///
/// Bytes are read one at a time with the quiet timeout. When a
/// terminator-valued byte arrives, one more read is attempted straight
/// away: silence means the frame is done, a byte means the terminator
/// value was payload data and accumulation carries on. A read that times
/// out while the last byte is a terminator value also completes the frame.
///
/// Returns [`FrameError::Timeout`] with whatever was received once the
/// overall timeout passes without a complete frame.
pub fn read_frame<L: Link + ?Sized>(link: &mut L, timing: FrameTiming) -> Result<Frame, FrameError> {
    let start = Instant::now();
    let mut buf = BytesMut::with_capacity(FRAME_CAPACITY_HINT);

    while start.elapsed() < timing.overall {
        let Some(byte) = link.read_byte(timing.quiet)? else {
            if let Some(frame) = complete(&buf) {
                return Ok(frame);
            }
            continue;
        };

        buf.put_u8(byte);
        if !Terminator::matches(byte) {
            continue;
        }

        match link.read_byte(timing.quiet)? {
            None => {
                if let Some(frame) = complete(&buf) {
                    return Ok(frame);
                }
            }
            Some(tail) => {
                log::trace!(
                    "terminator value 0x{:02X} at offset {} followed by 0x{:02X}; reading on",
                    byte,
                    buf.len() - 1,
                    tail
                );
                buf.put_u8(tail);
            }
        }
    }

    if !buf.is_empty() {
        log::warn!("frame incomplete after {:?}: {:02X?}", timing.overall, &buf[..]);
    }
    Err(FrameError::Timeout { partial: buf.to_vec() })
}

fn complete(buf: &BytesMut) -> Option<Frame> {
    let frame = Frame::new(Bytes::copy_from_slice(buf))?;
    log::trace!("frame complete: {:02X?}", frame.as_bytes());
    Some(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedLink;

    fn fast() -> FrameTiming {
        FrameTiming::new(Duration::from_millis(60), Duration::from_millis(2))
    }

    #[test]
    fn test_frame_requires_terminator() {
        assert!(Frame::new(Vec::<u8>::new()).is_none());
        assert!(Frame::new(vec![0x05, 0x00]).is_none());

        let frame = Frame::new(vec![0x05, 0x00, 0xFE]).expect("should be a frame");
        assert_eq!(frame.payload(), &[0x05, 0x00]);
        assert_eq!(frame.terminator(), Terminator::Error);
        assert_eq!(frame.len(), 3);
    }

    #[test]
    fn test_read_simple_frame() {
        let mut link = ScriptedLink::new();
        link.push_bytes(&[0x05, 0x00, 0xFF]);

        let frame = read_frame(&mut link, fast()).expect("should read frame");
        assert_eq!(frame.as_bytes(), &[0x05, 0x00, 0xFF]);
        assert_eq!(frame.terminator(), Terminator::Success);
    }

    #[test]
    fn test_read_bare_terminator() {
        let mut link = ScriptedLink::new();
        link.push_bytes(&[0xFE]);

        let frame = read_frame(&mut link, fast()).expect("should read frame");
        assert!(frame.payload().is_empty());
        assert_eq!(frame.terminator(), Terminator::Error);
    }

    #[test]
    fn test_silence_times_out() {
        let mut link = ScriptedLink::new();
        let started = Instant::now();

        match read_frame(&mut link, fast()) {
            Err(FrameError::Timeout { partial }) => assert!(partial.is_empty()),
            other => panic!("Expected Timeout, got {:?}", other),
        }
        assert!(started.elapsed() >= Duration::from_millis(60));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_partial_frame_times_out_with_bytes() {
        let mut link = ScriptedLink::new();
        link.push_bytes(&[0x05, 0x00]);

        match read_frame(&mut link, fast()) {
            Err(FrameError::Timeout { partial }) => assert_eq!(partial, vec![0x05, 0x00]),
            other => panic!("Expected Timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_slow_payload_still_frames() {
        // Gaps between payload bytes are fine as long as no terminator
        // value has been seen yet.
        let mut link = ScriptedLink::new();
        link.push_bytes(&[0xE8]);
        link.push_gap();
        link.push_gap();
        link.push_bytes(&[0x03, 0xFF]);

        let frame = read_frame(&mut link, fast()).expect("should read frame");
        assert_eq!(frame.as_bytes(), &[0xE8, 0x03, 0xFF]);
    }

    #[test]
    fn test_terminator_value_in_contiguous_payload() {
        // analogread of 1023: payload 0xFF 0x03, then the real terminator.
        let mut link = ScriptedLink::new();
        link.push_bytes(&[0xFF, 0x03, 0xFF]);

        let frame = read_frame(&mut link, fast()).expect("should read frame");
        assert_eq!(frame.payload(), &[0xFF, 0x03]);
        assert_eq!(frame.terminator(), Terminator::Success);
    }

    #[test]
    fn test_terminator_value_followed_by_pause_splits_frame() {
        // Known protocol limitation: a pause after a payload byte equal to
        // 0xFF is indistinguishable from the end of the frame.
        let mut link = ScriptedLink::new();
        link.push_bytes(&[0xFF]);
        link.push_gap();
        link.push_bytes(&[0x03, 0xFF]);

        let frame = read_frame(&mut link, fast()).expect("should read frame");
        assert_eq!(frame.as_bytes(), &[0xFF]);
        assert!(frame.payload().is_empty());

        // The rest of the real reply is left on the link.
        let stale = read_frame(&mut link, fast()).expect("should read leftover");
        assert_eq!(stale.as_bytes(), &[0x03, 0xFF]);
    }

    #[test]
    fn test_consecutive_terminator_values() {
        let mut link = ScriptedLink::new();
        link.push_bytes(&[0x05, 0xFE, 0xFF]);

        let frame = read_frame(&mut link, fast()).expect("should read frame");
        assert_eq!(frame.payload(), &[0x05, 0xFE]);
        assert_eq!(frame.terminator(), Terminator::Success);
    }

    #[test]
    fn test_link_error_propagates() {
        let mut link = ScriptedLink::new();
        link.push_error(io::ErrorKind::BrokenPipe);

        assert!(matches!(read_frame(&mut link, fast()), Err(FrameError::Io(_))));
    }
}
