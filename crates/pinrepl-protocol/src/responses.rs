//! Replies from the firmware.
//!
//! A reply is the payload of a frame plus its terminator. Each command has
//! its own payload layout; the decoders here turn it into a [`Reply`] and
//! convert every malformed case into a [`DecodeError`] instead of panicking.

use bytes::Buf;

use crate::commands::CommandKind;
use crate::error::{CommandError, DecodeError, RecordOverrun};
use crate::types::{DeviceInfo, Terminator};

/// Advisory attached to a successful reset.
pub const RESET_NOTE: &str = "device reset likely triggered";

/// A successfully decoded reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Success with no payload (`nop`, `digitalwrite`, `analogwrite`, `pinmode`).
    Ack,
    /// The board accepted a reset and is rebooting.
    Reset {
        /// Fixed advisory text.
        note: &'static str,
    },
    /// Digital pin level.
    DigitalRead {
        /// Level as reported (0 or 1 on real hardware).
        value: u8,
    },
    /// Analog reading.
    AnalogRead {
        /// 10-bit ADC value.
        value: u16,
    },
    /// Device information record.
    Info(DeviceInfo),
}

impl Reply {
    /// The single reading carried by this reply, if any.
    pub fn value(&self) -> Option<u16> {
        match self {
            Reply::DigitalRead { value } => Some(u16::from(*value)),
            Reply::AnalogRead { value } => Some(*value),
            Reply::Ack | Reply::Reset { .. } | Reply::Info(_) => None,
        }
    }
}

/// Result of executing one command, successful or not.
#[derive(Debug)]
pub struct Outcome {
    /// The command that was resolved, if resolution got that far.
    pub command: Option<CommandKind>,
    /// Decoded reply, or why there is none.
    pub result: Result<Reply, CommandError>,
}

impl Outcome {
    /// A successful outcome.
    pub fn success(command: CommandKind, reply: Reply) -> Self {
        Outcome {
            command: Some(command),
            result: Ok(reply),
        }
    }

    /// A failed outcome.
    pub fn failure(command: Option<CommandKind>, error: CommandError) -> Self {
        Outcome {
            command,
            result: Err(error),
        }
    }

    /// Whether the command succeeded end to end.
    pub fn ok(&self) -> bool {
        self.result.is_ok()
    }

    /// The reply, if the command succeeded.
    pub fn reply(&self) -> Option<&Reply> {
        self.result.as_ref().ok()
    }

    /// The error, if the command failed.
    pub fn error(&self) -> Option<&CommandError> {
        self.result.as_ref().err()
    }

    /// Shorthand for [`Reply::value`].
    pub fn value(&self) -> Option<u16> {
        self.reply().and_then(Reply::value)
    }
}

// ============================================================================
// Decoders
// ============================================================================

/// Replies that carry nothing but the terminator.
pub fn parse_without_payload(_payload: &[u8], terminator: Terminator) -> Result<Reply, DecodeError> {
    match terminator {
        Terminator::Success => Ok(Reply::Ack),
        Terminator::Error => Err(DecodeError::Device),
    }
}

/// Reset acknowledgement.
pub fn parse_reset(_payload: &[u8], terminator: Terminator) -> Result<Reply, DecodeError> {
    match terminator {
        Terminator::Success => Ok(Reply::Reset { note: RESET_NOTE }),
        Terminator::Error => Err(DecodeError::Device),
    }
}

/// One-byte digital level.
pub fn parse_digitalread(payload: &[u8], terminator: Terminator) -> Result<Reply, DecodeError> {
    if terminator == Terminator::Error {
        return Err(DecodeError::Device);
    }
    match payload.first() {
        Some(&value) => Ok(Reply::DigitalRead { value }),
        None => Err(DecodeError::ShortPayload {
            expected: 1,
            actual: 0,
        }),
    }
}

/// 16-bit little-endian analog value.
pub fn parse_analogread(payload: &[u8], terminator: Terminator) -> Result<Reply, DecodeError> {
    if terminator == Terminator::Error {
        return Err(DecodeError::Device);
    }
    if payload.len() < 2 {
        return Err(DecodeError::ShortPayload {
            expected: 2,
            actual: payload.len(),
        });
    }
    let value = u16::from_le_bytes([payload[0], payload[1]]);
    Ok(Reply::AnalogRead { value })
}

/// Device information record.
///
/// Layout: u32 millis, u16 free_ram, u16 total_ram, u32 flash_size,
/// u32 cpu_freq, u32 version (all little-endian), eight single-byte
/// fields, then a length-prefixed byte list and a length-prefixed text.
pub fn parse_info(payload: &[u8], terminator: Terminator) -> Result<Reply, DecodeError> {
    if terminator == Terminator::Error {
        return Err(DecodeError::Device);
    }
    decode_device_info(payload)
        .map(Reply::Info)
        .map_err(DecodeError::Overrun)
}

fn decode_device_info(data: &[u8]) -> Result<DeviceInfo, RecordOverrun> {
    let mut reader = RecordReader::new(data);

    let millis = reader.u32_le("millis")?;
    let free_ram = reader.u16_le("free_ram")?;
    let total_ram = reader.u16_le("total_ram")?;
    let flash_size = reader.u32_le("flash_size")?;
    let cpu_freq = reader.u32_le("cpu_freq")?;
    let version = reader.u32_le("version")?;

    let buffer_size = reader.u8("buffer_size")?;
    let digital_pins = reader.u8("digital_pins")?;
    let total_pins = reader.u8("total_pins")?;
    let max_soft_pwm = reader.u8("max_soft_pwm")?;
    let soft_pwm_freq = reader.u8("soft_pwm_freq")?;
    let commands_count = reader.u8("commands_count")?;
    let success_code = reader.u8("success_code")?;
    let error_code = reader.u8("error_code")?;

    let hw_len = reader.u8("hw_len")?;
    let hardware_pwm = reader.bytes("hardware_pwm", hw_len as usize)?.to_vec();

    let info_len = reader.u8("info_len")?;
    let info = ascii_lossy(reader.bytes("info", info_len as usize)?);

    if reader.remaining() > 0 {
        log::debug!("info record has {} trailing bytes", reader.remaining());
    }

    Ok(DeviceInfo {
        millis,
        free_ram,
        total_ram,
        flash_size,
        cpu_freq,
        version,
        buffer_size,
        digital_pins,
        total_pins,
        max_soft_pwm,
        soft_pwm_freq,
        commands_count,
        success_code,
        error_code,
        hardware_pwm,
        info,
    })
}

/// Decode ASCII, replacing anything outside it with U+FFFD. NULs are kept;
/// the firmware counts the C string's terminator in the length.
fn ascii_lossy(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
        .collect()
}

/// Bounds-checked sequential reader over a payload.
struct RecordReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> RecordReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        RecordReader { buf, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, field: &'static str, needed: usize) -> Result<(), RecordOverrun> {
        if self.buf.remaining() < needed {
            return Err(RecordOverrun {
                field,
                offset: self.offset,
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    fn u8(&mut self, field: &'static str) -> Result<u8, RecordOverrun> {
        self.ensure(field, 1)?;
        self.offset += 1;
        Ok(self.buf.get_u8())
    }

    fn u16_le(&mut self, field: &'static str) -> Result<u16, RecordOverrun> {
        self.ensure(field, 2)?;
        self.offset += 2;
        Ok(self.buf.get_u16_le())
    }

    fn u32_le(&mut self, field: &'static str) -> Result<u32, RecordOverrun> {
        self.ensure(field, 4)?;
        self.offset += 4;
        Ok(self.buf.get_u32_le())
    }

    fn bytes(&mut self, field: &'static str, len: usize) -> Result<&'a [u8], RecordOverrun> {
        self.ensure(field, len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        self.offset += len;
        Ok(head)
    }
}
