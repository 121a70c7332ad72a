//! Common types used in the protocol.

use crate::constants::*;

/// Status byte that ends every reply.
///
/// These values are not reserved in the payload: a multi-byte field can
/// legitimately contain 0xFF or 0xFE, so seeing one of them on the wire
/// does not by itself mean the frame is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminator {
    /// 0xFF: the command succeeded.
    Success,
    /// 0xFE: the firmware rejected the command.
    Error,
}

impl Terminator {
    /// Classify a byte, or `None` if it is not a terminator value.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            SUCCESS_CODE => Some(Terminator::Success),
            ERROR_CODE => Some(Terminator::Error),
            _ => None,
        }
    }

    /// Whether a byte carries one of the terminator values.
    pub fn matches(byte: u8) -> bool {
        Self::from_byte(byte).is_some()
    }

    /// The wire value.
    pub fn as_byte(self) -> u8 {
        match self {
            Terminator::Success => SUCCESS_CODE,
            Terminator::Error => ERROR_CODE,
        }
    }
}

impl From<Terminator> for u8 {
    fn from(terminator: Terminator) -> Self {
        terminator.as_byte()
    }
}

/// The device information record returned by `info`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeviceInfo {
    /// Milliseconds since the firmware booted.
    pub millis: u32,
    /// Free RAM in bytes.
    pub free_ram: u16,
    /// Total RAM in bytes.
    pub total_ram: u16,
    /// Flash size in bytes.
    pub flash_size: u32,
    /// CPU clock in Hz.
    pub cpu_freq: u32,
    /// Firmware protocol version.
    pub version: u32,
    /// Size of the firmware command buffer.
    pub buffer_size: u8,
    /// Number of digital pins.
    pub digital_pins: u8,
    /// Number of pins in total, analog included.
    pub total_pins: u8,
    /// Number of software PWM slots.
    pub max_soft_pwm: u8,
    /// Software PWM frequency in Hz.
    pub soft_pwm_freq: u8,
    /// Number of commands the firmware implements.
    pub commands_count: u8,
    /// Success terminator as the firmware reports it.
    pub success_code: u8,
    /// Error terminator as the firmware reports it.
    pub error_code: u8,
    /// Pins with hardware PWM.
    pub hardware_pwm: Vec<u8>,
    /// Free-form firmware description.
    pub info: String,
}

impl DeviceInfo {
    /// Encode the record in the layout the host decoder expects.
    ///
    /// Used by the simulated device and by tests. Sections longer than 255
    /// bytes are cut to fit their one-byte length prefix.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(INFO_MIN_SIZE + self.hardware_pwm.len() + self.info.len());
        buf.extend_from_slice(&self.millis.to_le_bytes());
        buf.extend_from_slice(&self.free_ram.to_le_bytes());
        buf.extend_from_slice(&self.total_ram.to_le_bytes());
        buf.extend_from_slice(&self.flash_size.to_le_bytes());
        buf.extend_from_slice(&self.cpu_freq.to_le_bytes());
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.push(self.buffer_size);
        buf.push(self.digital_pins);
        buf.push(self.total_pins);
        buf.push(self.max_soft_pwm);
        buf.push(self.soft_pwm_freq);
        buf.push(self.commands_count);
        buf.push(self.success_code);
        buf.push(self.error_code);

        let hw_len = self.hardware_pwm.len().min(u8::MAX as usize);
        buf.push(hw_len as u8);
        buf.extend_from_slice(&self.hardware_pwm[..hw_len]);

        let info = self.info.as_bytes();
        let info_len = info.len().min(u8::MAX as usize);
        buf.push(info_len as u8);
        buf.extend_from_slice(&info[..info_len]);
        buf
    }
}
