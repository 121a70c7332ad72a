//! Protocol constants
//!
//! These constants define the command opcodes, terminator bytes, link
//! defaults and device-info record layout used by the pin REPL protocol.

use std::time::Duration;

// ============================================================================
// Command Opcodes (host → firmware)
// ============================================================================

/// No operation. Answers with a bare terminator.
pub const CMD_NOP: u8 = 0;
/// Query the device information record.
pub const CMD_INFO: u8 = 1;
/// Read a digital pin level.
pub const CMD_DIGITALREAD: u8 = 2;
/// Drive a digital pin level.
pub const CMD_DIGITALWRITE: u8 = 3;
/// Read an analog input (10-bit, sent as 16-bit little-endian).
pub const CMD_ANALOGREAD: u8 = 4;
/// Set a PWM duty cycle (hardware or software PWM).
pub const CMD_ANALOGWRITE: u8 = 5;
/// Configure a pin mode (input, output, input with pull-up).
pub const CMD_PINMODE: u8 = 6;
/// Reset the microcontroller.
pub const CMD_RESET: u8 = 7;

// ============================================================================
// Terminator Bytes (firmware → host)
// ============================================================================

/// Final byte of a successful reply.
pub const SUCCESS_CODE: u8 = 0xFF;
/// Final byte of a failed reply.
pub const ERROR_CODE: u8 = 0xFE;

// ============================================================================
// Pin Mode Values
// ============================================================================

/// `pinMode` value for a plain input.
pub const PIN_MODE_INPUT: u8 = 0;
/// `pinMode` value for an output.
pub const PIN_MODE_OUTPUT: u8 = 1;
/// `pinMode` value for an input with the internal pull-up enabled.
pub const PIN_MODE_INPUT_PULLUP: u8 = 2;

// ============================================================================
// Link Defaults
// ============================================================================

/// Default signaling rate of the serial link.
pub const DEFAULT_BAUD: u32 = 9600;

/// Total time budget for assembling one reply frame.
pub const DEFAULT_OVERALL_TIMEOUT: Duration = Duration::from_millis(2000);

/// Per-byte read timeout used to detect the end of a reply.
pub const DEFAULT_QUIET_TIMEOUT: Duration = Duration::from_millis(20);

/// Delay after opening the port while the board resets. Nothing may be
/// written during this window.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(2000);

/// Capacity hint for the frame accumulator. Only the info reply gets
/// anywhere near this.
pub const FRAME_CAPACITY_HINT: usize = 64;

// ============================================================================
// Device Info Record Layout
// ============================================================================

/// Bytes in the fixed-width numeric header: millis (4), free RAM (2),
/// total RAM (2), flash size (4), CPU frequency (4), version (4).
pub const INFO_NUMERIC_HEADER_SIZE: usize = 20;

/// Bytes in the run of single-byte fields after the numeric header.
pub const INFO_BYTE_FIELDS_SIZE: usize = 8;

/// Smallest well-formed info payload: header, byte fields, and two zero
/// length prefixes.
pub const INFO_MIN_SIZE: usize = INFO_NUMERIC_HEADER_SIZE + INFO_BYTE_FIELDS_SIZE + 2;
