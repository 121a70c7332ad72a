//! In-process simulated device.
//!
//! [`SimulatedDevice`] implements [`Link`] and answers requests the way the
//! board firmware does: a small command buffer filled from the link, one
//! command executed as soon as its argument bytes are present, and one reply
//! frame per command. It backs the runner's `--simulate` mode and the
//! integration tests.
//!
//! Pin numbering follows an Uno-class board: pins below
//! [`SIM_DIGITAL_PINS`] are digital, pins up to [`SIM_TOTAL_PINS`] are the
//! analog inputs, anything else is answered with the error terminator.

use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use crate::commands::CommandKind;
use crate::constants::*;
use crate::frame::Link;
use crate::types::DeviceInfo;

// ============================================================================
// Board description
// ============================================================================

/// Command buffer size in bytes.
pub const SIM_BUFFER_SIZE: usize = 10;

/// Number of digital pins.
pub const SIM_DIGITAL_PINS: u8 = 14;

/// Number of addressable pins, digital plus analog.
pub const SIM_TOTAL_PINS: u8 = 22;

/// Number of software PWM slots.
pub const SIM_MAX_SOFT_PWM: usize = 6;

/// Software PWM frequency in Hz.
pub const SIM_SOFT_PWM_FREQ: u8 = 50;

/// Pins driven by hardware PWM.
pub const SIM_HARDWARE_PWM_PINS: [u8; 6] = [3, 5, 6, 9, 10, 11];

/// Firmware version reported by `info`.
pub const SIM_VERSION: u32 = 1;

/// Descriptive text reported by `info`, NUL included as the board sends it.
pub const SIM_INFO_TEXT: &str = "pinrepl simulated device v1.0\0";

const SIM_TOTAL_RAM: u16 = 2048;
const SIM_FREE_RAM: u16 = 1536;
const SIM_FLASH_SIZE: u32 = 32256;
const SIM_CPU_FREQ: u32 = 16_000_000;

// ============================================================================
// Types
// ============================================================================

/// How reply bytes are released onto the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// All bytes of a reply are available at once.
    #[default]
    Burst,
    /// Every byte is followed by one read timeout of silence.
    Stutter,
}

/// One software PWM slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftPwmSlot {
    /// Pin driven by this slot.
    pub pin: u8,
    /// Duty cycle, 0-255.
    pub duty: u8,
    /// Cleared when the pin is released; the slot stays allocated.
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outgoing {
    Byte(u8),
    Gap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PinState {
    levels: [u8; SIM_TOTAL_PINS as usize],
    modes: [u8; SIM_TOTAL_PINS as usize],
    hardware_duty: [u8; SIM_TOTAL_PINS as usize],
    analog_inputs: [u16; (SIM_TOTAL_PINS - SIM_DIGITAL_PINS) as usize],
    soft_pwm: Vec<SoftPwmSlot>,
}

impl Default for PinState {
    fn default() -> Self {
        PinState {
            levels: [0; SIM_TOTAL_PINS as usize],
            modes: [PIN_MODE_INPUT; SIM_TOTAL_PINS as usize],
            hardware_duty: [0; SIM_TOTAL_PINS as usize],
            analog_inputs: [0; (SIM_TOTAL_PINS - SIM_DIGITAL_PINS) as usize],
            soft_pwm: Vec::with_capacity(SIM_MAX_SOFT_PWM),
        }
    }
}

/// A simulated board reachable through the [`Link`] trait.
#[derive(Debug)]
pub struct SimulatedDevice {
    pacing: Pacing,
    booted: Instant,
    /// Bytes written by the host and not yet moved into the command buffer.
    serial_rx: VecDeque<u8>,
    command_buffer: Vec<u8>,
    outgoing: VecDeque<Outgoing>,
    pins: PinState,
    resets: usize,
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Public API
// ============================================================================

impl SimulatedDevice {
    /// A freshly booted device with burst pacing.
    pub fn new() -> Self {
        SimulatedDevice {
            pacing: Pacing::Burst,
            booted: Instant::now(),
            serial_rx: VecDeque::new(),
            command_buffer: Vec::with_capacity(SIM_BUFFER_SIZE),
            outgoing: VecDeque::new(),
            pins: PinState::default(),
            resets: 0,
        }
    }

    /// Builder-style pacing selection.
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Drive an analog input. Accepts the analog pin number (14..22).
    /// Returns false for pins that are not analog inputs.
    pub fn set_analog_input(&mut self, pin: u8, value: u16) -> bool {
        match analog_channel(pin) {
            Some(channel) if pin >= SIM_DIGITAL_PINS => {
                self.pins.analog_inputs[channel] = value.min(1023);
                true
            }
            _ => false,
        }
    }

    /// Drive a pin level from outside, as a switch or sensor would.
    pub fn set_digital_input(&mut self, pin: u8, high: bool) -> bool {
        match self.pins.levels.get_mut(pin as usize) {
            Some(level) => {
                *level = high as u8;
                true
            }
            None => false,
        }
    }

    /// Current output level of a pin.
    pub fn digital_level(&self, pin: u8) -> Option<u8> {
        self.pins.levels.get(pin as usize).copied()
    }

    /// Last mode set on a pin.
    pub fn pin_mode(&self, pin: u8) -> Option<u8> {
        self.pins.modes.get(pin as usize).copied()
    }

    /// Duty cycle of a hardware PWM pin.
    pub fn hardware_duty(&self, pin: u8) -> Option<u8> {
        if is_hardware_pwm(pin) {
            self.pins.hardware_duty.get(pin as usize).copied()
        } else {
            None
        }
    }

    /// Software PWM slots in use, enabled or not.
    pub fn soft_pwm_slots(&self) -> &[SoftPwmSlot] {
        &self.pins.soft_pwm
    }

    /// Number of resets executed since creation.
    pub fn resets(&self) -> usize {
        self.resets
    }

    /// The record `info` would return right now.
    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            millis: self.booted.elapsed().as_millis() as u32,
            free_ram: SIM_FREE_RAM,
            total_ram: SIM_TOTAL_RAM,
            flash_size: SIM_FLASH_SIZE,
            cpu_freq: SIM_CPU_FREQ,
            version: SIM_VERSION,
            buffer_size: SIM_BUFFER_SIZE as u8,
            digital_pins: SIM_DIGITAL_PINS,
            total_pins: SIM_TOTAL_PINS,
            max_soft_pwm: SIM_MAX_SOFT_PWM as u8,
            soft_pwm_freq: SIM_SOFT_PWM_FREQ,
            commands_count: CommandKind::ALL.len() as u8,
            success_code: SUCCESS_CODE,
            error_code: ERROR_CODE,
            hardware_pwm: SIM_HARDWARE_PWM_PINS.to_vec(),
            info: SIM_INFO_TEXT.to_string(),
        }
    }
}

// ============================================================================
// Command execution
// ============================================================================

impl SimulatedDevice {
    fn pump(&mut self) {
        loop {
            while self.command_buffer.len() < SIM_BUFFER_SIZE {
                match self.serial_rx.pop_front() {
                    Some(byte) => self.command_buffer.push(byte),
                    None => break,
                }
            }

            let Some(&opcode) = self.command_buffer.first() else {
                return;
            };
            let length = 1 + required_args(opcode);
            if self.command_buffer.len() < length {
                return;
            }

            let command: Vec<u8> = self.command_buffer.drain(..length).collect();
            if opcode == CMD_RESET {
                self.send(&[SUCCESS_CODE]);
                self.reboot();
                return;
            }

            let reply = match self.execute(&command) {
                Some(mut output) => {
                    output.push(SUCCESS_CODE);
                    output
                }
                None => vec![ERROR_CODE],
            };
            self.send(&reply);
        }
    }

    /// Run one buffered command. `None` means the error terminator.
    fn execute(&mut self, command: &[u8]) -> Option<Vec<u8>> {
        let opcode = command[0];
        let Some(kind) = CommandKind::from_opcode(opcode) else {
            log::debug!("sim: unknown opcode 0x{:02X}", opcode);
            return None;
        };

        if kind.arg_len() > 0 && command[1] >= SIM_TOTAL_PINS {
            log::debug!("sim: {} on invalid pin {}", kind, command[1]);
            return None;
        }
        log::debug!("sim: {} {:?}", kind, &command[1..]);

        match kind {
            CommandKind::Nop => Some(Vec::new()),
            CommandKind::Info => Some(self.device_info().encode()),
            CommandKind::DigitalRead => Some(vec![self.pins.levels[command[1] as usize]]),
            CommandKind::DigitalWrite => {
                let pin = command[1];
                self.release_soft_pwm(pin);
                self.pins.levels[pin as usize] = (command[2] != 0) as u8;
                Some(Vec::new())
            }
            CommandKind::AnalogRead => {
                let value = analog_channel(command[1])
                    .map(|channel| self.pins.analog_inputs[channel])
                    .unwrap_or(0);
                Some(value.to_le_bytes().to_vec())
            }
            CommandKind::AnalogWrite => self.set_pwm(command[1], command[2]).then(Vec::new),
            CommandKind::PinMode => {
                let (pin, mode) = (command[1] as usize, command[2]);
                self.pins.modes[pin] = mode;
                if mode == PIN_MODE_INPUT_PULLUP {
                    self.pins.levels[pin] = 1;
                }
                Some(Vec::new())
            }
            // Handled in `pump`, the reply goes out before the reboot.
            CommandKind::Reset => Some(Vec::new()),
        }
    }

    fn set_pwm(&mut self, pin: u8, duty: u8) -> bool {
        if is_hardware_pwm(pin) {
            self.pins.hardware_duty[pin as usize] = duty;
            return true;
        }

        self.pins.levels[pin as usize] = 0;

        let slots = &mut self.pins.soft_pwm;
        let index = slots
            .iter()
            .position(|slot| slot.pin == pin || !slot.enabled)
            .unwrap_or(slots.len());
        if index >= SIM_MAX_SOFT_PWM {
            log::debug!("sim: no free soft PWM slot for pin {}", pin);
            return false;
        }

        if duty == 0 {
            if let Some(slot) = slots.get_mut(index) {
                slot.enabled = false;
            }
            return true;
        }

        let slot = SoftPwmSlot {
            pin,
            duty,
            enabled: true,
        };
        if index == slots.len() {
            slots.push(slot);
        } else {
            slots[index] = slot;
        }
        true
    }

    fn release_soft_pwm(&mut self, pin: u8) {
        if let Some(slot) = self.pins.soft_pwm.iter_mut().find(|slot| slot.pin == pin) {
            slot.enabled = false;
        }
    }

    fn reboot(&mut self) {
        log::debug!("sim: reboot");
        self.pins = PinState::default();
        self.command_buffer.clear();
        self.serial_rx.clear();
        self.booted = Instant::now();
        self.resets += 1;
    }

    fn send(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.outgoing.push_back(Outgoing::Byte(byte));
            if self.pacing == Pacing::Stutter {
                self.outgoing.push_back(Outgoing::Gap);
            }
        }
    }
}

impl Link for SimulatedDevice {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.serial_rx.extend(data.iter().copied());
        self.pump();
        Ok(())
    }

    fn read_byte(&mut self, timeout: Duration) -> io::Result<Option<u8>> {
        match self.outgoing.pop_front() {
            Some(Outgoing::Byte(byte)) => Ok(Some(byte)),
            Some(Outgoing::Gap) | None => {
                std::thread::sleep(timeout);
                Ok(None)
            }
        }
    }

    fn clear_buffers(&mut self) -> io::Result<()> {
        self.serial_rx.clear();
        self.outgoing.clear();
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn required_args(opcode: u8) -> usize {
    CommandKind::from_opcode(opcode).map_or(0, CommandKind::arg_len)
}

fn is_hardware_pwm(pin: u8) -> bool {
    SIM_HARDWARE_PWM_PINS.contains(&pin)
}

/// Analog channel for a pin; digital pin numbers alias the channel of the
/// same index.
fn analog_channel(pin: u8) -> Option<usize> {
    let channel = if pin >= SIM_DIGITAL_PINS {
        pin - SIM_DIGITAL_PINS
    } else {
        pin
    };
    (channel < SIM_TOTAL_PINS - SIM_DIGITAL_PINS).then_some(channel as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(device: &mut SimulatedDevice) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(event) = device.outgoing.pop_front() {
            if let Outgoing::Byte(byte) = event {
                out.push(byte);
            }
        }
        out
    }

    #[test]
    fn test_nop_and_unknown_opcode() {
        let mut device = SimulatedDevice::new();
        device.write_all(&[CMD_NOP]).unwrap();
        assert_eq!(drain(&mut device), vec![SUCCESS_CODE]);

        device.write_all(&[0x42]).unwrap();
        assert_eq!(drain(&mut device), vec![ERROR_CODE]);
    }

    #[test]
    fn test_waits_for_argument_bytes() {
        let mut device = SimulatedDevice::new();
        device.write_all(&[CMD_DIGITALWRITE, 13]).unwrap();
        assert!(drain(&mut device).is_empty());

        device.write_all(&[1]).unwrap();
        assert_eq!(drain(&mut device), vec![SUCCESS_CODE]);
        assert_eq!(device.digital_level(13), Some(1));
    }

    #[test]
    fn test_pipelined_commands() {
        let mut device = SimulatedDevice::new();
        device
            .write_all(&[CMD_DIGITALWRITE, 4, 1, CMD_DIGITALREAD, 4, CMD_NOP])
            .unwrap();
        assert_eq!(drain(&mut device), vec![0xFF, 0x01, 0xFF, 0xFF]);
    }

    #[test]
    fn test_invalid_pin() {
        let mut device = SimulatedDevice::new();
        device.write_all(&[CMD_DIGITALREAD, SIM_TOTAL_PINS]).unwrap();
        assert_eq!(drain(&mut device), vec![ERROR_CODE]);

        device.write_all(&[CMD_DIGITALREAD, SIM_TOTAL_PINS - 1]).unwrap();
        assert_eq!(drain(&mut device), vec![0x00, SUCCESS_CODE]);
    }

    #[test]
    fn test_analog_read_little_endian() {
        let mut device = SimulatedDevice::new();
        assert!(device.set_analog_input(14, 1000));
        assert!(!device.set_analog_input(3, 1000));

        device.write_all(&[CMD_ANALOGREAD, 14]).unwrap();
        assert_eq!(drain(&mut device), vec![0xE8, 0x03, SUCCESS_CODE]);
    }

    #[test]
    fn test_pullup_reads_high() {
        let mut device = SimulatedDevice::new();
        device.write_all(&[CMD_PINMODE, 7, PIN_MODE_INPUT_PULLUP]).unwrap();
        device.write_all(&[CMD_DIGITALREAD, 7]).unwrap();
        assert_eq!(drain(&mut device), vec![0xFF, 0x01, 0xFF]);
        assert_eq!(device.pin_mode(7), Some(PIN_MODE_INPUT_PULLUP));
    }

    #[test]
    fn test_hardware_pwm() {
        let mut device = SimulatedDevice::new();
        device.write_all(&[CMD_ANALOGWRITE, 9, 128]).unwrap();
        assert_eq!(drain(&mut device), vec![SUCCESS_CODE]);
        assert_eq!(device.hardware_duty(9), Some(128));
        assert!(device.soft_pwm_slots().is_empty());
    }

    #[test]
    fn test_soft_pwm_slots_exhaust() {
        let mut device = SimulatedDevice::new();
        for pin in [2, 4, 7, 8, 12, 13] {
            device.write_all(&[CMD_ANALOGWRITE, pin, 100]).unwrap();
        }
        assert_eq!(drain(&mut device), vec![SUCCESS_CODE; 6]);

        device.write_all(&[CMD_ANALOGWRITE, 14, 100]).unwrap();
        assert_eq!(drain(&mut device), vec![ERROR_CODE]);

        // Updating an existing pin still works.
        device.write_all(&[CMD_ANALOGWRITE, 4, 200]).unwrap();
        assert_eq!(drain(&mut device), vec![SUCCESS_CODE]);
        assert_eq!(device.soft_pwm_slots()[1].duty, 200);
    }

    #[test]
    fn test_soft_pwm_slot_reuse() {
        let mut device = SimulatedDevice::new();
        device.write_all(&[CMD_ANALOGWRITE, 2, 100]).unwrap();
        device.write_all(&[CMD_ANALOGWRITE, 4, 100]).unwrap();
        // digitalwrite releases the slot, the next pin takes it over.
        device.write_all(&[CMD_DIGITALWRITE, 2, 0]).unwrap();
        device.write_all(&[CMD_ANALOGWRITE, 7, 50]).unwrap();
        drain(&mut device);

        let slots = device.soft_pwm_slots();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0], SoftPwmSlot { pin: 7, duty: 50, enabled: true });
    }

    #[test]
    fn test_soft_pwm_zero_duty_disables() {
        let mut device = SimulatedDevice::new();
        device.write_all(&[CMD_ANALOGWRITE, 2, 100]).unwrap();
        device.write_all(&[CMD_ANALOGWRITE, 2, 0]).unwrap();
        assert_eq!(drain(&mut device), vec![SUCCESS_CODE, SUCCESS_CODE]);
        assert!(!device.soft_pwm_slots()[0].enabled);
    }

    #[test]
    fn test_reset_replies_then_reboots() {
        let mut device = SimulatedDevice::new();
        device.write_all(&[CMD_DIGITALWRITE, 13, 1]).unwrap();
        device.write_all(&[CMD_RESET, CMD_NOP]).unwrap();

        // The trailing nop is lost in the reboot.
        assert_eq!(drain(&mut device), vec![SUCCESS_CODE, SUCCESS_CODE]);
        assert_eq!(device.digital_level(13), Some(0));
        assert_eq!(device.resets(), 1);
    }

    #[test]
    fn test_info_record() {
        let mut device = SimulatedDevice::new();
        device.write_all(&[CMD_INFO]).unwrap();
        let reply = drain(&mut device);

        let expected = device.device_info().encode();
        assert_eq!(reply.len(), expected.len() + 1);
        assert_eq!(reply[4..reply.len() - 1], expected[4..]);
        assert_eq!(reply.last(), Some(&SUCCESS_CODE));
    }

    #[test]
    fn test_stutter_inserts_gaps() {
        let mut device = SimulatedDevice::new().with_pacing(Pacing::Stutter);
        device.write_all(&[CMD_DIGITALREAD, 2]).unwrap();

        let quiet = Duration::from_millis(1);
        assert_eq!(device.read_byte(quiet).unwrap(), Some(0));
        assert_eq!(device.read_byte(quiet).unwrap(), None);
        assert_eq!(device.read_byte(quiet).unwrap(), Some(SUCCESS_CODE));
        assert_eq!(device.read_byte(quiet).unwrap(), None);
    }

    #[test]
    fn test_clear_buffers_drops_reply() {
        let mut device = SimulatedDevice::new();
        device.write_all(&[CMD_NOP]).unwrap();
        device.clear_buffers().unwrap();
        assert_eq!(device.read_byte(Duration::from_millis(1)).unwrap(), None);
    }
}
