//! Commands that can be sent to the firmware, and their argument encoders.
//!
//! Every command is a one-byte opcode followed by an argument block whose
//! length is fixed per command (0, 1 or 2 bytes). Arguments arrive as the
//! string tokens a user typed and are validated here, before any I/O.

use crate::constants::*;
use crate::error::{ArgumentError, CommandError, DecodeError};
use crate::responses::{self, Reply};
use crate::types::Terminator;

/// The commands implemented by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandKind {
    /// No operation.
    Nop,
    /// Device information record.
    Info,
    /// Read a digital pin.
    DigitalRead,
    /// Write a digital pin.
    DigitalWrite,
    /// Read an analog pin.
    AnalogRead,
    /// Write a PWM duty cycle.
    AnalogWrite,
    /// Configure a pin mode.
    PinMode,
    /// Reset the board.
    Reset,
}

impl CommandKind {
    /// All commands in opcode order.
    pub const ALL: [CommandKind; 8] = [
        CommandKind::Nop,
        CommandKind::Info,
        CommandKind::DigitalRead,
        CommandKind::DigitalWrite,
        CommandKind::AnalogRead,
        CommandKind::AnalogWrite,
        CommandKind::PinMode,
        CommandKind::Reset,
    ];

    /// Get the opcode for this command.
    pub fn opcode(self) -> u8 {
        match self {
            CommandKind::Nop => CMD_NOP,
            CommandKind::Info => CMD_INFO,
            CommandKind::DigitalRead => CMD_DIGITALREAD,
            CommandKind::DigitalWrite => CMD_DIGITALWRITE,
            CommandKind::AnalogRead => CMD_ANALOGREAD,
            CommandKind::AnalogWrite => CMD_ANALOGWRITE,
            CommandKind::PinMode => CMD_PINMODE,
            CommandKind::Reset => CMD_RESET,
        }
    }

    /// Get the command name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Nop => "nop",
            CommandKind::Info => "info",
            CommandKind::DigitalRead => "digitalread",
            CommandKind::DigitalWrite => "digitalwrite",
            CommandKind::AnalogRead => "analogread",
            CommandKind::AnalogWrite => "analogwrite",
            CommandKind::PinMode => "pinmode",
            CommandKind::Reset => "reset",
        }
    }

    /// Look up a command by opcode.
    pub fn from_opcode(opcode: u8) -> Option<CommandKind> {
        Self::ALL.iter().copied().find(|kind| kind.opcode() == opcode)
    }

    /// Number of argument bytes that follow the opcode.
    pub fn arg_len(self) -> usize {
        match self {
            CommandKind::Nop | CommandKind::Info | CommandKind::Reset => 0,
            CommandKind::DigitalRead | CommandKind::AnalogRead => 1,
            CommandKind::DigitalWrite | CommandKind::AnalogWrite | CommandKind::PinMode => 2,
        }
    }

    /// Encode argument tokens into this command's argument block.
    pub fn encode_args(self, tokens: &[&str]) -> Result<Vec<u8>, ArgumentError> {
        match self {
            CommandKind::Nop | CommandKind::Info | CommandKind::Reset => Ok(Vec::new()),
            CommandKind::DigitalRead => encode_single_pin(self, tokens),
            CommandKind::AnalogRead => encode_single_pin(self, tokens),
            CommandKind::DigitalWrite => encode_pin_and_value(self, "pin and value", tokens, digital_level_alias),
            CommandKind::AnalogWrite => encode_pin_and_value(self, "pin and value", tokens, |_| None),
            CommandKind::PinMode => encode_pin_and_value(self, "pin and mode", tokens, pin_mode_alias),
        }
    }

    /// Decode a reply payload for this command.
    pub fn decode(self, payload: &[u8], terminator: Terminator) -> Result<Reply, DecodeError> {
        match self {
            CommandKind::Nop
            | CommandKind::DigitalWrite
            | CommandKind::AnalogWrite
            | CommandKind::PinMode => responses::parse_without_payload(payload, terminator),
            CommandKind::Info => responses::parse_info(payload, terminator),
            CommandKind::DigitalRead => responses::parse_digitalread(payload, terminator),
            CommandKind::AnalogRead => responses::parse_analogread(payload, terminator),
            CommandKind::Reset => responses::parse_reset(payload, terminator),
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// Command identity.
    pub kind: CommandKind,
    /// Unique name.
    pub name: &'static str,
    /// Wire opcode.
    pub opcode: u8,
}

impl CommandDescriptor {
    fn new(kind: CommandKind) -> Self {
        CommandDescriptor {
            kind,
            name: kind.name(),
            opcode: kind.opcode(),
        }
    }

    /// Encode argument tokens into a ready-to-send request.
    pub fn encode(&self, tokens: &[&str]) -> Result<Request, ArgumentError> {
        let args = self.kind.encode_args(tokens)?;
        debug_assert_eq!(args.len(), self.kind.arg_len());
        Ok(Request { command: self.kind, args })
    }
}

/// Immutable name → descriptor table, built once and shared by reference.
#[derive(Debug, Clone)]
pub struct CommandTable {
    entries: [CommandDescriptor; 8],
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTable {
    /// Build the table of firmware commands.
    pub fn new() -> Self {
        CommandTable {
            entries: CommandKind::ALL.map(CommandDescriptor::new),
        }
    }

    /// Find a command by exact, case-sensitive name.
    pub fn lookup(&self, name: &str) -> Result<&CommandDescriptor, CommandError> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))
    }

    /// Find the descriptor for a known command.
    pub fn get(&self, kind: CommandKind) -> &CommandDescriptor {
        // Entries are stored in `CommandKind::ALL` order.
        &self.entries[kind as usize]
    }

    /// Command names in alphabetical order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.iter().map(|e| e.name).collect();
        names.sort_unstable();
        names
    }
}

/// An encoded command: opcode plus argument block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Command being sent.
    pub command: CommandKind,
    /// Argument block, exactly `command.arg_len()` bytes.
    pub args: Vec<u8>,
}

impl Request {
    /// Encode the request to bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + self.args.len());
        buf.push(self.command.opcode());
        buf.extend_from_slice(&self.args);
        buf
    }
}

// ============================================================================
// Argument Encoders
// ============================================================================

fn encode_single_pin(command: CommandKind, tokens: &[&str]) -> Result<Vec<u8>, ArgumentError> {
    let pin = tokens.first().ok_or(ArgumentError::Missing {
        command: command.name(),
        what: "pin number",
    })?;
    Ok(vec![parse_pin(pin)?])
}

fn encode_pin_and_value(
    command: CommandKind,
    what: &'static str,
    tokens: &[&str],
    alias: fn(&str) -> Option<u8>,
) -> Result<Vec<u8>, ArgumentError> {
    let (pin, value) = match tokens {
        [pin, value, ..] => (*pin, *value),
        _ => {
            return Err(ArgumentError::Missing {
                command: command.name(),
                what,
            })
        }
    };
    let pin = parse_pin(pin)?;
    let value = match alias(value) {
        Some(v) => v,
        None => parse_masked(value)?,
    };
    Ok(vec![pin, value])
}

/// Split a decimal integer token into its sign and digits.
fn split_integer(token: &str) -> Result<(bool, &str), ArgumentError> {
    let trimmed = token.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ArgumentError::NotAnInteger {
            token: token.to_string(),
        });
    }
    Ok((negative, digits))
}

/// Parse a pin token. Pins must fit in a byte; they are not masked.
pub fn parse_pin(token: &str) -> Result<u8, ArgumentError> {
    let (negative, digits) = split_integer(token)?;
    let digits = digits.trim_start_matches('0');
    match digits.parse::<u8>() {
        Ok(pin) if !negative || pin == 0 => Ok(pin),
        _ if digits.is_empty() => Ok(0),
        _ => Err(ArgumentError::PinOutOfRange {
            token: token.to_string(),
        }),
    }
}

/// Parse a decimal integer token of any length and reduce it modulo 256,
/// two's complement for negatives.
pub fn parse_masked(token: &str) -> Result<u8, ArgumentError> {
    let (negative, digits) = split_integer(token)?;
    let magnitude = digits
        .bytes()
        .fold(0u8, |acc, b| acc.wrapping_mul(10).wrapping_add(b - b'0'));
    Ok(if negative { magnitude.wrapping_neg() } else { magnitude })
}

/// Symbolic digital levels, case-insensitive.
pub fn digital_level_alias(token: &str) -> Option<u8> {
    match token.to_ascii_lowercase().as_str() {
        "on" | "true" | "high" | "h" => Some(1),
        "off" | "false" | "low" | "l" => Some(0),
        _ => None,
    }
}

/// Symbolic pin modes, case-insensitive.
pub fn pin_mode_alias(token: &str) -> Option<u8> {
    match token.to_ascii_lowercase().as_str() {
        "in" | "input" => Some(PIN_MODE_INPUT),
        "out" | "output" => Some(PIN_MODE_OUTPUT),
        "input_pullup" | "pullup" => Some(PIN_MODE_INPUT_PULLUP),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(kind: CommandKind, tokens: &[&str]) -> Result<Vec<u8>, ArgumentError> {
        kind.encode_args(tokens)
    }

    #[test]
    fn test_opcodes() {
        let opcodes: Vec<u8> = CommandKind::ALL.iter().map(|k| k.opcode()).collect();
        assert_eq!(opcodes, vec![0, 1, 2, 3, 4, 5, 6, 7]);
        for kind in CommandKind::ALL {
            assert_eq!(CommandKind::from_opcode(kind.opcode()), Some(kind));
        }
        assert_eq!(CommandKind::from_opcode(8), None);
    }

    #[test]
    fn test_lookup_is_exact() {
        let table = CommandTable::new();
        assert_eq!(table.lookup("pinmode").unwrap().opcode, CMD_PINMODE);
        assert!(matches!(
            table.lookup("PinMode"),
            Err(CommandError::UnknownCommand(name)) if name == "PinMode"
        ));
        assert!(table.lookup("pinmod").is_err());
        assert!(table.lookup("").is_err());
    }

    #[test]
    fn test_table_get_matches_kind() {
        let table = CommandTable::new();
        for kind in CommandKind::ALL {
            assert_eq!(table.get(kind).kind, kind);
        }
        assert_eq!(table.names().first(), Some(&"analogread"));
    }

    #[test]
    fn test_zero_arg_commands_ignore_tokens() {
        for kind in [CommandKind::Nop, CommandKind::Info, CommandKind::Reset] {
            assert_eq!(encode(kind, &[]).unwrap(), Vec::<u8>::new());
            assert_eq!(encode(kind, &["1", "junk"]).unwrap(), Vec::<u8>::new());
        }
    }

    #[test]
    fn test_single_pin_requires_pin() {
        for kind in [CommandKind::DigitalRead, CommandKind::AnalogRead] {
            assert!(matches!(encode(kind, &[]), Err(ArgumentError::Missing { .. })));
            assert!(matches!(
                encode(kind, &["x"]),
                Err(ArgumentError::NotAnInteger { token }) if token == "x"
            ));
            assert_eq!(encode(kind, &["13"]).unwrap(), vec![13]);
        }
    }

    #[test]
    fn test_pin_range() {
        assert_eq!(encode(CommandKind::DigitalRead, &["255"]).unwrap(), vec![255]);
        assert!(matches!(
            encode(CommandKind::DigitalRead, &["256"]),
            Err(ArgumentError::PinOutOfRange { .. })
        ));
        assert!(matches!(
            encode(CommandKind::AnalogWrite, &["-1", "5"]),
            Err(ArgumentError::PinOutOfRange { .. })
        ));
    }

    #[test]
    fn test_digitalwrite_aliases() {
        for alias in ["on", "ON", "true", "High", "h"] {
            assert_eq!(encode(CommandKind::DigitalWrite, &["3", alias]).unwrap(), vec![3, 1]);
        }
        for alias in ["off", "False", "LOW", "l"] {
            assert_eq!(encode(CommandKind::DigitalWrite, &["3", alias]).unwrap(), vec![3, 0]);
        }
        assert_eq!(
            encode(CommandKind::DigitalWrite, &["3", "on"]).unwrap(),
            encode(CommandKind::DigitalWrite, &["3", "1"]).unwrap()
        );
        assert!(matches!(
            encode(CommandKind::DigitalWrite, &["3", "maybe"]),
            Err(ArgumentError::NotAnInteger { token }) if token == "maybe"
        ));
    }

    #[test]
    fn test_pinmode_aliases() {
        let cases = [
            ("in", 0),
            ("INPUT", 0),
            ("out", 1),
            ("Output", 1),
            ("input_pullup", 2),
            ("PULLUP", 2),
        ];
        for (alias, mode) in cases {
            assert_eq!(encode(CommandKind::PinMode, &["7", alias]).unwrap(), vec![7, mode]);
        }
        assert!(matches!(
            encode(CommandKind::PinMode, &["7"]),
            Err(ArgumentError::Missing { what: "pin and mode", .. })
        ));
    }

    #[test]
    fn test_values_masked_to_byte() {
        assert_eq!(encode(CommandKind::AnalogWrite, &["9", "300"]).unwrap(), vec![9, 44]);
        assert_eq!(encode(CommandKind::PinMode, &["9", "300"]).unwrap(), vec![9, 44]);
        assert_eq!(encode(CommandKind::DigitalWrite, &["9", "257"]).unwrap(), vec![9, 1]);
        assert_eq!(encode(CommandKind::AnalogWrite, &["9", "-1"]).unwrap(), vec![9, 255]);
    }

    #[test]
    fn test_values_beyond_machine_integers_are_masked() {
        // 10^20 = 0x56BC75E2D63100000, low byte 0x00; 10^20 - 1 ends in 0xFF.
        assert_eq!(
            encode(CommandKind::AnalogWrite, &["9", "100000000000000000000"]).unwrap(),
            vec![9, 0]
        );
        assert_eq!(
            encode(CommandKind::AnalogWrite, &["9", "99999999999999999999"]).unwrap(),
            vec![9, 255]
        );
        assert_eq!(
            encode(CommandKind::AnalogWrite, &["9", "-99999999999999999999"]).unwrap(),
            vec![9, 1]
        );
        assert!(matches!(
            encode(CommandKind::DigitalRead, &["99999999999999999999"]),
            Err(ArgumentError::PinOutOfRange { .. })
        ));
    }

    #[test]
    fn test_integer_token_forms() {
        assert_eq!(parse_pin(" 007 ").unwrap(), 7);
        assert_eq!(parse_pin("-0").unwrap(), 0);
        assert_eq!(parse_pin("+13").unwrap(), 13);
        assert_eq!(parse_masked("+300").unwrap(), 44);
        for token in ["", "-", "1.5", "0x10", "1e3"] {
            assert!(matches!(parse_masked(token), Err(ArgumentError::NotAnInteger { .. })));
        }
    }

    #[test]
    fn test_analogwrite_has_no_aliases() {
        assert!(matches!(
            encode(CommandKind::AnalogWrite, &["9", "on"]),
            Err(ArgumentError::NotAnInteger { .. })
        ));
    }

    #[test]
    fn test_encoded_length_matches_arg_len() {
        let samples: [(CommandKind, &[&str]); 8] = [
            (CommandKind::Nop, &[]),
            (CommandKind::Info, &[]),
            (CommandKind::DigitalRead, &["1"]),
            (CommandKind::DigitalWrite, &["1", "on"]),
            (CommandKind::AnalogRead, &["14"]),
            (CommandKind::AnalogWrite, &["3", "128"]),
            (CommandKind::PinMode, &["2", "pullup"]),
            (CommandKind::Reset, &[]),
        ];
        for (kind, tokens) in samples {
            let request = CommandTable::new().get(kind).encode(tokens).unwrap();
            assert_eq!(request.args.len(), kind.arg_len(), "{}", kind);
            assert_eq!(request.encode()[0], kind.opcode());
        }
    }

    #[test]
    fn test_request_encode() {
        let table = CommandTable::new();
        let request = table.lookup("digitalwrite").unwrap().encode(&["3", "on"]).unwrap();
        assert_eq!(request.encode(), vec![CMD_DIGITALWRITE, 3, 1]);
    }
}
