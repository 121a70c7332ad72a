//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

/// Drive the pins of a microcontroller over a serial port.
///
/// With a command, runs it once and prints the result. Without one, starts
/// the interactive shell.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "pinrepl", version, about)]
pub struct Cli {
    /// Serial port (auto-detected when omitted).
    #[arg(short, long)]
    pub port: Option<String>,

    /// Baud rate.
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Print results as JSON.
    #[arg(long)]
    pub json: bool,

    /// YAML config file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Talk to a built-in simulated board instead of a serial port.
    #[arg(long)]
    pub simulate: bool,

    /// List serial ports and exit.
    #[arg(long)]
    pub list_ports: bool,

    /// Increase log verbosity (-v, -vv, -vvv). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Device command for one-shot mode.
    pub command: Option<String>,

    /// Arguments to the command.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// Default log filter for the verbosity count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interactive_by_default() {
        let cli = Cli::try_parse_from(["pinrepl", "--port", "/dev/ttyACM0"]).unwrap();
        assert_eq!(cli.port.as_deref(), Some("/dev/ttyACM0"));
        assert!(cli.command.is_none());
        assert!(cli.args.is_empty());
    }

    #[test]
    fn test_one_shot_with_args() {
        let cli = Cli::try_parse_from(["pinrepl", "-b", "115200", "--json", "dw", "13", "on"]).unwrap();
        assert_eq!(cli.baud, Some(115200));
        assert!(cli.json);
        assert_eq!(cli.command.as_deref(), Some("dw"));
        assert_eq!(cli.args, vec!["13", "on"]);
    }

    #[test]
    fn test_negative_argument_is_not_a_flag() {
        let cli = Cli::try_parse_from(["pinrepl", "aw", "9", "-1"]).unwrap();
        assert_eq!(cli.args, vec!["9", "-1"]);
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["pinrepl", "-vv", "--simulate"]).unwrap();
        assert_eq!(cli.log_level(), "debug");
        assert!(cli.simulate);
        assert_eq!(Cli::default().log_level(), "warn");
    }
}
