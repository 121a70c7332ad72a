//! The interactive line language.
//!
//! A line is split on whitespace. The first token is lower-cased and
//! checked against the local commands; anything that is not local is a
//! device command, passed on to the dispatcher with its arguments as typed.

use crate::error::LineError;

/// Local command names and their short forms.
pub const LOCAL_COMMANDS: &[(&str, &[&str])] = &[
    ("help", &["h"]),
    ("exit", &["quit", "q", "x"]),
    ("aliases", &[]),
    ("alias", &[]),
    ("history", &[]),
    ("json", &[]),
    ("run", &[]),
    ("repeat", &[]),
    ("rvd", &[]),
];

const ALIAS_USAGE: &str = "alias add <alias> <command> | alias rm <alias>";
const JSON_USAGE: &str = "json on|off";
const RUN_USAGE: &str = "run <file>";
const REPEAT_USAGE: &str = "repeat <count> <command...>";
const RVD_USAGE: &str = "rvd <count> <command...>";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Print the command overview.
    Help,
    /// Leave the shell.
    Exit,
    /// List built-in and user aliases.
    ListAliases,
    /// Add or replace a user alias.
    AliasAdd { alias: String, target: String },
    /// Remove a user alias.
    AliasRemove { alias: String },
    /// Print the numbered history.
    History,
    /// Switch JSON output, or show the current mode when `None`.
    Json(Option<bool>),
    /// Execute device commands from a file.
    Run { path: String },
    /// Execute a device command `count` times.
    Repeat {
        count: usize,
        name: String,
        args: Vec<String>,
        /// Print only the primary value of each reply (`rvd`).
        value_only: bool,
    },
    /// A command for the device.
    Device { name: String, args: Vec<String> },
}

impl ShellCommand {
    /// Parse an interactive line. Blank lines give `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<ShellCommand>, LineError> {
        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else {
            return Ok(None);
        };
        let name = first.to_lowercase();
        let args: Vec<&str> = tokens.collect();

        let command = match canonical_local(&name) {
            Some("help") => ShellCommand::Help,
            Some("exit") => ShellCommand::Exit,
            Some("aliases") => ShellCommand::ListAliases,
            Some("alias") => parse_alias(&args)?,
            Some("history") => ShellCommand::History,
            Some("json") => parse_json(&args)?,
            Some("run") => match args.first() {
                Some(path) => ShellCommand::Run {
                    path: path.to_string(),
                },
                None => return Err(LineError::Usage(RUN_USAGE)),
            },
            Some("repeat") => parse_repeat(&args, false)?,
            Some("rvd") => parse_repeat(&args, true)?,
            _ => ShellCommand::Device {
                name,
                args: owned(&args),
            },
        };
        Ok(Some(command))
    }

    /// Parse a line from a script file: device commands only, first token
    /// lower-cased. Blank lines and `#` comments give `None`.
    pub fn parse_script_line(line: &str) -> Option<ShellCommand> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let mut tokens = line.split_whitespace();
        let name = tokens.next()?.to_lowercase();
        Some(ShellCommand::Device {
            name,
            args: tokens.map(str::to_string).collect(),
        })
    }
}

/// Map a lower-cased name to its local command, if it is one.
pub fn canonical_local(name: &str) -> Option<&'static str> {
    LOCAL_COMMANDS
        .iter()
        .find(|(command, short)| *command == name || short.contains(&name))
        .map(|(command, _)| *command)
}

fn parse_alias(args: &[&str]) -> Result<ShellCommand, LineError> {
    match args {
        [] => Ok(ShellCommand::ListAliases),
        ["add", alias, target, ..] => Ok(ShellCommand::AliasAdd {
            alias: alias.to_string(),
            target: target.to_string(),
        }),
        ["rm", alias, ..] => Ok(ShellCommand::AliasRemove {
            alias: alias.to_string(),
        }),
        _ => Err(LineError::Usage(ALIAS_USAGE)),
    }
}

fn parse_json(args: &[&str]) -> Result<ShellCommand, LineError> {
    match args.first().map(|arg| arg.to_lowercase()).as_deref() {
        None => Ok(ShellCommand::Json(None)),
        Some("on") => Ok(ShellCommand::Json(Some(true))),
        Some("off") => Ok(ShellCommand::Json(Some(false))),
        Some(_) => Err(LineError::Usage(JSON_USAGE)),
    }
}

fn parse_repeat(args: &[&str], value_only: bool) -> Result<ShellCommand, LineError> {
    let usage = if value_only { RVD_USAGE } else { REPEAT_USAGE };
    let [count, name, rest @ ..] = args else {
        return Err(LineError::Usage(usage));
    };
    let count: i64 = count
        .parse()
        .map_err(|_| LineError::BadCount(count.to_string()))?;

    Ok(ShellCommand::Repeat {
        count: count.max(0) as usize,
        name: name.to_string(),
        args: owned(rest),
        value_only,
    })
}

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}
