//! The shell session: one link, one alias set, one output mode.

use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use pinrepl_protocol::{
    Aliases, CommandTable, Dispatcher, FrameTiming, Link, Outcome, BUILTIN_ALIASES, SHORTCUTS,
};

use crate::alias_store::AliasStore;
use crate::commands::ShellCommand;
use crate::error::ShellResult;
use crate::history::History;
use crate::output::{render, render_value};

/// Pause between iterations of `repeat` and `rvd` unless configured.
pub const DEFAULT_REPEAT_DELAY: Duration = Duration::from_millis(100);

/// Prompt printed before each interactive line.
pub const PROMPT: &str = "> ";

/// Session settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellOptions {
    /// Start in JSON output mode.
    pub json: bool,
    /// Pause between repeated executions.
    pub repeat_delay: Duration,
    /// Frame timeouts for every request.
    pub timing: FrameTiming,
}

impl Default for ShellOptions {
    fn default() -> Self {
        ShellOptions {
            json: false,
            repeat_delay: DEFAULT_REPEAT_DELAY,
            timing: FrameTiming::default(),
        }
    }
}

/// Whether the session should keep reading lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// Leave the session.
    Exit,
}

/// An interactive or one-shot session over a link.
pub struct Shell<L: Link> {
    link: L,
    table: CommandTable,
    aliases: Aliases,
    alias_store: Option<AliasStore>,
    history: History,
    options: ShellOptions,
}

impl<L: Link> Shell<L> {
    /// A session with built-in aliases only and no persistence.
    pub fn new(link: L, options: ShellOptions) -> Self {
        Shell {
            link,
            table: CommandTable::new(),
            aliases: Aliases::builtin(),
            alias_store: None,
            history: History::in_memory(),
            options,
        }
    }

    /// Load user aliases from `store` and save changes back to it.
    pub fn with_alias_store(mut self, store: AliasStore) -> Self {
        self.aliases = Aliases::with_user(store.load());
        self.alias_store = Some(store);
        self
    }

    /// Record interactive lines in `history`.
    pub fn with_history(mut self, history: History) -> Self {
        self.history = history;
        self
    }

    pub fn aliases(&self) -> &Aliases {
        &self.aliases
    }

    pub fn json(&self) -> bool {
        self.options.json
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    /// Execute one device command.
    pub fn execute<S: AsRef<str>>(&mut self, name: &str, args: &[S]) -> Outcome {
        let dispatcher = Dispatcher::new(&self.table, &self.aliases, self.options.timing);
        dispatcher.execute(&mut self.link, name, args)
    }

    /// One-shot mode: run a single device command as typed and print it.
    pub fn run_once<S: AsRef<str>, W: Write>(
        &mut self,
        name: &str,
        args: &[S],
        out: &mut W,
    ) -> ShellResult<Outcome> {
        let outcome = self.execute(name, args);
        self.print_outcome(&outcome, out)?;
        Ok(outcome)
    }

    /// Interactive mode: read lines until end of input or `exit`.
    pub fn run_interactive<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> ShellResult<()> {
        writeln!(out, "Interactive pin REPL. 'help' for commands, 'exit' to leave.")?;

        let mut lines = input.lines();
        loop {
            write!(out, "{}", PROMPT)?;
            out.flush()?;

            let Some(line) = lines.next() else {
                writeln!(out)?;
                break;
            };
            if self.handle_line(&line?, out)? == Flow::Exit {
                break;
            }
        }

        writeln!(out, "Exit.")?;
        Ok(())
    }

    /// Handle one interactive line.
    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> ShellResult<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }
        if let Err(e) = self.history.push(line) {
            log::warn!("{}", e);
        }

        let command = match ShellCommand::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(Flow::Continue),
            Err(e) => {
                writeln!(out, "{}", e)?;
                return Ok(Flow::Continue);
            }
        };
        self.dispatch(command, out)
    }

    fn dispatch<W: Write>(&mut self, command: ShellCommand, out: &mut W) -> ShellResult<Flow> {
        match command {
            ShellCommand::Help => self.print_help(out)?,
            ShellCommand::Exit => return Ok(Flow::Exit),
            ShellCommand::ListAliases => self.print_aliases(out)?,
            ShellCommand::AliasAdd { alias, target } => {
                let mut user = self.aliases.user().clone();
                user.insert(alias.clone(), target.clone());
                self.replace_aliases(user)?;
                writeln!(out, "alias added: {} -> {}", alias, target)?;
            }
            ShellCommand::AliasRemove { alias } => {
                let mut user = self.aliases.user().clone();
                if user.remove(&alias).is_some() {
                    self.replace_aliases(user)?;
                    writeln!(out, "alias removed: {}", alias)?;
                } else {
                    writeln!(out, "alias not found")?;
                }
            }
            ShellCommand::History => {
                for (i, entry) in self.history.entries().iter().enumerate() {
                    writeln!(out, "{} {}", i + 1, entry)?;
                }
            }
            ShellCommand::Json(None) => {
                writeln!(out, "json {}", if self.options.json { "on" } else { "off" })?
            }
            ShellCommand::Json(Some(on)) => {
                self.options.json = on;
                writeln!(out, "json {}", if on { "on" } else { "off" })?;
            }
            ShellCommand::Run { path } => self.run_script(Path::new(&path), out)?,
            ShellCommand::Repeat {
                count,
                name,
                args,
                value_only,
            } => {
                for _ in 0..count {
                    let outcome = self.execute(&name, &args);
                    if value_only {
                        writeln!(out, "{}", render_value(&outcome))?;
                    } else {
                        self.print_outcome(&outcome, out)?;
                    }
                    thread::sleep(self.options.repeat_delay);
                }
            }
            ShellCommand::Device { name, args } => {
                let outcome = self.execute(&name, &args);
                self.print_outcome(&outcome, out)?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Execute every device command in a file, echoing each line.
    pub fn run_script<W: Write>(&mut self, path: &Path, out: &mut W) -> ShellResult<()> {
        if !path.exists() {
            writeln!(out, "file not found: {}", path.display())?;
            return Ok(());
        }
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                writeln!(out, "error reading file: {}", e)?;
                return Ok(());
            }
        };

        for line in text.lines() {
            let Some(ShellCommand::Device { name, args }) = ShellCommand::parse_script_line(line)
            else {
                continue;
            };
            writeln!(out, "> {}", line.trim())?;
            let outcome = self.execute(&name, &args);
            self.print_outcome(&outcome, out)?;
        }
        Ok(())
    }

    fn replace_aliases(&mut self, user: std::collections::BTreeMap<String, String>) -> ShellResult<()> {
        if let Some(store) = &self.alias_store {
            store.save(&user)?;
        }
        self.aliases = Aliases::with_user(user);
        Ok(())
    }

    fn print_outcome<W: Write>(&self, outcome: &Outcome, out: &mut W) -> ShellResult<()> {
        writeln!(out, "{}", render(outcome, self.options.json)?)?;
        Ok(())
    }

    fn print_help<W: Write>(&self, out: &mut W) -> ShellResult<()> {
        writeln!(out, "local commands:")?;
        writeln!(out, "  help, h             - show this message")?;
        writeln!(out, "  exit, quit, q, x    - leave the shell")?;
        writeln!(out, "  aliases             - list aliases")?;
        writeln!(out, "  alias add <a> <cmd> - add alias (persists)")?;
        writeln!(out, "  alias rm <a>        - remove alias")?;
        writeln!(out, "  history             - show numbered history")?;
        writeln!(out, "  run <file>          - execute commands from file (one per line)")?;
        writeln!(out, "  repeat N <cmd...>   - repeat N times")?;
        writeln!(out, "  rvd N <cmd...>      - repeat N times, print only the value")?;
        writeln!(out, "  json on|off         - toggle JSON output")?;
        writeln!(out)?;
        writeln!(out, "device commands (aliases work too):")?;
        for name in self.table.names() {
            writeln!(out, "  {}", name)?;
        }
        writeln!(out)?;
        writeln!(out, "aliases: {}", self.aliases.names().join(", "))?;
        Ok(())
    }

    fn print_aliases<W: Write>(&self, out: &mut W) -> ShellResult<()> {
        writeln!(out, "builtin aliases:")?;
        for (alias, target) in BUILTIN_ALIASES {
            writeln!(out, "  {} -> {}", alias, target)?;
        }
        for shortcut in SHORTCUTS {
            writeln!(
                out,
                "  {} -> {} <pin> {}",
                shortcut.name, shortcut.command, shortcut.value
            )?;
        }
        if !self.aliases.user().is_empty() {
            writeln!(out, "user aliases:")?;
            for (alias, target) in self.aliases.user() {
                writeln!(out, "  {} -> {}", alias, target)?;
            }
        }
        Ok(())
    }
}
