//! Command name aliases.
//!
//! Names typed by the user go through this layer before the command table.
//! There are three kinds of alias:
//!
//! - **Shortcuts** (`on`, `off`): fixed command with a preset value. Matched
//!   on the name as typed, ahead of everything else.
//! - **User aliases**: name → command name, loaded from the user's alias
//!   file. These win over built-in names.
//! - **Built-in aliases**: short forms such as `dr` for `digitalread`.
//!
//! Resolution is single-level: an alias target is not itself resolved.

use std::collections::BTreeMap;

use crate::commands::CommandKind;
use crate::error::ArgumentError;

/// Built-in short names.
pub const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("i", "info"),
    ("dr", "digitalread"),
    ("ar", "analogread"),
    ("dw", "digitalwrite"),
    ("aw", "analogwrite"),
    ("pm", "pinmode"),
    ("r", "reset"),
];

/// Built-in shortcuts with a preset value.
pub const SHORTCUTS: &[Shortcut] = &[
    Shortcut {
        name: "on",
        command: CommandKind::DigitalWrite,
        value: "1",
        usage: "on <pin>",
    },
    Shortcut {
        name: "off",
        command: CommandKind::DigitalWrite,
        value: "0",
        usage: "off <pin>",
    },
];

/// A name that expands to a command with a fixed trailing argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortcut {
    /// Name as typed.
    pub name: &'static str,
    /// Command it runs.
    pub command: CommandKind,
    /// Value appended after the pin.
    pub value: &'static str,
    /// Usage string reported when the pin is missing.
    pub usage: &'static str,
}

impl Shortcut {
    /// Build the argument tokens for the target command: `<pin> <value>`.
    pub fn expand<'a>(&self, tokens: &[&'a str]) -> Result<Vec<&'a str>, ArgumentError> {
        let pin = tokens.first().ok_or(ArgumentError::Usage(self.usage))?;
        Ok(vec![*pin, self.value])
    }
}

/// What a typed name resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// A command name to look up in the table.
    Name(&'a str),
    /// A shortcut with preset arguments.
    Shortcut(&'static Shortcut),
}

/// Immutable alias set: built-ins plus a snapshot of the user's aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aliases {
    user: BTreeMap<String, String>,
}

impl Aliases {
    /// Only the built-in aliases.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Built-ins plus the given user aliases.
    pub fn with_user(user: BTreeMap<String, String>) -> Self {
        Aliases { user }
    }

    /// The user alias map.
    pub fn user(&self) -> &BTreeMap<String, String> {
        &self.user
    }

    /// Resolve a typed name.
    pub fn resolve<'a>(&'a self, name: &'a str) -> Resolution<'a> {
        if let Some(shortcut) = SHORTCUTS.iter().find(|s| s.name == name) {
            return Resolution::Shortcut(shortcut);
        }
        if let Some(target) = self.user.get(name) {
            return Resolution::Name(target.as_str());
        }
        if let Some((_, target)) = BUILTIN_ALIASES.iter().find(|(alias, _)| *alias == name) {
            return Resolution::Name(*target);
        }
        Resolution::Name(name)
    }

    /// Every name the alias layer knows about, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = BUILTIN_ALIASES
            .iter()
            .map(|(alias, _)| *alias)
            .chain(SHORTCUTS.iter().map(|s| s.name))
            .chain(self.user.keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}
