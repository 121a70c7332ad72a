//! Request/response dispatch.
//!
//! [`Dispatcher`] ties the layers together for one command:
//! alias resolution → table lookup → argument encoding → write → frame
//! read → decode. Every failure along the way ends up in the returned
//! [`Outcome`]; nothing is raised to the caller.
//!
//! The link is borrowed mutably for the whole exchange, so a second request
//! cannot be started on the same link until the first one has finished or
//! timed out.

use crate::alias::{Aliases, Resolution};
use crate::commands::{CommandKind, CommandTable, Request};
use crate::error::CommandError;
use crate::frame::{read_frame, Frame, FrameTiming, Link};
use crate::responses::Outcome;

/// Executes named commands against a link.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'a> {
    table: &'a CommandTable,
    aliases: &'a Aliases,
    timing: FrameTiming,
}

impl<'a> Dispatcher<'a> {
    /// Create a dispatcher over a command table and alias set.
    pub fn new(table: &'a CommandTable, aliases: &'a Aliases, timing: FrameTiming) -> Self {
        Dispatcher {
            table,
            aliases,
            timing,
        }
    }

    /// Run one command to completion.
    pub fn execute<L, S>(&self, link: &mut L, name: &str, tokens: &[S]) -> Outcome
    where
        L: Link + ?Sized,
        S: AsRef<str>,
    {
        let tokens: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();
        let request = match self.prepare_tokens(name, &tokens) {
            Ok(request) => request,
            Err((command, err)) => {
                log::debug!("{}: rejected before I/O: {}", name, err);
                return Outcome::failure(command, err);
            }
        };

        let command = request.command;
        let frame = match exchange(link, &request, self.timing) {
            Ok(frame) => frame,
            Err(err) => return Outcome::failure(Some(command), err),
        };

        let (payload, terminator) = frame.split();
        match command.decode(payload, terminator) {
            Ok(reply) => Outcome::success(command, reply),
            Err(err) => {
                log::debug!("{}: decode failed: {}", command, err);
                Outcome::failure(Some(command), err.into())
            }
        }
    }

    fn prepare_tokens(
        &self,
        name: &str,
        tokens: &[&str],
    ) -> Result<Request, (Option<CommandKind>, CommandError)> {
        let (descriptor, args) = match self.aliases.resolve(name) {
            Resolution::Shortcut(shortcut) => {
                let descriptor = self.table.get(shortcut.command);
                let args = shortcut
                    .expand(tokens)
                    .map_err(|err| (Some(shortcut.command), err.into()))?;
                (descriptor, args)
            }
            Resolution::Name(target) => {
                let descriptor = self.table.lookup(target).map_err(|err| (None, err))?;
                (descriptor, tokens.to_vec())
            }
        };

        log::debug!("{} -> {} {:?}", name, descriptor.name, args);
        descriptor
            .encode(&args)
            .map_err(|err| (Some(descriptor.kind), err.into()))
    }
}

/// Write a request and read back its frame.
///
/// An empty timeout becomes [`CommandError::NoResponse`], a partial one
/// [`CommandError::LinkTimeout`].
pub fn exchange<L: Link + ?Sized>(
    link: &mut L,
    request: &Request,
    timing: FrameTiming,
) -> Result<Frame, CommandError> {
    let bytes = request.encode();
    log::trace!("-> {}: {:02X?}", request.command, bytes);
    link.write_all(&bytes)?;

    match read_frame(link, timing) {
        Ok(frame) => {
            log::trace!("<- {}: {:02X?}", request.command, frame.as_bytes());
            Ok(frame)
        }
        Err(err) => {
            log::warn!("{}: {}", request.command, err);
            Err(err.into())
        }
    }
}
