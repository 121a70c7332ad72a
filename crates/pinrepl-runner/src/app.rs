//! Top-level program flow.

use std::io::{self, BufRead, Write};

use pinrepl_protocol::{Link, SimulatedDevice};
use pinrepl_shell::{AliasStore, History, Shell};
use tracing::{info, warn};

use crate::cli::Cli;
use crate::config::RunnerConfig;
use crate::error::RunnerResult;
use crate::serial::{detect_port, list_ports, SerialLink};

/// Run the program for parsed arguments. Returns false when a one-shot
/// command failed.
pub fn run(cli: &Cli) -> RunnerResult<bool> {
    let mut config = RunnerConfig::discover(cli.config.as_deref())?;
    config.apply_cli(cli);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.list_ports {
        for port in list_ports()? {
            writeln!(out, "{}  {}", port.name, port.description)?;
        }
        return Ok(true);
    }

    let stdin = io::stdin();
    let input = stdin.lock();

    if cli.simulate {
        info!("using simulated device");
        return run_session(
            SimulatedDevice::new(),
            &config,
            cli.command.as_deref(),
            &cli.args,
            input,
            &mut out,
        );
    }

    let port = match &config.port {
        Some(port) => port.clone(),
        None => detect_port()?,
    };
    let link = SerialLink::open(&port, &config)?;
    run_session(link, &config, cli.command.as_deref(), &cli.args, input, &mut out)
}

/// Run one session over an open link: a single command when `command` is
/// given, otherwise the interactive shell reading from `input`.
pub fn run_session<L, R, W>(
    link: L,
    config: &RunnerConfig,
    command: Option<&str>,
    args: &[String],
    input: R,
    out: &mut W,
) -> RunnerResult<bool>
where
    L: Link,
    R: BufRead,
    W: Write,
{
    let mut shell = Shell::new(link, config.shell_options());
    if let Some(path) = config.aliases_path() {
        shell = shell.with_alias_store(AliasStore::new(path));
    }

    if let Some(name) = command {
        let outcome = shell.run_once(name, args, out)?;
        return Ok(outcome.ok());
    }

    if let Some(path) = config.history_path() {
        match History::open(path) {
            Ok(history) => shell = shell.with_history(history),
            Err(e) => warn!("history disabled: {}", e),
        }
    }
    shell.run_interactive(input, out)?;
    Ok(true)
}
