pub mod format;
pub mod io;
pub mod logger;
pub mod spinner;

use std::ffi::OsString;
use std::process;

use console::style;
use sshkeys_common::args::{Args, Error, Help};
use sshkeys_common::config::Config;

pub use io::*;
pub use spinner::{spinner, Spinner};

/// Log target prefix shared by the workspace crates.
pub const LOG_TARGET: &str = "sshkeys";

/// Context passed to all commands.
pub trait Context {
    /// Return the configuration for this run.
    fn config(&self) -> Result<Config, anyhow::Error>;
}

impl Context for Config {
    fn config(&self) -> Result<Config, anyhow::Error> {
        Ok(self.clone())
    }
}

impl<F> Context for F
where
    F: Fn() -> Result<Config, anyhow::Error>,
{
    fn config(&self) -> Result<Config, anyhow::Error> {
        self()
    }
}

/// A command that can be run.
pub trait Command<A: Args, C: Context> {
    /// Run the command, given arguments and a context.
    fn run(self, args: A, context: C) -> anyhow::Result<()>;
}

impl<F, A: Args, C: Context> Command<A, C> for F
where
    F: FnOnce(A, C) -> anyhow::Result<()>,
{
    fn run(self, args: A, context: C) -> anyhow::Result<()> {
        self(args, context)
    }
}

pub fn run_command<A, C>(help: Help, action: &str, cmd: C) -> !
where
    A: Args,
    C: Command<A, fn() -> anyhow::Result<Config>>,
{
    let args = std::env::args_os().skip(1).collect();

    run_command_args(help, action, cmd, args)
}

pub fn run_command_args<A, C>(help: Help, action: &str, cmd: C, args: Vec<OsString>) -> !
where
    A: Args,
    C: Command<A, fn() -> anyhow::Result<Config>>,
{
    use crate::io as term;

    if let Err(err) = logger::init(logger::Logger::new(LOG_TARGET, log::Level::Debug)) {
        term::warning(&format!("Logging is unavailable: {}", err));
    }

    let options = match A::from_args(args) {
        Ok((opts, unparsed)) => {
            if let Err(err) = sshkeys_common::args::finish(unparsed) {
                term::error(err);
                process::exit(1);
            }
            opts
        }
        Err(err) => {
            match err.downcast_ref::<Error>() {
                Some(Error::Help) => {
                    term::help(help.name, help.version, help.description, help.usage);
                    process::exit(0);
                }
                Some(Error::Usage) => {
                    term::usage(help.name, help.usage);
                    process::exit(1);
                }
                _ => {}
            };
            eprintln!(
                "{} {} {} {}",
                style("==").red(),
                style("Error:").red(),
                style(format!("{}:", help.name)).red(),
                style(&err).red()
            );

            if let Some(Error::WithHint { hint, .. }) = err.downcast_ref::<Error>() {
                eprintln!("{}", style(hint).yellow());
            }

            process::exit(1);
        }
    };
    logger::set_level(options.verbosity().level());

    match cmd.run(options, Config::from_env) {
        Ok(()) => process::exit(0),
        Err(err) => {
            term::fail(&format!("{} failed", action), &err);
            process::exit(1);
        }
    }
}
