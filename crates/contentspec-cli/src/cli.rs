use std::ffi::OsString;
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::commands;
use crate::context::CliSession;
use crate::error::{CliError, ExitStatus};
use crate::formatter::{OutputFormat, emit_result};
use crate::util::Verbosity;

const NAME: &str = "contentspec";

pub fn run() -> ExitCode {
    init_tracing();
    match run_cli(std::env::args()) {
        Ok(code) => code,
        Err(err) => {
            err.print();
            err.exit_code()
        }
    }
}

/// Parses arguments, dispatches the subcommand and prints its result.
/// Failures come back as `CliError`s carrying a `sysexits` status.
pub fn run_cli<I, S>(args: I) -> Result<ExitCode, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    let command = build_cli();
    let matches = command.try_get_matches_from(args)?;

    let verbosity = Verbosity {
        json: matches.get_flag("json"),
        verbose: matches.get_flag("verbose"),
    };
    let output = if verbosity.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let session = CliSession::bootstrap(verbosity);
    if session.verbosity.verbose {
        tracing::info!(
            command = matches.subcommand_name().unwrap_or_default(),
            json = verbosity.json,
            "dispatching"
        );
    }

    let result = dispatch(&session, &matches)?;
    emit_result(result, output)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_cli() -> Command {
    Command::new(NAME)
        .about("Build, render and check Content Specifications")
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit a JSON object instead of human-readable text."),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log resolved inputs to stderr (filter with RUST_LOG)."),
        )
        .subcommand_required(true)
        .subcommand(commands::render::command())
        .subcommand(commands::outline::command())
        .subcommand(commands::links::command())
        .subcommand(commands::checksum::command())
}

fn dispatch(
    session: &CliSession,
    matches: &ArgMatches,
) -> Result<commands::CommandResult, CliError> {
    match matches.subcommand() {
        Some(("render", sub)) => commands::render::run(session, sub),
        Some(("outline", sub)) => commands::outline::run(session, sub),
        Some(("links", sub)) => commands::links::run(session, sub),
        Some(("checksum", sub)) => commands::checksum::run(session, sub),
        _ => Err(CliError::new("missing command", ExitStatus::Usage)),
    }
}
