use std::path::PathBuf;

use clap::{Arg, ArgMatches, Command};

use crate::commands::CommandResult;
use crate::context::CliSession;
use crate::error::CliError;

pub fn command() -> Command {
    Command::new("outline")
        .about("List levels and topics with their step numbers")
        .arg(
            Arg::new("document")
                .value_name("DOCUMENT")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Path to the YAML outline document"),
        )
}

pub fn run(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let path = crate::util::required_path(matches, "document")?;
    let loaded = session.load_document(&path)?;
    Ok(CommandResult::Outline {
        outline: loaded.spec.outline(),
        path: loaded.path,
    })
}
