use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command};
use contentspec::checksum_of;

use crate::commands::CommandResult;
use crate::context::CliSession;
use crate::error::CliError;

pub fn command() -> Command {
    Command::new("render")
        .about("Render a YAML outline document as a content spec")
        .arg(
            Arg::new("document")
                .value_name("DOCUMENT")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Path to the YAML outline document"),
        )
        .arg(
            Arg::new("checksum")
                .long("checksum")
                .action(ArgAction::SetTrue)
                .help("Prepend a CHECKSUM line computed over the ID line and body"),
        )
}

pub fn run(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let path = crate::util::required_path(matches, "document")?;
    let loaded = session.load_document(&path)?;
    let include_checksum = matches.get_flag("checksum");
    if include_checksum && loaded.spec.id().is_none() {
        tracing::warn!(path = %loaded.path, "no ID set; rendering without a checksum");
    }

    let text = loaded.spec.render(include_checksum);
    let checksum = checksum_of(&text).map(str::to_string);
    Ok(CommandResult::Rendered {
        path: loaded.path,
        text,
        checksum,
    })
}
