use std::path::{Path, PathBuf};

use clap::{Arg, ArgMatches, Command};
use contentspec::{remove_checksum_and_id, verify_checksum};
use serde::Serialize;
use walkdir::WalkDir;

use crate::commands::CommandResult;
use crate::context::CliSession;
use crate::error::{CliError, ExitStatus};
use crate::util::{self, CONTENT_SPEC_EXTENSION};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumStatus {
    Valid,
    Mismatch,
    Missing,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChecksumReport {
    pub path: String,
    pub status: ChecksumStatus,
}

pub fn command() -> Command {
    Command::new("checksum")
        .about("Verify or strip the checksum lines of rendered content specs")
        .subcommand_required(true)
        .subcommand(
            Command::new("verify")
                .about("Verify a content spec file, or every *.contentspec file under a directory")
                .arg(path_arg("PATH")),
        )
        .subcommand(
            Command::new("strip")
                .about("Print a content spec without its CHECKSUM and ID lines")
                .arg(path_arg("FILE")),
        )
}

fn path_arg(value_name: &'static str) -> Arg {
    Arg::new("path")
        .value_name(value_name)
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
}

pub fn run(session: &CliSession, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    match matches.subcommand() {
        Some(("verify", sub)) => verify(session, &util::required_path(sub, "path")?),
        Some(("strip", sub)) => strip(&util::required_path(sub, "path")?),
        _ => Err(CliError::new("missing checksum command", ExitStatus::Usage)),
    }
}

fn verify(session: &CliSession, path: &Path) -> Result<CommandResult, CliError> {
    if !path.exists() {
        return Err(CliError::new(
            format!("{} does not exist", path.display()),
            ExitStatus::Usage,
        ));
    }

    let mut reports = Vec::new();
    for file in content_spec_files(path)? {
        let text = util::read_to_string(&file)?;
        let status = match verify_checksum(&text) {
            Some(true) => ChecksumStatus::Valid,
            Some(false) => ChecksumStatus::Mismatch,
            None => ChecksumStatus::Missing,
        };
        if session.verbosity.verbose {
            tracing::info!(path = %file.display(), ?status, "checked");
        }
        reports.push(ChecksumReport {
            path: util::display_path(&file),
            status,
        });
    }

    let healthy = reports
        .iter()
        .all(|report| report.status == ChecksumStatus::Valid);
    Ok(CommandResult::ChecksumVerified { reports, healthy })
}

/// A file is checked whatever its name; a directory is walked for `*.contentspec`.
fn content_spec_files(path: &Path) -> Result<Vec<PathBuf>, CliError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext == CONTENT_SPEC_EXTENSION)
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn strip(path: &Path) -> Result<CommandResult, CliError> {
    let text = util::read_to_string(path)?;
    Ok(CommandResult::ChecksumStripped {
        path: util::display_path(path),
        text: remove_checksum_and_id(&text),
    })
}
