use std::path::{Path, PathBuf};

use crate::error::{CliError, ExitStatus};

#[derive(Clone, Copy, Debug, Default)]
pub struct Verbosity {
    pub json: bool,
    pub verbose: bool,
}

/// File extension of rendered content spec files.
pub const CONTENT_SPEC_EXTENSION: &str = "contentspec";

pub fn read_to_string(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|err| {
        let status = match err.kind() {
            std::io::ErrorKind::NotFound => ExitStatus::Usage,
            _ => ExitStatus::Io,
        };
        CliError::new(format!("failed to read {}: {err}", path.display()), status)
    })
}

pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

pub fn required_path(matches: &clap::ArgMatches, name: &str) -> Result<PathBuf, CliError> {
    matches
        .get_one::<PathBuf>(name)
        .cloned()
        .ok_or_else(|| CliError::new(format!("missing <{name}> argument"), ExitStatus::Usage))
}
