mod cli;
mod commands;
mod context;
mod document;
mod error;
mod formatter;
mod util;

pub use cli::{run, run_cli};
pub use document::{
    ContentEntry, Document, DocumentError, LevelEntry, MetadataEntry, RelationshipEntry, TopicEntry,
};
pub use error::CliError;
