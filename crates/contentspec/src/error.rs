use std::fmt;
use std::num::ParseIntError;

use thiserror::Error;

use crate::node::NodeId;

/// High-level error type shared across content spec components.
#[derive(Debug, Error)]
pub enum ContentSpecError {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
    #[error("node {0} is not a level")]
    NotALevel(NodeId),
    #[error("node {0} is not a spec topic")]
    NotATopic(NodeId),
    #[error("node {0} cannot hold relationships")]
    NotRelationshipCapable(NodeId),
    #[error("unsupported relationship: {0}")]
    UnsupportedRelationship(String),
    #[error("structure error: {0}")]
    Structure(String),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("invalid number for {key}: {source}")]
    InvalidNumber {
        key: String,
        #[source]
        source: ParseIntError,
    },
}

impl ContentSpecError {
    pub fn context<T: fmt::Display>(self, ctx: T) -> Self {
        match self {
            ContentSpecError::UnsupportedRelationship(msg) => {
                ContentSpecError::UnsupportedRelationship(format!("{ctx}: {msg}"))
            }
            ContentSpecError::Structure(msg) => {
                ContentSpecError::Structure(format!("{ctx}: {msg}"))
            }
            ContentSpecError::InvalidValue { key, message } => ContentSpecError::InvalidValue {
                key,
                message: format!("{ctx}: {message}"),
            },
            other => other,
        }
    }
}
