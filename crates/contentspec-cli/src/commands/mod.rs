use contentspec::OutlineNode;
use serde::Serialize;

use crate::error::ExitStatus;

pub mod checksum;
pub mod links;
pub mod outline;
pub mod render;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandResult {
    Rendered {
        path: String,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        checksum: Option<String>,
    },
    Outline {
        path: String,
        outline: OutlineNode,
    },
    Links {
        path: String,
        fixed_urls: bool,
        links: Vec<links::LinkEntry>,
    },
    ChecksumVerified {
        reports: Vec<checksum::ChecksumReport>,
        healthy: bool,
    },
    ChecksumStripped {
        path: String,
        text: String,
    },
}

impl CommandResult {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            CommandResult::ChecksumVerified { healthy, .. } => {
                if *healthy {
                    ExitStatus::Ok
                } else {
                    ExitStatus::Data
                }
            }
            _ => ExitStatus::Ok,
        }
    }
}
