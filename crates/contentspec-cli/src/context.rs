use std::path::Path;

use contentspec::{ContentSpec, LinkOptions};

use crate::document::Document;
use crate::error::{CliError, ExitStatus};
use crate::util::{self, Verbosity};

pub struct CliSession {
    pub verbosity: Verbosity,
}

/// A document together with the tree built from it.
pub struct LoadedDocument {
    pub path: String,
    pub document: Document,
    pub spec: ContentSpec,
}

impl LoadedDocument {
    pub fn link_options(&self, use_fixed_urls: bool) -> LinkOptions {
        LinkOptions {
            fixed_url_property_tag_id: self.document.settings.entities.fixed_url_property_tag_id,
            use_fixed_urls,
        }
    }
}

impl CliSession {
    pub fn bootstrap(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    pub fn load_document(&self, path: &Path) -> Result<LoadedDocument, CliError> {
        let text = util::read_to_string(path)?;
        let document = Document::from_yaml(&text)
            .map_err(|err| CliError::new(format!("{}: {err}", path.display()), ExitStatus::Data))?;
        let spec = document.build().map_err(|err| {
            let err = CliError::from(err);
            CliError::new(format!("{}: {err}", path.display()), err.status())
        })?;
        if self.verbosity.verbose {
            tracing::info!(
                path = %path.display(),
                metadata = document.metadata.len(),
                topics = spec.spec_topics().len(),
                catalog = document.topics.len(),
                "loaded content spec document"
            );
        }
        Ok(LoadedDocument {
            path: util::display_path(path),
            document,
            spec,
        })
    }
}
