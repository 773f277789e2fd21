use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// A resolved topic from the content server, as seen by the tree.
pub trait TopicWrapper: Send + Sync + fmt::Debug {
    fn id(&self) -> i32;
    fn revision(&self) -> Option<i32>;
    fn title(&self) -> &str;
    fn has_tag(&self, tag_id: i32) -> bool;
    /// Value of the property tag `property_tag_id`, if the topic carries it.
    fn property(&self, property_tag_id: i32) -> Option<&str>;

    /// Legacy anchor id.
    fn xref_id(&self) -> String {
        format!("TopicID{}", self.id())
    }

    /// The fixed URL property when present, otherwise the legacy anchor id.
    fn xref_property_or_id(&self, property_tag_id: Option<i32>) -> String {
        property_tag_id
            .and_then(|tag| self.property(tag))
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.xref_id())
    }
}

/// Looks topics up by id and optional revision. `None` means the topic could
/// not be resolved.
pub trait TopicProvider: Send + Sync {
    fn get_topic(&self, id: i32, revision: Option<i32>) -> Option<Arc<dyn TopicWrapper>>;
}

pub trait ServerSettingsProvider: Send + Sync {
    fn server_settings(&self) -> ServerSettings;
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntities {
    #[serde(default)]
    pub task_tag_id: Option<i32>,
    #[serde(default)]
    pub fixed_url_property_tag_id: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default)]
    pub entities: ServerEntities,
}

impl ServerSettingsProvider for ServerSettings {
    fn server_settings(&self) -> ServerSettings {
        self.clone()
    }
}

/// A plain topic record, as loaded from a document catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub id: i32,
    #[serde(default)]
    pub revision: Option<i32>,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<i32>,
    #[serde(default)]
    pub properties: BTreeMap<i32, String>,
}

impl TopicWrapper for TopicRecord {
    fn id(&self) -> i32 {
        self.id
    }

    fn revision(&self) -> Option<i32> {
        self.revision
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn has_tag(&self, tag_id: i32) -> bool {
        self.tags.contains(&tag_id)
    }

    fn property(&self, property_tag_id: i32) -> Option<&str> {
        self.properties.get(&property_tag_id).map(String::as_str)
    }
}

/// Topic provider backed by a map, counting every lookup it serves.
#[derive(Default)]
pub struct InMemoryTopicProvider {
    topics: Mutex<BTreeMap<i32, Vec<Arc<dyn TopicWrapper>>>>,
    lookups: Mutex<usize>,
}

impl InMemoryTopicProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = TopicRecord>) -> Self {
        let provider = Self::new();
        for record in records {
            provider.insert(Arc::new(record));
        }
        provider
    }

    pub fn insert(&self, topic: Arc<dyn TopicWrapper>) {
        self.topics.lock().entry(topic.id()).or_default().push(topic);
    }

    /// How many times `get_topic` has been called.
    pub fn lookups(&self) -> usize {
        *self.lookups.lock()
    }
}

impl TopicProvider for InMemoryTopicProvider {
    fn get_topic(&self, id: i32, revision: Option<i32>) -> Option<Arc<dyn TopicWrapper>> {
        *self.lookups.lock() += 1;
        let topics = self.topics.lock();
        let candidates = topics.get(&id)?;
        match revision {
            Some(revision) => candidates
                .iter()
                .find(|topic| topic.revision() == Some(revision))
                .cloned(),
            None => candidates.iter().max_by_key(|topic| topic.revision()).cloned(),
        }
    }
}
