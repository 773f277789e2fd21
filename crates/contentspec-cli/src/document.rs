use contentspec::{
    ContentSpec, ContentSpecError, InMemoryTopicProvider, InfoTopic, NodeId, RelationshipType,
    ServerSettings, SpecTopic, TopicRecord,
};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// A content spec outline as written in YAML.
///
/// ```yaml
/// id: 1234
/// metadata:
///   - { key: Title, value: Tea }
/// content:
///   - chapter:
///       title: Tea
///       children:
///         - topic: { id: N, title: Boiling, type: Task }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
    #[serde(default)]
    pub settings: ServerSettings,
    /// Topics known to the content server, used when linking processes.
    #[serde(default)]
    pub topics: Vec<TopicRecord>,
    #[serde(default)]
    pub content: Vec<ContentEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataEntry {
    pub key: String,
    #[serde(deserialize_with = "scalar_string")]
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentEntry {
    Chapter(LevelEntry),
    Section(LevelEntry),
    Appendix(LevelEntry),
    Part(LevelEntry),
    Preface(LevelEntry),
    Process(LevelEntry),
    Topic(TopicEntry),
    CommonContent(String),
    Comment(String),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelEntry {
    pub title: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "optional_scalar_string")]
    pub info: Option<String>,
    #[serde(default)]
    pub initial_content: Vec<TopicEntry>,
    #[serde(default)]
    pub relationships: Vec<RelationshipEntry>,
    #[serde(default)]
    pub children: Vec<ContentEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopicEntry {
    #[serde(deserialize_with = "scalar_string")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub type_label: Option<String>,
    #[serde(default)]
    pub revision: Option<i32>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<RelationshipEntry>,
}

/// A relationship to a target id (`T...`) or to a topic id.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationshipEntry {
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
    #[serde(deserialize_with = "scalar_string")]
    pub target: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Tree(#[from] ContentSpecError),
    #[error("line {line}: relationship target '{target}' could not be found")]
    UnresolvedTarget { line: i32, target: String },
}

impl Document {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Builds the tree, resolves relationships, and links every process.
    ///
    /// Each metadata entry and content entry counts as one source line, in
    /// document order.
    pub fn build(&self) -> Result<ContentSpec, DocumentError> {
        let mut builder = Builder::default();
        if let Some(id) = self.id {
            builder.spec.set_id(Some(id));
        }
        for entry in &self.metadata {
            let line = builder.next_line();
            builder
                .spec
                .append_key_value_node(&entry.key, &entry.value, line)
                .map_err(|err| err.context(format!("line {line}")))?;
        }

        let base = builder.spec.base_level();
        for entry in &self.content {
            builder.add(base, entry)?;
        }
        builder.resolve_relationships()?;

        let provider = InMemoryTopicProvider::with_records(self.topics.iter().cloned());
        let Builder {
            mut spec, processes, ..
        } = builder;
        for process in processes {
            if !spec.process_topics(process, &provider, &self.settings)? {
                tracing::warn!(%process, "process linked with unresolved topics");
            }
        }
        tracing::debug!(topics = provider.lookups(), "topic lookups served");
        Ok(spec)
    }
}

#[derive(Default)]
struct Builder<'a> {
    spec: ContentSpec,
    line: i32,
    pending: Vec<(NodeId, i32, &'a RelationshipEntry)>,
    processes: Vec<NodeId>,
}

impl<'a> Builder<'a> {
    fn next_line(&mut self) -> i32 {
        self.line += 1;
        self.line
    }

    fn add(&mut self, parent: NodeId, entry: &'a ContentEntry) -> Result<(), DocumentError> {
        let line = self.next_line();
        let node = match entry {
            ContentEntry::Chapter(level) => self.level(parent, line, level, |spec, t| spec.new_chapter(t))?,
            ContentEntry::Section(level) => self.level(parent, line, level, |spec, t| spec.new_section(t))?,
            ContentEntry::Appendix(level) => {
                self.level(parent, line, level, |spec, t| spec.new_appendix(t))?
            }
            ContentEntry::Part(level) => self.level(parent, line, level, |spec, t| spec.new_part(t))?,
            ContentEntry::Preface(level) => self.level(parent, line, level, |spec, t| spec.new_preface(t))?,
            ContentEntry::Process(level) => {
                let node = self.level(parent, line, level, |spec, t| spec.new_process(t))?;
                self.processes.push(node);
                node
            }
            ContentEntry::Topic(topic) => {
                let node = self.topic(line, topic)?;
                self.spec.append_child(parent, node)?;
                node
            }
            ContentEntry::CommonContent(title) => {
                let node = self.spec.new_common_content(title);
                self.attach(parent, node, line)?;
                node
            }
            ContentEntry::Comment(text) => {
                let node = self.spec.new_comment(text.as_str());
                self.attach(parent, node, line)?;
                node
            }
            ContentEntry::Text(text) => {
                let node = self.spec.new_text(text.as_str());
                self.attach(parent, node, line)?;
                node
            }
        };
        tracing::trace!(%node, line, "added");
        Ok(())
    }

    fn attach(&mut self, parent: NodeId, node: NodeId, line: i32) -> Result<(), DocumentError> {
        self.spec.entry_mut(node)?.set_line_number(line);
        self.spec.append_child(parent, node)?;
        Ok(())
    }

    fn level(
        &mut self,
        parent: NodeId,
        line: i32,
        entry: &'a LevelEntry,
        create: impl FnOnce(&mut ContentSpec, &str) -> NodeId,
    ) -> Result<NodeId, DocumentError> {
        let level = create(&mut self.spec, &entry.title);
        if let Some(attributes) = self.spec.attributes_mut(level) {
            attributes.set_target_id(entry.target.as_deref());
            attributes.set_tags(entry.tags.clone());
        }
        self.attach(parent, level, line)?;

        if let Some(info) = &entry.info {
            self.spec.set_info_topic(level, Some(InfoTopic::new(info)))?;
        }
        for topic in &entry.initial_content {
            let line = self.next_line();
            let node = self.topic(line, topic)?;
            self.spec.append_initial_content(level, node)?;
        }
        for relationship in &entry.relationships {
            self.pending.push((level, line, relationship));
        }
        for child in &entry.children {
            self.add(level, child)?;
        }
        Ok(level)
    }

    fn topic(&mut self, line: i32, entry: &'a TopicEntry) -> Result<NodeId, DocumentError> {
        let mut topic = SpecTopic::new(&entry.id);
        if let Some(title) = &entry.title {
            topic = topic.with_title(title);
        }
        if let Some(type_label) = &entry.type_label {
            topic = topic.with_type(type_label);
        }
        if let Some(revision) = entry.revision {
            topic = topic.with_revision(revision);
        }
        let attributes = topic.attributes_mut();
        attributes.set_target_id(entry.target.as_deref());
        attributes.set_tags(entry.tags.clone());

        let node = self.spec.new_topic(topic);
        self.spec.entry_mut(node)?.set_line_number(line);
        for relationship in &entry.relationships {
            self.pending.push((node, line, relationship));
        }
        Ok(node)
    }

    fn resolve_relationships(&mut self) -> Result<(), DocumentError> {
        for (from, line, relationship) in std::mem::take(&mut self.pending) {
            let target = relationship.target.as_str();
            let title = relationship.title.as_deref();
            if is_target_id(target) {
                let node = self
                    .spec
                    .closest_spec_node_by_target_id(from, target, true)
                    .ok_or_else(|| unresolved(line, target))?;
                self.spec
                    .add_relationship_to_target(from, node, relationship.relationship_type, title)
                    .map_err(|err| err.context(format!("line {line}")))?;
            } else {
                let node = self
                    .spec
                    .closest_topic(from, target, true)
                    .ok_or_else(|| unresolved(line, target))?;
                self.spec
                    .add_relationship_to_topic(from, node, relationship.relationship_type, title)
                    .map_err(|err| err.context(format!("line {line}")))?;
            }
        }
        Ok(())
    }
}

fn is_target_id(target: &str) -> bool {
    target.starts_with('T') && target.len() > 1
}

fn unresolved(line: i32, target: &str) -> DocumentError {
    DocumentError::UnresolvedTarget {
        line,
        target: target.to_string(),
    }
}

fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    scalar_text(&value).ok_or_else(|| serde::de::Error::custom("expected a scalar value"))
}

fn optional_scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    match value {
        serde_yaml::Value::Null => Ok(None),
        other => scalar_text(&other)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("expected a scalar value")),
    }
}

fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(text) => Some(text.clone()),
        serde_yaml::Value::Number(number) => Some(number.to_string()),
        serde_yaml::Value::Bool(true) => Some("ON".to_string()),
        serde_yaml::Value::Bool(false) => Some("OFF".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentspec::LinkOptions;

    const TEA: &str = r#"
id: 1234
metadata:
  - { key: Title, value: Tea }
  - { key: product, value: Nu-Tea }
  - { key: Pubsnumber, value: 3 }
settings:
  entities: { task_tag_id: 4 }
topics:
  - { id: 12, title: Boil, tags: [4] }
content:
  - chapter:
      title: Tea
      target: T-tea
      children:
        - topic: { id: N, title: Tea, type: Concept }
        - process:
            title: Brewing
            children:
              - topic: { id: 12 }
              - topic:
                  id: N1
                  title: Steep
                  type: Task
                  relationships:
                    - { type: refer-to, target: T-tea }
"#;

    #[test]
    fn builds_tree_metadata_and_process_links() {
        let document = Document::from_yaml(TEA).unwrap();
        let spec = document.build().unwrap();

        assert_eq!(spec.title(), Some("Tea"));
        assert_eq!(spec.product(), Some("Nu-Tea"));
        assert_eq!(spec.pubsnumber(), Some(3));
        assert_eq!(spec.id(), Some(1234));
        assert_eq!(spec.spec_topics().len(), 3);

        let topics = spec.spec_topics();
        let boil = topics[1];
        let steep = topics[2];
        let next: Vec<NodeId> = spec
            .next_relationships(boil)
            .iter()
            .map(|r| r.secondary())
            .collect();
        assert_eq!(next, vec![steep]);
        assert_eq!(
            spec.unique_link_id(boil, &LinkOptions::default()).as_deref(),
            Some("TopicID12")
        );
        assert!(spec.render(false).contains("[R: T-tea]"));
    }

    #[test]
    fn unknown_relationship_target_is_reported_with_its_line() {
        let document = Document::from_yaml(
            r#"
content:
  - chapter:
      title: Tea
      children:
        - topic:
            id: N
            relationships:
              - { type: prerequisite, target: "99" }
"#,
        )
        .unwrap();
        let err = document.build().unwrap_err();
        assert!(matches!(
            err,
            DocumentError::UnresolvedTarget { line: 2, ref target } if target == "99"
        ));
    }

    #[test]
    fn invalid_metadata_values_surface_as_tree_errors() {
        let document = Document::from_yaml("metadata:\n  - { key: Pubsnumber, value: three }\n").unwrap();
        let err = document.build().unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Tree(ContentSpecError::InvalidNumber { .. })
        ));
    }
}
