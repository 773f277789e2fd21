use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Serialize;

use crate::attributes::SpecAttributes;
use crate::escape::{docbook_escape_title, escape_title};
use crate::provider::TopicWrapper;
use crate::relationship::Relationship;

/// Provenance of a topic, parsed from the shape of its id string.
///
/// | id        | identity                                   |
/// |-----------|--------------------------------------------|
/// | `N`, `N3` | new topic, with an optional local number   |
/// | `12`      | existing topic 12                          |
/// | `C12`     | clone of existing topic 12                 |
/// | `X12`     | duplicate of the new topic declared `N12`  |
/// | `XC12`    | duplicate of the clone declared `C12`      |
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopicIdentity {
    New { local: Option<u32> },
    Existing { db_id: i32 },
    Cloned { source_id: i32 },
    Duplicate { declared_as: String },
    ClonedDuplicate { declared_as: String },
    Unrecognized,
}

struct IdentityPatterns {
    new: Regex,
    existing: Regex,
    cloned: Regex,
    duplicate: Regex,
    cloned_duplicate: Regex,
}

fn identity_patterns() -> &'static IdentityPatterns {
    static PATTERNS: OnceLock<IdentityPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| IdentityPatterns {
        new: Regex::new(r"^N[0-9]*$").expect("Invalid regex"),
        existing: Regex::new(r"^[0-9]+$").expect("Invalid regex"),
        cloned: Regex::new(r"^C[0-9]+$").expect("Invalid regex"),
        duplicate: Regex::new(r"^X[0-9]+$").expect("Invalid regex"),
        cloned_duplicate: Regex::new(r"^XC[0-9]+$").expect("Invalid regex"),
    })
}

impl TopicIdentity {
    pub fn parse(id: &str) -> Self {
        let patterns = identity_patterns();
        if patterns.new.is_match(id) {
            TopicIdentity::New {
                local: id[1..].parse().ok(),
            }
        } else if patterns.existing.is_match(id) {
            id.parse()
                .map(|db_id| TopicIdentity::Existing { db_id })
                .unwrap_or(TopicIdentity::Unrecognized)
        } else if patterns.cloned.is_match(id) {
            id[1..]
                .parse()
                .map(|source_id| TopicIdentity::Cloned { source_id })
                .unwrap_or(TopicIdentity::Unrecognized)
        } else if patterns.duplicate.is_match(id) {
            TopicIdentity::Duplicate {
                declared_as: format!("N{}", &id[1..]),
            }
        } else if patterns.cloned_duplicate.is_match(id) {
            TopicIdentity::ClonedDuplicate {
                declared_as: format!("C{}", &id[2..]),
            }
        } else {
            TopicIdentity::Unrecognized
        }
    }
}

/// Structural role a container assigns to a topic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicType {
    #[default]
    Normal,
    Level,
    Info,
    Abstract,
    RevisionHistory,
    Feedback,
    LegalNotice,
    AuthorGroup,
    InitialContent,
}

/// Identity fields shared by spec topics and info topics.
#[derive(Clone, Debug)]
struct TopicRef {
    id: String,
    identity: TopicIdentity,
    db_id: Option<i32>,
    type_label: Option<String>,
    revision: Option<i32>,
}

impl TopicRef {
    fn new(id: &str) -> Self {
        let mut topic_ref = Self {
            id: String::new(),
            identity: TopicIdentity::Unrecognized,
            db_id: None,
            type_label: None,
            revision: None,
        };
        topic_ref.set_id(id);
        topic_ref
    }

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
        self.identity = TopicIdentity::parse(id);
        self.db_id = match self.identity {
            TopicIdentity::Existing { db_id } => Some(db_id),
            _ => None,
        };
    }

    /// `id(, type)(, rev: N)` as written inside a topic's brackets.
    fn bracket_body(&self) -> String {
        let mut body = self.id.clone();
        if matches!(self.identity, TopicIdentity::New { .. }) {
            if let Some(label) = &self.type_label {
                body.push_str(", ");
                body.push_str(label);
            }
        } else if let Some(revision) = self.revision {
            body.push_str(&format!(", rev: {revision}"));
        }
        body
    }
}

/// A reference to a documentation topic.
#[derive(Clone, Debug)]
pub struct SpecTopic {
    topic_ref: TopicRef,
    topic_type: TopicType,
    attributes: SpecAttributes,
    pub(crate) relationships: Vec<Relationship>,
    topic: Option<Arc<dyn TopicWrapper>>,
    xml_document: Option<String>,
}

impl SpecTopic {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self {
            topic_ref: TopicRef::new(id.as_ref()),
            topic_type: TopicType::Normal,
            attributes: SpecAttributes::default(),
            relationships: Vec::new(),
            topic: None,
            xml_document: None,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.attributes.set_title(Some(title));
        self
    }

    pub fn with_type(mut self, type_label: &str) -> Self {
        self.topic_ref.type_label = Some(type_label.to_string());
        self
    }

    pub fn with_revision(mut self, revision: i32) -> Self {
        self.topic_ref.revision = Some(revision);
        self
    }

    pub fn id(&self) -> &str {
        &self.topic_ref.id
    }

    /// Replaces the id and re-derives the identity and database id from it.
    pub fn set_id(&mut self, id: &str) {
        self.topic_ref.set_id(id);
    }

    pub fn identity(&self) -> &TopicIdentity {
        &self.topic_ref.identity
    }

    pub fn db_id(&self) -> Option<i32> {
        self.topic_ref.db_id
    }

    pub fn set_db_id(&mut self, db_id: Option<i32>) {
        self.topic_ref.db_id = db_id;
    }

    pub fn type_label(&self) -> Option<&str> {
        self.topic_ref.type_label.as_deref()
    }

    pub fn set_type_label(&mut self, type_label: Option<&str>) {
        self.topic_ref.type_label = type_label.map(str::to_string);
    }

    pub fn revision(&self) -> Option<i32> {
        self.topic_ref.revision
    }

    pub fn set_revision(&mut self, revision: Option<i32>) {
        self.topic_ref.revision = revision;
    }

    pub fn topic_type(&self) -> TopicType {
        self.topic_type
    }

    pub fn set_topic_type(&mut self, topic_type: TopicType) {
        self.topic_type = topic_type;
    }

    pub fn is_new_topic(&self) -> bool {
        matches!(self.identity(), TopicIdentity::New { .. })
    }

    pub fn is_existing_topic(&self) -> bool {
        matches!(self.identity(), TopicIdentity::Existing { .. })
    }

    pub fn is_cloned_topic(&self) -> bool {
        matches!(self.identity(), TopicIdentity::Cloned { .. })
    }

    pub fn is_duplicate_topic(&self) -> bool {
        matches!(self.identity(), TopicIdentity::Duplicate { .. })
    }

    pub fn is_cloned_duplicate_topic(&self) -> bool {
        matches!(self.identity(), TopicIdentity::ClonedDuplicate { .. })
    }

    /// The existing topic a clone was made from.
    pub fn cloned_source_id(&self) -> Option<i32> {
        match self.identity() {
            TopicIdentity::Cloned { source_id } => Some(*source_id),
            _ => None,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.attributes.title()
    }

    pub fn target_id(&self) -> Option<&str> {
        self.attributes.target_id()
    }

    pub fn attributes(&self) -> &SpecAttributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut SpecAttributes {
        &mut self.attributes
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn topic(&self) -> Option<&Arc<dyn TopicWrapper>> {
        self.topic.as_ref()
    }

    pub fn set_topic(&mut self, topic: Option<Arc<dyn TopicWrapper>>) {
        self.topic = topic;
    }

    pub fn xml_document(&self) -> Option<&str> {
        self.xml_document.as_deref()
    }

    pub fn set_xml_document(&mut self, xml: Option<String>) {
        self.xml_document = xml;
    }

    /// `[id, options]`, the form used when a topic fills a metadata slot.
    pub fn bracket_text(&self) -> String {
        let mut output = format!("[{}", self.topic_ref.bracket_body());
        let options = self.attributes.options_string();
        if !options.is_empty() {
            output.push_str(", ");
            output.push_str(&options);
        }
        output.push(']');
        output
    }

    /// `Title [id, options] [targetId]`, without relationships.
    pub fn text(&self) -> String {
        let mut output = String::new();
        if let Some(title) = self.title() {
            output.push_str(&escape_title(title));
            output.push(' ');
        }
        output.push_str(&self.bracket_text());
        if let Some(target_id) = self.target_id() {
            output.push_str(&format!(" [{target_id}]"));
        }
        output
    }
}

/// Front matter attached to a level heading as `[Info: id]`.
#[derive(Clone, Debug)]
pub struct InfoTopic {
    topic_ref: TopicRef,
    attributes: SpecAttributes,
    topic: Option<Arc<dyn TopicWrapper>>,
}

impl InfoTopic {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self {
            topic_ref: TopicRef::new(id.as_ref()),
            attributes: SpecAttributes::default(),
            topic: None,
        }
    }

    pub fn with_type(mut self, type_label: &str) -> Self {
        self.topic_ref.type_label = Some(type_label.to_string());
        self
    }

    pub fn with_revision(mut self, revision: i32) -> Self {
        self.topic_ref.revision = Some(revision);
        self
    }

    pub fn id(&self) -> &str {
        &self.topic_ref.id
    }

    pub fn set_id(&mut self, id: &str) {
        self.topic_ref.set_id(id);
    }

    pub fn identity(&self) -> &TopicIdentity {
        &self.topic_ref.identity
    }

    pub fn db_id(&self) -> Option<i32> {
        self.topic_ref.db_id
    }

    pub fn revision(&self) -> Option<i32> {
        self.topic_ref.revision
    }

    pub fn topic_type(&self) -> TopicType {
        TopicType::Info
    }

    pub fn attributes(&self) -> &SpecAttributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut SpecAttributes {
        &mut self.attributes
    }

    pub fn topic(&self) -> Option<&Arc<dyn TopicWrapper>> {
        self.topic.as_ref()
    }

    pub fn set_topic(&mut self, topic: Option<Arc<dyn TopicWrapper>>) {
        self.topic = topic;
    }

    pub fn text(&self) -> String {
        let mut output = format!("[Info: {}", self.topic_ref.bracket_body());
        let options = self.attributes.options_string();
        if !options.is_empty() {
            output.push_str(", ");
            output.push_str(&options);
        }
        output.push(']');
        output
    }
}

/// A fixed block of shared content, such as `Conventions.xml`.
#[derive(Clone, Debug)]
pub struct CommonContent {
    attributes: SpecAttributes,
}

impl CommonContent {
    pub fn new(title: &str) -> Self {
        let mut attributes = SpecAttributes::default();
        attributes.set_title(Some(title));
        Self { attributes }
    }

    pub fn title(&self) -> &str {
        self.attributes.title().unwrap_or_default()
    }

    /// The title used for link ids: escaped, without any `.xml` suffix.
    pub fn fixed_title(&self) -> String {
        let title = self.title();
        docbook_escape_title(title.strip_suffix(".xml").unwrap_or(title))
    }

    pub fn attributes(&self) -> &SpecAttributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut SpecAttributes {
        &mut self.attributes
    }

    pub fn text(&self) -> String {
        let mut output = format!("{} [Common Content", escape_title(self.title()));
        let options = self.attributes.options_string();
        if !options.is_empty() {
            output.push_str(", ");
            output.push_str(&options);
        }
        output.push(']');
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_id_resyncs_the_database_id() {
        let mut topic = SpecTopic::new("12");
        assert_eq!(topic.db_id(), Some(12));
        assert!(topic.is_existing_topic());

        topic.set_id("C12");
        assert_eq!(topic.db_id(), None);
        assert_eq!(topic.cloned_source_id(), Some(12));

        topic.set_db_id(Some(44));
        topic.set_id("N");
        assert_eq!(topic.db_id(), None);
        assert!(topic.is_new_topic());
    }

    #[test]
    fn duplicates_point_at_their_declaration() {
        assert_eq!(
            TopicIdentity::parse("X12"),
            TopicIdentity::Duplicate {
                declared_as: "N12".into()
            }
        );
        assert_eq!(
            TopicIdentity::parse("XC7"),
            TopicIdentity::ClonedDuplicate {
                declared_as: "C7".into()
            }
        );
        assert_eq!(TopicIdentity::parse("N"), TopicIdentity::New { local: None });
        assert_eq!(TopicIdentity::parse("Q1"), TopicIdentity::Unrecognized);
    }

    #[test]
    fn new_topics_render_their_type_label() {
        let topic = SpecTopic::new("N").with_title("Tea").with_type("Concept");
        assert_eq!(topic.text(), "Tea [N, Concept]");
    }

    #[test]
    fn existing_topics_render_revision_options_and_target() {
        let mut topic = SpecTopic::new("123").with_title("Brew [hot]").with_revision(4);
        topic.attributes_mut().add_tag("Tag1");
        topic.attributes_mut().set_target_id(Some("T-brew"));
        assert_eq!(
            topic.text(),
            r"Brew \[hot\] [123, rev: 4, Tag1] [T-brew]"
        );
    }

    #[test]
    fn info_and_common_content_render_their_markers() {
        assert_eq!(InfoTopic::new("55").text(), "[Info: 55]");
        assert_eq!(
            InfoTopic::new("N").with_type("Concept").text(),
            "[Info: N, Concept]"
        );

        let common = CommonContent::new("Conventions.xml");
        assert_eq!(common.text(), "Conventions.xml [Common Content]");
        assert_eq!(common.fixed_title(), "Conventions");
    }
}
