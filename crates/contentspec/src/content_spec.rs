use std::collections::BTreeMap;
use std::fmt;

use crate::attributes::SpecAttributes;
use crate::error::ContentSpecError;
use crate::key_value::{
    BookType, BugLinkType, FileEntry, KeyValueNode, MetadataKey, MetadataValue, ValueKind,
    strip_brackets,
};
use crate::level::{Level, LevelType};
use crate::node::{Comment, NodeEntry, NodeId, NodeKind, ParentRef, TextNode};
use crate::relationship::Relationship;
use crate::topic::{CommonContent, SpecTopic, TopicType};

/// The root of a content specification.
///
/// Owns every node in an arena. The base level is created with the spec and is
/// never replaced; metadata, comments and blank lines live in a flat top-level
/// list, with a typed index over the well-known metadata lines.
#[derive(Clone, Debug)]
pub struct ContentSpec {
    arena: Vec<NodeEntry>,
    top_level: Vec<NodeId>,
    base_level: NodeId,
    metadata: BTreeMap<MetadataKey, NodeId>,
}

impl Default for ContentSpec {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! text_metadata {
    ($($getter:ident, $setter:ident => $key:ident;)*) => {
        impl ContentSpec {
            $(
                pub fn $getter(&self) -> Option<&str> {
                    self.metadata_text(&MetadataKey::$key)
                }

                pub fn $setter(&mut self, value: Option<&str>) {
                    self.set_metadata(
                        MetadataKey::$key,
                        value.map(|value| MetadataValue::Text(value.to_string())),
                    );
                }
            )*
        }
    };
}

macro_rules! flag_metadata {
    ($($getter:ident, $setter:ident => $key:ident;)*) => {
        impl ContentSpec {
            $(
                pub fn $getter(&self) -> Option<bool> {
                    match self.metadata_value(&MetadataKey::$key)? {
                        MetadataValue::Bool(flag) => Some(*flag),
                        _ => None,
                    }
                }

                pub fn $setter(&mut self, value: Option<bool>) {
                    self.set_metadata(MetadataKey::$key, value.map(MetadataValue::Bool));
                }
            )*
        }
    };
}

macro_rules! topic_metadata {
    ($($getter:ident, $setter:ident => $key:ident, $topic_type:ident;)*) => {
        impl ContentSpec {
            $(
                pub fn $getter(&self) -> Option<NodeId> {
                    self.metadata_topic(&MetadataKey::$key)
                }

                /// Fills the slot and returns the topic's node, or clears it.
                pub fn $setter(&mut self, topic: Option<SpecTopic>) -> Option<NodeId> {
                    self.set_metadata_topic(MetadataKey::$key, TopicType::$topic_type, topic)
                }
            )*
        }
    };
}

text_metadata! {
    title, set_title => Title;
    subtitle, set_subtitle => Subtitle;
    product, set_product => Product;
    version, set_version => Version;
    edition, set_edition => Edition;
    book_version, set_book_version => BookVersion;
    abstract_text, set_abstract_text => Abstract;
    copyright_holder, set_copyright_holder => CopyrightHolder;
    copyright_year, set_copyright_year => CopyrightYear;
    brand, set_brand => Brand;
    brand_logo, set_brand_logo => BrandLogo;
    format, set_format => Format;
    locale, set_locale => Locale;
    translation_locale, set_translation_locale => TranslationLocale;
    output_style, set_output_style => OutputStyle;
    bugzilla_product, set_bugzilla_product => BugzillaProduct;
    bugzilla_component, set_bugzilla_component => BugzillaComponent;
    bugzilla_version, set_bugzilla_version => BugzillaVersion;
    bugzilla_keywords, set_bugzilla_keywords => BugzillaKeywords;
    bugzilla_assignee, set_bugzilla_assignee => BugzillaAssignee;
    bugzilla_server, set_bugzilla_server => BugzillaServer;
    bugzilla_url, set_bugzilla_url => BugzillaUrl;
    jira_project, set_jira_project => JiraProject;
    jira_component, set_jira_component => JiraComponent;
    jira_version, set_jira_version => JiraVersion;
    jira_labels, set_jira_labels => JiraLabels;
    jira_server, set_jira_server => JiraServer;
    maven_group_id, set_maven_group_id => MavenGroupId;
    maven_artifact_id, set_maven_artifact_id => MavenArtifactId;
    maven_version, set_maven_version => MavenVersion;
    pom_version, set_pom_version => PomVersion;
    checksum, set_checksum => Checksum;
}

flag_metadata! {
    inline_injection, set_inline_injection => InlineInjection;
    index, set_index => Index;
    survey_links, set_survey_links => SurveyLinks;
    allow_empty_levels, set_allow_empty_levels => AllowEmptyLevels;
}

topic_metadata! {
    revision_history, set_revision_history => RevisionHistory, RevisionHistory;
    legal_notice, set_legal_notice => LegalNotice, LegalNotice;
    author_group, set_author_group => AuthorGroup, AuthorGroup;
    feedback, set_feedback => Feedback, Feedback;
    abstract_topic, set_abstract_topic => AbstractTopic, Abstract;
}

impl ContentSpec {
    pub fn new() -> Self {
        let mut spec = Self {
            arena: Vec::new(),
            top_level: Vec::new(),
            base_level: NodeId(0),
            metadata: BTreeMap::new(),
        };
        let base = spec.alloc(NodeKind::Level(Level::new(LevelType::Base, None)));
        spec.arena[base.index()].parent = Some(ParentRef::ContentSpec);
        spec.base_level = base;
        spec
    }

    pub(crate) fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.arena.len());
        self.arena.push(NodeEntry::new(kind));
        id
    }

    pub fn base_level(&self) -> NodeId {
        self.base_level
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeEntry> {
        self.arena.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeEntry> {
        self.arena.get_mut(id.index())
    }

    pub fn entry(&self, id: NodeId) -> Result<&NodeEntry, ContentSpecError> {
        self.node(id).ok_or(ContentSpecError::UnknownNode(id))
    }

    pub fn entry_mut(&mut self, id: NodeId) -> Result<&mut NodeEntry, ContentSpecError> {
        self.node_mut(id).ok_or(ContentSpecError::UnknownNode(id))
    }

    pub fn parent(&self, id: NodeId) -> Option<ParentRef> {
        self.node(id)?.parent()
    }

    pub fn level(&self, id: NodeId) -> Option<&Level> {
        self.node(id)?.as_level()
    }

    pub fn level_mut(&mut self, id: NodeId) -> Option<&mut Level> {
        match self.node_mut(id)?.kind_mut() {
            NodeKind::Level(level) => Some(level),
            _ => None,
        }
    }

    pub(crate) fn level_or_err(&self, id: NodeId) -> Result<&Level, ContentSpecError> {
        self.entry(id)?
            .as_level()
            .ok_or(ContentSpecError::NotALevel(id))
    }

    pub(crate) fn level_mut_or_err(&mut self, id: NodeId) -> Result<&mut Level, ContentSpecError> {
        match self.entry_mut(id)?.kind_mut() {
            NodeKind::Level(level) => Ok(level),
            _ => Err(ContentSpecError::NotALevel(id)),
        }
    }

    pub fn topic(&self, id: NodeId) -> Option<&SpecTopic> {
        self.node(id)?.as_topic()
    }

    pub fn topic_mut(&mut self, id: NodeId) -> Option<&mut SpecTopic> {
        match self.node_mut(id)?.kind_mut() {
            NodeKind::Topic(topic) => Some(topic),
            _ => None,
        }
    }

    pub fn attributes_mut(&mut self, id: NodeId) -> Option<&mut SpecAttributes> {
        self.node_mut(id)?.attributes_mut()
    }

    /// Ordered children of a level; empty for anything else.
    pub fn child_nodes(&self, level: NodeId) -> &[NodeId] {
        self.level(level).map(Level::child_nodes).unwrap_or_default()
    }

    /// Metadata, comment and text nodes in serialization order.
    pub fn top_level_nodes(&self) -> &[NodeId] {
        &self.top_level
    }

    pub fn new_topic(&mut self, topic: SpecTopic) -> NodeId {
        self.alloc(NodeKind::Topic(topic))
    }

    pub fn new_common_content(&mut self, title: &str) -> NodeId {
        self.alloc(NodeKind::CommonContent(CommonContent::new(title)))
    }

    pub fn new_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Comment(Comment::new(text)))
    }

    pub fn new_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(TextNode::new(text)))
    }

    /// Appends a comment, text or metadata node to the top-level list.
    pub fn append_node(&mut self, node: NodeId) -> Result<(), ContentSpecError> {
        let metadata_key = match self.entry(node)?.kind() {
            NodeKind::Comment(_) | NodeKind::Text(_) => None,
            NodeKind::KeyValue(key_value) => key_value.metadata_key().cloned(),
            other => {
                return Err(ContentSpecError::Structure(format!(
                    "a {} node cannot be a top-level node",
                    other.name()
                )));
            }
        };
        self.remove_parent(node)?;
        if let Some(key) = metadata_key {
            if let Some(previous) = self.metadata.get(&key).copied() {
                self.detach_top_level(previous);
                self.entry_mut(previous)?.parent = None;
            }
            self.metadata.insert(key, node);
        }
        self.top_level.push(node);
        self.entry_mut(node)?.parent = Some(ParentRef::ContentSpec);
        Ok(())
    }

    pub(crate) fn detach_top_level(&mut self, node: NodeId) {
        self.top_level.retain(|top| *top != node);
        self.metadata.retain(|_, indexed| *indexed != node);
        let held_topic = self.node(node).and_then(|entry| match entry.kind() {
            NodeKind::KeyValue(key_value) => key_value.topic(),
            _ => None,
        });
        if let Some(topic) = held_topic {
            if let Some(entry) = self.node_mut(topic) {
                if entry.parent == Some(ParentRef::Node(node)) {
                    entry.parent = None;
                }
            }
        }
    }

    pub fn metadata_node(&self, key: &MetadataKey) -> Option<NodeId> {
        self.metadata.get(key).copied()
    }

    pub fn metadata_value(&self, key: &MetadataKey) -> Option<&MetadataValue> {
        match self.node(self.metadata_node(key)?)?.kind() {
            NodeKind::KeyValue(key_value) => Some(key_value.value()),
            _ => None,
        }
    }

    fn metadata_text(&self, key: &MetadataKey) -> Option<&str> {
        self.metadata_value(key)?.as_text()
    }

    fn metadata_topic(&self, key: &MetadataKey) -> Option<NodeId> {
        match self.metadata_value(key)? {
            MetadataValue::Topic(topic) => Some(*topic),
            _ => None,
        }
    }

    /// Applies the metadata mutation rule for `key`.
    ///
    /// No value and no line is a no-op; no value removes the existing line; a
    /// value with no line appends one; a value with a line replaces its value in
    /// place, keeping its position. Returns the line's node when one remains.
    pub fn set_metadata(&mut self, key: MetadataKey, value: Option<MetadataValue>) -> Option<NodeId> {
        let existing = self.metadata_node(&key);
        match (value, existing) {
            (None, None) => None,
            (None, Some(node)) => {
                self.detach_top_level(node);
                if let Some(entry) = self.node_mut(node) {
                    entry.parent = None;
                }
                None
            }
            (Some(value), None) => {
                let node = self.alloc(NodeKind::KeyValue(KeyValueNode::new(key.clone(), value)));
                self.arena[node.index()].parent = Some(ParentRef::ContentSpec);
                self.top_level.push(node);
                self.metadata.insert(key, node);
                Some(node)
            }
            (Some(value), Some(node)) => {
                self.detach_held_topic(node);
                if let Some(NodeKind::KeyValue(key_value)) = self.node_mut(node).map(|e| e.kind_mut()) {
                    key_value.value = value;
                }
                Some(node)
            }
        }
    }

    fn detach_held_topic(&mut self, key_value: NodeId) {
        let held = match self.node(key_value).map(|entry| entry.kind()) {
            Some(NodeKind::KeyValue(node)) => node.topic(),
            _ => None,
        };
        if let Some(topic) = held {
            if let Some(entry) = self.node_mut(topic) {
                entry.parent = None;
            }
        }
    }

    fn set_metadata_topic(
        &mut self,
        key: MetadataKey,
        topic_type: TopicType,
        topic: Option<SpecTopic>,
    ) -> Option<NodeId> {
        let Some(mut topic) = topic else {
            self.set_metadata(key, None);
            return None;
        };
        topic.set_topic_type(topic_type);
        let topic = self.new_topic(topic);
        let line = self.set_metadata(key, Some(MetadataValue::Topic(topic)))?;
        self.arena[topic.index()].parent = Some(ParentRef::Node(line));
        Some(topic)
    }

    pub fn book_type(&self) -> Option<BookType> {
        match self.metadata_value(&MetadataKey::BookType)? {
            MetadataValue::BookType(book_type) => Some(*book_type),
            _ => None,
        }
    }

    pub fn set_book_type(&mut self, book_type: Option<BookType>) {
        self.set_metadata(MetadataKey::BookType, book_type.map(MetadataValue::BookType));
    }

    pub fn bug_links(&self) -> Option<BugLinkType> {
        match self.metadata_value(&MetadataKey::BugLinks)? {
            MetadataValue::BugLinks(bug_links) => Some(*bug_links),
            _ => None,
        }
    }

    pub fn set_bug_links(&mut self, bug_links: Option<BugLinkType>) {
        self.set_metadata(MetadataKey::BugLinks, bug_links.map(MetadataValue::BugLinks));
    }

    pub fn pubsnumber(&self) -> Option<i32> {
        self.metadata_integer(&MetadataKey::Pubsnumber)
    }

    pub fn set_pubsnumber(&mut self, pubsnumber: Option<i32>) {
        self.set_metadata(MetadataKey::Pubsnumber, pubsnumber.map(MetadataValue::Integer));
    }

    /// The content spec's server-side id, rendered as the `ID = ` line.
    pub fn id(&self) -> Option<i32> {
        self.metadata_integer(&MetadataKey::Id)
    }

    pub fn set_id(&mut self, id: Option<i32>) {
        self.set_metadata(MetadataKey::Id, id.map(MetadataValue::Integer));
    }

    fn metadata_integer(&self, key: &MetadataKey) -> Option<i32> {
        match self.metadata_value(key)? {
            MetadataValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn files(&self) -> Option<&[FileEntry]> {
        match self.metadata_value(&MetadataKey::Files)? {
            MetadataValue::Files(files) => Some(files),
            _ => None,
        }
    }

    pub fn set_files(&mut self, files: Option<Vec<FileEntry>>) {
        self.set_metadata(MetadataKey::Files, files.map(MetadataValue::Files));
    }

    pub fn publican_cfg(&self) -> Option<&str> {
        self.metadata_text(&MetadataKey::PublicanCfg)
    }

    pub fn set_publican_cfg(&mut self, cfg: Option<&str>) {
        self.set_block(MetadataKey::PublicanCfg, cfg);
    }

    pub fn default_publican_cfg(&self) -> Option<&str> {
        self.metadata_text(&MetadataKey::DefaultPublicanCfg)
    }

    pub fn set_default_publican_cfg(&mut self, cfg: Option<&str>) {
        self.set_block(MetadataKey::DefaultPublicanCfg, cfg);
    }

    /// A named `<name>-publican.cfg` override. Names match case-insensitively.
    pub fn additional_publican_cfg(&self, name: &str) -> Option<&str> {
        self.metadata_text(&MetadataKey::CustomPublicanCfg(name.to_lowercase()))
    }

    pub fn set_additional_publican_cfg(&mut self, name: &str, cfg: Option<&str>) {
        self.set_block(MetadataKey::CustomPublicanCfg(name.to_lowercase()), cfg);
    }

    pub fn additional_publican_cfg_names(&self) -> Vec<&str> {
        self.metadata
            .keys()
            .filter_map(|key| match key {
                MetadataKey::CustomPublicanCfg(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn entities(&self) -> Option<&str> {
        self.metadata_text(&MetadataKey::Entities)
    }

    pub fn set_entities(&mut self, entities: Option<&str>) {
        self.set_block(MetadataKey::Entities, entities);
    }

    fn set_block(&mut self, key: MetadataKey, value: Option<&str>) {
        self.set_metadata(key, value.map(|value| MetadataValue::Block(value.to_string())));
    }

    /// Ingests one parsed `key = value` line.
    ///
    /// Recognized keys (matched case-insensitively) are coerced to their typed
    /// value and routed through the metadata setters; anything else is kept as
    /// an opaque line at the end of the top-level list.
    pub fn append_key_value_node(
        &mut self,
        key: &str,
        value: &str,
        line_number: i32,
    ) -> Result<NodeId, ContentSpecError> {
        let node = match MetadataKey::parse(key) {
            Some(metadata_key) if metadata_key.value_kind() == ValueKind::Topic => {
                let topic = parse_metadata_topic(&metadata_key, value)?;
                let topic_type = match metadata_key {
                    MetadataKey::RevisionHistory => TopicType::RevisionHistory,
                    MetadataKey::LegalNotice => TopicType::LegalNotice,
                    MetadataKey::AuthorGroup => TopicType::AuthorGroup,
                    MetadataKey::Feedback => TopicType::Feedback,
                    _ => TopicType::Abstract,
                };
                let topic = self
                    .set_metadata_topic(metadata_key.clone(), topic_type, Some(topic))
                    .ok_or_else(|| ContentSpecError::Structure(format!("{metadata_key} was not stored")))?;
                self.entry_mut(topic)?.set_line_number(line_number);
                self.metadata_node(&metadata_key)
                    .ok_or(ContentSpecError::UnknownNode(topic))?
            }
            Some(metadata_key) => {
                let typed = MetadataValue::coerce(&metadata_key, value)?;
                self.set_metadata(metadata_key.clone(), Some(typed))
                    .ok_or_else(|| ContentSpecError::Structure(format!("{metadata_key} was not stored")))?
            }
            None => {
                let node = self.alloc(NodeKind::KeyValue(KeyValueNode::opaque(key, value)));
                self.append_node(node)?;
                node
            }
        };
        self.entry_mut(node)?.set_line_number(line_number);
        Ok(node)
    }

    /// Topics held by metadata lines, in top-level order.
    pub fn metadata_topics(&self) -> Vec<NodeId> {
        self.top_level
            .iter()
            .filter_map(|node| match self.node(*node)?.kind() {
                NodeKind::KeyValue(key_value) => key_value.topic(),
                _ => None,
            })
            .collect()
    }

    /// Every spec topic: metadata topics first, then the level tree in
    /// document order with each level's front matter ahead of its children.
    pub fn spec_topics(&self) -> Vec<NodeId> {
        let mut topics = self.metadata_topics();
        self.walk_levels(self.base_level, &mut |spec, node| {
            if spec.topic(node).is_some() {
                topics.push(node);
            }
        });
        topics
    }

    /// Spec topics plus info topics and common content.
    pub fn all_topic_nodes(&self) -> Vec<NodeId> {
        let mut nodes = self.metadata_topics();
        self.walk_levels(self.base_level, &mut |spec, node| {
            if matches!(
                spec.node(node).map(|entry| entry.kind()),
                Some(NodeKind::Topic(_) | NodeKind::InfoTopic(_) | NodeKind::CommonContent(_))
            ) {
                nodes.push(node);
            }
        });
        nodes
    }

    /// Every relationship held by a level or topic in the document.
    pub fn all_relationships(&self) -> Vec<&Relationship> {
        let mut holders = self.metadata_topics();
        self.walk_levels(self.base_level, &mut |_, node| holders.push(node));
        holders
            .into_iter()
            .flat_map(|node| self.relationships(node).iter())
            .collect()
    }

    /// Visits `level` and everything beneath it: the level, its info topic, its
    /// front matter and then each child in order.
    pub(crate) fn walk_levels(&self, level: NodeId, visit: &mut dyn FnMut(&Self, NodeId)) {
        let Some(data) = self.level(level) else {
            return;
        };
        visit(self, level);
        if let Some(info) = data.info_topic() {
            visit(self, info);
        }
        for node in data.front_matter() {
            visit(self, *node);
        }
        for node in data.child_nodes() {
            if self.level(*node).is_some() {
                self.walk_levels(*node, visit);
            } else {
                visit(self, *node);
            }
        }
    }
}

fn parse_metadata_topic(key: &MetadataKey, value: &str) -> Result<SpecTopic, ContentSpecError> {
    let mut parts = strip_brackets(value).split(',').map(str::trim);
    let id = parts.next().filter(|id| !id.is_empty()).ok_or_else(|| {
        ContentSpecError::InvalidValue {
            key: key.canonical(),
            message: "missing topic id".into(),
        }
    })?;
    let mut topic = SpecTopic::new(id);
    for part in parts {
        if let Some(revision) = part.strip_prefix("rev:") {
            let revision = revision
                .trim()
                .parse()
                .map_err(|source| ContentSpecError::InvalidNumber {
                    key: key.canonical(),
                    source,
                })?;
            topic.set_revision(Some(revision));
        } else if topic.is_new_topic() && topic.type_label().is_none() {
            topic.set_type_label(Some(part));
        } else {
            topic.attributes_mut().add_tag(part);
        }
    }
    Ok(topic)
}

impl fmt::Display for ContentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_follow_the_mutation_rule() {
        let mut spec = ContentSpec::new();
        spec.set_title(Some("Tea"));
        spec.set_product(Some("Foo"));
        spec.set_product(Some("Foo"));
        spec.set_version(Some("1"));

        let product = spec.metadata_node(&MetadataKey::Product).unwrap();
        assert_eq!(spec.top_level_nodes().len(), 3);
        assert_eq!(spec.top_level_nodes()[1], product);
        assert_eq!(spec.product(), Some("Foo"));

        spec.set_product(Some("Bar"));
        assert_eq!(spec.top_level_nodes()[1], product);
        assert_eq!(spec.product(), Some("Bar"));

        spec.set_product(None);
        assert_eq!(spec.product(), None);
        assert_eq!(spec.top_level_nodes().len(), 2);
        assert_eq!(spec.parent(product), None);

        spec.set_product(None);
        assert_eq!(spec.top_level_nodes().len(), 2);
    }

    #[test]
    fn key_value_lines_dispatch_to_typed_fields() {
        let mut spec = ContentSpec::new();
        spec.append_key_value_node("title", "Tea", 1).unwrap();
        spec.append_key_value_node("Inline Injection", "OFF", 2).unwrap();
        spec.append_key_value_node("Bug Links", "ON", 3).unwrap();
        spec.append_key_value_node("Type", "Article", 4).unwrap();
        spec.append_key_value_node("mobile-publican.cfg", "[xml_lang: en]", 5).unwrap();
        let opaque = spec.append_key_value_node("Colour", "green", 6).unwrap();

        assert_eq!(spec.title(), Some("Tea"));
        assert_eq!(spec.inline_injection(), Some(false));
        assert_eq!(spec.bug_links(), Some(BugLinkType::Bugzilla));
        assert_eq!(spec.book_type(), Some(BookType::Article));
        assert_eq!(spec.additional_publican_cfg("mobile"), Some("xml_lang: en"));
        assert_eq!(spec.additional_publican_cfg_names(), vec!["mobile"]);
        assert_eq!(spec.node(opaque).unwrap().line_number(), 6);
        assert_eq!(spec.top_level_nodes().len(), 6);
    }

    #[test]
    fn custom_publican_cfg_names_fold_case() {
        let mut spec = ContentSpec::new();
        let first = spec.append_key_value_node("Mobile-publican.cfg", "[a]", 1).unwrap();
        let second = spec.append_key_value_node("mobile-publican.cfg", "[b]", 2).unwrap();

        assert_eq!(first, second);
        assert_eq!(spec.top_level_nodes().len(), 1);
        assert_eq!(spec.additional_publican_cfg("MOBILE"), Some("b"));
        assert_eq!(spec.additional_publican_cfg_names(), vec!["mobile"]);
    }

    #[test]
    fn allocated_ids_index_the_arena() {
        let mut spec = ContentSpec::new();
        let ids: Vec<NodeId> = (0..3).map(|n| spec.new_comment(format!("c{n}"))).collect();
        assert_eq!(spec.base_level().index(), 0);
        assert_eq!(ids.iter().map(|id| id.index()).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(spec.node(ids[2]).is_some());
    }

    #[test]
    fn bad_numbers_propagate_to_the_caller() {
        let mut spec = ContentSpec::new();
        let err = spec.append_key_value_node("Pubsnumber", "x1", 1).unwrap_err();
        assert!(matches!(err, ContentSpecError::InvalidNumber { .. }));
        assert!(spec.top_level_nodes().is_empty());
    }

    #[test]
    fn metadata_topics_live_under_their_line() {
        let mut spec = ContentSpec::new();
        spec.set_title(Some("Tea"));
        spec.append_key_value_node("Revision History", "[123, rev: 4]", 2).unwrap();

        let topic = spec.revision_history().unwrap();
        let line = spec.metadata_node(&MetadataKey::RevisionHistory).unwrap();
        assert_eq!(spec.parent(topic), Some(ParentRef::Node(line)));
        assert_eq!(spec.topic(topic).unwrap().revision(), Some(4));
        assert_eq!(
            spec.topic(topic).unwrap().topic_type(),
            TopicType::RevisionHistory
        );
        assert_eq!(spec.step(topic), Some(2));
        assert_eq!(spec.spec_topics(), vec![topic]);

        let replacement = spec.set_revision_history(Some(SpecTopic::new("124"))).unwrap();
        assert_eq!(spec.parent(topic), None);
        assert_eq!(spec.top_level_nodes()[1], line);
        assert_eq!(spec.revision_history(), Some(replacement));

        spec.remove_parent(replacement).unwrap();
        assert_eq!(spec.revision_history(), None);
        assert_eq!(spec.top_level_nodes().len(), 1);
    }

    #[test]
    fn spec_topics_follow_document_order() {
        let mut spec = ContentSpec::new();
        let base = spec.base_level();
        let chapter = spec.new_chapter("One");
        spec.append_child(base, chapter).unwrap();
        let intro = spec.new_topic(SpecTopic::new("N1"));
        spec.append_initial_content(chapter, intro).unwrap();
        let body = spec.new_topic(SpecTopic::new("N2"));
        spec.append_child(chapter, body).unwrap();
        let common = spec.new_common_content("Conventions.xml");
        spec.append_child(chapter, common).unwrap();

        assert_eq!(spec.spec_topics(), vec![intro, body]);
        assert_eq!(spec.all_topic_nodes(), vec![intro, body, common]);
    }
}
