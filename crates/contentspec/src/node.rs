use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::attributes::SpecAttributes;
use crate::key_value::KeyValueNode;
use crate::level::Level;
use crate::relationship::Relationship;
use crate::topic::{CommonContent, InfoTopic, SpecTopic};

/// Arena handle for a node owned by a [`crate::ContentSpec`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The single owner of an attached node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParentRef {
    /// Held directly by the content spec: the base level and top-level nodes.
    ContentSpec,
    Node(NodeId),
}

/// A passthrough comment line. Text always starts with `#`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    text: String,
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let text = if text.trim_start().starts_with('#') {
            text
        } else {
            format!("# {text}")
        };
        Self { text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Verbatim text, typically a blank separator line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextNode {
    text: String,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn blank() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    Level(Level),
    Topic(SpecTopic),
    InfoTopic(InfoTopic),
    CommonContent(CommonContent),
    Comment(Comment),
    Text(TextNode),
    KeyValue(KeyValueNode),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Level(_) => "level",
            NodeKind::Topic(_) => "topic",
            NodeKind::InfoTopic(_) => "info-topic",
            NodeKind::CommonContent(_) => "common-content",
            NodeKind::Comment(_) => "comment",
            NodeKind::Text(_) => "text",
            NodeKind::KeyValue(_) => "key-value",
        }
    }
}

/// One arena slot: identity shared by every node kind plus the kind payload.
#[derive(Clone, Debug)]
pub struct NodeEntry {
    line_number: i32,
    source_text: Option<String>,
    unique_id: Option<String>,
    translation_unique_id: Option<String>,
    pub(crate) parent: Option<ParentRef>,
    pub(crate) kind: NodeKind,
}

impl NodeEntry {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            line_number: -1,
            source_text: None,
            unique_id: None,
            translation_unique_id: None,
            parent: None,
            kind,
        }
    }

    /// Source line number, or -1 for nodes built in memory.
    pub fn line_number(&self) -> i32 {
        self.line_number
    }

    pub fn set_line_number(&mut self, line_number: i32) {
        self.line_number = line_number;
    }

    /// The raw line this node was parsed from, when a front end recorded one.
    pub fn source_text(&self) -> Option<&str> {
        self.source_text.as_deref()
    }

    pub fn set_source_text(&mut self, text: Option<String>) {
        self.source_text = text;
    }

    pub fn unique_id(&self) -> Option<&str> {
        self.unique_id.as_deref()
    }

    // Process levels index topics by unique id, so this stays crate-private.
    pub(crate) fn set_unique_id(&mut self, unique_id: Option<&str>) {
        self.unique_id = unique_id.map(sanitize_unique_id);
    }

    pub fn translation_unique_id(&self) -> Option<&str> {
        self.translation_unique_id.as_deref()
    }

    pub fn set_translation_unique_id(&mut self, unique_id: Option<&str>) {
        self.translation_unique_id = unique_id.map(sanitize_unique_id);
    }

    pub fn parent(&self) -> Option<ParentRef> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn as_level(&self) -> Option<&Level> {
        match &self.kind {
            NodeKind::Level(level) => Some(level),
            _ => None,
        }
    }

    pub fn as_topic(&self) -> Option<&SpecTopic> {
        match &self.kind {
            NodeKind::Topic(topic) => Some(topic),
            _ => None,
        }
    }

    /// Option-carrying view for levels and every topic-like node.
    pub fn attributes(&self) -> Option<&SpecAttributes> {
        match &self.kind {
            NodeKind::Level(level) => Some(level.attributes()),
            NodeKind::Topic(topic) => Some(topic.attributes()),
            NodeKind::InfoTopic(info) => Some(info.attributes()),
            NodeKind::CommonContent(common) => Some(common.attributes()),
            _ => None,
        }
    }

    pub fn attributes_mut(&mut self) -> Option<&mut SpecAttributes> {
        match &mut self.kind {
            NodeKind::Level(level) => Some(level.attributes_mut()),
            NodeKind::Topic(topic) => Some(topic.attributes_mut()),
            NodeKind::InfoTopic(info) => Some(info.attributes_mut()),
            NodeKind::CommonContent(common) => Some(common.attributes_mut()),
            _ => None,
        }
    }

    pub(crate) fn relationships(&self) -> Option<&[Relationship]> {
        match &self.kind {
            NodeKind::Level(level) => Some(&level.relationships),
            NodeKind::Topic(topic) => Some(&topic.relationships),
            _ => None,
        }
    }

    pub(crate) fn relationships_mut(&mut self) -> Option<&mut Vec<Relationship>> {
        match &mut self.kind {
            NodeKind::Level(level) => Some(&mut level.relationships),
            NodeKind::Topic(topic) => Some(&mut topic.relationships),
            _ => None,
        }
    }
}

/// Strips every character that is not a word character or a hyphen.
pub fn sanitize_unique_id(raw: &str) -> String {
    static NON_ID: OnceLock<Regex> = OnceLock::new();
    let re = NON_ID.get_or_init(|| Regex::new(r"[^\w\-]").expect("Invalid regex"));
    re.replace_all(raw, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_ids_are_sanitized_on_set() {
        let mut entry = NodeEntry::new(NodeKind::Text(TextNode::blank()));
        entry.set_unique_id(Some("L12-N 3!"));
        assert_eq!(entry.unique_id(), Some("L12-N3"));

        entry.set_translation_unique_id(Some("a.b/c_d"));
        assert_eq!(entry.translation_unique_id(), Some("abc_d"));
    }

    #[test]
    fn comments_gain_a_hash_prefix() {
        assert_eq!(Comment::new("note").text(), "# note");
        assert_eq!(Comment::new("#already").text(), "#already");
    }
}
