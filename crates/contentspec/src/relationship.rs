use std::fmt;

use serde::{Deserialize, Serialize};

use crate::content_spec::ContentSpec;
use crate::error::ContentSpecError;
use crate::escape::escape_relationship_title;
use crate::node::{NodeId, NodeKind};
use crate::render::SPACER;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipType {
    Previous,
    Next,
    Prerequisite,
    ReferTo,
    LinkList,
}

impl RelationshipType {
    /// Rendering order of relationship groups.
    pub const ALL: [RelationshipType; 5] = [
        RelationshipType::ReferTo,
        RelationshipType::Prerequisite,
        RelationshipType::LinkList,
        RelationshipType::Previous,
        RelationshipType::Next,
    ];

    /// The keyword opening a relationship block, e.g. `R` in `[R: 12]`.
    pub fn keyword(self) -> &'static str {
        match self {
            RelationshipType::ReferTo => "R",
            RelationshipType::Prerequisite => "P",
            RelationshipType::LinkList => "L",
            RelationshipType::Previous => "Prev",
            RelationshipType::Next => "Next",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelationshipType::Previous => "previous",
            RelationshipType::Next => "next",
            RelationshipType::Prerequisite => "prerequisite",
            RelationshipType::ReferTo => "refer-to",
            RelationshipType::LinkList => "link-list",
        };
        f.write_str(name)
    }
}

/// Which list a relationship belongs to, partitioned by target kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// Topic to topic, targeted by topic id.
    Topic,
    /// Any node to a topic, targeted by target id.
    TopicTarget,
    /// Any node to a level, targeted by target id.
    LevelTarget,
    /// Previous/next edges synthesized by a process. Never rendered.
    Process,
}

/// A directed edge between two nodes of the same content spec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relationship {
    primary: NodeId,
    secondary: NodeId,
    relationship_type: RelationshipType,
    kind: RelationshipKind,
    title: Option<String>,
}

impl Relationship {
    pub fn primary(&self) -> NodeId {
        self.primary
    }

    pub fn secondary(&self) -> NodeId {
        self.secondary
    }

    pub fn relationship_type(&self) -> RelationshipType {
        self.relationship_type
    }

    pub fn kind(&self) -> RelationshipKind {
        self.kind
    }

    /// Display title overriding the target's own title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn has_title(&self) -> bool {
        self.title.as_deref().is_some_and(|title| !title.trim().is_empty())
    }

    pub fn is_topic_relationship(&self) -> bool {
        self.kind == RelationshipKind::Topic
    }

    pub fn is_process_relationship(&self) -> bool {
        self.kind == RelationshipKind::Process
    }
}

impl ContentSpec {
    /// Adds a topic-to-topic relationship, targeting the secondary topic by id.
    pub fn add_relationship_to_topic(
        &mut self,
        from: NodeId,
        topic: NodeId,
        relationship_type: RelationshipType,
        title: Option<&str>,
    ) -> Result<(), ContentSpecError> {
        if self.topic(topic).is_none() {
            return Err(ContentSpecError::NotATopic(topic));
        }
        self.push_relationship(from, topic, relationship_type, RelationshipKind::Topic, title)
    }

    /// Adds a relationship targeting a topic or level by its target id.
    pub fn add_relationship_to_target(
        &mut self,
        from: NodeId,
        target: NodeId,
        relationship_type: RelationshipType,
        title: Option<&str>,
    ) -> Result<(), ContentSpecError> {
        let kind = match self.entry(target)?.kind() {
            NodeKind::Topic(_) => RelationshipKind::TopicTarget,
            NodeKind::Level(_) => RelationshipKind::LevelTarget,
            _ => return Err(ContentSpecError::NotRelationshipCapable(target)),
        };
        self.push_relationship(from, target, relationship_type, kind, title)
    }

    pub(crate) fn add_process_relationship(
        &mut self,
        from: NodeId,
        to: NodeId,
        relationship_type: RelationshipType,
    ) -> Result<(), ContentSpecError> {
        self.push_relationship(from, to, relationship_type, RelationshipKind::Process, None)
    }

    fn push_relationship(
        &mut self,
        from: NodeId,
        to: NodeId,
        relationship_type: RelationshipType,
        kind: RelationshipKind,
        title: Option<&str>,
    ) -> Result<(), ContentSpecError> {
        let entry = self.entry_mut(from)?;
        if matches!(entry.kind(), NodeKind::Level(_))
            && matches!(
                relationship_type,
                RelationshipType::Previous | RelationshipType::Next
            )
        {
            return Err(ContentSpecError::UnsupportedRelationship(format!(
                "{relationship_type} relationships cannot start at a level"
            )));
        }
        let relationships = entry
            .relationships_mut()
            .ok_or(ContentSpecError::NotRelationshipCapable(from))?;
        relationships.push(Relationship {
            primary: from,
            secondary: to,
            relationship_type,
            kind,
            title: title.map(str::to_string),
        });
        Ok(())
    }

    /// Every relationship of `node` in insertion order.
    pub fn relationships(&self, node: NodeId) -> &[Relationship] {
        self.node(node)
            .and_then(|entry| entry.relationships())
            .unwrap_or_default()
    }

    pub fn topic_relationships(&self, node: NodeId) -> Vec<&Relationship> {
        self.relationships_where(node, |r| r.kind == RelationshipKind::Topic)
    }

    /// Relationships targeting topics by target id, including process edges.
    pub fn topic_target_relationships(&self, node: NodeId) -> Vec<&Relationship> {
        self.relationships_where(node, |r| {
            matches!(
                r.kind,
                RelationshipKind::TopicTarget | RelationshipKind::Process
            )
        })
    }

    pub fn level_relationships(&self, node: NodeId) -> Vec<&Relationship> {
        self.relationships_where(node, |r| r.kind == RelationshipKind::LevelTarget)
    }

    pub fn previous_relationships(&self, node: NodeId) -> Vec<&Relationship> {
        self.relationships_of_type(node, RelationshipType::Previous)
    }

    pub fn next_relationships(&self, node: NodeId) -> Vec<&Relationship> {
        self.relationships_of_type(node, RelationshipType::Next)
    }

    pub fn prerequisite_relationships(&self, node: NodeId) -> Vec<&Relationship> {
        self.relationships_of_type(node, RelationshipType::Prerequisite)
    }

    pub fn related_relationships(&self, node: NodeId) -> Vec<&Relationship> {
        self.relationships_of_type(node, RelationshipType::ReferTo)
    }

    pub fn link_list_relationships(&self, node: NodeId) -> Vec<&Relationship> {
        self.relationships_of_type(node, RelationshipType::LinkList)
    }

    fn relationships_of_type(
        &self,
        node: NodeId,
        relationship_type: RelationshipType,
    ) -> Vec<&Relationship> {
        self.relationships_where(node, |r| r.relationship_type == relationship_type)
    }

    fn relationships_where(
        &self,
        node: NodeId,
        predicate: impl Fn(&Relationship) -> bool,
    ) -> Vec<&Relationship> {
        self.relationships(node)
            .iter()
            .filter(|r| predicate(r))
            .collect()
    }

    /// How a relationship names its target: topic id for topic edges, otherwise
    /// the target id.
    pub fn relationship_target(&self, relationship: &Relationship) -> String {
        let Some(entry) = self.node(relationship.secondary) else {
            return String::new();
        };
        let topic_id = entry.as_topic().map(|topic| topic.id().to_string());
        if relationship.kind == RelationshipKind::Topic {
            return topic_id.unwrap_or_default();
        }
        entry
            .attributes()
            .and_then(|attributes| attributes.target_id())
            .map(str::to_string)
            .or(topic_id)
            .unwrap_or_default()
    }

    /// Renders the relationship blocks that follow a node's own text.
    ///
    /// Each relationship type is rendered independently. A group uses the long,
    /// one-target-per-line form when any of its members carries a title, and the
    /// short inline form otherwise. `indent` is the node's own indentation depth.
    pub fn relationship_text(&self, node: NodeId, indent: usize) -> String {
        let relationships: Vec<&Relationship> = self
            .relationships(node)
            .iter()
            .filter(|r| !r.is_process_relationship())
            .collect();

        let mut output = String::new();
        for relationship_type in RelationshipType::ALL {
            let group: Vec<&Relationship> = relationships
                .iter()
                .copied()
                .filter(|r| r.relationship_type == relationship_type)
                .collect();
            if group.is_empty() {
                continue;
            }

            if group.iter().any(|r| r.has_title()) {
                let entry_indent = SPACER.repeat(indent + 1);
                let entries: Vec<String> = group
                    .iter()
                    .map(|r| {
                        let target = self.relationship_target(r);
                        match r.title().filter(|_| r.has_title()) {
                            Some(title) => format!(
                                "{entry_indent}{} [{target}]",
                                escape_relationship_title(title)
                            ),
                            None => format!("{entry_indent}[{target}]"),
                        }
                    })
                    .collect();
                output.push_str(&format!(
                    " [{}:\n{}\n{}]",
                    relationship_type.keyword(),
                    entries.join(",\n"),
                    SPACER.repeat(indent)
                ));
            } else {
                let targets: Vec<String> = group
                    .iter()
                    .map(|r| self.relationship_target(r))
                    .collect();
                output.push_str(&format!(
                    " [{}: {}]",
                    relationship_type.keyword(),
                    targets.join(", ")
                ));
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic::SpecTopic;

    fn spec_with_topics() -> (ContentSpec, NodeId, NodeId, NodeId) {
        let mut spec = ContentSpec::new();
        let chapter = spec.new_chapter("Brewing");
        spec.append_child(spec.base_level(), chapter).unwrap();
        let first = spec.new_topic(SpecTopic::new("10").with_title("Boil"));
        let second = spec.new_topic(SpecTopic::new("11").with_title("Steep"));
        spec.append_child(chapter, first).unwrap();
        spec.append_child(chapter, second).unwrap();
        (spec, chapter, first, second)
    }

    #[test]
    fn both_views_record_each_relationship() {
        let (mut spec, chapter, first, second) = spec_with_topics();
        spec.attributes_mut(chapter)
            .unwrap()
            .set_target_id(Some("T-brewing"));

        spec.add_relationship_to_topic(first, second, RelationshipType::Prerequisite, None)
            .unwrap();
        spec.add_relationship_to_target(first, chapter, RelationshipType::ReferTo, None)
            .unwrap();
        spec.add_relationship_to_target(first, second, RelationshipType::LinkList, None)
            .unwrap();

        assert_eq!(spec.relationships(first).len(), 3);
        assert_eq!(spec.topic_relationships(first).len(), 1);
        assert_eq!(spec.level_relationships(first).len(), 1);
        assert_eq!(spec.topic_target_relationships(first).len(), 1);
        assert_eq!(spec.prerequisite_relationships(first).len(), 1);
        assert_eq!(spec.related_relationships(first)[0].secondary(), chapter);
        assert!(spec.previous_relationships(first).is_empty());
    }

    #[test]
    fn short_syntax_is_used_without_titles() {
        let (mut spec, _, first, second) = spec_with_topics();
        spec.add_relationship_to_topic(first, second, RelationshipType::ReferTo, None)
            .unwrap();
        spec.add_relationship_to_topic(first, second, RelationshipType::ReferTo, Some("  "))
            .unwrap();

        assert_eq!(spec.relationship_text(first, 1), " [R: 11, 11]");
    }

    #[test]
    fn one_title_forces_the_long_form_for_its_group() {
        let (mut spec, _, first, second) = spec_with_topics();
        let third = spec.new_topic(SpecTopic::new("12"));
        spec.add_relationship_to_topic(first, second, RelationshipType::Prerequisite, None)
            .unwrap();
        spec.add_relationship_to_topic(
            first,
            third,
            RelationshipType::Prerequisite,
            Some("Read [this], first"),
        )
        .unwrap();
        spec.add_relationship_to_topic(first, third, RelationshipType::ReferTo, None)
            .unwrap();

        assert_eq!(
            spec.relationship_text(first, 1),
            " [R: 12] [P:\n    [11],\n    Read \\[this\\]\\, first [12]\n  ]"
        );
    }

    #[test]
    fn levels_reject_sequencing_relationships() {
        let (mut spec, chapter, first, _) = spec_with_topics();
        let err = spec
            .add_relationship_to_target(chapter, first, RelationshipType::Next, None)
            .unwrap_err();
        assert!(matches!(err, ContentSpecError::UnsupportedRelationship(_)));
    }
}
