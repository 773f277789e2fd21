use serde::Serialize;

use crate::content_spec::ContentSpec;
use crate::level::LevelType;
use crate::node::{NodeId, NodeKind};

/// A serializable view of the level tree with step numbers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutlineNode {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineNode>,
}

impl ContentSpec {
    /// The base level and everything beneath it, minus comments and blank lines.
    pub fn outline(&self) -> OutlineNode {
        self.outline_node(self.base_level()).unwrap_or(OutlineNode {
            kind: level_kind(LevelType::Base),
            title: None,
            id: None,
            step: None,
            target_id: None,
            children: Vec::new(),
        })
    }

    fn outline_node(&self, node: NodeId) -> Option<OutlineNode> {
        let entry = self.node(node)?;
        let target_id = entry
            .attributes()
            .and_then(|attributes| attributes.target_id())
            .map(str::to_string);
        let mut outline = match entry.kind() {
            NodeKind::Level(level) => OutlineNode {
                kind: level_kind(level.level_type()),
                title: level.title().map(str::to_string),
                id: None,
                step: self.step(node),
                target_id,
                children: level
                    .front_matter()
                    .iter()
                    .chain(level.child_nodes())
                    .filter_map(|child| self.outline_node(*child))
                    .collect(),
            },
            NodeKind::Topic(topic) => OutlineNode {
                kind: "topic".to_string(),
                title: topic.title().map(str::to_string),
                id: Some(topic.id().to_string()),
                step: self.step(node),
                target_id,
                children: Vec::new(),
            },
            NodeKind::CommonContent(common) => OutlineNode {
                kind: "common_content".to_string(),
                title: Some(common.title().to_string()),
                id: None,
                step: self.step(node),
                target_id,
                children: Vec::new(),
            },
            _ => return None,
        };
        if let Some(info) = self.level(node).and_then(|level| level.info_topic()) {
            if let Some(NodeKind::InfoTopic(info)) = self.node(info).map(|entry| entry.kind()) {
                outline.children.insert(
                    0,
                    OutlineNode {
                        kind: "info".to_string(),
                        title: None,
                        id: Some(info.id().to_string()),
                        step: None,
                        target_id: None,
                        children: Vec::new(),
                    },
                );
            }
        }
        Some(outline)
    }
}

fn level_kind(level_type: LevelType) -> String {
    match level_type {
        LevelType::InitialContent => "initial_content".to_string(),
        other => other.title().to_ascii_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic::SpecTopic;

    #[test]
    fn outline_carries_steps_and_skips_comments() {
        let mut spec = ContentSpec::new();
        let chapter = spec.new_chapter("Tea");
        spec.append_child(spec.base_level(), chapter).unwrap();
        let comment = spec.new_comment("draft");
        spec.append_child(chapter, comment).unwrap();
        let topic = spec.new_topic(SpecTopic::new("N").with_title("Tea").with_type("Concept"));
        spec.append_child(chapter, topic).unwrap();

        let outline = spec.outline();
        assert_eq!(outline.kind, "base");
        let chapter = &outline.children[0];
        assert_eq!(chapter.kind, "chapter");
        assert_eq!(chapter.step, Some(1));
        assert_eq!(chapter.children.len(), 1);
        assert_eq!(chapter.children[0].id.as_deref(), Some("N"));
        assert_eq!(chapter.children[0].step, Some(3));

        let json = serde_json::to_value(&outline).unwrap();
        assert_eq!(json["children"][0]["title"], "Tea");
        assert!(json.get("title").is_none());
    }
}
