use crate::checksum::generate_checksum;
use crate::content_spec::ContentSpec;
use crate::escape::escape_title;
use crate::key_value::{KeyValueNode, MetadataKey};
use crate::level::{Level, LevelType};
use crate::node::{NodeId, NodeKind, ParentRef};

/// One level of indentation in content spec text.
pub const SPACER: &str = "  ";

impl ContentSpec {
    /// Nesting depth: 0 for the base level, 1 for its children and for
    /// top-level nodes, and one more per enclosing level after that.
    pub fn depth(&self, node: NodeId) -> usize {
        if node == self.base_level() {
            return 0;
        }
        let Some(ParentRef::Node(owner)) = self.parent(node) else {
            return 1;
        };
        let Some(level) = self.level(owner) else {
            return 1;
        };
        let owner_depth = self.depth(owner);
        if level.front_matter().contains(&node) {
            owner_depth + 2
        } else if level.info_topic() == Some(node) {
            owner_depth
        } else {
            owner_depth + 1
        }
    }

    fn indentation(&self, node: NodeId) -> usize {
        self.depth(node).saturating_sub(1)
    }

    /// The node's own line without indentation or trailing newline.
    ///
    /// Levels and topics include their relationship blocks; the base level has
    /// no heading and renders as an empty string.
    pub fn text(&self, node: NodeId) -> String {
        let Some(entry) = self.node(node) else {
            return String::new();
        };
        match entry.kind() {
            NodeKind::Level(level) => {
                if level.level_type() == LevelType::Base {
                    return String::new();
                }
                let mut output = self.level_heading(level);
                output.push_str(&self.relationship_text(node, self.indentation(node)));
                output
            }
            NodeKind::Topic(topic) => {
                let mut output = topic.text();
                output.push_str(&self.relationship_text(node, self.indentation(node)));
                output
            }
            NodeKind::InfoTopic(info) => info.text(),
            NodeKind::CommonContent(common) => common.text(),
            NodeKind::Comment(comment) => comment.text().to_string(),
            NodeKind::Text(text) => text.text().to_string(),
            NodeKind::KeyValue(key_value) => self.key_value_text(key_value),
        }
    }

    fn level_heading(&self, level: &Level) -> String {
        let mut output = match level.title() {
            Some(title) => format!("{}: {}", level.level_type().title(), escape_title(title)),
            None => format!("{}:", level.level_type().title()),
        };
        let options = level.attributes().options_string();
        if !options.is_empty() {
            output.push_str(&format!(" [{options}]"));
        }
        if let Some(info) = level.info_topic() {
            output.push(' ');
            output.push_str(&self.text(info));
        }
        if let Some(target_id) = level.attributes().target_id() {
            output.push_str(&format!(" [{target_id}]"));
        }
        output
    }

    fn key_value_text(&self, key_value: &KeyValueNode) -> String {
        let value = match key_value.topic() {
            Some(topic) => self
                .topic(topic)
                .map(|topic| topic.bracket_text())
                .unwrap_or_default(),
            None => key_value.value().render().unwrap_or_default(),
        };
        format!("{} = {}", key_value.key(), value)
    }

    /// Renders a node and everything beneath it, one line per node.
    pub fn node_to_string(&self, node: NodeId) -> String {
        let mut output = String::new();
        self.write_node(node, &mut output);
        output
    }

    fn write_node(&self, node: NodeId, output: &mut String) {
        let Some(entry) = self.node(node) else {
            return;
        };
        let indent = SPACER.repeat(self.indentation(node));
        match entry.kind() {
            NodeKind::Level(level) => {
                if level.level_type() != LevelType::Base {
                    output.push_str(&indent);
                    output.push_str(&self.text(node));
                    output.push('\n');
                }
                if !level.front_matter().is_empty() {
                    let child_indent = SPACER.repeat(self.depth(node));
                    output.push_str(&child_indent);
                    output.push_str(LevelType::InitialContent.title());
                    output.push_str(":\n");
                    for topic in level.front_matter() {
                        self.write_node(*topic, output);
                    }
                }
                for child in level.child_nodes() {
                    self.write_node(*child, output);
                }
            }
            NodeKind::Text(text) => {
                output.push_str(text.text());
                output.push('\n');
            }
            NodeKind::InfoTopic(_) => {}
            _ => {
                output.push_str(&indent);
                output.push_str(&self.text(node));
                output.push('\n');
            }
        }
    }

    /// Renders the whole content spec.
    ///
    /// The top-level list comes first (minus the `CHECKSUM` and `ID` lines),
    /// then the base level's global options, then the level tree. When the spec
    /// has an id, the `ID` line is prepended last, preceded by a checksum of the
    /// id line plus body when `include_checksum` is set.
    pub fn render(&self, include_checksum: bool) -> String {
        let mut body = String::new();
        for node in self.top_level_nodes() {
            if let Some(NodeKind::KeyValue(key_value)) = self.node(*node).map(|entry| entry.kind()) {
                if matches!(
                    key_value.metadata_key(),
                    Some(MetadataKey::Checksum | MetadataKey::Id)
                ) {
                    continue;
                }
            }
            self.write_node(*node, &mut body);
        }

        if let Some(base) = self.level(self.base_level()) {
            let options = base.attributes().options_string();
            if !options.is_empty() {
                body.push_str(&format!("[{options}]\n"));
            }
        }
        self.write_node(self.base_level(), &mut body);

        match self.id() {
            Some(id) if include_checksum => {
                let checksum = generate_checksum(id, &body);
                format!("CHECKSUM = {checksum}\nID = {id}\n{body}")
            }
            Some(id) => format!("ID = {id}\n{body}"),
            None => body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationship::RelationshipType;
    use crate::topic::{InfoTopic, SpecTopic};

    #[test]
    fn levels_and_topics_indent_per_depth() {
        let mut spec = ContentSpec::new();
        spec.set_title(Some("Tea"));
        let chapter = spec.new_chapter("Tea");
        spec.append_child(spec.base_level(), chapter).unwrap();
        let section = spec.new_section("Green [leaf]");
        spec.append_child(chapter, section).unwrap();
        let topic = spec.new_topic(SpecTopic::new("N").with_title("Sencha").with_type("Task"));
        spec.append_child(section, topic).unwrap();
        let comment = spec.new_comment("check steep times");
        spec.append_child(section, comment).unwrap();

        assert_eq!(
            spec.render(false),
            "Title = Tea\nChapter: Tea\n  Section: Green \\[leaf\\]\n    Sencha [N, Task]\n    # check steep times\n"
        );
    }

    #[test]
    fn headings_carry_options_info_and_target() {
        let mut spec = ContentSpec::new();
        let chapter = spec.new_chapter("Tea");
        spec.append_child(spec.base_level(), chapter).unwrap();
        spec.attributes_mut(chapter).unwrap().add_tag("Beta");
        spec.attributes_mut(chapter).unwrap().set_target_id(Some("T-tea"));
        spec.set_info_topic(chapter, Some(InfoTopic::new("55"))).unwrap();

        assert_eq!(spec.text(chapter), "Chapter: Tea [Beta] [Info: 55] [T-tea]");
    }

    #[test]
    fn front_matter_renders_as_an_initial_text_block() {
        let mut spec = ContentSpec::new();
        let chapter = spec.new_chapter("Tea");
        spec.append_child(spec.base_level(), chapter).unwrap();
        let intro = spec.new_topic(SpecTopic::new("12").with_title("About"));
        spec.append_initial_content(chapter, intro).unwrap();
        let body = spec.new_topic(SpecTopic::new("13").with_title("Body"));
        spec.append_child(chapter, body).unwrap();

        assert_eq!(
            spec.node_to_string(chapter),
            "Chapter: Tea\n  Initial Text:\n    About [12]\n  Body [13]\n"
        );
    }

    #[test]
    fn topic_relationships_use_the_topic_indent() {
        let mut spec = ContentSpec::new();
        let chapter = spec.new_chapter("Tea");
        spec.append_child(spec.base_level(), chapter).unwrap();
        let a = spec.new_topic(SpecTopic::new("12").with_title("Boil"));
        let b = spec.new_topic(SpecTopic::new("13").with_title("Steep"));
        spec.append_child(chapter, a).unwrap();
        spec.append_child(chapter, b).unwrap();
        spec.add_relationship_to_topic(a, b, RelationshipType::Prerequisite, Some("Steep first"))
            .unwrap();

        assert_eq!(
            spec.node_to_string(a),
            "  Boil [12] [P:\n    Steep first [13]\n  ]\n"
        );
    }

    #[test]
    fn global_options_and_id_lines_frame_the_body() {
        let mut spec = ContentSpec::new();
        spec.set_id(Some(42));
        spec.set_title(Some("Tea"));
        spec.attributes_mut(spec.base_level()).unwrap().add_tag("Global");

        assert_eq!(spec.render(false), "ID = 42\nTitle = Tea\n[Global]\n");
        let with_checksum = spec.render(true);
        assert!(with_checksum.starts_with("CHECKSUM = "));
        assert!(with_checksum.ends_with("ID = 42\nTitle = Tea\n[Global]\n"));
        assert_eq!(with_checksum, spec.to_string());
    }

    #[test]
    fn metadata_topics_and_blocks_render_inline() {
        let mut spec = ContentSpec::new();
        spec.set_revision_history(Some(SpecTopic::new("123").with_revision(2)));
        spec.set_entities(Some("<!ENTITY PRODUCT \"Tea\">"));
        spec.set_index(Some(true));
        let blank = spec.new_text("");
        spec.append_node(blank).unwrap();

        assert_eq!(
            spec.render(false),
            "Revision History = [123, rev: 2]\nEntities = [<!ENTITY PRODUCT \"Tea\">]\nIndex = ON\n\n"
        );
    }
}
