use crate::content_spec::ContentSpec;
use crate::escape::docbook_escape_title;
use crate::level::LevelType;
use crate::node::{NodeId, NodeKind, ParentRef};

/// How generated anchors are built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkOptions {
    /// Property tag holding a topic's fixed URL on the content server.
    pub fixed_url_property_tag_id: Option<i32>,
    /// Title-derived anchors instead of step-derived ones.
    pub use_fixed_urls: bool,
}

impl ContentSpec {
    /// The anchor id that cross references to `node` should target.
    ///
    /// Returns `None` when no anchor can be derived: a legacy level id for an
    /// unattached level, a topic with no resolved database id, or a node kind
    /// that is never a link target.
    pub fn unique_link_id(&self, node: NodeId, options: &LinkOptions) -> Option<String> {
        let entry = self.node(node)?;
        let base = match entry.kind() {
            NodeKind::Level(level) => match level.level_type() {
                LevelType::Base => return None,
                LevelType::InitialContent => {
                    return match entry.parent()? {
                        ParentRef::Node(parent) => self.unique_link_id(parent, options),
                        ParentRef::ContentSpec => None,
                    };
                }
                level_type => {
                    let anchor = if options.use_fixed_urls {
                        docbook_escape_title(level.title().unwrap_or_default())
                    } else {
                        format!("ChapterID{}", self.step(node)?)
                    };
                    format!("{}{anchor}", level_type.link_prefix())
                }
            },
            NodeKind::Topic(topic) => match topic.topic() {
                Some(wrapper) if options.use_fixed_urls => {
                    wrapper.xref_property_or_id(options.fixed_url_property_tag_id)
                }
                Some(wrapper) => wrapper.xref_id(),
                None => format!("TopicID{}", topic.db_id()?),
            },
            NodeKind::CommonContent(common) => common.fixed_title(),
            _ => return None,
        };

        match entry.attributes().and_then(|a| a.duplicate_id()) {
            Some(duplicate) => Some(format!("{base}-{duplicate}")),
            None => Some(base),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use super::*;
    use crate::provider::TopicRecord;
    use crate::topic::SpecTopic;

    const FIXED: LinkOptions = LinkOptions {
        fixed_url_property_tag_id: Some(20),
        use_fixed_urls: true,
    };

    #[test]
    fn levels_use_prefix_and_title_or_step() {
        let mut spec = ContentSpec::new();
        let intro = spec.new_topic(SpecTopic::new("N"));
        spec.append_child(spec.base_level(), intro).unwrap();
        let chapter = spec.new_chapter("Brewing the Tea!");
        spec.append_child(spec.base_level(), chapter).unwrap();
        spec.attributes_mut(chapter).unwrap().set_duplicate_id(Some("2"));
        let process = spec.new_process("Steps");
        spec.append_child(chapter, process).unwrap();

        assert_eq!(
            spec.unique_link_id(chapter, &FIXED).as_deref(),
            Some("chap-Brewing_the_Tea-2")
        );
        assert_eq!(
            spec.unique_link_id(chapter, &LinkOptions::default()).as_deref(),
            Some("chap-ChapterID2-2")
        );
        assert_eq!(spec.unique_link_id(process, &FIXED).as_deref(), Some("proc-Steps"));
        assert_eq!(spec.unique_link_id(spec.base_level(), &FIXED), None);

        let loose = spec.new_appendix("Loose");
        assert_eq!(spec.unique_link_id(loose, &LinkOptions::default()), None);
        assert_eq!(spec.unique_link_id(loose, &FIXED).as_deref(), Some("appe-Loose"));
    }

    #[test]
    fn initial_content_levels_delegate_to_their_parent() {
        let mut spec = ContentSpec::new();
        let chapter = spec.new_chapter("Tea");
        spec.append_child(spec.base_level(), chapter).unwrap();
        let initial = spec.new_initial_content();
        spec.append_child(chapter, initial).unwrap();

        assert_eq!(spec.unique_link_id(initial, &FIXED).as_deref(), Some("chap-Tea"));
    }

    #[test]
    fn topics_use_their_wrapper_or_database_id() {
        let mut spec = ContentSpec::new();
        let resolved = spec.new_topic(SpecTopic::new("12"));
        spec.topic_mut(resolved)
            .unwrap()
            .set_topic(Some(Arc::new(TopicRecord {
                id: 12,
                revision: None,
                title: "Boil".into(),
                tags: Vec::new(),
                properties: BTreeMap::from([(20, "Boiling_Water".to_string())]),
            })));
        let unresolved = spec.new_topic(SpecTopic::new("13"));
        spec.attributes_mut(unresolved).unwrap().set_duplicate_id(Some("1"));
        let new_topic = spec.new_topic(SpecTopic::new("N1"));
        let common = spec.new_common_content("Conventions.xml");

        assert_eq!(spec.unique_link_id(resolved, &FIXED).as_deref(), Some("Boiling_Water"));
        assert_eq!(
            spec.unique_link_id(resolved, &LinkOptions::default()).as_deref(),
            Some("TopicID12")
        );
        assert_eq!(
            spec.unique_link_id(unresolved, &FIXED).as_deref(),
            Some("TopicID13-1")
        );
        assert_eq!(spec.unique_link_id(new_topic, &FIXED), None);
        assert_eq!(spec.unique_link_id(common, &FIXED).as_deref(), Some("Conventions"));
    }
}
