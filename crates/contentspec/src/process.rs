use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::content_spec::ContentSpec;
use crate::error::ContentSpecError;
use crate::node::NodeId;
use crate::provider::{ServerSettingsProvider, TopicProvider, TopicWrapper};
use crate::relationship::RelationshipType;
use crate::topic::TopicIdentity;

const TASK_TYPE: &str = "Task";

impl ContentSpec {
    /// Links the task topics of a process into a previous/next chain.
    ///
    /// Existing and cloned topics are resolved through `topics` and count as
    /// tasks when they carry the server's task tag; new and duplicate topics
    /// count as tasks when their type label is `Task`. Topics that cannot be
    /// resolved are skipped and make the pass return `false`, but the links
    /// already made stay in place. Every linked topic gets a target id.
    ///
    /// Only the first call does any work; later calls return `true` without
    /// touching the providers.
    pub fn process_topics(
        &mut self,
        process: NodeId,
        topics: &dyn TopicProvider,
        settings: &dyn ServerSettingsProvider,
    ) -> Result<bool, ContentSpecError> {
        let state = self.level_or_err(process)?.process().ok_or_else(|| {
            ContentSpecError::Structure(format!("{process} is not a process"))
        })?;
        if state.topics_processed() {
            return Ok(true);
        }

        let task_tag_id = settings.server_settings().entities.task_tag_id;
        let mut success = true;
        let mut previous: Option<NodeId> = None;

        for node in self.level_spec_topics(process) {
            let Some(is_task) = self.classify_process_topic(node, topics, task_tag_id) else {
                success = false;
                continue;
            };
            if !is_task {
                continue;
            }

            self.ensure_target_id(node)?;
            if let Some(previous) = previous {
                self.add_process_relationship(previous, node, RelationshipType::Next)?;
                self.add_process_relationship(node, previous, RelationshipType::Previous)?;
            }
            previous = Some(node);
        }

        if let Some(state) = self.level_mut_or_err(process)?.process.as_mut() {
            state.topics_processed = true;
        }
        Ok(success)
    }

    /// `Some(is_task)`, or `None` when the topic could not be resolved.
    fn classify_process_topic(
        &mut self,
        node: NodeId,
        topics: &dyn TopicProvider,
        task_tag_id: Option<i32>,
    ) -> Option<bool> {
        let topic = self.topic(node)?;
        let lookup_id = match topic.identity() {
            TopicIdentity::Existing { db_id } => *db_id,
            TopicIdentity::Cloned { source_id } => *source_id,
            TopicIdentity::New { .. }
            | TopicIdentity::Duplicate { .. }
            | TopicIdentity::ClonedDuplicate { .. } => {
                return Some(
                    topic
                        .type_label()
                        .is_some_and(|label| label.trim().eq_ignore_ascii_case(TASK_TYPE)),
                );
            }
            TopicIdentity::Unrecognized => {
                tracing::warn!(topic = topic.id(), "unrecognized topic id in process");
                return None;
            }
        };

        let revision = topic.revision();
        let wrapper: Arc<dyn TopicWrapper> = match topic.topic().cloned() {
            Some(wrapper) => wrapper,
            None => {
                let Some(wrapper) = topics.get_topic(lookup_id, revision) else {
                    tracing::warn!(topic = lookup_id, ?revision, "process topic could not be resolved");
                    return None;
                };
                tracing::debug!(topic = lookup_id, title = wrapper.title(), "resolved process topic");
                if let Some(topic) = self.topic_mut(node) {
                    topic.set_topic(Some(Arc::clone(&wrapper)));
                }
                wrapper
            }
        };
        Some(task_tag_id.is_some_and(|tag| wrapper.has_tag(tag)))
    }

    fn ensure_target_id(&mut self, node: NodeId) -> Result<(), ContentSpecError> {
        let entry = self.entry(node)?;
        if entry.attributes().and_then(|a| a.target_id()).is_some() {
            return Ok(());
        }
        let unique_id = entry.unique_id().unwrap_or_default().to_string();
        let target_id = format!("T-{unique_id}-{}", random_suffix());
        if let Some(attributes) = self.attributes_mut(node) {
            attributes.set_target_id(Some(&target_id));
        }
        Ok(())
    }
}

fn random_suffix() -> String {
    let mut bytes = [0u8; 4];
    if getrandom::getrandom(&mut bytes).is_err() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        for (idx, b) in bytes.iter_mut().enumerate() {
            *b = ((now >> (idx * 8)) & 0xFF) as u8;
        }
    }
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::provider::{InMemoryTopicProvider, ServerEntities, ServerSettings, TopicRecord};
    use crate::topic::SpecTopic;

    fn settings() -> ServerSettings {
        ServerSettings {
            entities: ServerEntities {
                task_tag_id: Some(7),
                fixed_url_property_tag_id: None,
            },
        }
    }

    fn task_record(id: i32) -> TopicRecord {
        TopicRecord {
            id,
            revision: None,
            title: format!("Task {id}"),
            tags: vec![7],
            properties: BTreeMap::new(),
        }
    }

    #[test]
    fn new_task_topics_are_chained_in_order() {
        let mut spec = ContentSpec::new();
        let process = spec.new_process("Brew");
        spec.append_child(spec.base_level(), process).unwrap();
        let boil = spec.new_topic(SpecTopic::new("N1").with_title("Boil").with_type("task"));
        let note = spec.new_topic(SpecTopic::new("N2").with_title("Note").with_type("Concept"));
        let steep = spec.new_topic(SpecTopic::new("N3").with_title("Steep").with_type("Task"));
        for node in [boil, note, steep] {
            spec.append_child(process, node).unwrap();
        }

        let provider = InMemoryTopicProvider::new();
        assert!(spec.process_topics(process, &provider, &settings()).unwrap());

        assert_eq!(spec.next_relationships(boil)[0].secondary(), steep);
        assert_eq!(spec.previous_relationships(steep)[0].secondary(), boil);
        assert!(spec.relationships(note).is_empty());
        let target = spec.topic(boil).unwrap().target_id().unwrap();
        assert!(target.starts_with("T-L-1-N1-"));
        assert_eq!(target.len(), "T-L-1-N1-".len() + 8);
        assert!(spec.topic(note).unwrap().target_id().is_none());
        assert_eq!(provider.lookups(), 0);
    }

    #[test]
    fn existing_topics_resolve_through_the_provider() {
        let mut spec = ContentSpec::new();
        let process = spec.new_process("Brew");
        let first = spec.new_topic(SpecTopic::new("10"));
        let second = spec.new_topic(SpecTopic::new("C11"));
        spec.append_child(process, first).unwrap();
        spec.append_child(process, second).unwrap();

        let provider = InMemoryTopicProvider::with_records([task_record(10), task_record(11)]);
        assert!(spec.process_topics(process, &provider, &settings()).unwrap());
        assert_eq!(provider.lookups(), 2);
        assert_eq!(spec.topic(first).unwrap().topic().unwrap().title(), "Task 10");
        assert_eq!(spec.next_relationships(first)[0].secondary(), second);

        // A second pass is a no-op.
        assert!(spec.process_topics(process, &provider, &settings()).unwrap());
        assert_eq!(provider.lookups(), 2);
        assert_eq!(spec.next_relationships(first).len(), 1);
    }

    #[test]
    fn unresolved_topics_fail_the_pass_without_undoing_links() {
        let mut spec = ContentSpec::new();
        let process = spec.new_process("Brew");
        let a = spec.new_topic(SpecTopic::new("10"));
        let b = spec.new_topic(SpecTopic::new("11"));
        let missing = spec.new_topic(SpecTopic::new("404"));
        for node in [a, b, missing] {
            spec.append_child(process, node).unwrap();
        }

        let provider = InMemoryTopicProvider::with_records([task_record(10), task_record(11)]);
        assert!(!spec.process_topics(process, &provider, &settings()).unwrap());
        assert_eq!(spec.next_relationships(a).len(), 1);
        assert!(spec.level(process).unwrap().process().unwrap().topics_processed());
        assert!(spec.process_topics(process, &provider, &settings()).unwrap());
    }

    #[test]
    fn process_edges_are_not_rendered() {
        let mut spec = ContentSpec::new();
        let process = spec.new_process("Brew");
        spec.append_child(spec.base_level(), process).unwrap();
        let a = spec.new_topic(SpecTopic::new("N1").with_title("A").with_type("Task"));
        let b = spec.new_topic(SpecTopic::new("N2").with_title("B").with_type("Task"));
        spec.append_child(process, a).unwrap();
        spec.append_child(process, b).unwrap();
        spec.process_topics(process, &InMemoryTopicProvider::new(), &settings())
            .unwrap();

        let rendered = spec.text(a);
        assert!(!rendered.contains("[Next"));
        assert!(rendered.starts_with("A [N1, Task] [T-"));
    }

    #[test]
    fn non_process_levels_are_rejected() {
        let mut spec = ContentSpec::new();
        let chapter = spec.new_chapter("Tea");
        let err = spec
            .process_topics(chapter, &InMemoryTopicProvider::new(), &settings())
            .unwrap_err();
        assert!(matches!(err, ContentSpecError::Structure(_)));
    }
}
