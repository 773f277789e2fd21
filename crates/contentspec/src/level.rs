use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::attributes::SpecAttributes;
use crate::content_spec::ContentSpec;
use crate::error::ContentSpecError;
use crate::node::{NodeId, NodeKind, ParentRef};
use crate::relationship::Relationship;
use crate::topic::{InfoTopic, TopicType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelType {
    Base,
    Chapter,
    Section,
    Appendix,
    Process,
    Part,
    Preface,
    InitialContent,
}

impl LevelType {
    /// The heading keyword, e.g. `Chapter` in `Chapter: Tea`.
    pub fn title(self) -> &'static str {
        match self {
            LevelType::Base => "Base",
            LevelType::Chapter => "Chapter",
            LevelType::Section => "Section",
            LevelType::Appendix => "Appendix",
            LevelType::Process => "Process",
            LevelType::Part => "Part",
            LevelType::Preface => "Preface",
            LevelType::InitialContent => "Initial Text",
        }
    }

    /// Anchor prefix used by generated link ids.
    pub fn link_prefix(self) -> &'static str {
        match self {
            LevelType::Chapter => "chap-",
            LevelType::Section => "sect-",
            LevelType::Appendix => "appe-",
            LevelType::Process => "proc-",
            LevelType::Part => "part-",
            LevelType::Preface => "pref-",
            LevelType::Base | LevelType::InitialContent => "",
        }
    }
}

impl fmt::Display for LevelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Process-only state: topics indexed by unique id, plus the one-shot linking flag.
#[derive(Clone, Debug, Default)]
pub struct ProcessState {
    pub(crate) topics: BTreeMap<String, NodeId>,
    pub(crate) topics_processed: bool,
}

impl ProcessState {
    pub fn topic(&self, unique_id: &str) -> Option<NodeId> {
        self.topics.get(unique_id).copied()
    }

    pub fn topics_processed(&self) -> bool {
        self.topics_processed
    }
}

/// A structural container: chapter, section, appendix, part, preface, process or the base.
#[derive(Clone, Debug)]
pub struct Level {
    level_type: LevelType,
    attributes: SpecAttributes,
    pub(crate) relationships: Vec<Relationship>,
    /// Every direct child in document order; the only source of truth for ordering.
    pub(crate) nodes: Vec<NodeId>,
    pub(crate) front_matter: Vec<NodeId>,
    pub(crate) info_topic: Option<NodeId>,
    external_target_id: Option<String>,
    pub(crate) process: Option<ProcessState>,
}

impl Level {
    pub fn new(level_type: LevelType, title: Option<&str>) -> Self {
        let mut attributes = SpecAttributes::default();
        attributes.set_title(title);
        Self {
            level_type,
            attributes,
            relationships: Vec::new(),
            nodes: Vec::new(),
            front_matter: Vec::new(),
            info_topic: None,
            external_target_id: None,
            process: (level_type == LevelType::Process).then(ProcessState::default),
        }
    }

    pub fn level_type(&self) -> LevelType {
        self.level_type
    }

    pub fn title(&self) -> Option<&str> {
        self.attributes.title()
    }

    pub fn attributes(&self) -> &SpecAttributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut SpecAttributes {
        &mut self.attributes
    }

    pub fn child_nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn front_matter(&self) -> &[NodeId] {
        &self.front_matter
    }

    pub fn info_topic(&self) -> Option<NodeId> {
        self.info_topic
    }

    pub fn external_target_id(&self) -> Option<&str> {
        self.external_target_id.as_deref()
    }

    pub fn set_external_target_id(&mut self, target_id: Option<&str>) {
        self.external_target_id = target_id.map(str::to_string);
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn process(&self) -> Option<&ProcessState> {
        self.process.as_ref()
    }
}

/// What a closest-node search is looking for.
enum SearchTarget<'a> {
    TopicId(&'a str),
    Topic(NodeId, &'a str),
    DbId(i32),
    TargetId(&'a str),
}

impl ContentSpec {
    pub fn new_level(&mut self, level_type: LevelType, title: &str) -> NodeId {
        self.alloc(NodeKind::Level(Level::new(level_type, Some(title))))
    }

    pub fn new_chapter(&mut self, title: &str) -> NodeId {
        self.new_level(LevelType::Chapter, title)
    }

    pub fn new_section(&mut self, title: &str) -> NodeId {
        self.new_level(LevelType::Section, title)
    }

    pub fn new_appendix(&mut self, title: &str) -> NodeId {
        self.new_level(LevelType::Appendix, title)
    }

    pub fn new_part(&mut self, title: &str) -> NodeId {
        self.new_level(LevelType::Part, title)
    }

    pub fn new_preface(&mut self, title: &str) -> NodeId {
        self.new_level(LevelType::Preface, title)
    }

    pub fn new_process(&mut self, title: &str) -> NodeId {
        self.new_level(LevelType::Process, title)
    }

    pub fn new_initial_content(&mut self) -> NodeId {
        self.alloc(NodeKind::Level(Level::new(LevelType::InitialContent, None)))
    }

    /// Attaches `child` as the last child of `parent`, detaching it from any
    /// previous container first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), ContentSpecError> {
        self.check_attachable(parent, child)?;
        if self.entry(child)?.as_topic().is_some() {
            return self.append_spec_topic(parent, child);
        }
        self.remove_parent(child)?;
        self.level_mut_or_err(parent)?.nodes.push(child);
        self.entry_mut(child)?.parent = Some(ParentRef::Node(parent));
        Ok(())
    }

    pub fn append_spec_topic(
        &mut self,
        parent: NodeId,
        topic: NodeId,
    ) -> Result<(), ContentSpecError> {
        self.check_attachable(parent, topic)?;
        if self.entry(topic)?.as_topic().is_none() {
            return Err(ContentSpecError::NotATopic(topic));
        }
        self.remove_parent(topic)?;
        self.level_mut_or_err(parent)?.nodes.push(topic);
        self.entry_mut(topic)?.parent = Some(ParentRef::Node(parent));
        self.on_topic_attached(parent, topic)
    }

    /// Detaches `child` from `parent`. Returns false when it was not a child.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<bool, ContentSpecError> {
        self.level_or_err(parent)?;
        if self.entry(child)?.parent() != Some(ParentRef::Node(parent)) {
            return Ok(false);
        }
        self.remove_parent(child)?;
        Ok(true)
    }

    /// Inserts `new_node` ahead of `anchor` in `parent`'s children.
    ///
    /// The anchor index is taken before `new_node` is detached. An anchor at
    /// index 0 prepends; any other anchor inserts at `index - 1`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        new_node: NodeId,
        anchor: NodeId,
    ) -> Result<bool, ContentSpecError> {
        let Some(index) = self
            .level_or_err(parent)?
            .nodes
            .iter()
            .position(|node| *node == anchor)
        else {
            return Ok(false);
        };
        self.check_attachable(parent, new_node)?;
        self.remove_parent(new_node)?;

        let level = self.level_mut_or_err(parent)?;
        let position = if index == 0 {
            0
        } else {
            (index - 1).min(level.nodes.len())
        };
        level.nodes.insert(position, new_node);
        self.entry_mut(new_node)?.parent = Some(ParentRef::Node(parent));
        if self.entry(new_node)?.as_topic().is_some() {
            self.on_topic_attached(parent, new_node)?;
        }
        Ok(true)
    }

    /// Attaches a front-matter topic rendered under the level's `Initial Text:` block.
    pub fn append_initial_content(
        &mut self,
        level: NodeId,
        topic: NodeId,
    ) -> Result<(), ContentSpecError> {
        self.level_or_err(level)?;
        if self.entry(topic)?.as_topic().is_none() {
            return Err(ContentSpecError::NotATopic(topic));
        }
        self.remove_parent(topic)?;
        self.level_mut_or_err(level)?.front_matter.push(topic);
        self.entry_mut(topic)?.parent = Some(ParentRef::Node(level));
        if let Some(topic) = self.topic_mut(topic) {
            topic.set_topic_type(TopicType::InitialContent);
        }
        Ok(())
    }

    /// Replaces the level's info topic. Returns the new node, if any.
    pub fn set_info_topic(
        &mut self,
        level: NodeId,
        info: Option<InfoTopic>,
    ) -> Result<Option<NodeId>, ContentSpecError> {
        if let Some(previous) = self.level_or_err(level)?.info_topic {
            self.remove_parent(previous)?;
        }
        let Some(info) = info else {
            return Ok(None);
        };
        let node = self.alloc(NodeKind::InfoTopic(info));
        self.level_mut_or_err(level)?.info_topic = Some(node);
        self.entry_mut(node)?.parent = Some(ParentRef::Node(level));
        Ok(Some(node))
    }

    /// Breaks the link between `node` and its container, whatever kind of
    /// collection the container keeps it in.
    pub fn remove_parent(&mut self, node: NodeId) -> Result<(), ContentSpecError> {
        let Some(parent) = self.entry(node)?.parent() else {
            return Ok(());
        };
        match parent {
            ParentRef::ContentSpec => {
                if node == self.base_level() {
                    return Err(ContentSpecError::Structure(
                        "the base level cannot be detached".into(),
                    ));
                }
                self.detach_top_level(node);
            }
            ParentRef::Node(owner) => {
                let mut orphaned_metadata = None;
                match &mut self.entry_mut(owner)?.kind {
                    NodeKind::Level(level) => {
                        level.nodes.retain(|child| *child != node);
                        level.front_matter.retain(|child| *child != node);
                        if level.info_topic == Some(node) {
                            level.info_topic = None;
                        }
                        if let Some(process) = &mut level.process {
                            process.topics.retain(|_, topic| *topic != node);
                        }
                    }
                    NodeKind::KeyValue(_) => orphaned_metadata = Some(owner),
                    _ => {}
                }
                // A metadata topic slot without its topic is removed outright.
                if let Some(key_value) = orphaned_metadata {
                    self.entry_mut(node)?.parent = None;
                    return self.remove_parent(key_value);
                }
            }
        }
        self.entry_mut(node)?.parent = None;
        Ok(())
    }

    /// Changes a node's unique id, re-keying any process index that holds it.
    pub fn set_unique_id(
        &mut self,
        node: NodeId,
        unique_id: Option<&str>,
    ) -> Result<(), ContentSpecError> {
        let parent = self.entry(node)?.parent();
        let process_parent = match parent {
            Some(ParentRef::Node(owner)) => self
                .level(owner)
                .filter(|level| level.process.is_some())
                .map(|_| owner),
            _ => None,
        };
        if let Some(owner) = process_parent {
            if let Some(process) = self.level_mut_or_err(owner)?.process.as_mut() {
                process.topics.retain(|_, topic| *topic != node);
            }
        }
        self.entry_mut(node)?.set_unique_id(unique_id);
        if let Some(owner) = process_parent {
            self.on_topic_attached(owner, node)?;
        }
        Ok(())
    }

    fn on_topic_attached(&mut self, parent: NodeId, topic: NodeId) -> Result<(), ContentSpecError> {
        let level_type = self.level_or_err(parent)?.level_type();
        if level_type == LevelType::InitialContent {
            if let Some(topic) = self.topic_mut(topic) {
                topic.set_topic_type(TopicType::InitialContent);
            }
        }
        if level_type != LevelType::Process {
            return Ok(());
        }

        let entry = self.entry(topic)?;
        let base = match entry.unique_id() {
            Some(unique_id) => unique_id.to_string(),
            None => {
                let id = entry.as_topic().map(|t| t.id().to_string()).unwrap_or_default();
                format!("L{}-{}", entry.line_number(), id)
            }
        };

        // Keys are unique within a process; a clash gets the next free `-N` suffix.
        let taken = |key: &str| {
            self.level(parent)
                .and_then(Level::process)
                .and_then(|process| process.topic(key))
                .is_some_and(|holder| holder != topic)
        };
        let mut candidate = base.clone();
        let mut suffix = 1;
        while taken(&candidate) {
            suffix += 1;
            candidate = format!("{base}-{suffix}");
        }

        let entry = self.entry_mut(topic)?;
        entry.set_unique_id(Some(&candidate));
        let key = entry.unique_id().unwrap_or_default().to_string();
        if let Some(process) = self.level_mut_or_err(parent)?.process.as_mut() {
            process.topics.insert(key, topic);
        }
        Ok(())
    }

    fn check_attachable(&self, parent: NodeId, child: NodeId) -> Result<(), ContentSpecError> {
        self.level_or_err(parent)?;
        match self.entry(child)?.kind() {
            NodeKind::Level(_)
            | NodeKind::Topic(_)
            | NodeKind::CommonContent(_)
            | NodeKind::Comment(_)
            | NodeKind::Text(_) => {}
            other => {
                return Err(ContentSpecError::Structure(format!(
                    "a {} node cannot be a level child",
                    other.name()
                )));
            }
        }
        if child == self.base_level() {
            return Err(ContentSpecError::Structure(
                "the base level cannot be re-parented".into(),
            ));
        }
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(ContentSpecError::Structure(format!(
                    "{child} cannot be attached beneath itself"
                )));
            }
            cursor = match self.node(current).and_then(|n| n.parent()) {
                Some(ParentRef::Node(next)) => Some(next),
                _ => None,
            };
        }
        Ok(())
    }

    /// Direct child levels of `level`, in document order.
    pub fn child_levels(&self, level: NodeId) -> Vec<NodeId> {
        self.children_where(level, |kind| matches!(kind, NodeKind::Level(_)))
    }

    /// Direct child spec topics of `level`, in document order.
    pub fn level_spec_topics(&self, level: NodeId) -> Vec<NodeId> {
        self.children_where(level, |kind| matches!(kind, NodeKind::Topic(_)))
    }

    pub fn number_of_spec_topics(&self, level: NodeId) -> usize {
        match self.level(level) {
            Some(Level {
                process: Some(process),
                ..
            }) => process.topics.len(),
            Some(_) => self.level_spec_topics(level).len(),
            None => 0,
        }
    }

    pub fn number_of_child_levels(&self, level: NodeId) -> usize {
        self.child_levels(level).len()
    }

    /// True when `level` or any descendant level holds a spec topic.
    pub fn has_spec_topics(&self, level: NodeId) -> bool {
        self.number_of_spec_topics(level) > 0
            || self
                .child_levels(level)
                .into_iter()
                .any(|child| self.has_spec_topics(child))
    }

    fn children_where(&self, level: NodeId, predicate: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
        let Some(level) = self.level(level) else {
            return Vec::new();
        };
        level
            .nodes
            .iter()
            .copied()
            .filter(|child| self.node(*child).is_some_and(|n| predicate(n.kind())))
            .collect()
    }

    /// Direct child count plus, recursively, the count of every child level.
    pub fn total_number_of_children(&self, level: NodeId) -> usize {
        let Some(data) = self.level(level) else {
            return 0;
        };
        data.nodes.len()
            + self
                .child_levels(level)
                .into_iter()
                .map(|child| self.total_number_of_children(child))
                .sum::<usize>()
    }

    /// The node's 1-based position in the flattened document, or `None` when
    /// it is not attached.
    ///
    /// A first child takes its container's step plus one. Every later child
    /// adds one per preceding sibling, plus each preceding level's total
    /// descendant count. An unattached container counts as zero. Front matter
    /// sits one before its level (-1 under the base level), an info topic shares
    /// its level's step, and a metadata topic takes its metadata line's position.
    pub fn step(&self, node: NodeId) -> Option<i32> {
        let entry = self.node(node)?;
        match entry.parent()? {
            ParentRef::ContentSpec => {
                if node == self.base_level() {
                    return None;
                }
                self.top_level_nodes()
                    .iter()
                    .position(|top| *top == node)
                    .map(|position| position as i32 + 1)
            }
            ParentRef::Node(owner) => match self.node(owner)?.kind() {
                NodeKind::KeyValue(_) => self.step(owner),
                NodeKind::Level(level) => {
                    let Some(position) = level.nodes.iter().position(|child| *child == node)
                    else {
                        if level.info_topic == Some(node) {
                            return self.step(owner);
                        }
                        return Some(if level.level_type() == LevelType::Base {
                            -1
                        } else {
                            self.step(owner).unwrap_or(0) - 1
                        });
                    };
                    let mut step = self.step(owner).unwrap_or(0);
                    for sibling in &level.nodes[..position] {
                        step += 1;
                        if self.level(*sibling).is_some() {
                            step += self.total_number_of_children(*sibling) as i32;
                        }
                    }
                    Some(step + 1)
                }
                _ => None,
            },
        }
    }

    /// Nearest topic with the given id string.
    ///
    /// The search scans the starting level's topics, then its child levels, then
    /// (when `check_parent` is set) moves up one level at a time, never
    /// re-entering the level it came from. At the base level the content spec's
    /// metadata topics are scanned last.
    pub fn closest_topic(&self, from: NodeId, topic_id: &str, check_parent: bool) -> Option<NodeId> {
        self.closest_from(from, &SearchTarget::TopicId(topic_id), check_parent)
    }

    /// Nearest topic that is `topic` itself or shares its id string.
    pub fn closest_topic_to(&self, from: NodeId, topic: NodeId, check_parent: bool) -> Option<NodeId> {
        let id = self.topic(topic)?.id();
        self.closest_from(from, &SearchTarget::Topic(topic, id), check_parent)
    }

    pub fn closest_topic_by_db_id(&self, from: NodeId, db_id: i32, check_parent: bool) -> Option<NodeId> {
        self.closest_from(from, &SearchTarget::DbId(db_id), check_parent)
    }

    /// Nearest level or topic carrying `target_id`.
    pub fn closest_spec_node_by_target_id(
        &self,
        from: NodeId,
        target_id: &str,
        check_parent: bool,
    ) -> Option<NodeId> {
        self.closest_from(from, &SearchTarget::TargetId(target_id), check_parent)
    }

    fn closest_from(&self, from: NodeId, target: &SearchTarget<'_>, check_parent: bool) -> Option<NodeId> {
        let entry = self.node(from)?;
        if entry.as_level().is_some() {
            return self.closest_in_level(from, None, check_parent, target);
        }
        match entry.parent()? {
            ParentRef::Node(owner) if self.level(owner).is_some() => {
                self.closest_in_level(owner, Some(from), check_parent, target)
            }
            ParentRef::Node(_) => {
                self.closest_in_level(self.base_level(), None, check_parent, target)
            }
            ParentRef::ContentSpec => {
                self.closest_in_level(self.base_level(), None, check_parent, target)
            }
        }
    }

    fn closest_in_level(
        &self,
        level_id: NodeId,
        caller: Option<NodeId>,
        check_parent: bool,
        target: &SearchTarget<'_>,
    ) -> Option<NodeId> {
        let level = self.level(level_id)?;

        if let SearchTarget::TargetId(target_id) = target {
            if level.attributes().target_id() == Some(*target_id) {
                return Some(level_id);
            }
        }

        let own_topics = self
            .level_spec_topics(level_id)
            .into_iter()
            .chain(level.front_matter.iter().copied());
        for topic in own_topics {
            if self.matches_search(topic, target) {
                return Some(topic);
            }
        }

        for child in self.child_levels(level_id) {
            if Some(child) == caller {
                continue;
            }
            if let Some(found) = self.closest_in_level(child, None, false, target) {
                return Some(found);
            }
        }

        if check_parent {
            if let Some(ParentRef::Node(parent)) = self.node(level_id).and_then(|n| n.parent()) {
                if let Some(found) = self.closest_in_level(parent, Some(level_id), true, target) {
                    return Some(found);
                }
            }
        }

        if level_id == self.base_level() {
            return self
                .metadata_topics()
                .into_iter()
                .find(|topic| self.matches_search(*topic, target));
        }
        None
    }

    fn matches_search(&self, node: NodeId, target: &SearchTarget<'_>) -> bool {
        let Some(topic) = self.topic(node) else {
            return false;
        };
        match target {
            SearchTarget::TopicId(id) => topic.id() == *id,
            SearchTarget::Topic(same, id) => node == *same || topic.id() == *id,
            SearchTarget::DbId(db_id) => topic.db_id() == Some(*db_id),
            SearchTarget::TargetId(target_id) => topic.target_id() == Some(*target_id),
        }
    }
}
