use crate::content_spec::ContentSpec;
use crate::node::{NodeId, NodeKind, ParentRef};

/// Per-node option set shared by levels and topic-like nodes.
///
/// Values stored here are local; inherited views are resolved through
/// [`ContentSpec`] because they depend on where the node sits in the tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpecAttributes {
    title: Option<String>,
    target_id: Option<String>,
    duplicate_id: Option<String>,
    tags: Vec<String>,
    remove_tags: Vec<String>,
    source_urls: Vec<String>,
    condition: Option<String>,
    description: Option<String>,
    assigned_writer: Option<String>,
}

impl SpecAttributes {
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: Option<&str>) {
        self.title = title.map(str::to_string);
    }

    pub fn target_id(&self) -> Option<&str> {
        self.target_id.as_deref()
    }

    pub fn set_target_id(&mut self, target_id: Option<&str>) {
        self.target_id = target_id.map(str::to_string);
    }

    pub fn duplicate_id(&self) -> Option<&str> {
        self.duplicate_id.as_deref()
    }

    pub fn set_duplicate_id(&mut self, duplicate_id: Option<&str>) {
        self.duplicate_id = duplicate_id.map(str::to_string);
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        push_unique(&mut self.tags, tag.into());
    }

    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.tags = tags;
    }

    pub fn remove_tags(&self) -> &[String] {
        &self.remove_tags
    }

    pub fn add_remove_tag(&mut self, tag: impl Into<String>) {
        push_unique(&mut self.remove_tags, tag.into());
    }

    pub fn set_remove_tags(&mut self, tags: Vec<String>) {
        self.remove_tags = tags;
    }

    pub fn source_urls(&self) -> &[String] {
        &self.source_urls
    }

    pub fn add_source_url(&mut self, url: impl Into<String>) {
        push_unique(&mut self.source_urls, url.into());
    }

    pub fn set_source_urls(&mut self, urls: Vec<String>) {
        self.source_urls = urls;
    }

    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    pub fn set_condition(&mut self, condition: Option<&str>) {
        self.condition = condition.map(str::to_string);
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<&str>) {
        self.description = description.map(str::to_string);
    }

    pub fn assigned_writer(&self) -> Option<&str> {
        self.assigned_writer.as_deref()
    }

    pub fn set_assigned_writer(&mut self, writer: Option<&str>) {
        self.assigned_writer = writer.map(str::to_string);
    }

    /// Renders the local options in content spec order, without brackets.
    pub fn options_string(&self) -> String {
        let mut vars: Vec<String> = Vec::new();
        vars.extend(self.tags.iter().cloned());
        vars.extend(self.remove_tags.iter().map(|tag| format!("-{tag}")));
        vars.extend(self.source_urls.iter().map(|url| format!("URL = {url}")));
        if let Some(description) = &self.description {
            vars.push(format!("Description = {description}"));
        }
        if let Some(writer) = &self.assigned_writer {
            vars.push(format!("Writer = {writer}"));
        }
        if let Some(condition) = &self.condition {
            vars.push(format!("condition = {condition}"));
        }
        vars.join(", ")
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

impl ContentSpec {
    /// Returns `id` followed by each option-carrying ancestor, nearest first.
    ///
    /// A topic embedded in a metadata line inherits from the base level; the walk
    /// stops at the content spec itself.
    pub fn option_ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(entry) = self.node(current) else {
                break;
            };
            if entry.attributes().is_some() {
                chain.push(current);
            }
            cursor = match entry.parent() {
                Some(ParentRef::Node(parent)) => match self.node(parent).map(|p| p.kind()) {
                    Some(NodeKind::KeyValue(_)) => Some(self.base_level()),
                    Some(_) => Some(parent),
                    None => None,
                },
                Some(ParentRef::ContentSpec) | None => None,
            };
        }
        chain
    }

    /// Resolves a single-valued property, falling back to ancestors when inherited.
    pub(crate) fn resolve_inherited<'a, T>(
        &'a self,
        id: NodeId,
        use_inherited: bool,
        accessor: impl Fn(&'a SpecAttributes) -> Option<T>,
    ) -> Option<T> {
        if !use_inherited {
            return self.node(id)?.attributes().and_then(accessor);
        }
        self.option_ancestors(id)
            .into_iter()
            .filter_map(|ancestor| self.node(ancestor)?.attributes())
            .find_map(accessor)
    }

    /// Effective tags: inherited tags minus each level's remove list, plus local tags.
    pub fn tags(&self, id: NodeId, use_inherited: bool) -> Vec<String> {
        let chain = if use_inherited {
            self.option_ancestors(id)
        } else {
            vec![id]
        };
        let mut tags: Vec<String> = Vec::new();
        for ancestor in chain.into_iter().rev() {
            let Some(attributes) = self.node(ancestor).and_then(|n| n.attributes()) else {
                continue;
            };
            tags.retain(|tag| !attributes.remove_tags().contains(tag));
            for tag in attributes.tags() {
                push_unique(&mut tags, tag.clone());
            }
        }
        tags
    }

    pub fn remove_tags(&self, id: NodeId, use_inherited: bool) -> Vec<String> {
        self.collect_inherited_list(id, use_inherited, |attributes| attributes.remove_tags())
    }

    pub fn source_urls(&self, id: NodeId, use_inherited: bool) -> Vec<String> {
        self.collect_inherited_list(id, use_inherited, |attributes| attributes.source_urls())
    }

    pub fn assigned_writer(&self, id: NodeId, use_inherited: bool) -> Option<&str> {
        self.resolve_inherited(id, use_inherited, |attributes| attributes.assigned_writer())
    }

    pub fn description(&self, id: NodeId, use_inherited: bool) -> Option<&str> {
        self.resolve_inherited(id, use_inherited, |attributes| attributes.description())
    }

    pub fn condition(&self, id: NodeId, use_inherited: bool) -> Option<&str> {
        self.resolve_inherited(id, use_inherited, |attributes| attributes.condition())
    }

    fn collect_inherited_list(
        &self,
        id: NodeId,
        use_inherited: bool,
        accessor: impl Fn(&SpecAttributes) -> &[String],
    ) -> Vec<String> {
        let chain = if use_inherited {
            self.option_ancestors(id)
        } else {
            vec![id]
        };
        let mut values = Vec::new();
        for ancestor in chain.into_iter().rev() {
            if let Some(attributes) = self.node(ancestor).and_then(|n| n.attributes()) {
                for value in accessor(attributes) {
                    push_unique(&mut values, value.clone());
                }
            }
        }
        values
    }
}
