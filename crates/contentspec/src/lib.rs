pub mod attributes;
pub mod checksum;
pub mod content_spec;
pub mod error;
pub mod escape;
pub mod key_value;
pub mod level;
pub mod link_id;
pub mod node;
pub mod outline;
pub mod process;
pub mod provider;
pub mod relationship;
pub mod render;
pub mod topic;

pub use attributes::SpecAttributes;
pub use checksum::{
    checksum_of, checksum_pattern, generate_checksum, id_of, id_pattern, remove_checksum,
    remove_checksum_and_id, verify_checksum,
};
pub use content_spec::ContentSpec;
pub use error::ContentSpecError;
pub use escape::{docbook_escape_title, escape_relationship_title, escape_title};
pub use key_value::{
    BookType, BugLinkType, FileEntry, KeyValueNode, MetadataKey, MetadataValue, ValueKind,
};
pub use level::{Level, LevelType, ProcessState};
pub use link_id::LinkOptions;
pub use node::{Comment, NodeEntry, NodeId, NodeKind, ParentRef, TextNode};
pub use outline::OutlineNode;
pub use provider::{
    InMemoryTopicProvider, ServerEntities, ServerSettings, ServerSettingsProvider, TopicProvider,
    TopicRecord, TopicWrapper,
};
pub use relationship::{Relationship, RelationshipKind, RelationshipType};
pub use render::SPACER;
pub use topic::{CommonContent, InfoTopic, SpecTopic, TopicIdentity, TopicType};
