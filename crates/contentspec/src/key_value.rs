use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::ContentSpecError;
use crate::node::NodeId;

/// Well-known content spec metadata keys.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetadataKey {
    Title,
    Subtitle,
    Product,
    Version,
    Edition,
    BookVersion,
    Pubsnumber,
    Abstract,
    CopyrightHolder,
    CopyrightYear,
    Brand,
    BrandLogo,
    Format,
    BookType,
    Locale,
    TranslationLocale,
    OutputStyle,
    DefaultPublicanCfg,
    PublicanCfg,
    /// `<name>-publican.cfg`
    CustomPublicanCfg(String),
    InlineInjection,
    Index,
    SurveyLinks,
    AllowEmptyLevels,
    BugLinks,
    BugzillaProduct,
    BugzillaComponent,
    BugzillaVersion,
    BugzillaKeywords,
    BugzillaAssignee,
    BugzillaServer,
    BugzillaUrl,
    JiraProject,
    JiraComponent,
    JiraVersion,
    JiraLabels,
    JiraServer,
    MavenGroupId,
    MavenArtifactId,
    MavenVersion,
    PomVersion,
    Entities,
    Files,
    RevisionHistory,
    LegalNotice,
    AuthorGroup,
    Feedback,
    AbstractTopic,
    Id,
    Checksum,
}

/// How the raw string of a metadata line is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Bool,
    BookType,
    BugLinks,
    Files,
    Block,
    Topic,
}

fn custom_publican_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^(.+)-publican\.cfg$").expect("Invalid regex"))
}

impl MetadataKey {
    /// Case-insensitive lookup of a key as written in a content spec.
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim();
        let known = match key.to_ascii_lowercase().as_str() {
            "title" => MetadataKey::Title,
            "subtitle" => MetadataKey::Subtitle,
            "product" => MetadataKey::Product,
            "version" => MetadataKey::Version,
            "edition" => MetadataKey::Edition,
            "book version" => MetadataKey::BookVersion,
            "pubsnumber" => MetadataKey::Pubsnumber,
            "abstract" => MetadataKey::Abstract,
            "copyright holder" => MetadataKey::CopyrightHolder,
            "copyright year" => MetadataKey::CopyrightYear,
            "brand" => MetadataKey::Brand,
            "brand logo" => MetadataKey::BrandLogo,
            "format" => MetadataKey::Format,
            "type" => MetadataKey::BookType,
            "locale" => MetadataKey::Locale,
            "translation locale" => MetadataKey::TranslationLocale,
            "output style" => MetadataKey::OutputStyle,
            "default publican.cfg" => MetadataKey::DefaultPublicanCfg,
            "publican.cfg" => MetadataKey::PublicanCfg,
            "inline injection" => MetadataKey::InlineInjection,
            "index" => MetadataKey::Index,
            "survey links" => MetadataKey::SurveyLinks,
            "allow empty levels" => MetadataKey::AllowEmptyLevels,
            "bug links" => MetadataKey::BugLinks,
            "bzproduct" => MetadataKey::BugzillaProduct,
            "bzcomponent" => MetadataKey::BugzillaComponent,
            "bzversion" => MetadataKey::BugzillaVersion,
            "bzkeywords" => MetadataKey::BugzillaKeywords,
            "bzassignee" => MetadataKey::BugzillaAssignee,
            "bzserver" => MetadataKey::BugzillaServer,
            "bzurl" => MetadataKey::BugzillaUrl,
            "jiraproject" => MetadataKey::JiraProject,
            "jiracomponent" => MetadataKey::JiraComponent,
            "jiraversion" => MetadataKey::JiraVersion,
            "jiralabels" => MetadataKey::JiraLabels,
            "jiraserver" => MetadataKey::JiraServer,
            "maven group id" => MetadataKey::MavenGroupId,
            "maven artifact id" => MetadataKey::MavenArtifactId,
            "maven version" => MetadataKey::MavenVersion,
            "pom version" => MetadataKey::PomVersion,
            "entities" => MetadataKey::Entities,
            "files" => MetadataKey::Files,
            "revision history" => MetadataKey::RevisionHistory,
            "legal notice" => MetadataKey::LegalNotice,
            "author group" => MetadataKey::AuthorGroup,
            "feedback" => MetadataKey::Feedback,
            "abstract topic" => MetadataKey::AbstractTopic,
            "id" => MetadataKey::Id,
            "checksum" => MetadataKey::Checksum,
            _ => {
                return custom_publican_pattern()
                    .captures(key)
                    .map(|caps| MetadataKey::CustomPublicanCfg(caps[1].to_lowercase()));
            }
        };
        Some(known)
    }

    /// The canonical spelling used when rendering.
    pub fn canonical(&self) -> String {
        let name = match self {
            MetadataKey::Title => "Title",
            MetadataKey::Subtitle => "Subtitle",
            MetadataKey::Product => "Product",
            MetadataKey::Version => "Version",
            MetadataKey::Edition => "Edition",
            MetadataKey::BookVersion => "Book Version",
            MetadataKey::Pubsnumber => "Pubsnumber",
            MetadataKey::Abstract => "Abstract",
            MetadataKey::CopyrightHolder => "Copyright Holder",
            MetadataKey::CopyrightYear => "Copyright Year",
            MetadataKey::Brand => "Brand",
            MetadataKey::BrandLogo => "Brand Logo",
            MetadataKey::Format => "Format",
            MetadataKey::BookType => "Type",
            MetadataKey::Locale => "Locale",
            MetadataKey::TranslationLocale => "Translation Locale",
            MetadataKey::OutputStyle => "Output Style",
            MetadataKey::DefaultPublicanCfg => "Default publican.cfg",
            MetadataKey::PublicanCfg => "publican.cfg",
            MetadataKey::CustomPublicanCfg(name) => return format!("{name}-publican.cfg"),
            MetadataKey::InlineInjection => "Inline Injection",
            MetadataKey::Index => "Index",
            MetadataKey::SurveyLinks => "Survey Links",
            MetadataKey::AllowEmptyLevels => "Allow Empty Levels",
            MetadataKey::BugLinks => "Bug Links",
            MetadataKey::BugzillaProduct => "BZProduct",
            MetadataKey::BugzillaComponent => "BZComponent",
            MetadataKey::BugzillaVersion => "BZVersion",
            MetadataKey::BugzillaKeywords => "BZKeywords",
            MetadataKey::BugzillaAssignee => "BZAssignee",
            MetadataKey::BugzillaServer => "BZServer",
            MetadataKey::BugzillaUrl => "BZURL",
            MetadataKey::JiraProject => "JIRAProject",
            MetadataKey::JiraComponent => "JIRAComponent",
            MetadataKey::JiraVersion => "JIRAVersion",
            MetadataKey::JiraLabels => "JIRALabels",
            MetadataKey::JiraServer => "JIRAServer",
            MetadataKey::MavenGroupId => "Maven Group ID",
            MetadataKey::MavenArtifactId => "Maven Artifact ID",
            MetadataKey::MavenVersion => "Maven Version",
            MetadataKey::PomVersion => "POM Version",
            MetadataKey::Entities => "Entities",
            MetadataKey::Files => "Files",
            MetadataKey::RevisionHistory => "Revision History",
            MetadataKey::LegalNotice => "Legal Notice",
            MetadataKey::AuthorGroup => "Author Group",
            MetadataKey::Feedback => "Feedback",
            MetadataKey::AbstractTopic => "Abstract Topic",
            MetadataKey::Id => "ID",
            MetadataKey::Checksum => "CHECKSUM",
        };
        name.to_string()
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            MetadataKey::Pubsnumber | MetadataKey::Id => ValueKind::Integer,
            MetadataKey::InlineInjection
            | MetadataKey::Index
            | MetadataKey::SurveyLinks
            | MetadataKey::AllowEmptyLevels => ValueKind::Bool,
            MetadataKey::BookType => ValueKind::BookType,
            MetadataKey::BugLinks => ValueKind::BugLinks,
            MetadataKey::Files => ValueKind::Files,
            MetadataKey::DefaultPublicanCfg
            | MetadataKey::PublicanCfg
            | MetadataKey::CustomPublicanCfg(_)
            | MetadataKey::Entities => ValueKind::Block,
            MetadataKey::RevisionHistory
            | MetadataKey::LegalNotice
            | MetadataKey::AuthorGroup
            | MetadataKey::Feedback
            | MetadataKey::AbstractTopic => ValueKind::Topic,
            _ => ValueKind::Text,
        }
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BookType {
    Book,
    Article,
    BookDraft,
    ArticleDraft,
}

impl BookType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "book" => Some(BookType::Book),
            "article" => Some(BookType::Article),
            "book-draft" => Some(BookType::BookDraft),
            "article-draft" => Some(BookType::ArticleDraft),
            _ => None,
        }
    }
}

impl fmt::Display for BookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BookType::Book => "Book",
            BookType::Article => "Article",
            BookType::BookDraft => "Book-Draft",
            BookType::ArticleDraft => "Article-Draft",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BugLinkType {
    Bugzilla,
    Jira,
    None,
}

impl BugLinkType {
    /// Accepts the legacy `ON`/`OFF` spellings as Bugzilla and none.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bugzilla" | "on" => Some(BugLinkType::Bugzilla),
            "jira" => Some(BugLinkType::Jira),
            "none" | "off" => Some(BugLinkType::None),
            _ => None,
        }
    }
}

impl fmt::Display for BugLinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BugLinkType::Bugzilla => "Bugzilla",
            BugLinkType::Jira => "JIRA",
            BugLinkType::None => "None",
        })
    }
}

/// One additional file shipped with the book: `Title [id, rev: N]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub title: String,
    pub id: i32,
    pub revision: Option<i32>,
}

impl fmt::Display for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}", self.title, self.id)?;
        if let Some(revision) = self.revision {
            write!(f, ", rev: {revision}")?;
        }
        f.write_str("]")
    }
}

fn file_entry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([^\[\],]+?)\s*\[\s*([0-9]+)\s*(?:,\s*rev:\s*([0-9]+)\s*)?\]")
            .expect("Invalid regex")
    })
}

/// Parses `[Title [12], Other [13, rev: 2]]`.
pub fn parse_files(value: &str) -> Result<Vec<FileEntry>, ContentSpecError> {
    let inner = strip_brackets(value);
    let mut files = Vec::new();
    for caps in file_entry_pattern().captures_iter(inner) {
        let id = caps[2].parse().map_err(|source| ContentSpecError::InvalidNumber {
            key: MetadataKey::Files.canonical(),
            source,
        })?;
        let revision = caps
            .get(3)
            .map(|rev| rev.as_str().parse())
            .transpose()
            .map_err(|source| ContentSpecError::InvalidNumber {
                key: MetadataKey::Files.canonical(),
                source,
            })?;
        files.push(FileEntry {
            title: caps[1].trim().to_string(),
            id,
            revision,
        });
    }
    if files.is_empty() && !inner.trim().is_empty() {
        return Err(ContentSpecError::InvalidValue {
            key: MetadataKey::Files.canonical(),
            message: format!("'{value}' is not a file list"),
        });
    }
    Ok(files)
}

pub(crate) fn strip_brackets(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .unwrap_or(value)
}

/// Typed metadata value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetadataValue {
    Text(String),
    Integer(i32),
    Bool(bool),
    BookType(BookType),
    BugLinks(BugLinkType),
    Files(Vec<FileEntry>),
    /// Multi-line content rendered inside brackets, such as publican.cfg overrides.
    Block(String),
    /// A spec topic node parented by this metadata line.
    Topic(NodeId),
}

impl MetadataValue {
    /// Coerces the raw value of a `key = value` line. Topic slots are handled by
    /// the content spec, which owns the topic node.
    pub fn coerce(key: &MetadataKey, raw: &str) -> Result<Self, ContentSpecError> {
        let value = raw.trim();
        let invalid = |message: String| ContentSpecError::InvalidValue {
            key: key.canonical(),
            message,
        };
        Ok(match key.value_kind() {
            ValueKind::Text | ValueKind::Topic => MetadataValue::Text(value.to_string()),
            ValueKind::Integer => MetadataValue::Integer(value.parse().map_err(|source| {
                ContentSpecError::InvalidNumber {
                    key: key.canonical(),
                    source,
                }
            })?),
            ValueKind::Bool => match value.to_ascii_lowercase().as_str() {
                "on" | "true" => MetadataValue::Bool(true),
                "off" | "false" => MetadataValue::Bool(false),
                _ => return Err(invalid(format!("expected ON or OFF, found '{value}'"))),
            },
            ValueKind::BookType => MetadataValue::BookType(
                BookType::parse(value)
                    .ok_or_else(|| invalid(format!("unknown book type '{value}'")))?,
            ),
            ValueKind::BugLinks => MetadataValue::BugLinks(
                BugLinkType::parse(value)
                    .ok_or_else(|| invalid(format!("unknown bug link type '{value}'")))?,
            ),
            ValueKind::Files => MetadataValue::Files(parse_files(value)?),
            ValueKind::Block => MetadataValue::Block(strip_brackets(value).to_string()),
        })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(text) | MetadataValue::Block(text) => Some(text),
            _ => None,
        }
    }

    /// Renders everything except topic values, which need the owning content spec.
    pub fn render(&self) -> Option<String> {
        Some(match self {
            MetadataValue::Text(text) => text.clone(),
            MetadataValue::Integer(value) => value.to_string(),
            MetadataValue::Bool(true) => "ON".to_string(),
            MetadataValue::Bool(false) => "OFF".to_string(),
            MetadataValue::BookType(book_type) => book_type.to_string(),
            MetadataValue::BugLinks(bug_links) => bug_links.to_string(),
            MetadataValue::Files(files) => {
                let entries: Vec<String> = files.iter().map(FileEntry::to_string).collect();
                format!("[{}]", entries.join(", "))
            }
            MetadataValue::Block(text) => format!("[{text}]"),
            MetadataValue::Topic(_) => return None,
        })
    }
}

/// A `Key = Value` metadata line.
#[derive(Clone, Debug)]
pub struct KeyValueNode {
    key: String,
    metadata_key: Option<MetadataKey>,
    pub(crate) value: MetadataValue,
}

impl KeyValueNode {
    pub fn new(key: MetadataKey, value: MetadataValue) -> Self {
        Self {
            key: key.canonical(),
            metadata_key: Some(key),
            value,
        }
    }

    /// An unrecognized key kept as written.
    pub fn opaque(key: &str, value: &str) -> Self {
        Self {
            key: key.trim().to_string(),
            metadata_key: None,
            value: MetadataValue::Text(value.trim().to_string()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn metadata_key(&self) -> Option<&MetadataKey> {
        self.metadata_key.as_ref()
    }

    pub fn value(&self) -> &MetadataValue {
        &self.value
    }

    pub fn topic(&self) -> Option<NodeId> {
        match self.value {
            MetadataValue::Topic(node) => Some(node),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_parse_case_insensitively() {
        assert_eq!(MetadataKey::parse("product"), Some(MetadataKey::Product));
        assert_eq!(MetadataKey::parse(" BUG LINKS "), Some(MetadataKey::BugLinks));
        assert_eq!(MetadataKey::parse("Type").unwrap().canonical(), "Type");
        assert_eq!(
            MetadataKey::parse("mobile-publican.cfg"),
            Some(MetadataKey::CustomPublicanCfg("mobile".into()))
        );
        assert_eq!(
            MetadataKey::parse("Mobile-Publican.cfg"),
            Some(MetadataKey::CustomPublicanCfg("mobile".into()))
        );
        assert_eq!(MetadataKey::parse("Publican.cfg"), Some(MetadataKey::PublicanCfg));
        assert_eq!(MetadataKey::parse("Colour"), None);
    }

    #[test]
    fn values_coerce_by_key() {
        assert_eq!(
            MetadataValue::coerce(&MetadataKey::Index, "on").unwrap(),
            MetadataValue::Bool(true)
        );
        assert_eq!(
            MetadataValue::coerce(&MetadataKey::BugLinks, "OFF").unwrap(),
            MetadataValue::BugLinks(BugLinkType::None)
        );
        assert_eq!(
            MetadataValue::coerce(&MetadataKey::BookType, "article-draft").unwrap(),
            MetadataValue::BookType(BookType::ArticleDraft)
        );
        assert_eq!(
            MetadataValue::coerce(&MetadataKey::Entities, "[<!ENTITY a \"b\">]").unwrap(),
            MetadataValue::Block("<!ENTITY a \"b\">".into())
        );
    }

    #[test]
    fn coercion_failures_are_typed() {
        let err = MetadataValue::coerce(&MetadataKey::Pubsnumber, "twelve").unwrap_err();
        assert!(matches!(err, ContentSpecError::InvalidNumber { .. }));
        let err = MetadataValue::coerce(&MetadataKey::Index, "maybe").unwrap_err();
        assert!(matches!(err, ContentSpecError::InvalidValue { .. }));
        let err = MetadataValue::coerce(&MetadataKey::BookType, "Pamphlet").unwrap_err();
        assert!(matches!(err, ContentSpecError::InvalidValue { .. }));
    }

    #[test]
    fn file_lists_parse_and_render() {
        let files = parse_files("[Logo [12], Stylesheet, v2 [13, rev: 4]]").unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].title, "v2");
        assert_eq!(files[1].revision, Some(4));
        assert_eq!(
            MetadataValue::Files(files[..1].to_vec()).render().unwrap(),
            "[Logo [12]]"
        );
        assert!(parse_files("[]").unwrap().is_empty());
        assert!(parse_files("no ids here").is_err());
    }

    #[test]
    fn rendering_uses_on_off_and_brackets() {
        assert_eq!(MetadataValue::Bool(false).render().unwrap(), "OFF");
        assert_eq!(MetadataValue::Block("x".into()).render().unwrap(), "[x]");
        assert_eq!(MetadataValue::Topic(NodeId(3)).render(), None);
    }
}
