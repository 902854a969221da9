//! SIP definition domain model
//!
//! A [`SipDefinition`] is one unit of export. It is assembled by the
//! cataloguing layer before a run starts and is read-only to the packaging
//! core, which shares it behind an `Arc`.

use super::file_tree::FileTreeNode;
use super::ids::{ClassificationId, SipId};
use std::fmt;
use std::str::FromStr;

/// Descriptive metadata format tag
///
/// Only Dublin Core and EAD are recognized. Every other tag is treated as
/// custom metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataFormat {
    /// Dublin Core
    Dc,
    /// Encoded Archival Description
    Ead,
    /// Any other format
    Custom,
}

impl MetadataFormat {
    /// Maps a free-form format tag to a known format
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace, so
    /// `"DC"`, `"dc"` and `" Dc "` all map to [`MetadataFormat::Dc`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "dc" => Self::Dc,
            "ead" => Self::Ead,
            _ => Self::Custom,
        }
    }

    /// Canonical lowercase tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dc => "dc",
            Self::Ead => "ead",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for MetadataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetadataFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_tag(s))
    }
}

/// Whether a catalog item is a plain SIP or a grouping of other items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ItemKind {
    /// A leaf SIP
    #[default]
    Sip,
    /// A non-leaf grouping item that can itself be exported
    Grouping,
}

/// One unit of export
///
/// # Examples
///
/// ```
/// use sipkit::domain::{FileTreeNode, MetadataFormat, SipDefinition, SipId};
///
/// let sip = SipDefinition::builder()
///     .id(SipId::new("sip-1").unwrap())
///     .name("Annual report")
///     .file(FileTreeNode::file("/data/report.pdf"))
///     .metadata("<dc/>", Some(MetadataFormat::Dc), Some("2002".to_string()))
///     .build()
///     .unwrap();
///
/// assert_eq!(sip.id.as_str(), "sip-1");
/// assert_eq!(sip.leaf_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SipDefinition {
    /// Stable identifier
    pub id: SipId,

    /// Display name
    pub name: String,

    /// File tree roots included in the package, in user order
    pub files: Vec<FileTreeNode>,

    /// Raw descriptive metadata text
    pub metadata_content: String,

    /// Metadata format tag, `None` when unset
    pub metadata_format: Option<MetadataFormat>,

    /// Metadata schema or version tag
    pub metadata_version: Option<String>,

    /// Classification node this SIP is filed under
    pub parent: Option<ClassificationId>,

    /// Plain SIP or grouping
    pub kind: ItemKind,
}

impl SipDefinition {
    /// Creates a new builder for constructing a SipDefinition
    pub fn builder() -> SipDefinitionBuilder {
        SipDefinitionBuilder::default()
    }

    /// Number of files that will be packaged
    pub fn leaf_count(&self) -> usize {
        self.files.iter().map(FileTreeNode::leaf_count).sum()
    }

    /// Whether this item is a non-leaf grouping
    pub fn is_grouping(&self) -> bool {
        self.kind == ItemKind::Grouping
    }
}

/// Builder for constructing SipDefinition instances
#[derive(Debug, Default)]
pub struct SipDefinitionBuilder {
    id: Option<SipId>,
    name: Option<String>,
    files: Vec<FileTreeNode>,
    metadata_content: String,
    metadata_format: Option<MetadataFormat>,
    metadata_version: Option<String>,
    parent: Option<ClassificationId>,
    kind: ItemKind,
}

impl SipDefinitionBuilder {
    /// Creates a new SipDefinitionBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the SIP ID
    pub fn id(mut self, id: SipId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the display name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Appends a file tree root
    pub fn file(mut self, node: FileTreeNode) -> Self {
        self.files.push(node);
        self
    }

    /// Replaces all file tree roots
    pub fn files(mut self, nodes: Vec<FileTreeNode>) -> Self {
        self.files = nodes;
        self
    }

    /// Sets the descriptive metadata text and its tags
    pub fn metadata(
        mut self,
        content: impl Into<String>,
        format: Option<MetadataFormat>,
        version: Option<String>,
    ) -> Self {
        self.metadata_content = content.into();
        self.metadata_format = format;
        self.metadata_version = version;
        self
    }

    /// Sets the classification parent
    pub fn parent(mut self, parent: Option<ClassificationId>) -> Self {
        self.parent = parent;
        self
    }

    /// Sets the item kind
    pub fn kind(mut self, kind: ItemKind) -> Self {
        self.kind = kind;
        self
    }

    /// Builds the SipDefinition
    ///
    /// # Errors
    ///
    /// Returns an error if the id is missing. A missing name defaults to the id.
    pub fn build(self) -> Result<SipDefinition, String> {
        let id = self.id.ok_or("id is required")?;
        let name = self.name.unwrap_or_else(|| id.to_string());
        Ok(SipDefinition {
            id,
            name,
            files: self.files,
            metadata_content: self.metadata_content,
            metadata_format: self.metadata_format,
            metadata_version: self.metadata_version,
            parent: self.parent,
            kind: self.kind,
        })
    }
}
