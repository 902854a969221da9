//! Catalog manifest models
//!
//! This module defines the JSON structures of a catalog manifest. These
//! models are separate from the domain models and only handle
//! serialization; [`CatalogEntry::to_domain`] converts them.

use crate::domain::{
    ClassificationId, FileTreeNode, ItemKind, MetadataFormat, Result, SipDefinition, SipId,
    SipkitError,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level manifest document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogManifest {
    /// Entries in catalog order
    #[serde(default)]
    pub sips: Vec<CatalogEntry>,
}

/// Item kind as written in the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogItemKind {
    #[default]
    Sip,
    Grouping,
}

impl From<CatalogItemKind> for ItemKind {
    fn from(kind: CatalogItemKind) -> Self {
        match kind {
            CatalogItemKind::Sip => ItemKind::Sip,
            CatalogItemKind::Grouping => ItemKind::Grouping,
        }
    }
}

/// One catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,

    /// Display name, defaults to the id
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub kind: CatalogItemKind,

    /// Identifier of the classification node the SIP is filed under
    #[serde(default)]
    pub parent: Option<String>,

    /// Whether the entry belongs to the current selection
    #[serde(default)]
    pub selected: bool,

    #[serde(default)]
    pub metadata: Option<CatalogMetadata>,

    /// Source files and directories; relative paths resolve against the
    /// manifest's directory
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

/// Descriptive metadata of an entry
///
/// The text is either inline (`content`) or read from `path`; inline
/// content wins when both are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogMetadata {
    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl CatalogEntry {
    /// Convert to a domain SipDefinition
    ///
    /// Each file path is scanned into a [`FileTreeNode`]. A path that cannot
    /// be scanned is kept as a plain file node so that the failure surfaces
    /// when that SIP is packaged, not while loading the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank id or parent, or an unreadable metadata
    /// file.
    pub fn to_domain(&self, base_dir: &Path) -> Result<SipDefinition> {
        let id = SipId::new(self.id.clone())
            .map_err(|e| SipkitError::Catalog(format!("Invalid SIP id: {}", e)))?;

        let parent = self
            .parent
            .as_ref()
            .map(|p| {
                ClassificationId::new(p.clone()).map_err(|e| {
                    SipkitError::Catalog(format!("Invalid parent of SIP '{}': {}", id, e))
                })
            })
            .transpose()?;

        let files = self
            .files
            .iter()
            .map(|path| scan_source(&resolve(base_dir, path), &id))
            .collect();

        let mut builder = SipDefinition::builder()
            .id(id.clone())
            .files(files)
            .parent(parent)
            .kind(self.kind.into());

        if let Some(name) = &self.name {
            builder = builder.name(name.clone());
        }

        if let Some(metadata) = &self.metadata {
            let content = match (&metadata.content, &metadata.path) {
                (Some(content), _) => content.clone(),
                (None, Some(path)) => {
                    let path = resolve(base_dir, path);
                    std::fs::read_to_string(&path).map_err(|e| {
                        SipkitError::Catalog(format!(
                            "Cannot read metadata of SIP '{}' from {}: {}",
                            id,
                            path.display(),
                            e
                        ))
                    })?
                }
                (None, None) => String::new(),
            };
            let format = metadata.format.as_deref().map(MetadataFormat::from_tag);
            builder = builder.metadata(content, format, metadata.version.clone());
        }

        builder.build().map_err(SipkitError::Catalog)
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn scan_source(path: &Path, id: &SipId) -> FileTreeNode {
    match FileTreeNode::scan(path) {
        Ok(node) => node,
        Err(e) => {
            tracing::warn!(
                sip_id = %id,
                path = %path.display(),
                error = %e,
                "Cannot scan source path, keeping it as a file"
            );
            FileTreeNode::file(path)
        }
    }
}
