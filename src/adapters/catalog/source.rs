//! Classification-hierarchy provider
//!
//! The export coordinator asks a [`SipSource`] for the SIPs of a run. The
//! bundled implementation is an in-memory [`SipCatalog`], usually loaded from
//! a JSON manifest with [`load_catalog`].

use super::models::CatalogManifest;
use crate::domain::{Result, SipDefinition, SipkitError};
use std::path::Path;

/// Supplies the SIPs of an export run
///
/// Both queries return definitions in a stable order. Each definition carries
/// its classification parent.
pub trait SipSource {
    /// Every SIP in the hierarchy
    fn all_sips(&self) -> Vec<SipDefinition>;

    /// The SIPs currently selected
    fn selected_sips(&self) -> Vec<SipDefinition>;
}

#[derive(Debug, Clone)]
struct CatalogItem {
    definition: SipDefinition,
    selected: bool,
}

/// In-memory catalog in insertion order
#[derive(Debug, Clone, Default)]
pub struct SipCatalog {
    items: Vec<CatalogItem>,
}

impl SipCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a definition
    ///
    /// # Errors
    ///
    /// Returns an error if a definition with the same id is already present.
    pub fn add(&mut self, definition: SipDefinition, selected: bool) -> Result<()> {
        if self.items.iter().any(|item| item.definition.id == definition.id) {
            return Err(SipkitError::Catalog(format!(
                "Duplicate SIP id '{}'",
                definition.id
            )));
        }
        self.items.push(CatalogItem {
            definition,
            selected,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected_count(&self) -> usize {
        self.items.iter().filter(|item| item.selected).count()
    }
}

impl SipSource for SipCatalog {
    fn all_sips(&self) -> Vec<SipDefinition> {
        self.items
            .iter()
            .map(|item| item.definition.clone())
            .collect()
    }

    fn selected_sips(&self) -> Vec<SipDefinition> {
        self.items
            .iter()
            .filter(|item| item.selected)
            .map(|item| item.definition.clone())
            .collect()
    }
}

/// Loads a catalog from a JSON manifest
///
/// Relative source and metadata paths resolve against the manifest's
/// directory.
///
/// # Errors
///
/// Fails if the manifest cannot be read or parsed, or an entry is invalid.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<SipCatalog> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        SipkitError::Catalog(format!(
            "Failed to read catalog {}: {}",
            path.display(),
            e
        ))
    })?;

    let manifest: CatalogManifest = serde_json::from_str(&contents).map_err(|e| {
        SipkitError::Catalog(format!(
            "Failed to parse catalog {}: {}",
            path.display(),
            e
        ))
    })?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut catalog = SipCatalog::new();
    for entry in &manifest.sips {
        catalog.add(entry.to_domain(base_dir)?, entry.selected)?;
    }

    tracing::info!(
        path = %path.display(),
        entries = catalog.len(),
        selected = catalog.selected_count(),
        "Catalog loaded"
    );

    Ok(catalog)
}
