//! Catalog adapter
//!
//! This module provides the classification-hierarchy boundary: the
//! [`SipSource`] trait the export coordinator consumes and a catalog loaded
//! from a JSON manifest.

pub mod models;
pub mod source;

pub use models::{CatalogEntry, CatalogItemKind, CatalogManifest, CatalogMetadata};
pub use source::{load_catalog, SipCatalog, SipSource};
