//! Domain models and types for sipkit.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`SipId`], [`ClassificationId`])
//! - **Domain models** ([`SipDefinition`], [`FileTreeNode`])
//! - **Error types** ([`SipkitError`], [`PackageError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Identifiers are newtypes, so a classification id cannot be passed where a
//! SIP id is expected:
//!
//! ```rust
//! use sipkit::domain::{ClassificationId, SipId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let sip_id = SipId::new("sip-123")?;
//! let parent = ClassificationId::new("series-7")?;
//!
//! // This won't compile
//! // let wrong: SipId = parent;
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod file_tree;
pub mod ids;
pub mod result;
pub mod sip;

// Re-export commonly used types for convenience
pub use errors::{PackageError, SipkitError};
pub use file_tree::{FileTreeNode, NodeKind};
pub use ids::{ClassificationId, SipId};
pub use result::Result;
pub use sip::{ItemKind, MetadataFormat, SipDefinition, SipDefinitionBuilder};
