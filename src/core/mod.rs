//! Core business logic for sipkit.
//!
//! # Modules
//!
//! - [`metadata`] - Descriptive metadata field extraction and reports
//! - [`tree`] - File tree walking, copying and digests
//! - [`package`] - BagIt and E-ARK package builders
//! - [`export`] - Export job, progress and orchestration
//!
//! # Export Workflow
//!
//! 1. **Resolve**: The coordinator asks the catalog for all or the selected SIPs
//! 2. **Build**: The job hands each SIP to the package builder, one at a time
//! 3. **Observe**: The builder reports phases and file progress to the tracker
//! 4. **Isolate**: A failing SIP is recorded and the job moves on
//! 5. **Report**: The job returns an export summary

pub mod export;
pub mod metadata;
pub mod package;
pub mod tree;
