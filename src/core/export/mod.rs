//! Export job and orchestration
//!
//! This module provides the export run itself:
//! - The sequential [`ExportJob`] worker loop
//! - Progress snapshots published by the worker
//! - The [`ExportCoordinator`] facade callers start and poll
//! - Summary and reporting

pub mod coordinator;
pub mod job;
pub mod progress;
pub mod summary;

pub use coordinator::{estimate_remaining, ExportCoordinator, ExportRequest, ExportScope};
pub use job::ExportJob;
pub use progress::{ExportPhase, JobState, ProgressSnapshot, ProgressTracker};
pub use summary::{ExportError, ExportErrorType, ExportSummary};
