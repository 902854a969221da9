//! Export summary and reporting
//!
//! This module defines structures for tracking and reporting export results.

use crate::domain::{PackageError, SipDefinition, SipkitError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Summary of an export run
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Number of SIPs selected for the run
    pub total: usize,

    /// Number of packages written
    pub created: usize,

    /// SIPs that could not be packaged, in processing order
    pub failed: Vec<Arc<SipDefinition>>,

    /// One entry per failed SIP
    pub errors: Vec<ExportError>,

    /// Paths of the packages written
    pub packages: Vec<PathBuf>,

    /// Whether the run stopped early on request
    pub canceled: bool,

    /// Duration of the run
    pub duration: Duration,
}

impl ExportSummary {
    /// Create an empty summary for a run of `total` SIPs
    pub fn new(total: usize) -> Self {
        Self {
            total,
            created: 0,
            failed: Vec::new(),
            errors: Vec::new(),
            packages: Vec::new(),
            canceled: false,
            duration: Duration::from_secs(0),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Record a written package
    pub fn record_created(&mut self, package: PathBuf) {
        self.created += 1;
        self.packages.push(package);
    }

    /// Record a SIP that failed along with its error
    pub fn record_failure(&mut self, sip: Arc<SipDefinition>, error: ExportError) {
        self.failed.push(sip);
        self.errors.push(error);
    }

    /// Number of failed SIPs
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// SIPs that were never attempted because the run was canceled
    pub fn skipped(&self) -> usize {
        self.total
            .saturating_sub(self.created + self.failed_count())
    }

    /// Check if every SIP was written
    pub fn is_successful(&self) -> bool {
        !self.canceled && self.failed.is_empty() && self.created == self.total
    }

    /// Get success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.created as f64 / self.total as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            total = self.total,
            created = self.created,
            failed = self.failed_count(),
            skipped = self.skipped(),
            canceled = self.canceled,
            duration_secs = self.duration.as_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Export finished"
        );

        if !self.errors.is_empty() {
            tracing::warn!(
                error_count = self.errors.len(),
                "Export completed with errors"
            );
            for error in &self.errors {
                tracing::warn!(
                    error_type = ?error.error_type,
                    message = %error.message,
                    context = error.context.as_deref().unwrap_or(""),
                    "Export error"
                );
            }
        }
    }
}

impl Default for ExportSummary {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Type of export error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportErrorType {
    /// Reading a source or writing the destination failed
    Io,
    /// Package assembly failed (naming, existing target, archive encoding)
    Package,
    /// Serialization error
    Serialization,
    /// Unknown error
    Unknown,
}

/// Export error with context
#[derive(Debug, Clone)]
pub struct ExportError {
    /// Type of error
    pub error_type: ExportErrorType,

    /// Error message
    pub message: String,

    /// Optional context (e.g., SIP ID)
    pub context: Option<String>,
}

impl ExportError {
    /// Create a new export error
    pub fn new(error_type: ExportErrorType, message: String) -> Self {
        Self {
            error_type,
            message,
            context: None,
        }
    }

    /// Classify a domain error
    pub fn from_error(error: &SipkitError) -> Self {
        let error_type = match error {
            SipkitError::Io(_)
            | SipkitError::Package(PackageError::SourceUnreadable { .. })
            | SipkitError::Package(PackageError::DestinationUnwritable { .. }) => {
                ExportErrorType::Io
            }
            SipkitError::Package(_) => ExportErrorType::Package,
            SipkitError::Serialization(_) => ExportErrorType::Serialization,
            _ => ExportErrorType::Unknown,
        };
        Self::new(error_type, error.to_string())
    }

    /// Add context to the error
    pub fn with_context(mut self, context: String) -> Self {
        self.context = Some(context);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SipId;

    fn sip(id: &str) -> Arc<SipDefinition> {
        Arc::new(
            SipDefinition::builder()
                .id(SipId::new(id).unwrap())
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_export_summary_creation() {
        let summary = ExportSummary::new(3);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.created, 0);
        assert!(summary.failed.is_empty());
        assert!(summary.packages.is_empty());
        assert!(!summary.canceled);
        assert_eq!(summary.duration, Duration::from_secs(0));
    }

    #[test]
    fn test_export_summary_with_duration() {
        let summary = ExportSummary::new(0).with_duration(Duration::from_secs(120));
        assert_eq!(summary.duration, Duration::from_secs(120));
    }

    #[test]
    fn test_export_summary_counts() {
        let mut summary = ExportSummary::new(3);
        summary.record_created(PathBuf::from("/out/a"));
        summary.record_failure(
            sip("b"),
            ExportError::new(ExportErrorType::Io, "gone".to_string()),
        );

        assert_eq!(summary.created, 1);
        assert_eq!(summary.failed_count(), 1);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.failed[0].id.as_str(), "b");
        assert!(!summary.is_successful());
    }

    #[test]
    fn test_export_summary_success_rate() {
        let mut summary = ExportSummary::new(4);
        summary.created = 3;
        assert_eq!(summary.success_rate(), 75.0);

        let empty = ExportSummary::new(0);
        assert_eq!(empty.success_rate(), 100.0);
        assert!(empty.is_successful());
    }

    #[test]
    fn test_export_error_with_context() {
        let error = ExportError::new(ExportErrorType::Package, "exists".to_string())
            .with_context("sip_id=sip-1".to_string());

        assert_eq!(error.error_type, ExportErrorType::Package);
        assert_eq!(error.context, Some("sip_id=sip-1".to_string()));
    }

    #[test]
    fn test_export_error_classification() {
        let io = SipkitError::Package(PackageError::SourceUnreadable {
            path: PathBuf::from("/a"),
            reason: "gone".to_string(),
        });
        assert_eq!(ExportError::from_error(&io).error_type, ExportErrorType::Io);

        let exists = SipkitError::Package(PackageError::AlreadyExists(PathBuf::from("/out/a")));
        assert_eq!(
            ExportError::from_error(&exists).error_type,
            ExportErrorType::Package
        );

        let ser = SipkitError::Serialization("bad".to_string());
        assert_eq!(
            ExportError::from_error(&ser).error_type,
            ExportErrorType::Serialization
        );

        let other = SipkitError::Other("?".to_string());
        assert_eq!(
            ExportError::from_error(&other).error_type,
            ExportErrorType::Unknown
        );
    }
}
