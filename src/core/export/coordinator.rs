//! Export coordinator - user-facing orchestrator for an export run
//!
//! Resolves which SIPs to export, picks the package builder for the requested
//! format and runs the [`ExportJob`] on a blocking worker thread. While the
//! job runs, callers poll counts, progress and the remaining-time estimate.

use super::job::ExportJob;
use super::progress::{ExportPhase, ProgressSnapshot, ProgressTracker};
use super::summary::ExportSummary;
use crate::adapters::catalog::SipSource;
use crate::core::package::{NamingPolicy, PackageBuilder, PackageFormat, PackageNaming};
use crate::domain::{Result, SipDefinition, SipkitError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Which catalog entries a run covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportScope {
    /// Every SIP in the catalog
    #[default]
    All,
    /// Only the currently selected SIPs
    Selection,
}

impl ExportScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Selection => "selection",
        }
    }
}

impl fmt::Display for ExportScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "selection" => Ok(Self::Selection),
            other => Err(format!(
                "Invalid export scope '{}'. Must be 'all' or 'selection'",
                other
            )),
        }
    }
}

/// Everything needed to start an export run
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    /// Directory the packages are written to
    pub output_path: PathBuf,
    pub format: PackageFormat,
    pub scope: ExportScope,
    /// Also export non-leaf grouping items
    pub include_items: bool,
    /// Write a human-readable report into each bag
    pub create_report: bool,
    pub prefix: Option<String>,
    pub naming: NamingPolicy,
}

impl ExportRequest {
    /// Creates a request for every SIP with default naming and no report
    pub fn new(output_path: impl Into<PathBuf>, format: PackageFormat) -> Self {
        Self {
            output_path: output_path.into(),
            format,
            scope: ExportScope::All,
            include_items: false,
            create_report: false,
            prefix: None,
            naming: NamingPolicy::default(),
        }
    }

    pub fn package_naming(&self) -> PackageNaming {
        PackageNaming::new(self.naming, self.prefix.clone())
    }
}

/// Orchestrates one export run
///
/// # Example
///
/// ```rust,no_run
/// use sipkit::adapters::catalog::load_catalog;
/// use sipkit::core::export::{ExportCoordinator, ExportRequest};
/// use sipkit::core::package::PackageFormat;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let catalog = Arc::new(load_catalog("catalog.json")?);
/// let request = ExportRequest::new("/srv/export", PackageFormat::Bagit);
///
/// let mut coordinator = ExportCoordinator::new(request, catalog);
/// coordinator.start()?;
/// println!("{:.0}% done", coordinator.progress() * 100.0);
///
/// let summary = coordinator.wait().await?;
/// println!("Created {} of {}", summary.created, summary.total);
/// # Ok(())
/// # }
/// ```
pub struct ExportCoordinator {
    request: ExportRequest,
    source: Arc<dyn SipSource + Send + Sync>,
    cancel_tx: watch::Sender<bool>,
    progress: Option<watch::Receiver<ProgressSnapshot>>,
    started_at: Option<Instant>,
    handle: Option<JoinHandle<ExportSummary>>,
}

impl ExportCoordinator {
    /// Create a new export coordinator
    pub fn new(request: ExportRequest, source: Arc<dyn SipSource + Send + Sync>) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            request,
            source,
            cancel_tx,
            progress: None,
            started_at: None,
            handle: None,
        }
    }

    pub fn request(&self) -> &ExportRequest {
        &self.request
    }

    /// SIPs the run covers, in catalog order
    ///
    /// Grouping items are dropped unless the request includes them.
    pub fn resolve_sips(&self) -> Vec<Arc<SipDefinition>> {
        let sips = match self.request.scope {
            ExportScope::All => self.source.all_sips(),
            ExportScope::Selection => self.source.selected_sips(),
        };

        sips.into_iter()
            .filter(|sip| self.request.include_items || !sip.is_grouping())
            .map(Arc::new)
            .collect()
    }

    /// Starts the export in the background
    ///
    /// # Errors
    ///
    /// Fails when called outside a Tokio runtime, when called twice, or when
    /// the output directory cannot be created. Per-SIP failures never surface
    /// here.
    pub fn start(&mut self) -> Result<()> {
        if self.started_at.is_some() {
            return Err(SipkitError::Export(
                "Export has already been started".to_string(),
            ));
        }

        let runtime = Handle::try_current().map_err(|e| {
            SipkitError::Export(format!("Export must be started inside a runtime: {}", e))
        })?;

        std::fs::create_dir_all(&self.request.output_path).map_err(|e| {
            SipkitError::Export(format!(
                "Cannot create output directory {}: {}",
                self.request.output_path.display(),
                e
            ))
        })?;

        let sips = self.resolve_sips();
        let builder = PackageBuilder::new(
            self.request.format,
            self.request.output_path.clone(),
            self.request.package_naming(),
            self.request.create_report,
        );
        let (tracker, progress) = ProgressTracker::new(sips.len());

        tracing::info!(
            total = sips.len(),
            scope = %self.request.scope,
            include_items = self.request.include_items,
            naming = %self.request.naming,
            "Resolved SIPs for export"
        );

        let job = ExportJob::new(sips, builder, tracker, self.cancel_tx.subscribe());
        self.started_at = Some(Instant::now());
        self.progress = Some(progress);
        self.handle = Some(runtime.spawn_blocking(move || job.run()));

        Ok(())
    }

    /// Requests cancellation
    ///
    /// The SIP in progress finishes; no further SIP is started.
    pub fn cancel(&self) {
        tracing::info!("Cancellation requested");
        self.cancel_tx.send_replace(true);
    }

    pub fn is_canceled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// Latest published snapshot; the default snapshot before `start`
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.progress
            .as_ref()
            .map(|rx| rx.borrow().clone())
            .unwrap_or_default()
    }

    pub fn total_count(&self) -> usize {
        self.snapshot().total
    }

    pub fn created_count(&self) -> usize {
        self.snapshot().created
    }

    pub fn error_count(&self) -> usize {
        self.snapshot().failed
    }

    /// Overall completion in `[0, 1]`
    pub fn progress(&self) -> f64 {
        self.snapshot().fraction()
    }

    pub fn current_sip_name(&self) -> Option<String> {
        self.snapshot().current_name
    }

    pub fn current_phase(&self) -> Option<ExportPhase> {
        self.snapshot().phase
    }

    pub fn is_done(&self) -> bool {
        self.snapshot().is_done()
    }

    /// Whether the worker thread has exited, normally or not
    pub fn worker_finished(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| h.is_finished())
    }

    /// Time since `start`, zero before it
    pub fn elapsed(&self) -> Duration {
        self.started_at
            .map(|started| started.elapsed())
            .unwrap_or_default()
    }

    /// Linear estimate of the time left
    pub fn time_remaining(&self) -> Option<Duration> {
        let snapshot = self.snapshot();
        estimate_remaining(self.elapsed(), snapshot.fraction(), snapshot.is_done())
    }

    /// Waits for the worker and returns the final summary
    ///
    /// # Errors
    ///
    /// Fails when the run was never started or the worker thread died.
    pub async fn wait(mut self) -> Result<ExportSummary> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| SipkitError::Export("Export has not been started".to_string()))?;

        handle
            .await
            .map_err(|e| SipkitError::Export(format!("Export worker failed: {}", e)))
    }
}

/// `elapsed * (1 / fraction - 1)`
///
/// `None` while nothing is done yet, zero once the run is finished.
pub fn estimate_remaining(elapsed: Duration, fraction: f64, done: bool) -> Option<Duration> {
    if done {
        return Some(Duration::ZERO);
    }
    if fraction.is_nan() || fraction <= 0.0 {
        return None;
    }
    let fraction = fraction.min(1.0);
    Duration::try_from_secs_f64(elapsed.as_secs_f64() * (1.0 / fraction - 1.0)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FileTreeNode, ItemKind, SipId};
    use std::fs;
    use tempfile::TempDir;

    struct FixedSource {
        all: Vec<SipDefinition>,
        selected: Vec<SipDefinition>,
    }

    impl SipSource for FixedSource {
        fn all_sips(&self) -> Vec<SipDefinition> {
            self.all.clone()
        }

        fn selected_sips(&self) -> Vec<SipDefinition> {
            self.selected.clone()
        }
    }

    fn sip(id: &str, kind: ItemKind, file: Option<&std::path::Path>) -> SipDefinition {
        let mut builder = SipDefinition::builder().id(SipId::new(id).unwrap()).kind(kind);
        if let Some(file) = file {
            builder = builder.file(FileTreeNode::file(file));
        }
        builder.build().unwrap()
    }

    fn source() -> Arc<FixedSource> {
        Arc::new(FixedSource {
            all: vec![
                sip("a", ItemKind::Sip, None),
                sip("group", ItemKind::Grouping, None),
                sip("b", ItemKind::Sip, None),
            ],
            selected: vec![sip("b", ItemKind::Sip, None)],
        })
    }

    fn ids(sips: &[Arc<SipDefinition>]) -> Vec<&str> {
        sips.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_scope_from_str() {
        assert_eq!("all".parse::<ExportScope>().unwrap(), ExportScope::All);
        assert_eq!(
            "Selection".parse::<ExportScope>().unwrap(),
            ExportScope::Selection
        );
        assert!("some".parse::<ExportScope>().is_err());
    }

    #[test]
    fn test_resolve_drops_groupings_by_default() {
        let coordinator =
            ExportCoordinator::new(ExportRequest::new("/tmp/out", PackageFormat::Bagit), source());
        assert_eq!(ids(&coordinator.resolve_sips()), vec!["a", "b"]);
    }

    #[test]
    fn test_resolve_includes_groupings_on_request() {
        let mut request = ExportRequest::new("/tmp/out", PackageFormat::Bagit);
        request.include_items = true;
        let coordinator = ExportCoordinator::new(request, source());
        assert_eq!(ids(&coordinator.resolve_sips()), vec!["a", "group", "b"]);
    }

    #[test]
    fn test_resolve_selection() {
        let mut request = ExportRequest::new("/tmp/out", PackageFormat::Eark);
        request.scope = ExportScope::Selection;
        let coordinator = ExportCoordinator::new(request, source());
        assert_eq!(ids(&coordinator.resolve_sips()), vec!["b"]);
    }

    #[test]
    fn test_estimate_remaining() {
        let elapsed = Duration::from_secs(30);
        assert_eq!(estimate_remaining(elapsed, 0.0, false), None);
        assert_eq!(
            estimate_remaining(elapsed, 0.25, false),
            Some(Duration::from_secs(90))
        );
        assert_eq!(
            estimate_remaining(elapsed, 1.0, false),
            Some(Duration::ZERO)
        );
        assert_eq!(estimate_remaining(elapsed, 0.0, true), Some(Duration::ZERO));
        assert_eq!(estimate_remaining(elapsed, f64::NAN, false), None);
    }

    #[test]
    fn test_accessors_before_start() {
        let coordinator =
            ExportCoordinator::new(ExportRequest::new("/tmp/out", PackageFormat::Bagit), source());
        assert_eq!(coordinator.total_count(), 0);
        assert_eq!(coordinator.progress(), 0.0);
        assert_eq!(coordinator.time_remaining(), None);
        assert!(!coordinator.is_done());
        assert!(!coordinator.is_canceled());
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let out = TempDir::new().unwrap();
        let mut coordinator =
            ExportCoordinator::new(ExportRequest::new(out.path(), PackageFormat::Bagit), source());
        assert!(matches!(coordinator.start(), Err(SipkitError::Export(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_to_completion() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let file = src.path().join("a.txt");
        fs::write(&file, b"payload").unwrap();

        let source = Arc::new(FixedSource {
            all: vec![
                sip("one", ItemKind::Sip, Some(&file)),
                sip("two", ItemKind::Sip, Some(&file)),
            ],
            selected: Vec::new(),
        });
        let mut coordinator = ExportCoordinator::new(
            ExportRequest::new(out.path().join("nested"), PackageFormat::Bagit),
            source,
        );
        coordinator.start().unwrap();
        assert!(coordinator.start().is_err());
        assert_eq!(coordinator.total_count(), 2);

        let summary = coordinator.wait().await.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.created, 2);
        assert!(summary.is_successful());
        assert!(out.path().join("nested/one/data/a.txt").is_file());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cancel_before_start() {
        let out = TempDir::new().unwrap();
        let mut coordinator =
            ExportCoordinator::new(ExportRequest::new(out.path(), PackageFormat::Eark), source());
        coordinator.cancel();
        coordinator.start().unwrap();

        let summary = coordinator.wait().await.unwrap();
        assert!(summary.canceled);
        assert_eq!(summary.created, 0);
        assert_eq!(summary.total, 2);
    }

    #[tokio::test]
    async fn test_wait_without_start_fails() {
        let coordinator =
            ExportCoordinator::new(ExportRequest::new("/tmp/out", PackageFormat::Bagit), source());
        assert!(coordinator.wait().await.is_err());
    }
}
