//! Export job: the sequential worker loop
//!
//! Runs every SIP through the configured [`PackageBuilder`] one at a time.
//! A failing SIP is recorded and the loop moves on. Cancellation is checked
//! once before each SIP; the SIP in progress always runs to completion.

use super::progress::ProgressTracker;
use super::summary::{ExportError, ExportSummary};
use crate::core::package::{BuildObserver, PackageBuilder};
use crate::domain::SipDefinition;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// One export run over a fixed list of SIPs
pub struct ExportJob {
    sips: Vec<Arc<SipDefinition>>,
    builder: PackageBuilder,
    tracker: ProgressTracker,
    cancel: watch::Receiver<bool>,
}

impl ExportJob {
    pub fn new(
        sips: Vec<Arc<SipDefinition>>,
        builder: PackageBuilder,
        tracker: ProgressTracker,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        Self {
            sips,
            builder,
            tracker,
            cancel,
        }
    }

    /// Processes every SIP and returns the final summary
    ///
    /// Blocks on file I/O; run it on a blocking thread.
    pub fn run(self) -> ExportSummary {
        self.process(&self.tracker)
    }

    /// Worker loop with builder notifications routed to `observer`
    fn process(&self, observer: &dyn BuildObserver) -> ExportSummary {
        let start_time = Instant::now();
        let total = self.sips.len();
        let mut summary = ExportSummary::new(total);
        let mut canceled = false;

        tracing::info!(
            total,
            format = %self.builder.format(),
            output = %self.builder.output_root().display(),
            "Starting export"
        );
        self.tracker.start();

        for sip in &self.sips {
            if *self.cancel.borrow() {
                tracing::info!(
                    processed = summary.created + summary.failed_count(),
                    total,
                    "Export canceled"
                );
                canceled = true;
                break;
            }

            let item_start = Instant::now();
            self.tracker.begin_item(&sip.name);
            crate::log_sip_start!(sip.id, sip.name);

            match self.builder.create(sip, observer) {
                Ok(path) => {
                    crate::log_sip_complete!(sip.id, path, item_start.elapsed());
                    summary.record_created(path);
                    self.tracker.item_created();
                }
                Err(e) => {
                    tracing::error!(
                        sip_id = %sip.id,
                        sip_name = %sip.name,
                        error = %e,
                        "Failed to create SIP"
                    );
                    let error =
                        ExportError::from_error(&e).with_context(format!("sip_id={}", sip.id));
                    summary.record_failure(Arc::clone(sip), error);
                    self.tracker.item_failed();
                }
            }

            crate::log_export_progress!(summary.created + summary.failed_count(), total);
        }

        summary.canceled = canceled;
        self.tracker.finish(canceled);

        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::export::progress::{ExportPhase, JobState};
    use crate::core::package::{PackageFormat, PackageNaming};
    use crate::domain::{FileTreeNode, SipId};
    use std::cell::Cell;
    use std::fs;
    use std::sync::mpsc;
    use tempfile::TempDir;

    /// Holds the worker inside the payload copy of the `hold_at`-th SIP
    struct Gate {
        copies: Cell<usize>,
        hold_at: usize,
        reached: mpsc::Sender<()>,
        release: mpsc::Receiver<()>,
    }

    impl BuildObserver for Gate {
        fn phase_changed(&self, phase: ExportPhase) {
            if phase != ExportPhase::CopyingData {
                return;
            }
            self.copies.set(self.copies.get() + 1);
            if self.copies.get() == self.hold_at {
                self.reached.send(()).unwrap();
                self.release.recv().unwrap();
            }
        }

        fn files_done(&self, _done: usize, _total: usize) {}
    }

    fn sip_with_file(id: &str, file: &std::path::Path) -> Arc<SipDefinition> {
        Arc::new(
            SipDefinition::builder()
                .id(SipId::new(id).unwrap())
                .file(FileTreeNode::file(file))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_failure_is_isolated() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let present = src.path().join("present.txt");
        fs::write(&present, b"here").unwrap();
        let missing = src.path().join("missing.txt");

        let sips = vec![sip_with_file("ok", &present), sip_with_file("broken", &missing)];
        let builder = PackageBuilder::new(
            PackageFormat::Bagit,
            out.path(),
            PackageNaming::default(),
            false,
        );
        let (tracker, rx) = ProgressTracker::new(sips.len());
        let (_cancel_tx, cancel_rx) = watch::channel(false);

        let summary = ExportJob::new(sips, builder, tracker, cancel_rx).run();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.failed_count(), 1);
        assert_eq!(summary.failed[0].id.as_str(), "broken");
        assert_eq!(summary.packages, vec![out.path().join("ok")]);
        assert!(!summary.canceled);

        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.state, JobState::Completed);
        assert_eq!(snapshot.created + snapshot.failed, 2);
        assert_eq!(snapshot.fraction(), 1.0);
    }

    #[test]
    fn test_cancel_before_start_processes_nothing() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let file = src.path().join("a.txt");
        fs::write(&file, b"a").unwrap();

        let sips = vec![sip_with_file("a", &file), sip_with_file("b", &file)];
        let builder = PackageBuilder::new(
            PackageFormat::Eark,
            out.path(),
            PackageNaming::default(),
            false,
        );
        let (tracker, rx) = ProgressTracker::new(sips.len());
        let (cancel_tx, cancel_rx) = watch::channel(false);
        cancel_tx.send(true).unwrap();

        let summary = ExportJob::new(sips, builder, tracker, cancel_rx).run();

        assert!(summary.canceled);
        assert_eq!(summary.created, 0);
        assert_eq!(summary.skipped(), 2);
        assert_eq!(rx.borrow().state, JobState::Canceled);
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_cancel_lets_current_sip_finish_and_starts_no_other() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let file = src.path().join("plain.txt");
        fs::write(&file, b"plain").unwrap();

        let sips = vec![
            sip_with_file("first", &file),
            sip_with_file("second", &file),
            sip_with_file("third", &file),
            sip_with_file("fourth", &file),
        ];
        let builder = PackageBuilder::new(
            PackageFormat::Bagit,
            out.path(),
            PackageNaming::default(),
            false,
        );
        let (tracker, rx) = ProgressTracker::new(sips.len());
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (reached_tx, reached_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let job = ExportJob::new(sips, builder, tracker, cancel_rx);

        let worker = std::thread::spawn(move || {
            let gate = Gate {
                copies: Cell::new(0),
                hold_at: 2,
                reached: reached_tx,
                release: release_rx,
            };
            job.process(&gate)
        });

        reached_rx.recv().unwrap();
        assert_eq!(rx.borrow().created, 1);
        assert_eq!(rx.borrow().current_name.as_deref(), Some("second"));
        cancel_tx.send_replace(true);
        release_tx.send(()).unwrap();
        let summary = worker.join().unwrap();

        assert!(summary.canceled);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.created, 2);
        assert_eq!(summary.skipped(), 2);
        assert_eq!(
            fs::read_to_string(out.path().join("second/data/plain.txt")).unwrap(),
            "plain"
        );
        assert!(!out.path().join("third").exists());
        assert!(!out.path().join("fourth").exists());
        assert_eq!(rx.borrow().state, JobState::Canceled);
    }
}
