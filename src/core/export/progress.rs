//! Export progress publication
//!
//! The worker owns a [`ProgressTracker`] and is the only writer. Every change
//! is applied to a whole [`ProgressSnapshot`] and published through a
//! `tokio::sync::watch` channel, so readers never see a count from one
//! moment mixed with a phase from another.

use crate::core::package::BuildObserver;
use std::fmt;
use tokio::sync::watch;

/// Phase of the SIP currently being built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportPhase {
    CreatingStructure,
    CopyingData,
    CopyingMetadata,
    Finalizing,
}

impl ExportPhase {
    /// Human-readable description
    pub fn label(&self) -> &'static str {
        match self {
            Self::CreatingStructure => "Creating the SIP's directory structure",
            Self::CopyingData => "Copying the SIP's data",
            Self::CopyingMetadata => "Copying the SIP's metadata",
            Self::Finalizing => "Finalizing the SIP",
        }
    }
}

impl fmt::Display for ExportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle of an export run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Pending,
    Running,
    Completed,
    Canceled,
}

/// Consistent view of an export run at one instant
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressSnapshot {
    /// Number of SIPs in the run, fixed at start
    pub total: usize,
    /// SIPs written successfully
    pub created: usize,
    /// SIPs that failed
    pub failed: usize,
    /// Display name of the SIP in progress
    pub current_name: Option<String>,
    /// Phase of the SIP in progress
    pub phase: Option<ExportPhase>,
    /// Completed share of the SIP in progress, in `[0, 1]`
    pub item_fraction: f64,
    pub state: JobState,
}

impl ProgressSnapshot {
    /// SIPs that reached a final outcome
    pub fn processed(&self) -> usize {
        self.created + self.failed
    }

    /// Overall completion in `[0, 1]`
    ///
    /// Failed SIPs count as processed so the value never moves backwards.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return if self.is_done() { 1.0 } else { 0.0 };
        }
        let done = self.processed() as f64 + self.item_fraction;
        (done / self.total as f64).clamp(0.0, 1.0)
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, JobState::Completed | JobState::Canceled)
    }
}

/// Single-writer publisher of [`ProgressSnapshot`]s
#[derive(Debug)]
pub struct ProgressTracker {
    tx: watch::Sender<ProgressSnapshot>,
}

impl ProgressTracker {
    /// Creates a tracker for `total` SIPs and the receiving end of its channel
    pub fn new(total: usize) -> (Self, watch::Receiver<ProgressSnapshot>) {
        let (tx, rx) = watch::channel(ProgressSnapshot {
            total,
            ..ProgressSnapshot::default()
        });
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.tx.subscribe()
    }

    /// Current snapshot
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.tx.borrow().clone()
    }

    pub fn start(&self) {
        self.tx.send_modify(|s| s.state = JobState::Running);
    }

    pub fn begin_item(&self, name: &str) {
        self.tx.send_modify(|s| {
            s.current_name = Some(name.to_string());
            s.phase = None;
            s.item_fraction = 0.0;
        });
    }

    pub fn item_created(&self) {
        self.tx.send_modify(|s| {
            s.created += 1;
            s.item_fraction = 0.0;
        });
    }

    pub fn item_failed(&self) {
        self.tx.send_modify(|s| {
            s.failed += 1;
            s.item_fraction = 0.0;
        });
    }

    /// Marks the run terminal; no further changes are published
    pub fn finish(&self, canceled: bool) {
        self.tx.send_modify(|s| {
            s.state = if canceled {
                JobState::Canceled
            } else {
                JobState::Completed
            };
            s.current_name = None;
            s.phase = None;
            s.item_fraction = 0.0;
        });
    }
}

impl BuildObserver for ProgressTracker {
    fn phase_changed(&self, phase: ExportPhase) {
        self.tx.send_modify(|s| s.phase = Some(phase));
    }

    fn files_done(&self, done: usize, total: usize) {
        if total == 0 {
            return;
        }
        let fraction = (done as f64 / total as f64).min(1.0);
        self.tx.send_modify(|s| {
            if fraction > s.item_fraction {
                s.item_fraction = fraction;
            }
        });
    }
}
