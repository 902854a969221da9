//! Cooperative cancellation of export runs
//!
//! Cancellation is observed once per SIP. A cancel that arrives after the
//! run has finished leaves the summary untouched.

use sipkit::adapters::catalog::SipCatalog;
use sipkit::core::export::{ExportCoordinator, ExportRequest, JobState};
use sipkit::core::package::PackageFormat;
use sipkit::domain::{FileTreeNode, SipDefinition, SipId};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn sip(id: &str, file: &Path) -> SipDefinition {
    SipDefinition::builder()
        .id(SipId::new(id).unwrap())
        .file(FileTreeNode::file(file))
        .build()
        .unwrap()
}

async fn wait_until<F: Fn() -> bool>(condition: F) {
    for _ in 0..2000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancel_after_completion_changes_nothing() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let file = src.path().join("a.txt");
    fs::write(&file, b"a").unwrap();

    let mut catalog = SipCatalog::new();
    catalog.add(sip("only", &file), true).unwrap();

    let mut coordinator = ExportCoordinator::new(
        ExportRequest::new(out.path(), PackageFormat::Eark),
        Arc::new(catalog),
    );
    coordinator.start().unwrap();
    wait_until(|| coordinator.is_done()).await;
    coordinator.cancel();
    assert_eq!(coordinator.snapshot().state, JobState::Completed);

    let summary = coordinator.wait().await.unwrap();
    assert!(!summary.canceled);
    assert_eq!(summary.created, 1);
    assert!(summary.is_successful());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_progress_never_moves_backwards() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let present = src.path().join("a.txt");
    fs::write(&present, vec![b'x'; 64 * 1024]).unwrap();
    let missing = src.path().join("missing.txt");

    let mut catalog = SipCatalog::new();
    for i in 0..12 {
        let file = if i % 3 == 0 { &missing } else { &present };
        catalog.add(sip(&format!("sip-{i}"), file), false).unwrap();
    }

    let mut coordinator = ExportCoordinator::new(
        ExportRequest::new(out.path(), PackageFormat::Bagit),
        Arc::new(catalog),
    );
    coordinator.start().unwrap();

    let mut last = 0.0;
    while !coordinator.is_done() {
        let progress = coordinator.progress();
        assert!((0.0..=1.0).contains(&progress));
        assert!(progress >= last, "progress went from {last} to {progress}");
        last = progress;
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert_eq!(coordinator.progress(), 1.0);

    let summary = coordinator.wait().await.unwrap();
    assert_eq!(summary.created, 8);
    assert_eq!(summary.failed_count(), 4);
}
