//! Export command implementation
//!
//! This module implements the `export` command, which packages the SIPs of a
//! catalog into BagIt or E-ARK packages.

use crate::adapters::catalog::load_catalog;
use crate::config::{load_config, SipkitConfig};
use crate::core::export::{ExportCoordinator, ExportSummary};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Arguments for the export command
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Catalog manifest (JSON) listing the SIPs
    #[arg(long, value_name = "FILE")]
    pub catalog: String,

    /// Override the output directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<String>,

    /// Override the package format (bagit or eark)
    #[arg(long)]
    pub format: Option<String>,

    /// Export only the selected SIPs
    #[arg(long)]
    pub selection: bool,

    /// Also export grouping items
    #[arg(long)]
    pub include_items: bool,

    /// Write a report into each bag
    #[arg(long)]
    pub report: bool,

    /// Prefix for package names
    #[arg(long)]
    pub prefix: Option<String>,

    /// Override the naming policy (title, id or id_title)
    #[arg(long)]
    pub naming: Option<String>,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl ExportArgs {
    /// Applies the command-line overrides to the loaded configuration
    pub fn apply_overrides(&self, config: &mut SipkitConfig) {
        if let Some(output) = &self.output {
            tracing::info!(output = %output, "Overriding output path from CLI");
            config.export.output_path = output.clone();
        }
        if let Some(format) = &self.format {
            tracing::info!(format = %format, "Overriding package format from CLI");
            config.export.format = format.to_lowercase();
        }
        if self.selection {
            config.export.scope = "selection".to_string();
        }
        if self.include_items {
            config.export.include_items = true;
        }
        if self.report {
            config.export.create_report = true;
        }
        if let Some(prefix) = &self.prefix {
            config.export.prefix = Some(prefix.clone());
        }
        if let Some(naming) = &self.naming {
            tracing::info!(naming = %naming, "Overriding naming policy from CLI");
            config.export.naming = naming.to_lowercase();
        }
    }

    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        mut shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                crate::log_error_with_context!(e, "Failed to load configuration");
                eprintln!("{e}");
                return Ok(2);
            }
        };

        self.apply_overrides(&mut config);

        let request = match config.export.to_request() {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Configuration validation failed");
                eprintln!("Configuration validation failed: {e}");
                return Ok(2);
            }
        };

        let catalog = match load_catalog(&self.catalog) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                crate::log_error_with_context!(
                    e,
                    format!("Failed to load catalog {}", self.catalog)
                );
                eprintln!("{e}");
                return Ok(2);
            }
        };

        let mut coordinator = ExportCoordinator::new(request, catalog);

        if !self.yes {
            let request = coordinator.request();
            println!("Export Configuration:");
            println!("  Output: {}", request.output_path.display());
            println!("  Format: {}", request.format);
            println!("  Scope: {}", request.scope);
            println!("  Include grouping items: {}", request.include_items);
            println!("  Naming: {}", request.naming);
            if let Some(prefix) = &request.prefix {
                println!("  Prefix: {prefix}");
            }
            println!("  SIPs: {}", coordinator.resolve_sips().len());
            println!();
            print!("Proceed with export? [y/N]: ");
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Export cancelled.");
                return Ok(0);
            }
        }

        if let Err(e) = coordinator.start() {
            tracing::error!(error = %e, "Failed to start export");
            eprintln!("Failed to start export: {e}");
            return Ok(5);
        }

        println!("🚀 Starting export of {} SIPs...", coordinator.total_count());
        println!();

        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        let mut last_line = String::new();
        let mut signal_open = true;
        while !coordinator.is_done() && !coordinator.worker_finished() {
            tokio::select! {
                _ = ticker.tick() => {
                    let line = progress_line(&coordinator);
                    if line != last_line {
                        println!("{line}");
                        last_line = line;
                    }
                }
                changed = shutdown_signal.changed(), if signal_open => {
                    if changed.is_err() {
                        signal_open = false;
                    } else if *shutdown_signal.borrow() {
                        coordinator.cancel();
                    }
                }
            }
        }

        let summary = match coordinator.wait().await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Export failed: {e}");
                return Ok(5);
            }
        };

        print_summary(&summary);
        Ok(exit_code(&summary))
    }
}

fn progress_line(coordinator: &ExportCoordinator) -> String {
    let snapshot = coordinator.snapshot();
    let mut line = format!(
        "[{:>5.1}%] {}/{} created, {} failed",
        snapshot.fraction() * 100.0,
        snapshot.created,
        snapshot.total,
        snapshot.failed
    );
    if let Some(name) = &snapshot.current_name {
        line.push_str(&format!(" | {name}"));
    }
    if let Some(phase) = snapshot.phase {
        line.push_str(&format!(": {phase}"));
    }
    line.push_str(&format!(
        " | ETA {}",
        format_eta(coordinator.time_remaining())
    ));
    line
}

/// `h:mm:ss`, or `--:--` while no estimate exists
pub fn format_eta(remaining: Option<Duration>) -> String {
    match remaining {
        Some(d) => {
            let secs = d.as_secs();
            format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
        }
        None => "--:--".to_string(),
    }
}

fn print_summary(summary: &ExportSummary) {
    println!();
    println!("📊 Export Summary:");
    println!("  Total SIPs: {}", summary.total);
    println!("  Created: {}", summary.created);
    println!("  Failed: {}", summary.failed_count());
    if summary.canceled {
        println!("  Skipped: {}", summary.skipped());
    }
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!("  Success Rate: {:.2}%", summary.success_rate());
    println!();

    if !summary.failed.is_empty() {
        println!("⚠️  Failed SIPs:");
        for (sip, error) in summary.failed.iter().zip(&summary.errors) {
            println!("  - {} ({}): {}", sip.id, sip.name, error.message);
        }
        println!();
    }
}

/// 130 when canceled, 1 when a SIP failed, 0 otherwise
pub fn exit_code(summary: &ExportSummary) -> i32 {
    if summary.canceled {
        println!("⚠️  Export canceled. SIPs already written are kept.");
        tracing::info!("Export canceled by user signal");
        130
    } else if !summary.failed.is_empty() {
        println!("⚠️  Export completed with failures");
        1
    } else {
        println!("✅ Export completed successfully!");
        0
    }
}
