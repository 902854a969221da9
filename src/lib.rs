// Sipkit - SIP packaging for BagIt and E-ARK
// Copyright (c) 2025 Sipkit Contributors
// Licensed under the MIT License

//! # Sipkit - Submission Information Package export
//!
//! Sipkit turns catalogued records (a file tree plus descriptive metadata)
//! into archival Submission Information Packages.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Packaging** SIPs as BagIt directories or zipped E-ARK containers
//! - **Extracting** flat field maps from descriptive metadata, with a total
//!   fallback for malformed input
//! - **Running** exports on a background worker with poll-based progress,
//!   a remaining-time estimate and cooperative cancellation
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (metadata, tree walking, packaging, export)
//! - [`adapters`] - The catalog that supplies SIP definitions
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sipkit::adapters::catalog::load_catalog;
//! use sipkit::config::load_config;
//! use sipkit::core::export::ExportCoordinator;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("sipkit.toml")?;
//!     let request = config.export.to_request()?;
//!     let catalog = Arc::new(load_catalog("catalog.json")?);
//!
//!     let mut coordinator = ExportCoordinator::new(request, catalog);
//!     coordinator.start()?;
//!     let summary = coordinator.wait().await?;
//!
//!     println!("Created {} of {} SIPs", summary.created, summary.total);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return [`domain::Result`], whose error is
//! [`domain::SipkitError`]. Failures of a single SIP never abort a run; they
//! are collected in the [`core::export::ExportSummary`].

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
