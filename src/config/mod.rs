//! Configuration management for sipkit.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! sipkit uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `SIPKIT_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation of every enumerated setting
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sipkit::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("sipkit.toml")?;
//!
//! println!("Output: {}", config.export.output_path);
//! println!("Format: {}", config.export.format);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (log level)
//! - [`ExportConfig`] - Export settings (output, format, scope, naming)
//! - [`LoggingConfig`] - Logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [export]
//! output_path = "${SIPKIT_OUTPUT}"
//! format = "eark"
//! scope = "selection"
//! naming = "id_title"
//! prefix = "ACME"
//!
//! [logging]
//! local_enabled = true
//! local_path = "./logs"
//! local_rotation = "daily"
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{ApplicationConfig, ExportConfig, LoggingConfig, SipkitConfig};
