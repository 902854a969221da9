//! Configuration schema types
//!
//! This module defines the configuration structure for sipkit. Enumerated
//! settings are kept as strings so that validation can report the offending
//! value; [`ExportConfig::to_request`] parses them into typed values.

use crate::core::export::{ExportRequest, ExportScope};
use crate::core::package::{NamingPolicy, PackageFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main sipkit configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipkitConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Export settings
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SipkitConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.export.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory the packages are written to
    pub output_path: String,

    /// Package format (bagit, eark)
    #[serde(default = "default_format")]
    pub format: String,

    /// Which SIPs to export (all, selection)
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Also export non-leaf grouping items
    #[serde(default)]
    pub include_items: bool,

    /// Write a human-readable report into each bag
    #[serde(default)]
    pub create_report: bool,

    /// Optional prefix for package names
    #[serde(default)]
    pub prefix: Option<String>,

    /// Naming policy (title, id, id_title)
    #[serde(default = "default_naming")]
    pub naming: String,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.output_path.trim().is_empty() {
            return Err("export.output_path cannot be empty".to_string());
        }

        let valid_formats = ["bagit", "eark"];
        if !valid_formats.contains(&self.format.as_str()) {
            return Err(format!(
                "Invalid export.format '{}'. Must be one of: {}",
                self.format,
                valid_formats.join(", ")
            ));
        }

        let valid_scopes = ["all", "selection"];
        if !valid_scopes.contains(&self.scope.as_str()) {
            return Err(format!(
                "Invalid export.scope '{}'. Must be one of: {}",
                self.scope,
                valid_scopes.join(", ")
            ));
        }

        let valid_naming = ["title", "id", "id_title"];
        if !valid_naming.contains(&self.naming.as_str()) {
            return Err(format!(
                "Invalid export.naming '{}'. Must be one of: {}",
                self.naming,
                valid_naming.join(", ")
            ));
        }

        if let Some(prefix) = &self.prefix {
            if prefix.contains(['/', '\\']) {
                return Err(format!(
                    "export.prefix '{}' must not contain path separators",
                    prefix
                ));
            }
        }

        Ok(())
    }

    /// Builds the export request described by this section
    ///
    /// # Errors
    ///
    /// Returns an error if the section does not validate.
    pub fn to_request(&self) -> Result<ExportRequest, String> {
        self.validate()?;

        let format: PackageFormat = self.format.parse()?;
        let scope: ExportScope = self.scope.parse()?;
        let naming: NamingPolicy = self.naming.parse()?;

        Ok(ExportRequest {
            output_path: PathBuf::from(&self.output_path),
            format,
            scope,
            include_items: self.include_items,
            create_report: self.create_report,
            prefix: self.prefix.clone(),
            naming,
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Directory of the log files
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_format() -> String {
    "bagit".to_string()
}

fn default_scope() -> String {
    "all".to_string()
}

fn default_naming() -> String {
    "id".to_string()
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
