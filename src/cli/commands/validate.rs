//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the sipkit configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading also validates
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Output Path: {}", config.export.output_path);
        println!("  Format: {}", config.export.format);
        println!("  Scope: {}", config.export.scope);
        println!("  Include Grouping Items: {}", config.export.include_items);
        println!("  Create Report: {}", config.export.create_report);
        println!("  Naming: {}", config.export.naming);
        if let Some(prefix) = &config.export.prefix {
            println!("  Prefix: {prefix}");
        }
        if config.logging.local_enabled {
            println!(
                "  Log Files: {} ({})",
                config.logging.local_path, config.logging.local_rotation
            );
        }
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_validate_exit_codes() {
        let mut valid = NamedTempFile::new().unwrap();
        valid
            .write_all(b"[export]\noutput_path = \"/srv/export\"\n")
            .unwrap();
        let path = valid.path().to_string_lossy().into_owned();
        assert_eq!(ValidateArgs {}.execute(&path).await.unwrap(), 0);

        let mut invalid = NamedTempFile::new().unwrap();
        invalid
            .write_all(b"[export]\noutput_path = \"/srv/export\"\nnaming = \"date\"\n")
            .unwrap();
        let path = invalid.path().to_string_lossy().into_owned();
        assert_eq!(ValidateArgs {}.execute(&path).await.unwrap(), 2);

        assert_eq!(
            ValidateArgs {}.execute("missing-sipkit.toml").await.unwrap(),
            2
        );
    }
}
