//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "sipkit.toml")]
    pub output: String,

    /// Include explanatory comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing sipkit configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} and set export.output_path", self.output);
                println!("  2. Write a catalog manifest listing your SIPs");
                println!("  3. Validate configuration: sipkit validate-config");
                println!("  4. Run export: sipkit export --catalog catalog.json");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# sipkit configuration file

[application]
log_level = "info"

[export]
output_path = "./packages"
format = "bagit"
scope = "all"
include_items = false
create_report = false
naming = "id"

[logging]
local_enabled = true
local_path = "./logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with comments
    fn generate_config_with_examples() -> String {
        r#"# sipkit configuration file
#
# Values may reference environment variables with ${VAR_NAME}. Every key can
# also be overridden with SIPKIT_<SECTION>_<KEY>, for example
# SIPKIT_EXPORT_OUTPUT_PATH.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Export Configuration
# ============================================================================
[export]
# Directory the packages are written to (created if missing)
output_path = "./packages"

# Package format: "bagit" or "eark"
# - bagit: one BagIt directory per SIP
# - eark: one zipped E-ARK container per SIP
format = "bagit"

# Which SIPs to export: "all" or "selection"
scope = "all"

# Also export grouping items that contain other items
include_items = false

# Write report.txt with the extracted descriptive metadata into each bag
create_report = false

# Package naming: "title", "id" or "id_title"
naming = "id"

# Optional prefix, joined to the name as "<prefix> - <name>"
# prefix = "ACME"

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable JSON file logging
local_enabled = true

# Directory of the log files
local_path = "./logs"

# Log rotation (daily, hourly or never)
local_rotation = "daily"
"#
        .to_string()
    }
}
