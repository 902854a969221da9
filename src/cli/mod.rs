//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for sipkit using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// sipkit - SIP packaging tool (BagIt and E-ARK)
#[derive(Parser, Debug)]
#[command(name = "sipkit")]
#[command(version, about, long_about = None)]
#[command(author = "Sipkit Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "sipkit.toml", env = "SIPKIT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SIPKIT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Package the SIPs of a catalog
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
