//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::SipkitConfig;
use crate::domain::{Result, SipkitError};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static ENV_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("placeholder pattern is valid")
});

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into SipkitConfig
/// 4. Applies environment variable overrides (SIPKIT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use sipkit::config::loader::load_config;
///
/// let config = load_config("sipkit.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SipkitConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SipkitError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SipkitError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let config = parse_config(&contents)?;
    tracing::debug!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Parses and validates configuration text
///
/// Same pipeline as [`load_config`] without the file access.
///
/// # Errors
///
/// Returns an error on a missing environment variable, invalid TOML, or a
/// value that fails validation.
pub fn parse_config(contents: &str) -> Result<SipkitConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: SipkitConfig = toml::from_str(&contents)
        .map_err(|e| SipkitError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        SipkitError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied unchanged.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let mut missing_vars: Vec<String> = Vec::new();

    let lines: Vec<String> = input
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                return line.to_string();
            }
            ENV_PLACEHOLDER
                .replace_all(line, |cap: &regex::Captures<'_>| {
                    let var_name = &cap[1];
                    match std::env::var(var_name) {
                        Ok(value) => value,
                        Err(_) => {
                            if !missing_vars.iter().any(|v| v == var_name) {
                                missing_vars.push(var_name.to_string());
                            }
                            cap[0].to_string()
                        }
                    }
                })
                .into_owned()
        })
        .collect();

    if !missing_vars.is_empty() {
        return Err(SipkitError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    let mut result = lines.join("\n");
    if input.ends_with('\n') {
        result.push('\n');
    }
    Ok(result)
}

/// Applies environment variable overrides using the SIPKIT_* prefix
///
/// Environment variables follow the pattern: SIPKIT_<SECTION>_<KEY>
/// For example: SIPKIT_EXPORT_OUTPUT_PATH, SIPKIT_EXPORT_FORMAT
fn apply_env_overrides(config: &mut SipkitConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("SIPKIT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Export overrides
    if let Ok(val) = std::env::var("SIPKIT_EXPORT_OUTPUT_PATH") {
        config.export.output_path = val;
    }
    if let Ok(val) = std::env::var("SIPKIT_EXPORT_FORMAT") {
        config.export.format = val;
    }
    if let Ok(val) = std::env::var("SIPKIT_EXPORT_SCOPE") {
        config.export.scope = val;
    }
    if let Ok(val) = std::env::var("SIPKIT_EXPORT_INCLUDE_ITEMS") {
        config.export.include_items = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("SIPKIT_EXPORT_CREATE_REPORT") {
        config.export.create_report = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("SIPKIT_EXPORT_PREFIX") {
        config.export.prefix = Some(val);
    }
    if let Ok(val) = std::env::var("SIPKIT_EXPORT_NAMING") {
        config.export.naming = val;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("SIPKIT_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("SIPKIT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("SIPKIT_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }
}
