//! Domain error types
//!
//! This module defines the error hierarchy for sipkit.
//! Third-party error types are converted into domain variants at the boundary.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main sipkit error type
///
/// This is the primary error type used throughout the library.
#[derive(Debug, Error)]
pub enum SipkitError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Catalog (classification hierarchy) errors
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Package creation errors
    #[error("Package error: {0}")]
    Package(#[from] PackageError),

    /// Export process errors
    #[error("Export error: {0}")]
    Export(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Package-specific errors
///
/// Errors raised while building a single package. The export job records
/// them against the SIP being processed and moves on to the next one.
#[derive(Debug, Error)]
pub enum PackageError {
    /// A source file or directory could not be read
    #[error("Cannot read source {path}: {reason}")]
    SourceUnreadable { path: PathBuf, reason: String },

    /// The destination could not be written
    #[error("Cannot write destination {path}: {reason}")]
    DestinationUnwritable { path: PathBuf, reason: String },

    /// The target package already exists in the output directory
    #[error("Package already exists: {0}")]
    AlreadyExists(PathBuf),

    /// Archive encoding failed
    #[error("Archive error: {0}")]
    Archive(String),

    /// A source path has no final component to name it by, such as `/`
    #[error("Source path has no file name: {0}")]
    UnnamedSource(PathBuf),

    /// The computed package name cannot be used as a file name
    #[error("Invalid package name: {0}")]
    InvalidName(String),
}

impl PackageError {
    /// Builds a [`PackageError::SourceUnreadable`] from an I/O error
    pub fn source_unreadable(path: impl AsRef<Path>, err: std::io::Error) -> Self {
        Self::SourceUnreadable {
            path: path.as_ref().to_path_buf(),
            reason: err.to_string(),
        }
    }

    /// Builds a [`PackageError::DestinationUnwritable`] from an I/O error
    pub fn destination_unwritable(path: impl AsRef<Path>, err: std::io::Error) -> Self {
        Self::DestinationUnwritable {
            path: path.as_ref().to_path_buf(),
            reason: err.to_string(),
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for SipkitError {
    fn from(err: std::io::Error) -> Self {
        SipkitError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SipkitError {
    fn from(err: serde_json::Error) -> Self {
        SipkitError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for SipkitError {
    fn from(err: toml::de::Error) -> Self {
        SipkitError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from zip errors
impl From<zip::result::ZipError> for SipkitError {
    fn from(err: zip::result::ZipError) -> Self {
        SipkitError::Package(PackageError::Archive(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sipkit_error_display() {
        let err = SipkitError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_package_error_conversion() {
        let package_err = PackageError::AlreadyExists(PathBuf::from("/out/sip-1"));
        let err: SipkitError = package_err.into();
        assert!(matches!(err, SipkitError::Package(_)));
        assert!(err.to_string().contains("/out/sip-1"));
    }

    #[test]
    fn test_source_unreadable_keeps_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = PackageError::source_unreadable("/src/a.txt", io_err);
        match err {
            PackageError::SourceUnreadable { path, reason } => {
                assert_eq!(path, PathBuf::from("/src/a.txt"));
                assert_eq!(reason, "gone");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: SipkitError = io_err.into();
        assert!(matches!(err, SipkitError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: SipkitError = json_err.into();
        assert!(matches!(err, SipkitError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: SipkitError = toml_err.into();
        assert!(matches!(err, SipkitError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_zip_error_conversion() {
        let zip_err = zip::result::ZipError::FileNotFound;
        let err: SipkitError = zip_err.into();
        assert!(matches!(err, SipkitError::Package(PackageError::Archive(_))));
    }

    #[test]
    fn test_sipkit_error_implements_std_error() {
        let err = SipkitError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
