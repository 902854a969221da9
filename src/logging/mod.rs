//! Logging and observability
//!
//! Structured logging through `tracing`, with:
//! - Console output with configurable log levels
//! - Optional JSON log files with rotation
//!
//! # Example
//!
//! ```no_run
//! use sipkit::logging::init_logging;
//! use sipkit::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a SIP
///
/// # Example
///
/// ```no_run
/// use sipkit::log_sip_start;
/// use sipkit::domain::SipId;
///
/// let sip_id = SipId::new("sip-123").unwrap();
/// log_sip_start!(&sip_id, "Annual report");
/// ```
#[macro_export]
macro_rules! log_sip_start {
    ($sip_id:expr, $sip_name:expr) => {
        tracing::info!(
            sip_id = %$sip_id,
            sip_name = %$sip_name,
            "Creating SIP"
        );
    };
}

/// Log a successfully written SIP
///
/// # Example
///
/// ```no_run
/// use sipkit::log_sip_complete;
/// use std::path::Path;
/// use std::time::Duration;
///
/// log_sip_complete!("sip-123", Path::new("/out/sip-123"), Duration::from_millis(250));
/// ```
#[macro_export]
macro_rules! log_sip_complete {
    ($sip_id:expr, $path:expr, $duration:expr) => {
        tracing::info!(
            sip_id = %$sip_id,
            path = %$path.display(),
            duration_ms = $duration.as_millis() as u64,
            "SIP created"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use sipkit::log_error_with_context;
/// use sipkit::domain::SipkitError;
///
/// let error = SipkitError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = %$context,
            "Error occurred"
        );
    };
}

/// Log overall export progress
///
/// # Example
///
/// ```no_run
/// use sipkit::log_export_progress;
///
/// log_export_progress!(10, 250);
/// ```
#[macro_export]
macro_rules! log_export_progress {
    ($processed:expr, $total:expr) => {
        tracing::debug!(
            processed = $processed,
            total = $total,
            progress_pct = if $total == 0 {
                100.0
            } else {
                $processed as f64 / $total as f64 * 100.0
            },
            "Export progress"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::{SipId, SipkitError};
    use std::path::Path;
    use std::time::Duration;

    #[test]
    fn test_macros_expand() {
        let sip_id = SipId::new("sip-1").unwrap();
        log_sip_start!(&sip_id, "Letters");
        log_sip_complete!(&sip_id, Path::new("/out/sip-1"), Duration::from_millis(5));
        log_error_with_context!(SipkitError::Other("boom".to_string()), "while testing");
        log_export_progress!(1usize, 4usize);
        log_export_progress!(0usize, 0usize);
    }
}
