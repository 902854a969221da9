//! Result type alias for sipkit
//!
//! This module provides a convenient Result type alias that uses SipkitError
//! as the error type.

use super::errors::SipkitError;

/// Result type alias for sipkit operations
///
/// # Examples
///
/// ```
/// use sipkit::domain::result::Result;
/// use sipkit::domain::errors::SipkitError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(SipkitError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, SipkitError>;
