//! Domain identifier types with validation
//!
//! Newtype wrappers keep SIP identifiers and classification node identifiers
//! from being mixed up. Both are opaque strings assigned by the cataloguing layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SIP identifier newtype wrapper
///
/// Identifies one Submission Information Package. The value is used as the
/// METS `OBJID` and as the package name under the `id` naming policy.
///
/// # Examples
///
/// ```
/// use sipkit::domain::ids::SipId;
/// use std::str::FromStr;
///
/// let sip_id = SipId::from_str("uuid-4f2a").unwrap();
/// assert_eq!(sip_id.as_str(), "uuid-4f2a");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SipId(String);

impl SipId {
    /// Creates a new SipId from a string
    ///
    /// Returns `Err` if the identifier is empty or only whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("SIP ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the SIP ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SipId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SipId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SipId> for String {
    fn from(id: SipId) -> Self {
        id.0
    }
}

impl AsRef<str> for SipId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Classification node identifier newtype wrapper
///
/// References the node of the classification hierarchy a SIP is filed under.
/// Within the core it is only ever written out as the package's parent reference.
///
/// # Examples
///
/// ```
/// use sipkit::domain::ids::ClassificationId;
/// use std::str::FromStr;
///
/// let parent = ClassificationId::from_str("fonds-01").unwrap();
/// assert_eq!(parent.to_string(), "fonds-01");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClassificationId(String);

impl ClassificationId {
    /// Creates a new ClassificationId from a string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Classification ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the classification ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ClassificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClassificationId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ClassificationId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClassificationId> for String {
    fn from(id: ClassificationId) -> Self {
        id.0
    }
}

impl AsRef<str> for ClassificationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
