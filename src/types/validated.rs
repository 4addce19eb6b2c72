//! Validated configuration values and their error type

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Validation errors for configuration values
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("hostname cannot be empty or whitespace")]
    EmptyHostName,

    #[error("port cannot be 0")]
    InvalidPort,

    #[error("connection capacity cannot be 0")]
    ZeroCapacity,

    #[error("invalid number: {0}")]
    InvalidNumber(String),
}

/// Host a pool dials, as written in the configuration
///
/// Only emptiness is checked here; resolution failures surface later as
/// dial errors. The original text is kept, surrounding whitespace included,
/// so the pool name matches what the user configured.
///
/// # Examples
/// ```
/// use tcp_pool::types::HostName;
///
/// let host = HostName::new("db.internal").unwrap();
/// assert_eq!(host.as_str(), "db.internal");
///
/// assert!(HostName::new("").is_err());
/// assert!(HostName::new("   ").is_err());
/// ```
#[doc(alias = "host")]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HostName(String);

impl HostName {
    pub fn new(host: impl Into<String>) -> Result<Self, ValidationError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(ValidationError::EmptyHostName);
        }
        Ok(Self(host))
    }

    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for HostName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for HostName {
    type Error = ValidationError;

    fn try_from(host: String) -> Result<Self, Self::Error> {
        Self::new(host)
    }
}

impl TryFrom<&str> for HostName {
    type Error = ValidationError;

    fn try_from(host: &str) -> Result<Self, Self::Error> {
        Self::new(host)
    }
}

impl From<HostName> for String {
    fn from(host: HostName) -> Self {
        host.0
    }
}
