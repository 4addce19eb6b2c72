//! Configuration validation
//!
//! Most field-level rules are enforced by the newtypes (`HostName`, `Port`,
//! `MaxConnections`). This module covers the cross-field rules and the
//! error type returned when a pool cannot be constructed.

use thiserror::Error;
use tracing::warn;

use super::types::PoolConfig;
use crate::types::ValidationError;

/// Invalid construction parameters; the pool is never created
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("host cannot be empty")]
    EmptyHost,

    #[error("port must be greater than 0")]
    InvalidPort,

    #[error("max idle connections must be greater than 0")]
    ZeroIdleCapacity,

    #[error("max total connections must be greater than 0")]
    ZeroTotalCapacity,

    #[error("max idle connections ({max_idle}) exceeds max total connections ({max_total})")]
    IdleExceedsTotal { max_idle: usize, max_total: usize },

    #[error("connect timeout must be greater than 0")]
    ZeroConnectTimeout,

    #[error("connection capacity must be greater than 0")]
    ZeroCapacity,

    #[error("invalid number: {0}")]
    InvalidNumber(String),
}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyHostName => Self::EmptyHost,
            ValidationError::InvalidPort => Self::InvalidPort,
            ValidationError::ZeroCapacity => Self::ZeroCapacity,
            ValidationError::InvalidNumber(s) => Self::InvalidNumber(s),
        }
    }
}

impl PoolConfig {
    /// Validate cross-field constraints
    ///
    /// Checks:
    /// - idle capacity does not exceed the total ceiling, when one is set
    /// - connect timeout is non-zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(max_total) = self.max_total_connections
            && self.max_idle_connections > max_total
        {
            return Err(ConfigError::IdleExceedsTotal {
                max_idle: self.max_idle_connections.get(),
                max_total: max_total.get(),
            });
        }

        if self.connect_timeout.is_zero() {
            return Err(ConfigError::ZeroConnectTimeout);
        }

        if let Some(keepalive) = self.keepalive
            && keepalive.is_zero()
        {
            warn!(
                pool = %self.display_name(),
                "keepalive of 0s probes idle sockets constantly; omit it to disable keepalive"
            );
        }

        Ok(())
    }
}
