//! Core types for pool configuration and connection identification
//!
//! This module provides validated configuration newtypes, pool metric
//! newtypes and the per-pool connection identifier.

pub mod config;
pub mod pool;
pub mod validated;

pub use config::{MaxConnections, Port, duration_serde, option_duration_serde};
pub use pool::{
    AvailableConnections, CreatedConnections, InUseConnections, MaxPoolSize, OpenConnections,
};
pub use validated::{HostName, ValidationError};

/// Identifier of a connection within one pool
///
/// Ids are allocated from a counter owned by the pool, so two pools can hand
/// out the same id. They are only meaningful next to the pool name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create a connection id from a raw sequence number
    #[must_use]
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the underlying sequence number
    #[must_use]
    #[inline]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ConnectionId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}
