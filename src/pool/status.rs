//! Pool status snapshot

use std::fmt;

use crate::types::{
    AvailableConnections, CreatedConnections, InUseConnections, MaxPoolSize, OpenConnections,
};

/// Lifecycle stage of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolLifecycle {
    /// Constructed, `fill` not yet called
    Unstarted,
    /// Filled and serving checkouts
    Open,
    /// Closed; terminal
    Closed,
}

impl fmt::Display for PoolLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unstarted => "unstarted",
            Self::Open => "open",
            Self::Closed => "closed",
        })
    }
}

/// Point-in-time pool statistics
///
/// Fields are read independently, so a snapshot taken while other tasks
/// check connections in and out may be slightly inconsistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub lifecycle: PoolLifecycle,
    /// Idle connections in the queue
    pub available: AvailableConnections,
    /// Idle capacity
    pub max_size: MaxPoolSize,
    /// Transports dialed over the pool's lifetime
    pub created: CreatedConnections,
    /// Transports currently alive, idle or leased
    pub open: OpenConnections,
}

impl PoolStatus {
    /// Connections currently leased out
    #[must_use]
    pub fn in_use(&self) -> InUseConnections {
        InUseConnections::from_pool_stats(self.open, self.available)
    }
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} idle={}/{} in_use={} created={}",
            self.lifecycle,
            self.available,
            self.max_size,
            self.in_use(),
            self.created
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_use_from_open_and_available() {
        let status = PoolStatus {
            lifecycle: PoolLifecycle::Open,
            available: AvailableConnections::new(3),
            max_size: MaxPoolSize::new(5),
            created: CreatedConnections::new(8),
            open: OpenConnections::new(5),
        };
        assert_eq!(status.in_use().get(), 2);
        assert_eq!(status.to_string(), "open idle=3/5 in_use=2 created=8");
    }

    #[test]
    fn test_lifecycle_display() {
        assert_eq!(PoolLifecycle::Unstarted.to_string(), "unstarted");
        assert_eq!(PoolLifecycle::Closed.to_string(), "closed");
    }
}
