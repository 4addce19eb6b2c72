//! Constants used throughout the pool
//!
//! This module centralizes magic numbers and default configuration values.

use std::time::Duration;

/// Socket tuning constants applied to every dialed transport
pub mod socket {
    use super::Duration;

    /// TCP socket receive buffer size for pooled connections (256KB)
    pub const POOL_RECV_BUFFER: usize = 256 * 1024;

    /// TCP socket send buffer size for pooled connections (256KB)
    pub const POOL_SEND_BUFFER: usize = 256 * 1024;

    /// Interval between TCP keepalive probes once probing has started
    pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(10);

    /// Capacity of the write buffer wrapped around each transport (8KB)
    pub const WRITE_BUFFER: usize = 8 * 1024;
}

/// Connection pool constants
pub mod pool {
    use super::Duration;

    /// Default idle capacity per pool
    pub const DEFAULT_MAX_IDLE: usize = 10;

    /// Default timeout for dialing one transport
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Default idle time before TCP keepalive probes start
    pub const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(60);
}

/// Environment variable names read by the config loader
pub mod env {
    /// Target host
    pub const HOST: &str = "TCP_POOL_HOST";

    /// Target port
    pub const PORT: &str = "TCP_POOL_PORT";

    /// Connect timeout in seconds
    pub const CONNECT_TIMEOUT: &str = "TCP_POOL_CONNECT_TIMEOUT";

    /// Idle capacity
    pub const MAX_IDLE: &str = "TCP_POOL_MAX_IDLE";

    /// Optional total ceiling
    pub const MAX_TOTAL: &str = "TCP_POOL_MAX_TOTAL";
}
