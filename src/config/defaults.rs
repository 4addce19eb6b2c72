//! Default values for configuration fields
//!
//! This module centralizes all default value functions used in serde deserialization.

use crate::constants::pool::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_KEEPALIVE};
use crate::types::MaxConnections;
use std::time::Duration;

/// Default idle capacity
#[inline]
pub fn max_idle_connections() -> MaxConnections {
    MaxConnections::DEFAULT
}

/// Default connect timeout (5 seconds)
#[inline]
pub fn connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

/// Default keepalive idle time (60 seconds)
#[inline]
pub fn keepalive() -> Option<Duration> {
    Some(DEFAULT_KEEPALIVE)
}

/// Default for TCP_NODELAY (true: pooled requests are usually small)
#[inline]
pub fn tcp_nodelay() -> bool {
    true
}
