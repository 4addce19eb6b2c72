//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::defaults;
use super::validation::ConfigError;
use crate::network::SocketTuning;
use crate::types::{
    HostName, MaxConnections, Port, ValidationError, duration_serde, option_duration_serde,
};

/// Pool configuration: the single target endpoint plus capacity limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoolConfig {
    /// Target host name or IP address
    pub host: HostName,
    /// Target port
    pub port: Port,
    /// Friendly name for logs (defaults to "host:port")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Deadline for dialing one transport
    #[serde(with = "duration_serde", default = "super::defaults::connect_timeout")]
    pub connect_timeout: Duration,
    /// Idle capacity: connections created by fill and retained after release
    #[serde(default = "super::defaults::max_idle_connections")]
    pub max_idle_connections: MaxConnections,
    /// Ceiling on live connections, idle and leased together
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_total_connections: Option<MaxConnections>,
    /// Disable Nagle's algorithm on dialed sockets
    #[serde(default = "super::defaults::tcp_nodelay")]
    pub tcp_nodelay: bool,
    /// Idle time before TCP keepalive probes start
    #[serde(
        with = "option_duration_serde",
        default = "super::defaults::keepalive",
        skip_serializing_if = "Option::is_none"
    )]
    pub keepalive: Option<Duration>,
}

impl PoolConfig {
    /// Create a builder for a pool targeting `host:port`
    ///
    /// # Examples
    ///
    /// ```
    /// use tcp_pool::PoolConfig;
    ///
    /// let config = PoolConfig::builder("db.internal", 5432)
    ///     .max_idle_connections(4)
    ///     .max_total_connections(16)
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(config.address(), "db.internal:5432");
    /// assert_eq!(config.idle_capacity(), 4);
    /// ```
    #[must_use]
    pub fn builder(host: impl Into<String>, port: u16) -> Builder {
        Builder::new(host, port)
    }

    /// `host:port` string handed to the resolver
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Name used in logs: the configured name or `host:port`
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.address())
    }

    /// Idle queue capacity
    #[must_use]
    #[inline]
    pub fn idle_capacity(&self) -> usize {
        self.max_idle_connections.get()
    }

    /// Socket options for dialed transports
    #[must_use]
    pub fn socket_tuning(&self) -> SocketTuning {
        SocketTuning {
            nodelay: self.tcp_nodelay,
            keepalive: self.keepalive,
        }
    }
}

/// Builder for [`PoolConfig`]
///
/// Raw values are only checked in [`Builder::build`], so the builder can be
/// fed straight from CLI flags or environment variables.
#[derive(Debug, Clone)]
pub struct Builder {
    host: String,
    port: u16,
    name: Option<String>,
    connect_timeout: Duration,
    max_idle: usize,
    max_total: Option<usize>,
    tcp_nodelay: bool,
    keepalive: Option<Duration>,
}

impl Builder {
    /// Create a new builder with the required endpoint
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            name: None,
            connect_timeout: defaults::connect_timeout(),
            max_idle: defaults::max_idle_connections().get(),
            max_total: None,
            tcp_nodelay: defaults::tcp_nodelay(),
            keepalive: defaults::keepalive(),
        }
    }

    /// Set a friendly name for logging (defaults to "host:port")
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the dial deadline
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the idle capacity
    #[must_use]
    pub fn max_idle_connections(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    /// Set the ceiling on live connections
    #[must_use]
    pub fn max_total_connections(mut self, max_total: usize) -> Self {
        self.max_total = Some(max_total);
        self
    }

    /// Enable or disable TCP_NODELAY
    #[must_use]
    pub fn tcp_nodelay(mut self, enabled: bool) -> Self {
        self.tcp_nodelay = enabled;
        self
    }

    /// Set the keepalive idle time; `None` disables keepalive
    #[must_use]
    pub fn keepalive(mut self, keepalive: Option<Duration>) -> Self {
        self.keepalive = keepalive;
        self
    }

    /// Validate and build the configuration
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an empty host, port 0, zero capacities,
    /// idle capacity above the total ceiling, or a zero connect timeout.
    pub fn build(self) -> Result<PoolConfig, ConfigError> {
        let host = HostName::new(self.host)?;
        let port = Port::new(self.port).ok_or(ConfigError::InvalidPort)?;
        let max_idle_connections =
            MaxConnections::new(self.max_idle).ok_or(ConfigError::ZeroIdleCapacity)?;
        let max_total_connections = self
            .max_total
            .map(|total| {
                MaxConnections::try_from(total).map_err(|_: ValidationError| {
                    ConfigError::ZeroTotalCapacity
                })
            })
            .transpose()?;

        let config = PoolConfig {
            host,
            port,
            name: self.name,
            connect_timeout: self.connect_timeout,
            max_idle_connections,
            max_total_connections,
            tcp_nodelay: self.tcp_nodelay,
            keepalive: self.keepalive,
        };
        config.validate()?;
        Ok(config)
    }
}
