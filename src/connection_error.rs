//! Connection error types for the pool
//!
//! These are the transport-layer failures produced while dialing or using a
//! connection. The pool surfaces them verbatim and never retries them.

use std::fmt;
use std::time::Duration;

/// Errors that can occur while establishing or using a transport
#[derive(Debug)]
#[non_exhaustive]
pub enum ConnectionError {
    /// DNS resolution failed
    DnsResolution {
        address: String,
        source: std::io::Error,
    },

    /// DNS resolution returned no addresses
    NoAddresses { address: String },

    /// TCP connection failed
    TcpConnect {
        host: String,
        port: u16,
        source: std::io::Error,
    },

    /// Dial did not complete within the connect timeout
    ConnectTimeout { address: String, timeout: Duration },

    /// I/O error during communication or shutdown
    IoError(std::io::Error),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DnsResolution { address, source } => {
                write!(f, "Failed to resolve DNS for {}: {}", address, source)
            }
            Self::NoAddresses { address } => {
                write!(f, "No addresses found for {}", address)
            }
            Self::TcpConnect { host, port, source } => {
                write!(f, "Failed to connect to {}:{}: {}", host, port, source)
            }
            Self::ConnectTimeout { address, timeout } => {
                write!(f, "Connecting to {} timed out after {:?}", address, timeout)
            }
            Self::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TcpConnect { source, .. } => Some(source),
            Self::DnsResolution { source, .. } => Some(source),
            Self::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl ConnectionError {
    /// Check if this error happened while establishing the transport
    #[must_use]
    pub const fn is_dial_error(&self) -> bool {
        matches!(
            self,
            Self::DnsResolution { .. }
                | Self::NoAddresses { .. }
                | Self::TcpConnect { .. }
                | Self::ConnectTimeout { .. }
        )
    }

    /// Check if this is a timeout, either while dialing or from the I/O layer
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::ConnectTimeout { .. } => true,
            Self::IoError(e) | Self::TcpConnect { source: e, .. } => {
                e.kind() == std::io::ErrorKind::TimedOut
            }
            _ => false,
        }
    }

    /// Get the appropriate log level for this error
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        match self {
            // Peer hung up; routine for long-lived pooled sockets
            Self::IoError(e) if e.kind() == std::io::ErrorKind::BrokenPipe => tracing::Level::DEBUG,
            Self::IoError(e) if e.kind() == std::io::ErrorKind::NotConnected => {
                tracing::Level::DEBUG
            }
            // Unresolvable names are usually configuration mistakes
            Self::NoAddresses { .. } => tracing::Level::ERROR,
            _ => tracing::Level::WARN,
        }
    }
}

impl From<std::io::Error> for ConnectionError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err)
    }
}
