//! Transport factory
//!
//! The pool never opens sockets itself. It asks a [`Dialer`] for a fresh
//! stream, which keeps the pool testable without a network.

use async_trait::async_trait;
use std::fmt::Debug;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, lookup_host};
use tracing::debug;

use crate::config::PoolConfig;
use crate::connection_error::ConnectionError;
use crate::network::SocketOptimizer;

/// Creates new transports to the configured endpoint
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use tcp_pool::{ConnectionError, Dialer, PoolConfig};
/// use tokio::io::DuplexStream;
///
/// #[derive(Debug)]
/// struct InMemory;
///
/// #[async_trait]
/// impl Dialer for InMemory {
///     type Stream = DuplexStream;
///
///     async fn dial(&self, _config: &PoolConfig) -> Result<DuplexStream, ConnectionError> {
///         let (client, _server) = tokio::io::duplex(1024);
///         Ok(client)
///     }
/// }
/// ```
#[async_trait]
pub trait Dialer: Send + Sync + Debug + 'static {
    /// Stream type produced by this dialer
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Open one new transport
    ///
    /// # Errors
    ///
    /// Returns the transport error as-is. The pool does not retry.
    async fn dial(&self, config: &PoolConfig) -> Result<Self::Stream, ConnectionError>;
}

/// Dials plain TCP, bounded by `connect_timeout`, with socket tuning applied
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

#[async_trait]
impl Dialer for TcpDialer {
    type Stream = TcpStream;

    async fn dial(&self, config: &PoolConfig) -> Result<TcpStream, ConnectionError> {
        let timeout = config.connect_timeout;
        let stream = tokio::time::timeout(timeout, connect_any(config))
            .await
            .map_err(|_| ConnectionError::ConnectTimeout {
                address: config.address(),
                timeout,
            })??;

        SocketOptimizer::apply(&stream, config.socket_tuning());
        Ok(stream)
    }
}

/// Resolve the endpoint and try each address in order
async fn connect_any(config: &PoolConfig) -> Result<TcpStream, ConnectionError> {
    let address = config.address();
    let addrs: Vec<SocketAddr> = lookup_host(address.as_str())
        .await
        .map_err(|source| ConnectionError::DnsResolution {
            address: address.clone(),
            source,
        })?
        .collect();

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                debug!(%addr, "Connected");
                return Ok(stream);
            }
            Err(e) => {
                debug!(%addr, error = %e, "Connect attempt failed");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(source) => Err(ConnectionError::TcpConnect {
            host: config.host.to_string(),
            port: config.port.get(),
            source,
        }),
        None => Err(ConnectionError::NoAddresses { address }),
    }
}
