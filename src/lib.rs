//! # tcp-pool
//!
//! A client-side pool of TCP connections to one endpoint.
//!
//! The pool dials its idle capacity up front with [`ConnectionPool::fill`],
//! hands connections out with [`ConnectionPool::checkout`] and takes them
//! back with [`PooledConnection::release`]. Checkout never waits: when the
//! idle queue is empty a new connection is dialed. Released connections
//! beyond the idle capacity, and connections flagged with
//! [`PooledConnection::mark_unusable`], are closed instead of pooled.
//!
//! ```no_run
//! use tcp_pool::{ConnectionPool, PoolConfig};
//! use tokio::io::AsyncWriteExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PoolConfig::builder("127.0.0.1", 9000)
//!     .max_idle_connections(8)
//!     .build()?;
//! let pool = ConnectionPool::new(config)?;
//! pool.fill().await?;
//!
//! let mut conn = pool.checkout().await?;
//! if let Err(e) = conn.write_all(b"PING\r\n").await {
//!     conn.mark_unusable_if_broken(&e);
//! }
//! conn.release().await?;
//!
//! pool.close().await;
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod config;
pub mod connection_error;
pub mod constants;
pub mod logging;
pub mod network;
pub mod pool;
pub mod types;

pub use args::SendArgs;
pub use config::{
    Builder as PoolConfigBuilder, ConfigError, ConfigSource, PoolConfig, create_default_config,
    load_config, load_config_from_env, load_config_from_vars, load_config_with_fallback,
};
pub use connection_error::ConnectionError;
pub use network::{SocketOptimizer, SocketTuning};
pub use pool::{
    ConnectionPool, Dialer, MockDialer, MockStream, PoolError, PoolLifecycle, PoolStatus,
    PooledConnection, TcpDialer, is_connection_error,
};
pub use types::ConnectionId;
