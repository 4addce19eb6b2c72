//! Connection pooling for a single TCP endpoint
//!
//! - [`ConnectionPool`]: lifecycle, checkout, close and write helpers
//! - [`PooledConnection`]: a leased transport, returned with `release`
//! - [`Dialer`]: the factory that opens new transports
//! - [`MockDialer`]: in-memory transports for tests and benchmarks

mod connection;
mod connection_guard;
mod connection_pool;
mod dialer;
mod error;
mod mock;
mod status;
mod transport;

pub use connection::PooledConnection;
pub use connection_guard::{is_connection_error, is_connection_pool_error, release_with_guard};
pub use connection_pool::ConnectionPool;
pub use dialer::{Dialer, TcpDialer};
pub use error::PoolError;
pub use mock::{MockDialer, MockStream};
pub use status::{PoolLifecycle, PoolStatus};
