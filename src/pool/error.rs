//! Pool error taxonomy

use thiserror::Error;

use crate::connection_error::ConnectionError;

/// Errors returned by pool operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// Checkout or checkin attempted on a pool that is not open
    #[error("connection pool is closed")]
    Closed,

    /// `fill` called on a pool that is already open
    #[error("connection pool has already been filled")]
    AlreadyFilled,

    /// Creating another transport would exceed `max_total_connections`
    #[error("connection limit reached ({max_total} live connections)")]
    Exhausted { max_total: usize },

    /// Dial or I/O failure, surfaced as reported by the transport
    #[error(transparent)]
    Transport(#[from] ConnectionError),

    /// Checkin called without a transport
    #[error("connection is nil, rejecting")]
    NilConnection,
}

impl PoolError {
    /// Check if the pool was closed (or never started)
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Check if this wraps a transport failure
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Borrow the transport error, if any
    #[must_use]
    pub const fn as_transport(&self) -> Option<&ConnectionError> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PoolError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(ConnectionError::IoError(err))
    }
}
