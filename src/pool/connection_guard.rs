//! Classification of I/O errors that leave a connection unusable
//!
//! Callers doing their own I/O on a [`PooledConnection`] use these helpers to
//! keep a broken transport from being recycled into the idle queue.

use std::io::ErrorKind;
use tracing::{debug, warn};

use super::connection::PooledConnection;
use super::dialer::Dialer;
use super::error::PoolError;
use crate::connection_error::ConnectionError;

/// Check if an I/O error means the peer or the socket is gone
#[inline]
#[must_use]
pub fn is_connection_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::UnexpectedEof
            | ErrorKind::TimedOut
            | ErrorKind::WriteZero
    )
}

/// Check if a pool error wraps a broken-connection I/O error
#[must_use]
pub fn is_connection_pool_error(e: &PoolError) -> bool {
    matches!(
        e,
        PoolError::Transport(ConnectionError::IoError(io_err)) if is_connection_error(io_err)
    )
}

/// Release a connection after an I/O operation on it
///
/// Any I/O error marks the connection unusable, since a partial write leaves
/// the stream in an unknown state. The operation's error takes precedence
/// over an error from the release itself.
pub async fn release_with_guard<D, T>(
    conn: PooledConnection<D>,
    result: std::io::Result<T>,
) -> Result<T, PoolError>
where
    D: Dialer,
{
    if let Err(e) = &result {
        if is_connection_error(e) {
            debug!(conn = %conn.id(), error = %e, "Connection broken, discarding");
        } else {
            warn!(conn = %conn.id(), error = %e, "I/O error on pooled connection, discarding");
        }
        conn.mark_unusable();
    }

    let released = conn.release().await;
    let value = result?;
    released?;
    Ok(value)
}
