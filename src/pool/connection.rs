//! Leased connection handle
//!
//! A [`PooledConnection`] owns one transport while it is checked out. It is
//! a plain byte stream (`AsyncRead` + `AsyncWrite`) plus two pool-specific
//! operations: [`mark_unusable`](PooledConnection::mark_unusable) and
//! [`release`](PooledConnection::release).
//!
//! Writes go through a write buffer. [`send`](PooledConnection::send) and the
//! other `send_*` helpers flush before returning; raw `AsyncWrite` users must
//! flush themselves.

use std::io;
use std::pin::Pin;
use std::sync::Weak;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufWriter, ReadBuf};
use tracing::{debug, trace};

use super::connection_guard::is_connection_error;
use super::connection_pool::PoolInner;
use super::dialer::{Dialer, TcpDialer};
use super::error::PoolError;
use super::transport::Transport;
use crate::types::ConnectionId;

/// A connection checked out of a [`ConnectionPool`](super::ConnectionPool)
///
/// Give it back with [`release`](Self::release). Dropping the handle also
/// returns a usable transport to the idle queue, but any close error is lost
/// and a transport with unflushed writes is discarded instead.
pub struct PooledConnection<D: Dialer = TcpDialer> {
    transport: Option<Transport<D::Stream>>,
    pool: Weak<PoolInner<D>>,
    unusable: AtomicBool,
    id: ConnectionId,
}

impl<D: Dialer> PooledConnection<D> {
    pub(crate) fn new(transport: Transport<D::Stream>, pool: Weak<PoolInner<D>>) -> Self {
        let id = transport.id();
        Self {
            transport: Some(transport),
            pool,
            unusable: AtomicBool::new(false),
            id,
        }
    }

    /// Identifier of the underlying transport within its pool
    #[inline]
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Flag the connection so release closes it instead of pooling it
    ///
    /// Idempotent. The flag can never be cleared.
    pub fn mark_unusable(&self) {
        if !self.unusable.swap(true, Ordering::AcqRel) {
            debug!(conn = %self.id, "Connection marked unusable");
        }
    }

    #[inline]
    #[must_use]
    pub fn is_unusable(&self) -> bool {
        self.unusable.load(Ordering::Acquire)
    }

    /// Mark unusable if `err` means the socket is broken
    ///
    /// Returns whether the connection was marked.
    pub fn mark_unusable_if_broken(&self, err: &io::Error) -> bool {
        let broken = is_connection_error(err);
        if broken {
            self.mark_unusable();
        }
        broken
    }

    /// Borrow the underlying stream
    #[must_use]
    pub fn get_ref(&self) -> Option<&D::Stream> {
        self.transport.as_ref().map(|t| t.stream.get_ref())
    }

    /// Mutably borrow the underlying stream, bypassing the write buffer
    pub fn get_mut(&mut self) -> Option<&mut D::Stream> {
        self.transport.as_mut().map(|t| t.stream.get_mut())
    }

    /// Write all of `payload` and flush it
    ///
    /// # Errors
    ///
    /// Returns the transport's I/O error. The connection is left as is; use
    /// [`mark_unusable_if_broken`](Self::mark_unusable_if_broken) to decide.
    pub async fn send(&mut self, payload: &[u8]) -> io::Result<usize> {
        let id = self.id;
        let stream = self.buffered()?;
        stream.write_all(payload).await?;
        stream.flush().await?;
        trace!(conn = %id, bytes = payload.len(), "Sent payload");
        Ok(payload.len())
    }

    /// Write a string and flush it
    pub async fn send_str(&mut self, s: &str) -> io::Result<usize> {
        self.send(s.as_bytes()).await
    }

    /// Write the UTF-8 encoding of `c` and flush it
    pub async fn send_char(&mut self, c: char) -> io::Result<usize> {
        let mut encoded = [0u8; 4];
        self.send(c.encode_utf8(&mut encoded).as_bytes()).await
    }

    /// Write a single byte and flush it
    pub async fn send_byte(&mut self, b: u8) -> io::Result<()> {
        self.send(&[b]).await.map(|_| ())
    }

    /// Give the connection back to its pool
    ///
    /// A usable connection whose pool is still open has its pending writes
    /// flushed and goes back to the idle queue. Otherwise the transport is
    /// closed without flushing and unsent bytes are dropped. Calling release
    /// again is impossible since the handle is consumed.
    ///
    /// # Errors
    ///
    /// Returns the close error when the transport is closed, or the flush
    /// error when buffered writes could not be delivered.
    ///
    /// A handle can only be released once:
    ///
    /// ```compile_fail
    /// # async fn twice(pool: tcp_pool::ConnectionPool<tcp_pool::MockDialer>) {
    /// let conn = pool.checkout().await.unwrap();
    /// conn.release().await.unwrap();
    /// conn.release().await.unwrap();
    /// # }
    /// ```
    pub async fn release(mut self) -> Result<(), PoolError> {
        let Some(mut transport) = self.transport.take() else {
            return Ok(());
        };

        let pool = match self.pool.upgrade() {
            Some(pool) if !self.is_unusable() && pool.is_open() => pool,
            _ => {
                debug!(
                    conn = %self.id,
                    unusable = self.is_unusable(),
                    age = ?transport.age(),
                    "Closing released connection"
                );
                return transport.abort().await.map_err(PoolError::from);
            }
        };

        if transport.has_pending_writes()
            && let Err(e) = transport.flush().await
        {
            debug!(conn = %self.id, error = %e, "Flush on release failed, closing");
            // The flush error is what the caller needs to see
            let _ = transport.abort().await;
            return Err(e.into());
        }

        pool.checkin(Some(transport)).await
    }

    fn buffered(&mut self) -> io::Result<&mut BufWriter<D::Stream>> {
        self.transport
            .as_mut()
            .map(|t| &mut t.stream)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))
    }
}

impl<D: Dialer> std::fmt::Debug for PooledConnection<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("id", &self.id)
            .field("unusable", &self.is_unusable())
            .field("released", &self.transport.is_none())
            .finish()
    }
}

impl<D: Dialer> Drop for PooledConnection<D> {
    fn drop(&mut self) {
        let Some(transport) = self.transport.take() else {
            return;
        };
        if self.is_unusable() {
            debug!(conn = %self.id, "Dropping unusable connection");
            return;
        }
        match self.pool.upgrade() {
            Some(pool) => pool.reclaim(transport),
            None => debug!(conn = %self.id, "Pool gone, dropping connection"),
        }
    }
}

impl<D: Dialer> AsyncRead for PooledConnection<D> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match Pin::into_inner(self).buffered() {
            Ok(stream) => Pin::new(stream).poll_read(cx, buf),
            Err(e) => Poll::Ready(Err(e)),
        }
    }
}

impl<D: Dialer> AsyncWrite for PooledConnection<D> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match Pin::into_inner(self).buffered() {
            Ok(stream) => Pin::new(stream).poll_write(cx, buf),
            Err(e) => Poll::Ready(Err(e)),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match Pin::into_inner(self).buffered() {
            Ok(stream) => Pin::new(stream).poll_flush(cx),
            Err(e) => Poll::Ready(Err(e)),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = Pin::into_inner(self);
        // A shut-down write half can never be handed to another caller
        this.mark_unusable();
        match this.buffered() {
            Ok(stream) => Pin::new(stream).poll_shutdown(cx),
            Err(e) => Poll::Ready(Err(e)),
        }
    }
}
