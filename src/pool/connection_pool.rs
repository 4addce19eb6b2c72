//! Bounded connection pool for a single TCP endpoint
//!
//! The pool moves through three stages: unstarted, open and closed. `fill`
//! opens it and dials the idle capacity up front. `checkout` takes an idle
//! transport or dials a new one, and released connections go back to the
//! idle queue when there is room. `close` is terminal.
//!
//! The lifecycle lock is only ever held for queue operations, never across
//! an `.await`, so dialing and closing sockets never block other callers.

use crossbeam::queue::ArrayQueue;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, info, warn};

use super::connection::PooledConnection;
use super::connection_guard::release_with_guard;
use super::dialer::{Dialer, TcpDialer};
use super::error::PoolError;
use super::status::{PoolLifecycle, PoolStatus};
use super::transport::{LiveSlot, Transport};
use crate::config::{ConfigError, PoolConfig};
use crate::types::{
    AvailableConnections, ConnectionId, CreatedConnections, MaxPoolSize, OpenConnections,
};

enum PoolState<S> {
    Unstarted,
    Open(ArrayQueue<Transport<S>>),
    Closed,
}

/// Why the idle queue refused a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Closed,
    Full,
}

/// Shared pool state; connections hold a `Weak` to it
pub(crate) struct PoolInner<D: Dialer> {
    name: String,
    config: PoolConfig,
    dialer: D,
    state: RwLock<PoolState<D::Stream>>,
    open_connections: Arc<AtomicUsize>,
    created: AtomicUsize,
    next_id: AtomicU64,
}

impl<D: Dialer> PoolInner<D> {
    pub(crate) fn is_open(&self) -> bool {
        matches!(*self.state.read(), PoolState::Open(_))
    }

    fn lifecycle(&self) -> PoolLifecycle {
        match *self.state.read() {
            PoolState::Unstarted => PoolLifecycle::Unstarted,
            PoolState::Open(_) => PoolLifecycle::Open,
            PoolState::Closed => PoolLifecycle::Closed,
        }
    }

    fn idle_len(&self) -> usize {
        match &*self.state.read() {
            PoolState::Open(queue) => queue.len(),
            _ => 0,
        }
    }

    fn try_enqueue(
        &self,
        transport: Transport<D::Stream>,
    ) -> Result<(), (Transport<D::Stream>, Rejection)> {
        match &*self.state.read() {
            PoolState::Open(queue) => queue.push(transport).map_err(|t| (t, Rejection::Full)),
            _ => Err((transport, Rejection::Closed)),
        }
    }

    fn try_dequeue(&self) -> Result<Option<Transport<D::Stream>>, PoolError> {
        match &*self.state.read() {
            PoolState::Open(queue) => Ok(queue.pop()),
            _ => Err(PoolError::Closed),
        }
    }

    /// Dial one transport, reserving a live-connection slot first
    async fn create_transport(&self) -> Result<Transport<D::Stream>, PoolError> {
        let limit = self.config.max_total_connections.map(|m| m.get());
        let Some(slot) = LiveSlot::acquire(&self.open_connections, limit) else {
            let max_total = limit.unwrap_or(usize::MAX);
            debug!(pool = %self.name, max_total, "Connection limit reached");
            return Err(PoolError::Exhausted { max_total });
        };

        let stream = self.dialer.dial(&self.config).await.inspect_err(|e| {
            warn!(pool = %self.name, error = %e, "Failed to create connection");
        })?;

        let id = ConnectionId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.created.fetch_add(1, Ordering::Relaxed);
        debug!(pool = %self.name, conn = %id, "Created connection");
        Ok(Transport::new(id, stream, slot))
    }

    /// Return a transport to the idle queue, closing it if the queue refuses
    pub(crate) async fn checkin(
        &self,
        transport: Option<Transport<D::Stream>>,
    ) -> Result<(), PoolError> {
        let transport = transport.ok_or(PoolError::NilConnection)?;
        let id = transport.id();

        match self.try_enqueue(transport) {
            Ok(()) => {
                debug!(pool = %self.name, conn = %id, "Returned connection to pool");
                Ok(())
            }
            Err((transport, reason)) => {
                debug!(pool = %self.name, conn = %id, ?reason, "Pool rejected connection, closing");
                transport.close().await.map_err(PoolError::from)
            }
        }
    }

    /// Close a transport the pool is letting go of, logging any failure
    async fn close_transport(&self, transport: Transport<D::Stream>) {
        let id = transport.id();
        if let Err(e) = transport.close().await {
            warn!(pool = %self.name, conn = %id, error = %e, "Failed to close connection");
        }
    }

    /// Synchronous checkin used when a handle is dropped without `release`
    pub(crate) fn reclaim(&self, transport: Transport<D::Stream>) {
        let id = transport.id();
        if transport.has_pending_writes() {
            debug!(pool = %self.name, conn = %id, "Dropped with unflushed writes, discarding");
            return;
        }
        match self.try_enqueue(transport) {
            Ok(()) => debug!(pool = %self.name, conn = %id, "Reclaimed dropped connection"),
            Err((_, reason)) => {
                debug!(pool = %self.name, conn = %id, ?reason, "Dropped connection discarded");
            }
        }
    }
}

/// Connection pool for one TCP endpoint
///
/// Cloning is cheap and every clone refers to the same pool.
///
/// # Examples
///
/// ```no_run
/// use tcp_pool::{ConnectionPool, PoolConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PoolConfig::builder("127.0.0.1", 9000)
///     .max_idle_connections(4)
///     .build()?;
/// let pool = ConnectionPool::new(config)?;
/// pool.fill().await?;
///
/// pool.write_str("hello\n").await?;
///
/// pool.close().await;
/// # Ok(())
/// # }
/// ```
pub struct ConnectionPool<D: Dialer = TcpDialer> {
    inner: Arc<PoolInner<D>>,
}

impl<D: Dialer> Clone for ConnectionPool<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Dialer> std::fmt::Debug for ConnectionPool<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("name", &self.inner.name)
            .field("status", &self.status())
            .finish()
    }
}

impl ConnectionPool<TcpDialer> {
    /// Create an unstarted pool that dials plain TCP
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is inconsistent.
    pub fn new(config: PoolConfig) -> Result<Self, ConfigError> {
        Self::with_dialer(config, TcpDialer)
    }
}

impl<D: Dialer> ConnectionPool<D> {
    /// Create an unstarted pool using a custom dialer
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is inconsistent.
    pub fn with_dialer(config: PoolConfig, dialer: D) -> Result<Self, ConfigError> {
        config.validate()?;
        let name = config.display_name();
        debug!(
            pool = %name,
            max_idle = config.idle_capacity(),
            max_total = ?config.max_total_connections.map(|m| m.get()),
            "Created connection pool"
        );

        Ok(Self {
            inner: Arc::new(PoolInner {
                name,
                config,
                dialer,
                state: RwLock::new(PoolState::Unstarted),
                open_connections: Arc::new(AtomicUsize::new(0)),
                created: AtomicUsize::new(0),
                next_id: AtomicU64::new(1),
            }),
        })
    }

    /// Open the pool and dial the full idle capacity
    ///
    /// Connections are dialed one at a time. If any dial fails the pool is
    /// closed, every connection created so far is discarded and the dial
    /// error is returned.
    ///
    /// # Errors
    ///
    /// - [`PoolError::AlreadyFilled`] if the pool is already open
    /// - [`PoolError::Closed`] if the pool was closed, before or during fill
    /// - the first dial error
    pub async fn fill(&self) -> Result<(), PoolError> {
        let target = self.inner.config.idle_capacity();
        {
            let mut state = self.inner.state.write();
            match &*state {
                PoolState::Unstarted => {}
                PoolState::Open(_) => return Err(PoolError::AlreadyFilled),
                PoolState::Closed => return Err(PoolError::Closed),
            }
            *state = PoolState::Open(ArrayQueue::new(target));
        }

        info!(pool = %self.inner.name, target, "Filling connection pool");

        for created in 0..target {
            let transport = match self.inner.create_transport().await {
                Ok(transport) => transport,
                Err(e) => {
                    warn!(
                        pool = %self.inner.name,
                        created,
                        target,
                        error = %e,
                        "Fill failed, closing pool"
                    );
                    self.close().await;
                    return Err(e);
                }
            };

            match self.inner.try_enqueue(transport) {
                Ok(()) => {}
                Err((transport, Rejection::Full)) => {
                    // Concurrent releases already filled the queue
                    debug!(pool = %self.inner.name, created, "Idle queue full, stopping fill");
                    self.inner.close_transport(transport).await;
                    break;
                }
                Err((transport, Rejection::Closed)) => {
                    debug!(pool = %self.inner.name, created, "Pool closed during fill");
                    self.inner.close_transport(transport).await;
                    return Err(PoolError::Closed);
                }
            }
        }

        info!(
            pool = %self.inner.name,
            idle = self.inner.idle_len(),
            "Connection pool ready"
        );
        Ok(())
    }

    /// Lease a connection: an idle one if available, otherwise a new dial
    ///
    /// Never waits for another caller to release.
    ///
    /// # Errors
    ///
    /// - [`PoolError::Closed`] if the pool is not open
    /// - [`PoolError::Exhausted`] if `max_total_connections` is reached
    /// - the dial error when a new transport cannot be created
    pub async fn checkout(&self) -> Result<PooledConnection<D>, PoolError> {
        if let Some(transport) = self.inner.try_dequeue()? {
            debug!(pool = %self.inner.name, conn = %transport.id(), "Reusing idle connection");
            return Ok(PooledConnection::new(transport, Arc::downgrade(&self.inner)));
        }

        debug!(pool = %self.inner.name, "No idle connection, dialing");
        let transport = self.inner.create_transport().await?;
        Ok(PooledConnection::new(transport, Arc::downgrade(&self.inner)))
    }

    /// Close the pool and every idle connection
    ///
    /// Idempotent. Leased connections are closed when they are released.
    /// Individual close failures are logged. Returns how many idle
    /// connections were closed by this call.
    pub async fn close(&self) -> usize {
        let previous = {
            let mut state = self.inner.state.write();
            std::mem::replace(&mut *state, PoolState::Closed)
        };
        let queue = match previous {
            PoolState::Open(queue) => queue,
            PoolState::Unstarted => {
                debug!(pool = %self.inner.name, "Closed before fill");
                return 0;
            }
            PoolState::Closed => return 0,
        };

        info!(pool = %self.inner.name, idle = queue.len(), "Closing connection pool");

        let mut closed = 0;
        while let Some(transport) = queue.pop() {
            self.inner.close_transport(transport).await;
            closed += 1;
        }
        closed
    }

    /// Check whether the pool is open for checkouts
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    #[must_use]
    pub fn lifecycle(&self) -> PoolLifecycle {
        self.inner.lifecycle()
    }

    /// Pool name used in logs
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn dialer(&self) -> &D {
        &self.inner.dialer
    }

    /// Current pool statistics
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            lifecycle: self.inner.lifecycle(),
            available: AvailableConnections::new(self.inner.idle_len()),
            max_size: MaxPoolSize::new(self.inner.config.idle_capacity()),
            created: CreatedConnections::new(self.inner.created.load(Ordering::Relaxed)),
            open: OpenConnections::new(self.inner.open_connections.load(Ordering::Acquire)),
        }
    }

    /// Write `payload` on a pooled connection and release it
    ///
    /// A connection that fails mid-write is discarded, not pooled.
    ///
    /// # Errors
    ///
    /// Returns the checkout error, the write error, or the release error,
    /// in that order of precedence.
    pub async fn write(&self, payload: &[u8]) -> Result<usize, PoolError> {
        let mut conn = self.checkout().await?;
        let result = conn.send(payload).await;
        release_with_guard(conn, result).await
    }

    /// Write a string on a pooled connection and release it
    pub async fn write_str(&self, s: &str) -> Result<usize, PoolError> {
        self.write(s.as_bytes()).await
    }

    /// Write the UTF-8 encoding of `c` on a pooled connection and release it
    pub async fn write_char(&self, c: char) -> Result<usize, PoolError> {
        let mut encoded = [0u8; 4];
        self.write(c.encode_utf8(&mut encoded).as_bytes()).await
    }

    /// Write one byte on a pooled connection and release it
    pub async fn write_byte(&self, b: u8) -> Result<(), PoolError> {
        self.write(&[b]).await.map(|_| ())
    }

    #[cfg(test)]
    pub(crate) async fn checkin_raw(
        &self,
        transport: Option<Transport<D::Stream>>,
    ) -> Result<(), PoolError> {
        self.inner.checkin(transport).await
    }
}

#[cfg(test)]
mod tests;
