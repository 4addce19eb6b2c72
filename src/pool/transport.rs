//! Owned transport and live-connection accounting
//!
//! A `Transport` is what actually moves between the idle queue and a
//! leased `PooledConnection`. Each one carries a `LiveSlot`, so the pool's
//! open-connection count drops exactly when the socket is released.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::trace;

use crate::connection_error::ConnectionError;
use crate::constants::socket::WRITE_BUFFER;
use crate::types::ConnectionId;

/// One unit of the pool's live-connection count
pub(crate) struct LiveSlot {
    open: Arc<AtomicUsize>,
}

impl LiveSlot {
    /// Reserve a slot, failing when `limit` live transports already exist
    pub(crate) fn acquire(open: &Arc<AtomicUsize>, limit: Option<usize>) -> Option<Self> {
        let mut current = open.load(Ordering::Acquire);
        loop {
            if let Some(limit) = limit
                && current >= limit
            {
                return None;
            }
            match open.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Some(Self {
                        open: Arc::clone(open),
                    });
                }
                Err(actual) => current = actual,
            }
        }
    }
}

impl Drop for LiveSlot {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A dialed stream plus its identity and write buffer
pub(crate) struct Transport<S> {
    id: ConnectionId,
    pub(crate) stream: BufWriter<S>,
    created_at: Instant,
    _slot: LiveSlot,
}

impl<S> Transport<S>
where
    S: AsyncWrite + Unpin,
{
    pub(crate) fn new(id: ConnectionId, stream: S, slot: LiveSlot) -> Self {
        Self {
            id,
            stream: BufWriter::with_capacity(WRITE_BUFFER, stream),
            created_at: Instant::now(),
            _slot: slot,
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> ConnectionId {
        self.id
    }

    pub(crate) fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Bytes written but not yet flushed to the socket
    #[inline]
    pub(crate) fn has_pending_writes(&self) -> bool {
        !self.stream.buffer().is_empty()
    }

    /// Flush buffered bytes to the socket
    pub(crate) async fn flush(&mut self) -> std::io::Result<()> {
        self.stream.flush().await
    }

    /// Flush, shut down the write half and drop the socket
    pub(crate) async fn close(mut self) -> Result<(), ConnectionError> {
        let result = self.stream.shutdown().await;
        drop(self);
        result.map_err(ConnectionError::IoError)
    }

    /// Discard buffered bytes, shut down the socket and drop it
    ///
    /// Never flushes, so a peer that stopped reading cannot stall the caller.
    pub(crate) async fn abort(self) -> Result<(), ConnectionError> {
        let Self { id, stream, _slot: slot, .. } = self;
        let discarded = stream.buffer().len();
        if discarded > 0 {
            trace!(conn = %id, bytes = discarded, "Discarding unflushed writes");
        }
        let mut raw = stream.into_inner();
        let result = raw.shutdown().await;
        drop(raw);
        drop(slot);
        result.map_err(ConnectionError::IoError)
    }
}

impl<S: AsyncWrite> fmt::Debug for Transport<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("id", &self.id)
            .field("buffered", &self.stream.buffer().len())
            .finish_non_exhaustive()
    }
}
