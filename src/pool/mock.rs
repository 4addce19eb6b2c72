//! In-memory dialer for tests and benchmarks
//!
//! Streams are `tokio::io::duplex` pairs. The dialer keeps the server half of
//! every pair so tests can read what clients wrote, or drop peers to simulate
//! a broken connection.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};

use super::dialer::Dialer;
use crate::config::PoolConfig;
use crate::connection_error::ConnectionError;

const MOCK_BUFFER: usize = 64 * 1024;

#[derive(Debug, Default)]
struct MockState {
    dials: AtomicUsize,
    failures: AtomicUsize,
    shutdowns: AtomicUsize,
    drops: AtomicUsize,
    /// Successful dials allowed before failing; `usize::MAX` means unlimited
    budget: AtomicUsize,
    broken_shutdown: AtomicBool,
    peers: Mutex<Vec<Option<DuplexStream>>>,
}

/// Dialer producing in-memory streams with shutdown and drop counters
#[derive(Debug, Clone)]
pub struct MockDialer {
    state: Arc<MockState>,
}

impl Default for MockDialer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDialer {
    /// Dialer that always succeeds
    #[must_use]
    pub fn new() -> Self {
        let state = MockState {
            budget: AtomicUsize::new(usize::MAX),
            ..MockState::default()
        };
        Self {
            state: Arc::new(state),
        }
    }

    /// Dialer whose first `successes` dials succeed and the rest fail
    #[must_use]
    pub fn failing_after(successes: usize) -> Self {
        let dialer = Self::new();
        dialer.state.budget.store(successes, Ordering::SeqCst);
        dialer
    }

    /// Make every following dial fail
    pub fn fail_dials(&self) {
        self.state.budget.store(0, Ordering::SeqCst);
    }

    /// Allow dials again
    pub fn allow_dials(&self) {
        self.state.budget.store(usize::MAX, Ordering::SeqCst);
    }

    /// Make every following `poll_shutdown` fail with `BrokenPipe`
    pub fn fail_shutdowns(&self) {
        self.state.broken_shutdown.store(true, Ordering::SeqCst);
    }

    /// Dial attempts that produced a stream
    #[must_use]
    pub fn dials(&self) -> usize {
        self.state.dials.load(Ordering::SeqCst)
    }

    /// Dial attempts that failed
    #[must_use]
    pub fn failures(&self) -> usize {
        self.state.failures.load(Ordering::SeqCst)
    }

    /// `poll_shutdown` calls that completed, across all streams
    #[must_use]
    pub fn shutdowns(&self) -> usize {
        self.state.shutdowns.load(Ordering::SeqCst)
    }

    /// Client streams that have been dropped
    #[must_use]
    pub fn drops(&self) -> usize {
        self.state.drops.load(Ordering::SeqCst)
    }

    /// Client streams still alive
    #[must_use]
    pub fn live_streams(&self) -> usize {
        self.dials() - self.drops()
    }

    /// Take the server half of the `index`th dialed stream
    #[must_use]
    pub fn take_peer(&self, index: usize) -> Option<DuplexStream> {
        self.state.peers.lock().get_mut(index).and_then(Option::take)
    }

    /// Drop every server half still held, breaking the client streams
    pub fn drop_peers(&self) {
        for peer in self.state.peers.lock().iter_mut() {
            peer.take();
        }
    }
}

#[async_trait]
impl Dialer for MockDialer {
    type Stream = MockStream;

    async fn dial(&self, config: &PoolConfig) -> Result<MockStream, ConnectionError> {
        let granted = self
            .state
            .budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                usize::MAX => Some(usize::MAX),
                n => Some(n - 1),
            })
            .is_ok();

        if !granted {
            self.state.failures.fetch_add(1, Ordering::SeqCst);
            return Err(ConnectionError::TcpConnect {
                host: config.host.to_string(),
                port: config.port.get(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "mock dial refused"),
            });
        }

        let (client, server) = tokio::io::duplex(MOCK_BUFFER);
        self.state.peers.lock().push(Some(server));
        self.state.dials.fetch_add(1, Ordering::SeqCst);

        Ok(MockStream {
            inner: client,
            state: Arc::clone(&self.state),
        })
    }
}

/// Client half of an in-memory connection
#[derive(Debug)]
pub struct MockStream {
    inner: DuplexStream,
    state: Arc<MockState>,
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.state.drops.fetch_add(1, Ordering::SeqCst);
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if self.state.broken_shutdown.load(Ordering::SeqCst) {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock shutdown failed",
            )));
        }
        let result = Pin::new(&mut self.inner).poll_shutdown(cx);
        if result.is_ready() {
            self.state.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
        result
    }
}
