//! Socket tuning for pooled transports
//!
//! Pooled sockets sit idle for long stretches, so keepalive matters more
//! here than raw throughput.

use std::io;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

use crate::constants::socket::{KEEPALIVE_INTERVAL, POOL_RECV_BUFFER, POOL_SEND_BUFFER};

/// Socket options applied to each freshly dialed transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketTuning {
    /// Disable Nagle's algorithm
    pub nodelay: bool,
    /// Idle time before keepalive probes start; `None` disables keepalive
    pub keepalive: Option<Duration>,
}

/// Socket optimizer for pooled connections
pub struct SocketOptimizer;

impl SocketOptimizer {
    /// Apply pool-oriented socket options using socket2
    pub fn optimize_for_pool(stream: &TcpStream, tuning: SocketTuning) -> Result<(), io::Error> {
        use socket2::{SockRef, TcpKeepalive};

        let sock_ref = SockRef::from(stream);

        sock_ref.set_recv_buffer_size(POOL_RECV_BUFFER)?;
        sock_ref.set_send_buffer_size(POOL_SEND_BUFFER)?;
        sock_ref.set_tcp_nodelay(tuning.nodelay)?;

        match tuning.keepalive {
            Some(time) => {
                let keepalive = TcpKeepalive::new()
                    .with_time(time)
                    .with_interval(KEEPALIVE_INTERVAL);
                sock_ref.set_tcp_keepalive(&keepalive)?;
            }
            None => sock_ref.set_keepalive(false)?,
        }

        Ok(())
    }

    /// Apply tuning, logging instead of failing when the platform refuses
    /// an option
    pub fn apply(stream: &TcpStream, tuning: SocketTuning) {
        if let Err(e) = Self::optimize_for_pool(stream, tuning) {
            debug!("Failed to set pooled socket options: {}", e);
        }
    }
}
