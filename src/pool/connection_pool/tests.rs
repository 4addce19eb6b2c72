//! Tests for ConnectionPool lifecycle, checkout and release

use std::collections::HashSet;
use tokio::io::AsyncReadExt;

use crate::config::PoolConfig;
use crate::pool::{
    ConnectionPool, MockDialer, PoolError, PoolLifecycle, is_connection_pool_error,
};

fn config(max_idle: usize) -> PoolConfig {
    PoolConfig::builder("mock.example.com", 7000)
        .max_idle_connections(max_idle)
        .build()
        .unwrap()
}

fn pool_with(max_idle: usize) -> (ConnectionPool<MockDialer>, MockDialer) {
    let dialer = MockDialer::new();
    let pool = ConnectionPool::with_dialer(config(max_idle), dialer.clone()).unwrap();
    (pool, dialer)
}

#[tokio::test]
async fn test_new_pool_is_unstarted() {
    let (pool, dialer) = pool_with(3);

    assert_eq!(pool.lifecycle(), PoolLifecycle::Unstarted);
    assert!(!pool.is_open());
    assert_eq!(pool.name(), "mock.example.com:7000");
    assert_eq!(dialer.dials(), 0);
}

#[tokio::test]
async fn test_fill_creates_idle_capacity() {
    let (pool, dialer) = pool_with(3);
    pool.fill().await.unwrap();

    let status = pool.status();
    assert_eq!(status.lifecycle, PoolLifecycle::Open);
    assert_eq!(status.available.get(), 3);
    assert_eq!(status.max_size.get(), 3);
    assert_eq!(status.created.get(), 3);
    assert_eq!(status.open.get(), 3);
    assert_eq!(status.in_use().get(), 0);
    assert_eq!(dialer.dials(), 3);
}

#[tokio::test]
async fn test_second_fill_is_rejected() {
    let (pool, dialer) = pool_with(2);
    pool.fill().await.unwrap();

    let err = pool.fill().await.unwrap_err();
    assert!(matches!(err, PoolError::AlreadyFilled));
    assert_eq!(dialer.dials(), 2);
}

#[tokio::test]
async fn test_fill_after_close_is_rejected() {
    let (pool, dialer) = pool_with(2);
    pool.close().await;

    assert!(pool.fill().await.unwrap_err().is_closed());
    assert_eq!(dialer.dials(), 0);
}

#[tokio::test]
async fn test_checkout_before_fill_is_closed() {
    let (pool, dialer) = pool_with(2);

    let err = pool.checkout().await.unwrap_err();
    assert!(err.is_closed());
    assert_eq!(dialer.dials(), 0);
}

#[tokio::test]
async fn test_checkout_reuses_idle_connection() {
    let (pool, dialer) = pool_with(1);
    pool.fill().await.unwrap();

    let conn = pool.checkout().await.unwrap();
    let first_id = conn.id();
    assert_eq!(pool.status().available.get(), 0);
    conn.release().await.unwrap();

    let conn = pool.checkout().await.unwrap();
    assert_eq!(conn.id(), first_id);
    assert_eq!(dialer.dials(), 1);
    conn.release().await.unwrap();
}

#[tokio::test]
async fn test_checkout_dials_when_queue_empty() {
    let (pool, dialer) = pool_with(1);
    pool.fill().await.unwrap();

    let a = pool.checkout().await.unwrap();
    let b = pool.checkout().await.unwrap();
    assert_ne!(a.id(), b.id());
    assert_eq!(dialer.dials(), 2);
    assert_eq!(pool.status().in_use().get(), 2);

    a.release().await.unwrap();
    b.release().await.unwrap();
}

#[tokio::test]
async fn test_checkout_surfaces_dial_error() {
    let (pool, dialer) = pool_with(1);
    pool.fill().await.unwrap();
    let held = pool.checkout().await.unwrap();

    dialer.fail_dials();
    let err = pool.checkout().await.unwrap_err();
    assert!(err.is_transport());
    assert!(err.as_transport().unwrap().is_dial_error());
    assert!(pool.is_open());

    held.release().await.unwrap();
}

#[tokio::test]
async fn test_release_surplus_is_closed() {
    let (pool, dialer) = pool_with(2);
    pool.fill().await.unwrap();

    let leased = [
        pool.checkout().await.unwrap(),
        pool.checkout().await.unwrap(),
        pool.checkout().await.unwrap(),
    ];
    assert_eq!(dialer.dials(), 3);

    for conn in leased {
        conn.release().await.unwrap();
    }

    assert_eq!(pool.status().available.get(), 2);
    assert_eq!(dialer.shutdowns(), 1);
    assert_eq!(dialer.live_streams(), 2);
}

#[tokio::test]
async fn test_unusable_connection_is_not_pooled() {
    let (pool, dialer) = pool_with(1);
    pool.fill().await.unwrap();

    let conn = pool.checkout().await.unwrap();
    let id = conn.id();
    conn.mark_unusable();
    conn.mark_unusable();
    assert!(conn.is_unusable());
    conn.release().await.unwrap();

    assert_eq!(pool.status().available.get(), 0);
    assert_eq!(dialer.shutdowns(), 1);
    assert_eq!(dialer.live_streams(), 0);

    let fresh = pool.checkout().await.unwrap();
    assert_ne!(fresh.id(), id);
    assert!(!fresh.is_unusable());
    fresh.release().await.unwrap();
}

#[tokio::test]
async fn test_mark_unusable_if_broken() {
    let (pool, _dialer) = pool_with(1);
    pool.fill().await.unwrap();
    let conn = pool.checkout().await.unwrap();

    let benign = std::io::Error::from(std::io::ErrorKind::WouldBlock);
    assert!(!conn.mark_unusable_if_broken(&benign));
    assert!(!conn.is_unusable());

    let reset = std::io::Error::from(std::io::ErrorKind::ConnectionReset);
    assert!(conn.mark_unusable_if_broken(&reset));
    assert!(conn.is_unusable());
    conn.release().await.unwrap();
}

#[tokio::test]
async fn test_release_after_close_closes_transport() {
    let (pool, dialer) = pool_with(2);
    pool.fill().await.unwrap();

    let conn = pool.checkout().await.unwrap();
    assert_eq!(pool.close().await, 1);

    conn.release().await.unwrap();
    assert_eq!(dialer.shutdowns(), 2);
    assert_eq!(dialer.live_streams(), 0);
    assert_eq!(pool.status().open.get(), 0);
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let (pool, dialer) = pool_with(3);
    pool.fill().await.unwrap();

    assert_eq!(pool.close().await, 3);
    assert_eq!(pool.close().await, 0);
    assert_eq!(pool.lifecycle(), PoolLifecycle::Closed);
    assert_eq!(dialer.shutdowns(), 3);
    assert_eq!(dialer.live_streams(), 0);

    assert!(pool.checkout().await.unwrap_err().is_closed());
}

#[tokio::test]
async fn test_close_unstarted_pool() {
    let (pool, _dialer) = pool_with(3);
    assert_eq!(pool.close().await, 0);
    assert_eq!(pool.close().await, 0);
    assert_eq!(pool.lifecycle(), PoolLifecycle::Closed);
}

#[tokio::test]
async fn test_fill_failure_discards_everything() {
    let dialer = MockDialer::failing_after(2);
    let pool = ConnectionPool::with_dialer(config(5), dialer.clone()).unwrap();

    let err = pool.fill().await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(pool.lifecycle(), PoolLifecycle::Closed);
    assert_eq!(dialer.dials(), 2);
    assert_eq!(dialer.failures(), 1);
    assert_eq!(dialer.live_streams(), 0);
    assert_eq!(pool.status().open.get(), 0);

    assert!(pool.checkout().await.unwrap_err().is_closed());
}

#[tokio::test]
async fn test_checkin_without_transport() {
    let (pool, _dialer) = pool_with(1);
    pool.fill().await.unwrap();

    let err = pool.checkin_raw(None).await.unwrap_err();
    assert!(matches!(err, PoolError::NilConnection));
    assert_eq!(pool.status().available.get(), 1);
}

#[tokio::test]
async fn test_max_total_connections() {
    let dialer = MockDialer::new();
    let config = PoolConfig::builder("mock.example.com", 7000)
        .max_idle_connections(1)
        .max_total_connections(2)
        .build()
        .unwrap();
    let pool = ConnectionPool::with_dialer(config, dialer.clone()).unwrap();
    pool.fill().await.unwrap();

    let a = pool.checkout().await.unwrap();
    let b = pool.checkout().await.unwrap();
    let err = pool.checkout().await.unwrap_err();
    assert!(matches!(err, PoolError::Exhausted { max_total: 2 }));
    assert_eq!(dialer.dials(), 2);

    a.release().await.unwrap();
    let c = pool.checkout().await.unwrap();

    b.release().await.unwrap();
    c.release().await.unwrap();
    assert_eq!(pool.status().open.get(), 1);
}

#[tokio::test]
async fn test_dropped_handle_is_reclaimed() {
    let (pool, dialer) = pool_with(1);
    pool.fill().await.unwrap();

    let conn = pool.checkout().await.unwrap();
    drop(conn);

    assert_eq!(pool.status().available.get(), 1);
    assert_eq!(dialer.live_streams(), 1);
}

#[tokio::test]
async fn test_dropped_unusable_handle_is_discarded() {
    let (pool, dialer) = pool_with(1);
    pool.fill().await.unwrap();

    let conn = pool.checkout().await.unwrap();
    conn.mark_unusable();
    drop(conn);

    assert_eq!(pool.status().available.get(), 0);
    assert_eq!(dialer.live_streams(), 0);
}

#[tokio::test]
async fn test_release_after_pool_dropped() {
    let (pool, dialer) = pool_with(1);
    pool.fill().await.unwrap();

    let conn = pool.checkout().await.unwrap();
    drop(pool);

    conn.release().await.unwrap();
    assert_eq!(dialer.live_streams(), 0);
}

#[tokio::test]
async fn test_connection_ids_are_unique() {
    let (pool, _dialer) = pool_with(4);
    pool.fill().await.unwrap();

    let mut leased = Vec::new();
    for _ in 0..8 {
        leased.push(pool.checkout().await.unwrap());
    }

    let ids: HashSet<_> = leased.iter().map(|c| c.id()).collect();
    assert_eq!(ids.len(), 8);

    for conn in leased {
        conn.release().await.unwrap();
    }
}

#[tokio::test]
async fn test_write_reaches_peer_and_returns_connection() {
    let (pool, dialer) = pool_with(1);
    pool.fill().await.unwrap();
    let mut peer = dialer.take_peer(0).unwrap();

    assert_eq!(pool.write(b"abc").await.unwrap(), 3);
    assert_eq!(pool.write_str("de").await.unwrap(), 2);
    assert_eq!(pool.write_char('é').await.unwrap(), 2);
    pool.write_byte(b'\n').await.unwrap();

    let mut received = [0u8; 8];
    peer.read_exact(&mut received).await.unwrap();
    assert_eq!(&received, "abcdeé\n".as_bytes());

    assert_eq!(pool.status().available.get(), 1);
    assert_eq!(dialer.dials(), 1);
}

#[tokio::test]
async fn test_write_on_broken_connection_discards_it() {
    let (pool, dialer) = pool_with(1);
    pool.fill().await.unwrap();
    dialer.drop_peers();

    let err = pool.write(b"lost").await.unwrap_err();
    assert!(is_connection_pool_error(&err));
    assert_eq!(pool.status().available.get(), 0);
    assert_eq!(dialer.live_streams(), 0);
}

#[tokio::test]
async fn test_write_on_closed_pool() {
    let (pool, _dialer) = pool_with(1);
    pool.fill().await.unwrap();
    pool.close().await;

    assert!(pool.write_str("x").await.unwrap_err().is_closed());
}

#[tokio::test]
async fn test_pooled_connection_send_helpers() {
    let (pool, dialer) = pool_with(1);
    pool.fill().await.unwrap();
    let mut peer = dialer.take_peer(0).unwrap();

    let mut conn = pool.checkout().await.unwrap();
    conn.send_str("ok").await.unwrap();
    conn.send_char('!').await.unwrap();
    conn.send_byte(b'\n').await.unwrap();
    conn.release().await.unwrap();

    let mut received = [0u8; 4];
    peer.read_exact(&mut received).await.unwrap();
    assert_eq!(&received, b"ok!\n");
}

#[tokio::test]
async fn test_unflushed_writes_are_flushed_on_release() {
    use tokio::io::AsyncWriteExt;

    let (pool, dialer) = pool_with(1);
    pool.fill().await.unwrap();
    let mut peer = dialer.take_peer(0).unwrap();

    let mut conn = pool.checkout().await.unwrap();
    conn.write_all(b"buffered").await.unwrap();
    conn.release().await.unwrap();

    let mut received = [0u8; 8];
    peer.read_exact(&mut received).await.unwrap();
    assert_eq!(&received, b"buffered");
    assert_eq!(pool.status().available.get(), 1);
}

#[tokio::test]
async fn test_shutdown_marks_connection_unusable() {
    use tokio::io::AsyncWriteExt;

    let (pool, dialer) = pool_with(1);
    pool.fill().await.unwrap();

    let mut conn = pool.checkout().await.unwrap();
    conn.shutdown().await.unwrap();
    assert!(conn.is_unusable());
    conn.release().await.unwrap();

    assert_eq!(pool.status().available.get(), 0);
    assert_eq!(dialer.live_streams(), 0);
}

#[tokio::test]
async fn test_pool_clone_shares_state() {
    let (pool, _dialer) = pool_with(2);
    let clone = pool.clone();
    pool.fill().await.unwrap();

    assert!(clone.is_open());
    assert_eq!(clone.status().available.get(), 2);
    clone.close().await;
    assert!(!pool.is_open());
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = config(4);
    config.max_total_connections = Some(crate::types::MaxConnections::new(2).unwrap());

    let err = ConnectionPool::with_dialer(config, MockDialer::new()).unwrap_err();
    assert_eq!(
        err,
        crate::config::ConfigError::IdleExceedsTotal {
            max_idle: 4,
            max_total: 2
        }
    );
}

/// Write until neither the peer's buffer nor the write buffer has room
async fn stall_writes(conn: &mut crate::pool::PooledConnection<MockDialer>) {
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    let chunk = [b'x'; 1024];
    while let Ok(result) =
        tokio::time::timeout(Duration::from_millis(50), conn.write_all(&chunk)).await
    {
        result.unwrap();
    }
}

#[tokio::test]
async fn test_release_unusable_with_stalled_peer_returns() {
    use std::time::Duration;

    let (pool, dialer) = pool_with(1);
    pool.fill().await.unwrap();

    // The peer stays alive in the dialer but nobody reads it
    let mut conn = pool.checkout().await.unwrap();
    stall_writes(&mut conn).await;
    conn.mark_unusable();

    let released = tokio::time::timeout(Duration::from_secs(1), conn.release()).await;
    assert!(matches!(released, Ok(Ok(()))));
    assert_eq!(dialer.live_streams(), 0);
    assert_eq!(pool.status().available.get(), 0);
    assert_eq!(pool.status().open.get(), 0);
}

#[tokio::test]
async fn test_release_after_close_with_stalled_peer_returns() {
    use std::time::Duration;

    let (pool, dialer) = pool_with(1);
    pool.fill().await.unwrap();

    let mut conn = pool.checkout().await.unwrap();
    stall_writes(&mut conn).await;
    pool.close().await;

    let released = tokio::time::timeout(Duration::from_secs(1), conn.release()).await;
    assert!(matches!(released, Ok(Ok(()))));
    assert_eq!(dialer.live_streams(), 0);
}

#[tokio::test]
async fn test_close_failures_are_logged_not_returned() {
    let (pool, dialer) = pool_with(3);
    pool.fill().await.unwrap();
    dialer.fail_shutdowns();

    assert_eq!(pool.close().await, 3);
    assert_eq!(dialer.shutdowns(), 0);
    assert_eq!(dialer.live_streams(), 0);
    assert_eq!(pool.status().open.get(), 0);
}
