use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use tcp_pool::{ConnectionPool, PoolError, SendArgs, logging};

#[derive(Debug, Default)]
struct Totals {
    sent: usize,
    failed: usize,
}

impl Totals {
    fn record(&mut self, result: Result<Result<usize, PoolError>, tokio::task::JoinError>) {
        match result {
            Ok(Ok(_)) => self.sent += 1,
            Ok(Err(e)) => {
                self.failed += 1;
                warn!("Failed to send line: {}", e);
            }
            Err(e) => {
                self.failed += 1;
                error!("Sender task failed: {}", e);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = SendArgs::parse();

    match &args.log_file {
        Some(path) => logging::init_dual_logging(path)?,
        None => logging::init_logging(),
    }

    let (config, source) = args.load_config()?;
    info!("Loaded configuration from {}", source.description());

    let pool = ConnectionPool::new(config)?;
    pool.fill().await?;
    info!("Pool '{}' ready: {}", pool.name(), pool.status());

    let limiter = Arc::new(Semaphore::new(args.senders.get()));
    let mut tasks = JoinSet::new();
    let mut totals = Totals::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = &mut shutdown => {
                info!("Received shutdown signal");
                break;
            }
        };
        let Some(mut line) = line else {
            break;
        };

        while let Some(result) = tasks.try_join_next() {
            totals.record(result);
        }

        let permit = Arc::clone(&limiter).acquire_owned().await?;
        let pool = pool.clone();
        line.push('\n');
        tasks.spawn(async move {
            let _permit = permit;
            pool.write_str(&line).await
        });
    }

    while let Some(result) = tasks.join_next().await {
        totals.record(result);
    }

    let status = pool.status();
    let closed = pool.close().await;
    info!(
        "Sent {} lines ({} failed); final status {}; closed {} idle connections",
        totals.sent, totals.failed, status, closed
    );

    Ok(())
}
