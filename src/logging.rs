//! Centralized logging setup with optional file output

use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::Path;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

/// Initialize logging to stdout
///
/// Uses the level from the RUST_LOG environment variable, defaulting to
/// "info" when it is not set.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(env_filter()),
        )
        .init();
}

/// Initialize logging with dual output: stdout plus a log file at `path`
///
/// Both outputs use the same RUST_LOG level. The appender guard is
/// forgotten to keep the file writer alive for the program lifetime.
pub fn init_dual_logging(path: &Path) -> Result<()> {
    let (dir, file_name) = split_log_path(path)?;
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(env_filter()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(env_filter()),
        )
        .init();

    std::mem::forget(guard);
    Ok(())
}

/// Split a log file path into the directory and file name the appender needs
fn split_log_path(path: &Path) -> Result<(&Path, &OsStr)> {
    let file_name = path
        .file_name()
        .with_context(|| format!("Log file path '{}' has no file name", path.display()))?;
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok((dir, file_name))
}
