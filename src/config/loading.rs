//! Configuration loading from files and environment variables
//!
//! Environment variables take precedence over the config file so container
//! deployments can retarget a pool without editing files:
//! - `TCP_POOL_HOST`, `TCP_POOL_PORT`
//! - `TCP_POOL_CONNECT_TIMEOUT` (seconds)
//! - `TCP_POOL_MAX_IDLE`, `TCP_POOL_MAX_TOTAL`

use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

use super::types::PoolConfig;
use crate::constants::env;
use crate::types::{HostName, MaxConnections, Port};

/// Where a loaded configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// TOML configuration file
    File,
    /// `TCP_POOL_*` environment variables
    Environment,
    /// Command-line flags alone
    CommandLine,
}

impl ConfigSource {
    /// Human-readable description for logs
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::File => "configuration file",
            Self::Environment => "environment variables",
            Self::CommandLine => "command-line flags",
        }
    }
}

/// Parse one variable from `lookup`, attaching the variable name on failure
fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {}: '{}'", key, raw))
        })
        .transpose()
}

/// Overlay any `TCP_POOL_*` values found by `lookup` onto `config`
fn apply_overrides<F>(config: &mut PoolConfig, lookup: &F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(env::HOST) {
        config.host = HostName::new(host).with_context(|| format!("Invalid {}", env::HOST))?;
    }
    if let Some(port) = parse_var::<Port, _>(lookup, env::PORT)? {
        config.port = port;
    }
    if let Some(secs) = parse_var::<u64, _>(lookup, env::CONNECT_TIMEOUT)? {
        config.connect_timeout = Duration::from_secs(secs);
    }
    if let Some(max_idle) = parse_var::<MaxConnections, _>(lookup, env::MAX_IDLE)? {
        config.max_idle_connections = max_idle;
    }
    if let Some(max_total) = parse_var::<MaxConnections, _>(lookup, env::MAX_TOTAL)? {
        config.max_total_connections = Some(max_total);
    }
    Ok(())
}

/// Build a configuration from variables supplied by `lookup`
///
/// Returns `Ok(None)` when no host variable is present. When a host is
/// present the port variable is required.
pub fn load_config_from_vars<F>(lookup: F) -> Result<Option<PoolConfig>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(host) = lookup(env::HOST) else {
        return Ok(None);
    };
    let port = parse_var::<Port, _>(&lookup, env::PORT)?
        .with_context(|| format!("{} is set but {} is missing", env::HOST, env::PORT))?;

    let mut config = PoolConfig::builder(host, port.get())
        .build()
        .context("Invalid pool configuration in environment")?;
    apply_overrides(&mut config, &lookup)?;
    config
        .validate()
        .context("Invalid pool configuration in environment")?;

    Ok(Some(config))
}

/// Build a configuration from the process environment
pub fn load_config_from_env() -> Result<Option<PoolConfig>> {
    load_config_from_vars(|key| std::env::var(key).ok())
}

/// Load configuration from a TOML file, with environment variable overrides
pub fn load_config(config_path: &str) -> Result<PoolConfig> {
    let config_content = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", config_path, e))?;

    let mut config: PoolConfig = toml::from_str(&config_content)
        .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", config_path, e))?;

    apply_overrides(&mut config, &|key: &str| std::env::var(key).ok())?;

    config
        .validate()
        .with_context(|| format!("Invalid configuration in '{}'", config_path))?;

    Ok(config)
}

/// Load from `config_path` if it exists, otherwise from the environment
pub fn load_config_with_fallback(config_path: &str) -> Result<(PoolConfig, ConfigSource)> {
    if std::path::Path::new(config_path).exists() {
        let config = load_config(config_path)?;
        return Ok((config, ConfigSource::File));
    }

    match load_config_from_env()? {
        Some(config) => {
            tracing::info!(
                "Config file '{}' not found, using {}",
                config_path,
                ConfigSource::Environment.description()
            );
            Ok((config, ConfigSource::Environment))
        }
        None => Err(anyhow::anyhow!(
            "No configuration found: '{}' does not exist and {} is not set",
            config_path,
            env::HOST
        )),
    }
}

/// Create a sample configuration for examples and first runs
#[must_use]
pub fn create_default_config() -> PoolConfig {
    PoolConfig {
        host: HostName::new("127.0.0.1".to_string()).expect("literal host is non-empty"),
        port: Port::new(9000).expect("literal port is non-zero"),
        name: None,
        connect_timeout: super::defaults::connect_timeout(),
        max_idle_connections: super::defaults::max_idle_connections(),
        max_total_connections: None,
        tcp_nodelay: super::defaults::tcp_nodelay(),
        keepalive: super::defaults::keepalive(),
    }
}
