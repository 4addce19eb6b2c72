//! Command-line arguments for the `tcp-pool-send` binary

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{
    ConfigSource, PoolConfig, create_default_config, load_config, load_config_from_env,
};
use crate::types::{HostName, MaxConnections, Port};

/// Parse a host name from a command-line argument
fn parse_host(s: &str) -> Result<HostName, String> {
    HostName::try_from(s).map_err(|e| format!("Invalid host: {}", e))
}

/// Send stdin lines to a TCP endpoint through a connection pool
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct SendArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "tcp-pool.toml", env = "TCP_POOL_CONFIG")]
    pub config: String,

    /// Target host (overrides config file and environment)
    #[arg(long, value_parser = parse_host)]
    pub host: Option<HostName>,

    /// Target port (overrides config file and environment)
    #[arg(short, long)]
    pub port: Option<Port>,

    /// Pool name used in logs
    #[arg(long)]
    pub name: Option<String>,

    /// Idle connections to keep open
    #[arg(long)]
    pub max_idle: Option<MaxConnections>,

    /// Ceiling on live connections
    #[arg(long)]
    pub max_total: Option<MaxConnections>,

    /// Dial timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub connect_timeout: Option<u64>,

    /// Lines sent concurrently
    #[arg(short = 'n', long, default_value = "1", env = "TCP_POOL_SENDERS")]
    pub senders: MaxConnections,

    /// Also write logs to this file
    #[arg(long, env = "TCP_POOL_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl SendArgs {
    /// Resolve the pool configuration
    ///
    /// Sources in order: the config file if it exists, then `TCP_POOL_*`
    /// environment variables, then `--host`/`--port` alone. Flags given on
    /// the command line override whichever source was used.
    pub fn load_config(&self) -> Result<(PoolConfig, ConfigSource)> {
        let (mut config, source) = if Path::new(&self.config).exists() {
            (load_config(&self.config)?, ConfigSource::File)
        } else if let Some(config) = load_config_from_env()? {
            (config, ConfigSource::Environment)
        } else if let Some(host) = &self.host {
            let port = self
                .port
                .context("--port is required when --host is given without a config file")?;
            let config = PoolConfig {
                host: host.clone(),
                port,
                ..create_default_config()
            };
            (config, ConfigSource::CommandLine)
        } else {
            anyhow::bail!(
                "No configuration found: '{}' does not exist, {} is not set and --host was not given",
                self.config,
                crate::constants::env::HOST
            );
        };

        self.apply_overrides(&mut config);
        config
            .validate()
            .context("Invalid configuration after applying command-line flags")?;
        Ok((config, source))
    }

    fn apply_overrides(&self, config: &mut PoolConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(name) = &self.name {
            config.name = Some(name.clone());
        }
        if let Some(max_idle) = self.max_idle {
            config.max_idle_connections = max_idle;
        }
        if let Some(max_total) = self.max_total {
            config.max_total_connections = Some(max_total);
        }
        if let Some(secs) = self.connect_timeout {
            config.connect_timeout = Duration::from_secs(secs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MISSING: &str = "/nonexistent/tcp-pool-test.toml";

    #[test]
    fn test_defaults() {
        let args = SendArgs::try_parse_from(["tcp-pool-send"]).unwrap();
        assert_eq!(args.senders.get(), 1);
        assert!(args.host.is_none());
        assert!(args.log_file.is_none());
    }

    #[test]
    fn test_rejects_zero_port_and_senders() {
        assert!(SendArgs::try_parse_from(["tcp-pool-send", "--port", "0"]).is_err());
        assert!(SendArgs::try_parse_from(["tcp-pool-send", "-n", "0"]).is_err());
        assert!(SendArgs::try_parse_from(["tcp-pool-send", "--host", ""]).is_err());
    }

    #[test]
    fn test_flags_only_config() {
        let args = SendArgs::try_parse_from([
            "tcp-pool-send",
            "--config",
            MISSING,
            "--host",
            "10.0.0.5",
            "--port",
            "6379",
            "--max-idle",
            "3",
            "--connect-timeout",
            "2",
        ])
        .unwrap();

        let (config, source) = args.load_config().unwrap();
        assert_eq!(source, ConfigSource::CommandLine);
        assert_eq!(config.address(), "10.0.0.5:6379");
        assert_eq!(config.idle_capacity(), 3);
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_host_without_port_fails() {
        let args =
            SendArgs::try_parse_from(["tcp-pool-send", "--config", MISSING, "--host", "h"])
                .unwrap();
        assert!(args.load_config().is_err());
    }

    #[test]
    fn test_file_config_with_flag_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
host = "cache.internal"
port = 11211
max_idle_connections = 8
"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let args = SendArgs::try_parse_from([
            "tcp-pool-send",
            "--config",
            path,
            "--name",
            "memcache",
            "--max-idle",
            "2",
            "--max-total",
            "4",
        ])
        .unwrap();

        let (config, source) = args.load_config().unwrap();
        assert_eq!(source, ConfigSource::File);
        assert_eq!(config.display_name(), "memcache");
        assert_eq!(config.idle_capacity(), 2);
        assert_eq!(config.max_total_connections.map(|m| m.get()), Some(4));
    }

    #[test]
    fn test_overrides_are_validated() {
        let args = SendArgs::try_parse_from([
            "tcp-pool-send",
            "--config",
            MISSING,
            "--host",
            "h",
            "--port",
            "1",
            "--max-idle",
            "5",
            "--max-total",
            "2",
        ])
        .unwrap();

        assert!(args.load_config().is_err());
    }
}
