//! Configuration module
//!
//! Pool configuration types, defaults, validation and loading from TOML
//! files or environment variables.

mod defaults;
mod loading;
mod types;
mod validation;

pub use loading::{
    ConfigSource, create_default_config, load_config, load_config_from_env,
    load_config_from_vars, load_config_with_fallback,
};
pub use types::{Builder, PoolConfig};
pub use validation::ConfigError;

pub use defaults::{connect_timeout, keepalive, max_idle_connections, tcp_nodelay};
