//! Configuration loading and representation.
//!
//! Settings come from environment variables and are read once at startup into an
//! [`AppConfig`], which is then passed explicitly to whatever needs it.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

pub const ENV_BIND_ADDR: &str = "CATALOG_BIND_ADDR";
pub const ENV_USE_PERSISTENT_STORES: &str = "USE_PERSISTENT_STORES";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_STATIC_ROOT: &str = "CATALOG_STATIC_ROOT";
pub const ENV_STATIC_URL: &str = "CATALOG_STATIC_URL";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_STATIC_ROOT: &str = "static";
const DEFAULT_STATIC_URL: &str = "/static";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    InvalidBindAddr { var: &'static str, value: String },

    #[error("{var} must be true or false, got {value}")]
    InvalidBool { var: &'static str, value: String },

    #[error("{0} must be set when USE_PERSISTENT_STORES=true")]
    Missing(&'static str),

    #[error("{var} must start with '/' and not end with '/', got {value}")]
    InvalidStaticUrl { var: &'static str, value: String },
}

/// Where product records live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    InMemory,
    Postgres { database_url: String },
}

/// Process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreConfig,
    /// Directory static assets are served from.
    pub static_root: PathBuf,
    /// URL prefix static assets are served under, e.g. `/static`.
    pub static_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment in production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw = lookup(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBindAddr {
                var: ENV_BIND_ADDR,
                value: bind_raw.clone(),
            })?;

        let use_persistent = match lookup(ENV_USE_PERSISTENT_STORES) {
            None => false,
            Some(value) => value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidBool {
                var: ENV_USE_PERSISTENT_STORES,
                value,
            })?,
        };

        let store = if use_persistent {
            let database_url = lookup(ENV_DATABASE_URL)
                .filter(|url| !url.trim().is_empty())
                .ok_or(ConfigError::Missing(ENV_DATABASE_URL))?;
            StoreConfig::Postgres { database_url }
        } else {
            StoreConfig::InMemory
        };

        let static_root = lookup(ENV_STATIC_ROOT)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_ROOT));

        let static_url = lookup(ENV_STATIC_URL).unwrap_or_else(|| DEFAULT_STATIC_URL.to_string());
        if !static_url.starts_with('/') || static_url.len() < 2 || static_url.ends_with('/') {
            return Err(ConfigError::InvalidStaticUrl {
                var: ENV_STATIC_URL,
                value: static_url,
            });
        }

        Ok(Self {
            bind_addr,
            store,
            static_root,
            static_url,
        })
    }

    /// In-memory store on an ephemeral loopback port.
    pub fn for_tests() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            store: StoreConfig::InMemory,
            static_root: PathBuf::from(DEFAULT_STATIC_ROOT),
            static_url: DEFAULT_STATIC_URL.to_string(),
        }
    }
}
