use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::catalog::{CatalogConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::services::worker::DEFAULT_QUEUE_CAPACITY;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub db_max_connections: u32,
    pub sync_queue_capacity: usize,
    pub catalog: CatalogConfig,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. `DATABASE_URL` has no default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let timeout_secs = parse_or(&lookup, "CATALOG_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        Ok(Self {
            database_url,
            host: parse_or(&lookup, "HOST", IpAddr::V4(Ipv4Addr::LOCALHOST))?,
            port: parse_or(&lookup, "PORT", 3000)?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            sync_queue_capacity: parse_or(&lookup, "SYNC_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY)?,
            catalog: CatalogConfig {
                base_url: lookup("CATALOG_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
