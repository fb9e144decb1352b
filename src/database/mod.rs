//! Database bootstrap.
//!
//! The driver itself lives outside this crate: it plugs in through
//! [`Connector`] and hands out [`Connection`]s. This module owns the
//! connection settings, the pool and the lazily initialized [`Database`]
//! service that hooks and handlers resolve from the request's services.

mod pool;
mod service;

use serde::Deserialize;
use std::env;
use std::time::Duration;
use thiserror::Error;

pub use pool::{ConnectionPool, PooledConnection};
pub use service::Database;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    #[error("connection pool exhausted")]
    PoolExhausted,

    #[error("failed to connect: {0}")]
    ConnectionFailed(String),

    #[error("connection is no longer valid")]
    InvalidConnection,

    #[error("missing database setting `{0}`")]
    MissingSetting(&'static str),

    #[error("invalid database setting `{name}`: {value:?}")]
    InvalidSetting { name: &'static str, value: String },
}

pub trait Connection: Send + Sync {
    fn is_valid(&self) -> bool;
    fn close(&mut self);
}

/// Driver seam: opens connections from a [`DatabaseConfig`].
pub trait Connector: Send + Sync + 'static {
    type Connection: Connection + 'static;

    fn connect(&self, config: &DatabaseConfig) -> Result<Self::Connection, DatabaseError>;
}

/// Connection settings, usually read from `DB_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub driver: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: "mysql".to_string(),
            host: "localhost".to_string(),
            port: 3306,
            username: String::new(),
            password: String::new(),
            database: String::new(),
        }
    }
}

impl DatabaseConfig {
    /// Reads `DB_DRIVER`, `DB_HOST`, `DB_PORT`, `DB_USERNAME`, `DB_PASSWORD`
    /// and `DB_DATABASE`. Unset variables keep their defaults except
    /// `DB_DATABASE`, which is required.
    pub fn from_env() -> Result<Self, DatabaseError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, DatabaseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = DatabaseConfig::default();
        if let Some(driver) = lookup("DB_DRIVER") {
            config.driver = driver;
        }
        if let Some(host) = lookup("DB_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("DB_PORT") {
            config.port = port.trim().parse().map_err(|_| DatabaseError::InvalidSetting {
                name: "DB_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(username) = lookup("DB_USERNAME") {
            config.username = username;
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            config.password = password;
        }
        config.database = lookup("DB_DATABASE").ok_or(DatabaseError::MissingSetting("DB_DATABASE"))?;
        Ok(config)
    }
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_size: usize,
    pub min_idle: usize,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            min_idle: 2,
            max_lifetime: Duration::from_secs(30 * 60), // 30 minutes
            idle_timeout: Duration::from_secs(10 * 60), // 10 minutes
        }
    }
}
