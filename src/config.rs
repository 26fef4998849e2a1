//! Runner configuration.

use std::env;
use std::time::Duration;

use crate::error::Error;
use crate::value::SqlType;

/// Connection and binding settings for a [`QueryRunner`](crate::QueryRunner).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// MySQL connection URL
    pub database_url: String,

    /// Pool size upper bound
    pub max_connections: u32,

    /// How long acquiring a pooled connection may wait
    pub acquire_timeout: Duration,

    /// Type used for nulls bound without one
    pub null_type: SqlType,
}

impl Config {
    pub fn new<S: Into<String>>(database_url: S) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            null_type: SqlType::default(),
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_acquire_timeout(mut self, acquire_timeout: Duration) -> Self {
        self.acquire_timeout = acquire_timeout;
        self
    }

    pub fn with_null_type(mut self, null_type: SqlType) -> Self {
        self.null_type = null_type;
        self
    }

    /// Loads the configuration from environment variables.
    ///
    /// | variable                  | default   |
    /// |---------------------------|-----------|
    /// | `DATABASE_URL`            | required  |
    /// | `DB_MAX_CONNECTIONS`      | `5`       |
    /// | `DB_ACQUIRE_TIMEOUT_SECS` | `30`      |
    /// | `DB_NULL_TYPE`            | `varchar` |
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(Error::Config {
            key: "DATABASE_URL",
            message: "not set".to_string(),
        })?;
        let mut config = Self::new(database_url);

        if let Some(value) = lookup("DB_MAX_CONNECTIONS") {
            config.max_connections = value.trim().parse().map_err(|e| Error::Config {
                key: "DB_MAX_CONNECTIONS",
                message: format!("{e}: {value}"),
            })?;
        }

        if let Some(value) = lookup("DB_ACQUIRE_TIMEOUT_SECS") {
            let secs: u64 = value.trim().parse().map_err(|e| Error::Config {
                key: "DB_ACQUIRE_TIMEOUT_SECS",
                message: format!("{e}: {value}"),
            })?;
            config.acquire_timeout = Duration::from_secs(secs);
        }

        if let Some(value) = lookup("DB_NULL_TYPE") {
            config.null_type = SqlType::from_name(&value).ok_or_else(|| Error::Config {
                key: "DB_NULL_TYPE",
                message: format!("unknown SQL type: {value}"),
            })?;
        }

        Ok(config)
    }
}
