//! Backing engine selection and repository configuration.

use serde::{Deserialize, Serialize};

use crate::error::{BackendError, StorageError, StorageResult};

use super::strategy::ConcurrencyStrategy;

/// Identifies the backing engine behind a connection string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    /// SQLite database (file-based or in-memory).
    Sqlite,
    /// PostgreSQL database.
    Postgres,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::Sqlite => write!(f, "sqlite"),
            EngineKind::Postgres => write!(f, "postgres"),
        }
    }
}

impl EngineKind {
    /// Determines the engine from a connection string.
    ///
    /// # Errors
    ///
    /// * `StorageError::Backend(UnsupportedEngine)` - If no supported engine matches
    ///
    /// # Examples
    ///
    /// ```
    /// use register_persistence::core::EngineKind;
    ///
    /// assert_eq!(EngineKind::from_connection_string(":memory:").unwrap(), EngineKind::Sqlite);
    /// assert_eq!(EngineKind::from_connection_string("sqlite://data/register.db").unwrap(), EngineKind::Sqlite);
    /// assert_eq!(EngineKind::from_connection_string("postgres://u:p@localhost/register").unwrap(), EngineKind::Postgres);
    /// assert!(EngineKind::from_connection_string("mysql://localhost/register").is_err());
    /// ```
    pub fn from_connection_string(url: &str) -> StorageResult<Self> {
        let lower = url.trim().to_ascii_lowercase();
        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            Ok(EngineKind::Postgres)
        } else if lower == ":memory:"
            || lower.starts_with("sqlite:")
            || lower.ends_with(".db")
            || lower.ends_with(".sqlite")
            || lower.ends_with(".sqlite3")
        {
            Ok(EngineKind::Sqlite)
        } else {
            let engine = lower
                .split_once("://")
                .map(|(scheme, _)| scheme.to_string())
                .unwrap_or(lower);
            Err(StorageError::Backend(BackendError::UnsupportedEngine {
                engine,
            }))
        }
    }
}

/// Returns the SQLite path for a connection string (`sqlite://x.db` → `x.db`).
#[cfg_attr(not(feature = "sqlite"), allow(dead_code))]
pub(crate) fn sqlite_path(url: &str) -> &str {
    let url = url.trim();
    url.strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url)
}

/// Configuration for opening a repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Connection string naming the backing engine.
    pub connection_string: String,

    /// Version allocation strategy.
    #[serde(default)]
    pub concurrency: ConcurrencyStrategy,

    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Time to wait for a pooled connection, in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,

    /// PostgreSQL statement timeout in milliseconds.
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,

    /// Deadline for one write, in milliseconds. A write that has not reached
    /// commit by then is rolled back and fails with a timeout.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_connection_timeout_ms() -> u64 {
    30000
}

fn default_busy_timeout_ms() -> u32 {
    5000
}

fn default_statement_timeout_ms() -> u64 {
    30000
}

fn default_write_timeout_ms() -> u64 {
    10000
}

impl RepositoryConfig {
    /// Creates a configuration with default tuning for the given connection string.
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            concurrency: ConcurrencyStrategy::default(),
            max_connections: default_max_connections(),
            connection_timeout_ms: default_connection_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            statement_timeout_ms: default_statement_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }

    /// Sets the version allocation strategy.
    pub fn with_concurrency(mut self, concurrency: ConcurrencyStrategy) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets the pool size.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Sets the write deadline.
    pub fn with_write_timeout_ms(mut self, write_timeout_ms: u64) -> Self {
        self.write_timeout_ms = write_timeout_ms;
        self
    }

    /// Returns the engine named by the connection string.
    pub fn engine(&self) -> StorageResult<EngineKind> {
        EngineKind::from_connection_string(&self.connection_string)
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self::new(":memory:")
    }
}
