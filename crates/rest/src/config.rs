//! Server configuration for the register's HTTP API.
//!
//! Every option can be given on the command line or through the environment.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `REGISTER_PORT` | 8503 | Server port |
//! | `REGISTER_HOST` | 127.0.0.1 | Host to bind |
//! | `REGISTER_LOG_LEVEL` | info | Log level |
//! | `REGISTER_DATABASE_URL` | register.db | Connection string (SQLite path or `postgres://` URL) |
//! | `REGISTER_CONCURRENCY` | atomic-upsert | Version allocation strategy (`atomic-upsert`, `advisory-lock`) |
//! | `REGISTER_MAX_CONNECTIONS` | 10 | Database pool size |
//! | `REGISTER_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `REGISTER_WRITE_TIMEOUT_MS` | 10000 | Deadline for one database write (milliseconds) |
//! | `REGISTER_PROVIDER_ID` | 00000000 | Provider id used when exchanging pseudonyms |
//! | `REGISTER_ENABLE_CORS` | false | Enable CORS |
//! | `REGISTER_CORS_ORIGINS` | * | Allowed origins |
//!
//! # Example
//!
//! ```rust
//! use register_rest::ServerConfig;
//!
//! let config = ServerConfig {
//!     port: 3000,
//!     host: "0.0.0.0".to_string(),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use clap::Parser;
use register_persistence::core::{ConcurrencyStrategy, RepositoryConfig};

/// Time left between the write deadline and the request deadline for the
/// commit itself, which the write timeout does not bound.
pub const COMMIT_HEADROOM_MS: u64 = 1_000;

/// Server configuration for the register's HTTP API.
#[derive(Debug, Clone, Parser)]
#[command(name = "register")]
#[command(about = "Metadata register HTTP API")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "REGISTER_PORT", default_value = "8503")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "REGISTER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "REGISTER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Database connection string.
    #[arg(long, env = "REGISTER_DATABASE_URL", default_value = "register.db")]
    pub database_url: String,

    /// Version allocation strategy (atomic-upsert or advisory-lock).
    #[arg(long, env = "REGISTER_CONCURRENCY", default_value = "atomic-upsert")]
    pub concurrency: ConcurrencyStrategy,

    /// Maximum number of pooled database connections.
    #[arg(long, env = "REGISTER_MAX_CONNECTIONS", default_value = "10")]
    pub max_connections: u32,

    /// Request timeout in seconds.
    #[arg(long, env = "REGISTER_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Deadline for one database write in milliseconds.
    #[arg(long, env = "REGISTER_WRITE_TIMEOUT_MS", default_value = "10000")]
    pub write_timeout_ms: u64,

    /// Provider id used as the target of pseudonym exchanges and referrals.
    #[arg(long, env = "REGISTER_PROVIDER_ID", default_value = "00000000")]
    pub provider_id: String,

    /// Enable CORS.
    #[arg(long, env = "REGISTER_ENABLE_CORS", default_value = "false")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "REGISTER_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8503,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            database_url: "register.db".to_string(),
            concurrency: ConcurrencyStrategy::default(),
            max_connections: 10,
            request_timeout: 30,
            write_timeout_ms: 10_000,
            provider_id: "00000000".to_string(),
            enable_cors: false,
            cors_origins: "*".to_string(),
        }
    }
}

impl ServerConfig {
    /// Creates a new ServerConfig from environment variables.
    ///
    /// This parses environment variables without requiring command line
    /// arguments.
    pub fn from_env() -> Self {
        Self::try_parse().unwrap_or_default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the repository configuration for this server.
    pub fn repository_config(&self) -> RepositoryConfig {
        RepositoryConfig::new(&self.database_url)
            .with_concurrency(self.concurrency)
            .with_max_connections(self.max_connections)
            .with_write_timeout_ms(self.write_timeout_ms)
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("Port cannot be 0".to_string());
        }

        if self.database_url.trim().is_empty() {
            errors.push("Database URL cannot be empty".to_string());
        }

        if self.max_connections == 0 {
            errors.push("Max connections cannot be 0".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.write_timeout_ms == 0 {
            errors.push("Write timeout cannot be 0".to_string());
        }

        // A write and its commit must finish before the request times out.
        if self.write_timeout_ms.saturating_add(COMMIT_HEADROOM_MS)
            > self.request_timeout.saturating_mul(1000)
        {
            errors.push(format!(
                "Write timeout must be at least {}ms shorter than the request timeout",
                COMMIT_HEADROOM_MS
            ));
        }

        if self.provider_id.trim().is_empty() {
            errors.push("Provider id cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// This uses an in-memory database and ephemeral port 0.
    pub fn for_testing() -> Self {
        Self {
            port: 0,
            host: "127.0.0.1".to_string(),
            log_level: "debug".to_string(),
            database_url: ":memory:".to_string(),
            concurrency: ConcurrencyStrategy::AtomicUpsert,
            max_connections: 1,
            request_timeout: 5,
            write_timeout_ms: 2_000,
            provider_id: "00000000".to_string(),
            enable_cors: false,
            cors_origins: "*".to_string(),
        }
    }
}
