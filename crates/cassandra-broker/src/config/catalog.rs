//! Catalog database configuration for PostgreSQL connection.

use serde::Deserialize;
use std::time::Duration;

/// Catalog configuration loaded from environment variables.
///
/// Environment variables are prefixed with `BROKERDB_`:
/// - `BROKERDB_URL`: Full PostgreSQL connection URL
/// - `BROKERDB_MAX_CONNECTIONS`: Pool size (default: 5)
/// - `BROKERDB_ACQUIRE_TIMEOUT_SECS`: Pool acquire timeout (default: 10)
/// - `BROKERDB_STATEMENT_TIMEOUT_SECS`: Per-statement timeout (default: 10)
#[derive(Clone, Deserialize)]
pub struct CatalogConfig {
    /// Connection URL
    pub url: String,

    /// Maximum connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_timeout")]
    pub acquire_timeout_secs: u64,

    /// Statement timeout in seconds
    #[serde(default = "default_timeout")]
    pub statement_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_timeout() -> u64 {
    10
}

impl CatalogConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("BROKERDB_").from_env::<CatalogConfig>()
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn statement_timeout(&self) -> Duration {
        Duration::from_secs(self.statement_timeout_secs)
    }
}

// The URL usually embeds the catalog password.
impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("statement_timeout_secs", &self.statement_timeout_secs)
            .finish()
    }
}
