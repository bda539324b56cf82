//! Cassandra cluster connection configuration.

use serde::Deserialize;
use std::time::Duration;

/// Cluster configuration loaded from environment variables.
///
/// Environment variables are prefixed with `CASSANDRA_`:
/// - `CASSANDRA_URL`: Comma-separated list of cluster hosts
/// - `CASSANDRA_ADMIN_USERNAME`: Administrative role name
/// - `CASSANDRA_ADMIN_PASSWORD`: Administrative role password
/// - `CASSANDRA_PORT`: Native protocol port (default: 9042)
/// - `CASSANDRA_CONNECT_TIMEOUT_SECS`: Connect timeout (default: 10)
/// - `CASSANDRA_REQUEST_TIMEOUT_SECS`: Per-statement timeout (default: 10)
/// - `CASSANDRA_CONNECTIONS_PER_HOST`: Pool size per host (default: 1)
#[derive(Clone, Deserialize)]
pub struct ClusterConfig {
    /// Cluster host list as given, comma separated
    pub url: String,

    /// Administrative username
    pub admin_username: String,

    /// Administrative password
    pub admin_password: String,

    /// Native protocol port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout")]
    pub connect_timeout_secs: u64,

    /// Statement timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Connections kept open to each host
    #[serde(default = "default_connections_per_host")]
    pub connections_per_host: usize,
}

fn default_port() -> u16 {
    9042
}

fn default_timeout() -> u64 {
    10
}

fn default_connections_per_host() -> usize {
    1
}

impl ClusterConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("CASSANDRA_").from_env::<ClusterConfig>()
    }

    /// The configured hosts, trimmed, in the order given.
    pub fn hosts(&self) -> Vec<String> {
        self.url
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Host addresses with the native protocol port attached.
    ///
    /// Hosts that already carry a port are passed through unchanged.
    pub fn known_nodes(&self) -> Vec<String> {
        self.hosts()
            .into_iter()
            .map(|h| {
                if h.contains(':') {
                    h
                } else {
                    format!("{}:{}", h, self.port)
                }
            })
            .collect()
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl std::fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("url", &self.url)
            .field("admin_username", &self.admin_username)
            .field("admin_password", &"[REDACTED]")
            .field("port", &self.port)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connections_per_host", &self.connections_per_host)
            .finish()
    }
}
