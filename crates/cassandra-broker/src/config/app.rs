//! Server configuration for the Cassandra Broker.

use serde::Deserialize;
use std::time::Duration;

use crate::error::{BrokerError, BrokerResult};
use crate::generator::MAX_PREFIX_LEN;

/// Application configuration loaded from environment variables.
///
/// Environment variables are prefixed with `BROKER_`:
/// - `BROKER_HOST`: Server bind address (default: "0.0.0.0")
/// - `BROKER_PORT`: Server port (default: 3000)
/// - `BROKER_NAME_PREFIX`: Prefix for generated keyspace names (default: "ks")
/// - `BROKER_LOG_JSON`: Emit JSON log lines (default: false)
/// - `BROKER_SHUTDOWN_TIMEOUT_SECS`: How long shutdown waits for in-flight
///   workflows (default: 30)
///
/// The unprefixed `NAME_PREFIX` used by older deployments is honoured when
/// `BROKER_NAME_PREFIX` is not set.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Prefix prepended to every generated keyspace name
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,

    /// Emit JSON formatted logs
    #[serde(default)]
    pub log_json: bool,

    /// Seconds to wait for detached workflows at shutdown
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_name_prefix() -> String {
    "ks".to_string()
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

const PREFIX_VAR: &str = "BROKER_NAME_PREFIX";
const LEGACY_PREFIX_VAR: &str = "NAME_PREFIX";

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> BrokerResult<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> BrokerResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();
        let mut config = envy::prefixed("BROKER_").from_iter::<_, AppConfig>(vars.clone())?;

        let explicit = vars.iter().any(|(key, _)| key == PREFIX_VAR);
        let legacy = vars
            .iter()
            .find(|(key, value)| key == LEGACY_PREFIX_VAR && !value.is_empty());
        if let (false, Some((_, prefix))) = (explicit, legacy) {
            config.name_prefix = prefix.clone();
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject name prefixes that would produce invalid keyspace identifiers.
    ///
    /// Keyspace names are unquoted CQL identifiers capped at 48 characters,
    /// and 32 of those are taken by the generated suffix.
    pub fn validate(&self) -> BrokerResult<()> {
        let prefix = &self.name_prefix;
        let starts_with_letter = prefix
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic());

        if !starts_with_letter
            || prefix.len() > MAX_PREFIX_LEN
            || !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(BrokerError::Config(format!(
                "name prefix '{}' must start with a letter, contain only letters, digits or '_', and be at most {} characters",
                prefix, MAX_PREFIX_LEN
            )));
        }
        Ok(())
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Get the server bind address as a string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            name_prefix: default_name_prefix(),
            log_json: false,
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.name_prefix, "ks");
        assert!(config.validate().is_ok());
    }

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_vars() {
        let config = AppConfig::from_vars(vars(&[
            ("BROKER_PORT", "8080"),
            ("BROKER_NAME_PREFIX", "dev"),
            ("BROKER_SHUTDOWN_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.name_prefix, "dev");
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_legacy_name_prefix_fallback() {
        let config = AppConfig::from_vars(vars(&[("NAME_PREFIX", "legacy")])).unwrap();
        assert_eq!(config.name_prefix, "legacy");

        let config = AppConfig::from_vars(vars(&[
            ("NAME_PREFIX", "legacy"),
            ("BROKER_NAME_PREFIX", "current"),
        ]))
        .unwrap();
        assert_eq!(config.name_prefix, "current");

        let config = AppConfig::from_vars(vars(&[("NAME_PREFIX", "")])).unwrap();
        assert_eq!(config.name_prefix, "ks");

        assert!(AppConfig::from_vars(vars(&[("NAME_PREFIX", "bad-prefix")])).is_err());
    }

    #[test]
    fn test_bind_address() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_prefix_validation() {
        let mut config = AppConfig::default();

        config.name_prefix = "pfx".to_string();
        assert!(config.validate().is_ok());

        config.name_prefix = String::new();
        assert!(config.validate().is_err());

        config.name_prefix = "1abc".to_string();
        assert!(config.validate().is_err());

        config.name_prefix = "bad-prefix".to_string();
        assert!(config.validate().is_err());

        config.name_prefix = "a".repeat(MAX_PREFIX_LEN + 1);
        assert!(config.validate().is_err());
    }
}
