//! Cluster administration.
//!
//! The workflow talks to the distributed store through the
//! [`ClusterAdmin`] trait. [`ScyllaClusterAdmin`] is the production
//! implementation; tests use the in-memory one from [`crate::testing`].

pub mod cql;
pub mod statements;

use async_trait::async_trait;
use thiserror::Error;

use crate::plan::Replication;

pub use self::cql::ScyllaClusterAdmin;

/// Errors raised by cluster administration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClusterError {
    /// Could not open a session to the cluster.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The backend rejected or failed a statement.
    #[error("statement failed: {0}")]
    Execution(String),

    /// Drop target does not exist on the cluster.
    #[error("target does not exist: {0}")]
    Missing(String),

    /// Value refused before it reached a statement.
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),
}

/// Administrative operations against the distributed store.
///
/// Each call is one blocking round trip bounded by the implementation's
/// timeout. Nothing here is transactional; callers own compensation.
#[async_trait]
pub trait ClusterAdmin: Send + Sync {
    /// Create a keyspace. Fails if it already exists.
    async fn create_keyspace(&self, name: &str, replication: Replication)
        -> Result<(), ClusterError>;

    /// Create a login-capable role.
    async fn create_role(&self, username: &str, password: &str) -> Result<(), ClusterError>;

    /// Grant every permission on `keyspace` to `username`.
    async fn grant_all(&self, keyspace: &str, username: &str) -> Result<(), ClusterError>;

    /// Drop a role. Returns `ClusterError::Missing` if it is not there.
    async fn drop_role(&self, username: &str) -> Result<(), ClusterError>;

    /// Drop a keyspace. Returns `ClusterError::Missing` if it is not there.
    async fn drop_keyspace(&self, name: &str) -> Result<(), ClusterError>;
}
