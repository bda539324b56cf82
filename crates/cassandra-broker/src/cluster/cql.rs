//! `ClusterAdmin` backed by the `scylla` CQL driver.

use async_trait::async_trait;
use scylla::statement::Consistency;
use scylla::transport::session::PoolSize;
use scylla::{ExecutionProfile, Session, SessionBuilder};
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::cluster::statements;
use crate::cluster::{ClusterAdmin, ClusterError};
use crate::config::ClusterConfig;
use crate::plan::Replication;

/// Administrative session shared by every request.
#[derive(Clone)]
pub struct ScyllaClusterAdmin {
    session: Arc<Session>,
}

impl ScyllaClusterAdmin {
    /// Open a session to the configured hosts.
    ///
    /// One connection per host, consistency ONE, and the configured
    /// connect and request timeouts.
    pub async fn connect(config: &ClusterConfig) -> Result<Self, ClusterError> {
        let nodes = config.known_nodes();
        if nodes.is_empty() {
            return Err(ClusterError::Connection(
                "CASSANDRA_URL contains no hosts".to_string(),
            ));
        }

        let profile = ExecutionProfile::builder()
            .consistency(Consistency::One)
            .request_timeout(Some(config.request_timeout()))
            .build();

        let per_host = NonZeroUsize::new(config.connections_per_host.max(1))
            .unwrap_or(NonZeroUsize::MIN);

        let session = SessionBuilder::new()
            .known_nodes(&nodes)
            .user(&config.admin_username, &config.admin_password)
            .connection_timeout(config.connect_timeout())
            .pool_size(PoolSize::PerHost(per_host))
            .default_execution_profile_handle(profile.into_handle())
            .build()
            .await
            .map_err(|e| ClusterError::Connection(e.to_string()))?;

        tracing::info!(
            nodes = ?nodes,
            connections_per_host = per_host.get(),
            "Cluster session established"
        );

        Ok(Self {
            session: Arc::new(session),
        })
    }

    /// Run one statement. `op` names it in logs; the CQL text itself is
    /// not logged since role statements carry a password.
    async fn execute(&self, op: &'static str, cql: String) -> Result<(), ClusterError> {
        tracing::debug!(op, "Executing cluster statement");
        self.session
            .query_unpaged(cql, ())
            .await
            .map(|_| ())
            .map_err(|e| {
                let message = e.to_string();
                if statements::is_missing_target(&message) {
                    ClusterError::Missing(message)
                } else {
                    ClusterError::Execution(message)
                }
            })
    }
}

#[async_trait]
impl ClusterAdmin for ScyllaClusterAdmin {
    async fn create_keyspace(
        &self,
        name: &str,
        replication: Replication,
    ) -> Result<(), ClusterError> {
        let cql = statements::create_keyspace(name, replication)?;
        self.execute("create_keyspace", cql).await
    }

    async fn create_role(&self, username: &str, password: &str) -> Result<(), ClusterError> {
        let cql = statements::create_role(username, password)?;
        self.execute("create_role", cql).await
    }

    async fn grant_all(&self, keyspace: &str, username: &str) -> Result<(), ClusterError> {
        let cql = statements::grant_all(keyspace, username)?;
        self.execute("grant_all", cql).await
    }

    async fn drop_role(&self, username: &str) -> Result<(), ClusterError> {
        let cql = statements::drop_role(username)?;
        self.execute("drop_role", cql).await
    }

    async fn drop_keyspace(&self, name: &str) -> Result<(), ClusterError> {
        let cql = statements::drop_keyspace(name)?;
        self.execute("drop_keyspace", cql).await
    }
}
