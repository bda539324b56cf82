//! Catalog store abstraction used by the provisioning workflow.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::db::models::Instance;
use crate::db::queries::instance as queries;
use crate::db::{CatalogError, CatalogResult, DbPool};

/// Persistence for instance records.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Record a new instance. Fails with `Duplicate` if the name is taken.
    async fn insert(&self, instance: &Instance) -> CatalogResult<()>;

    /// Look up an instance. Absence is `Ok(None)`, never an empty record.
    async fn find_by_name(&self, name: &str) -> CatalogResult<Option<Instance>>;

    /// Remove an instance row. Returns whether a row existed.
    async fn delete_by_name(&self, name: &str) -> CatalogResult<bool>;

    /// Whether the store is reachable.
    async fn ping(&self) -> bool;
}

/// PostgreSQL-backed catalog store.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: DbPool,
    statement_timeout: Duration,
}

impl PgCatalogStore {
    pub fn new(pool: DbPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    async fn bounded<T>(&self, fut: impl Future<Output = CatalogResult<T>>) -> CatalogResult<T> {
        tokio::time::timeout(self.statement_timeout, fut)
            .await
            .map_err(|_| CatalogError::Timeout(self.statement_timeout.as_secs()))?
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn insert(&self, instance: &Instance) -> CatalogResult<()> {
        self.bounded(queries::insert_instance(&self.pool, instance))
            .await
    }

    async fn find_by_name(&self, name: &str) -> CatalogResult<Option<Instance>> {
        self.bounded(queries::find_instance_by_name(&self.pool, name))
            .await
    }

    async fn delete_by_name(&self, name: &str) -> CatalogResult<bool> {
        self.bounded(queries::delete_instance_by_name(&self.pool, name))
            .await
    }

    async fn ping(&self) -> bool {
        self.bounded(async { Ok(crate::db::pool::health_check(&self.pool).await) })
            .await
            .unwrap_or(false)
    }
}
