//! Cassandra Broker Library
//!
//! Provisions logical database instances (a keyspace plus a dedicated
//! login role) on a shared Cassandra cluster and records them in a
//! PostgreSQL catalog so they can be looked up and torn down later.
//!
//! ## Architecture
//!
//! The cluster and the catalog are independent, non-transactional
//! backends. The provisioning workflow orders calls against them and
//! compensates partial failures so a catalog row exists exactly when the
//! keyspace and role exist.
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from environment variables
//! - [`generator`]: Instance name and credential generation
//! - [`plan`]: Replication plans
//! - [`cluster`]: Cluster administration
//! - [`db`]: Catalog store
//! - [`services`]: Provisioning workflow
//! - [`handlers`]: HTTP route handlers
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cassandra_broker::{
//!     cluster::ScyllaClusterAdmin,
//!     config::{AppConfig, CatalogConfig, ClusterConfig},
//!     db::{create_pool, PgCatalogStore},
//!     generator::Generator,
//!     services::ProvisioningService,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = AppConfig::from_env()?;
//!     let cluster_config = ClusterConfig::from_env()?;
//!     let catalog_config = CatalogConfig::from_env()?;
//!     let pool = create_pool(&catalog_config).await?;
//!     let service = ProvisioningService::new(
//!         Arc::new(ScyllaClusterAdmin::connect(&cluster_config).await?),
//!         Arc::new(PgCatalogStore::new(pool, catalog_config.statement_timeout())),
//!         Generator::new(&app.name_prefix),
//!         cluster_config.hosts(),
//!     );
//!     let instance = service.provision_detached("small".into(), "ACME-1".into()).await?;
//!     println!("{}", instance.keyspace);
//!     Ok(())
//! }
//! ```

pub mod cluster;
pub mod config;
pub mod db;
pub mod error;
pub mod generator;
pub mod handlers;
pub mod plan;
pub mod router;
pub mod services;
pub mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{BrokerError, BrokerResult};
