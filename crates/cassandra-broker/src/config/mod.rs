//! Configuration module for the Cassandra Broker.
//!
//! All settings are read once at startup from environment variables
//! using the `envy` crate. Secrets (admin credentials, catalog URL) are
//! expected to be injected into the environment by the platform.

mod app;
mod catalog;
mod cluster;

pub use app::AppConfig;
pub use catalog::CatalogConfig;
pub use cluster::ClusterConfig;
