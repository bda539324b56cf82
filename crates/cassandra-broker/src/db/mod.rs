//! Catalog store for the Cassandra Broker.
//!
//! The `provision` table in PostgreSQL is the single source of truth for
//! which instances exist. Access goes through the [`CatalogStore`] trait;
//! [`PgCatalogStore`] implements it with SQLx.

pub mod models;
pub mod pool;
pub mod queries;
pub mod store;

use thiserror::Error;

pub use pool::{create_pool, ensure_schema, DbPool};
pub use store::{CatalogStore, PgCatalogStore};

/// Errors raised by the catalog store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// A row with this name already exists.
    #[error("duplicate instance name: {0}")]
    Duplicate(String),

    /// Could not reach the database or a statement failed.
    #[error("database error: {0}")]
    Connection(String),

    /// The statement did not finish in time.
    #[error("statement timed out after {0} seconds")]
    Timeout(u64),
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        CatalogError::Connection(err.to_string())
    }
}

/// Result type alias using CatalogError.
pub type CatalogResult<T> = Result<T, CatalogError>;
