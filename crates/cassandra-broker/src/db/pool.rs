//! Catalog connection pool management.

use crate::config::CatalogConfig;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Type alias for the PostgreSQL connection pool.
pub type DbPool = PgPool;

/// Table holding one row per provisioned instance.
///
/// Column types match tables created by earlier deployments, which store
/// `claimed` as `yes`/`no` text.
const CREATE_PROVISION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS provision (
    name        TEXT PRIMARY KEY,
    plan        TEXT NOT NULL,
    claimed     TEXT NOT NULL,
    billingcode TEXT NOT NULL,
    username    TEXT NOT NULL,
    password    TEXT NOT NULL
)
"#;

/// Create a new catalog connection pool.
///
/// Each statement borrows a connection from the pool and returns it when
/// the statement completes, on success and on error alike.
pub async fn create_pool(config: &CatalogConfig) -> Result<DbPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        acquire_timeout_secs = config.acquire_timeout_secs,
        "Catalog connection pool created"
    );

    Ok(pool)
}

/// Create the `provision` table if it does not exist yet.
pub async fn ensure_schema(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_PROVISION_TABLE).execute(pool).await?;
    tracing::debug!("Catalog schema ensured");
    Ok(())
}

/// Check if the catalog database is reachable.
pub async fn health_check(pool: &DbPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}
