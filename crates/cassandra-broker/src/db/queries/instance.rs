//! Queries against the `provision` table.

use crate::db::models::{encode_claimed, Instance, InstanceRow};
use crate::db::{CatalogError, CatalogResult, DbPool};

/// Insert a new instance row.
///
/// The primary key on `name` turns a second insert for the same name
/// into `CatalogError::Duplicate`.
pub async fn insert_instance(pool: &DbPool, instance: &Instance) -> CatalogResult<()> {
    let result = sqlx::query(
        r#"
        INSERT INTO provision (name, plan, claimed, billingcode, username, password)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(&instance.name)
    .bind(&instance.plan)
    .bind(encode_claimed(instance.claimed))
    .bind(&instance.billing_code)
    .bind(&instance.username)
    .bind(&instance.password)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(CatalogError::Duplicate(instance.name.clone()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Get an instance by name. `Ok(None)` means no row matched.
pub async fn find_instance_by_name(pool: &DbPool, name: &str) -> CatalogResult<Option<Instance>> {
    let row = sqlx::query_as::<_, InstanceRow>(
        r#"
        SELECT name, plan, claimed::text AS claimed, billingcode, username, password
        FROM provision
        WHERE name = $1
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Instance::from))
}

/// Delete an instance row. Returns whether a row was removed.
pub async fn delete_instance_by_name(pool: &DbPool, name: &str) -> CatalogResult<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM provision
        WHERE name = $1
        "#,
    )
    .bind(name)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
