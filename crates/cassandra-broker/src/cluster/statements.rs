//! CQL text for the administrative statements.
//!
//! DDL and role statements take no bind markers, so every interpolated
//! value goes through [`validate_identifier`] first.

use crate::cluster::ClusterError;
use crate::generator::validate_identifier;
use crate::plan::Replication;

pub fn create_keyspace(name: &str, replication: Replication) -> Result<String, ClusterError> {
    let name = validate_identifier(name)?;
    let strategy = validate_identifier(replication.strategy)?;
    Ok(format!(
        "CREATE KEYSPACE {} WITH replication = {{'class': '{}', 'replication_factor': {}}}",
        name, strategy, replication.replication_factor
    ))
}

pub fn create_role(username: &str, password: &str) -> Result<String, ClusterError> {
    let username = validate_identifier(username)?;
    let password = validate_identifier(password)?;
    Ok(format!(
        "CREATE ROLE {} WITH PASSWORD = '{}' AND LOGIN = true",
        username, password
    ))
}

pub fn grant_all(keyspace: &str, username: &str) -> Result<String, ClusterError> {
    let keyspace = validate_identifier(keyspace)?;
    let username = validate_identifier(username)?;
    Ok(format!(
        "GRANT ALL PERMISSIONS ON KEYSPACE {} TO {}",
        keyspace, username
    ))
}

pub fn drop_role(username: &str) -> Result<String, ClusterError> {
    Ok(format!("DROP ROLE {}", validate_identifier(username)?))
}

pub fn drop_keyspace(name: &str) -> Result<String, ClusterError> {
    Ok(format!("DROP KEYSPACE {}", validate_identifier(name)?))
}

/// Whether a backend error message means the drop target was absent.
///
/// Cassandra reports a missing keyspace as "Cannot drop non existing
/// keyspace" and a missing role as "<name> doesn't exist".
pub fn is_missing_target(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("non existing")
        || message.contains("doesn't exist")
        || message.contains("does not exist")
}
