//! Error types for the Cassandra Broker.
//!
//! `BrokerError` is what the provisioning workflow returns to callers.
//! Each HTTP endpoint renders it into its own response body shape, so
//! this module only decides the status code.

use axum::http::StatusCode;
use thiserror::Error;

use crate::cluster::ClusterError;
use crate::db::CatalogError;

/// Broker-level errors.
#[derive(Error, Debug)]
pub enum BrokerError {
    /// Caller supplied something the broker cannot act on (e.g. unknown plan)
    #[error("Validation error: {0}")]
    Validation(String),

    /// No catalog row for the requested instance
    #[error("Instance not found: {0}")]
    NotFound(String),

    /// A mutating workflow for the same name is already recorded
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Cluster administration failed
    #[error("Cluster error: {0}")]
    Cluster(#[from] ClusterError),

    /// Catalog store failed
    #[error("Catalog error: {0}")]
    Catalog(CatalogError),

    /// The caller went away before the workflow finished
    #[error("Request cancelled: {0}")]
    Cancelled(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (task failure and the like)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BrokerError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            BrokerError::Validation(_) => StatusCode::BAD_REQUEST,
            BrokerError::NotFound(_) => StatusCode::NOT_FOUND,
            BrokerError::Conflict(_) => StatusCode::CONFLICT,
            BrokerError::Cluster(_)
            | BrokerError::Catalog(_)
            | BrokerError::Cancelled(_)
            | BrokerError::Config(_)
            | BrokerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure is the caller's fault rather than a backend's.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<CatalogError> for BrokerError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Duplicate(name) => {
                BrokerError::Conflict(format!("instance '{}' is already recorded", name))
            }
            other => BrokerError::Catalog(other),
        }
    }
}

impl From<envy::Error> for BrokerError {
    fn from(err: envy::Error) -> Self {
        BrokerError::Config(err.to_string())
    }
}

/// Result type alias using BrokerError.
pub type BrokerResult<T> = Result<T, BrokerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = BrokerError::NotFound("ks1234".to_string());
        assert_eq!(err.to_string(), "Instance not found: ks1234");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(err.is_client_error());
    }

    #[test]
    fn test_validation_error() {
        let err = BrokerError::Validation("unknown plan 'huge'".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_backend_errors_are_server_errors() {
        let err = BrokerError::from(ClusterError::Execution("timeout".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.is_client_error());

        let err = BrokerError::from(CatalogError::Connection("refused".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_duplicate_maps_to_conflict() {
        let err = BrokerError::from(CatalogError::Duplicate("ks1".to_string()));
        assert!(matches!(err, BrokerError::Conflict(_)));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
