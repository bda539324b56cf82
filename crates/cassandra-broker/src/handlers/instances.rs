//! Instance API handlers.
//!
//! Each endpoint keeps its own error body shape; the status code comes
//! from [`BrokerError::status_code`].

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::db::models::ProvisionRequest;
use crate::error::BrokerError;
use crate::state::AppState;

fn log_failure(op: &'static str, err: &BrokerError) {
    if err.is_client_error() {
        tracing::info!(op, error = %err, "Request rejected");
    } else {
        tracing::error!(op, error = %err, "Request failed");
    }
}

/// Provision a new instance.
///
/// `POST /v1/cassandra/instance`
///
/// # Request Body
///
/// ```json
/// { "plan": "large", "billingcode": "ACME-1" }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// {
///   "CASSANDRA_KEYSPACE": "ks3f2a...",
///   "CASSANDRA_LOCATION": "host1,host2",
///   "CASSANDRA_PASSWORD": "p9c1e...",
///   "CASSANDRA_USERNAME": "u07bd..."
/// }
/// ```
///
/// Failures return `{"error": "<message>"}`.
pub async fn provision(
    State(state): State<AppState>,
    body: Result<Json<ProvisionRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            let err = BrokerError::Validation(rejection.body_text());
            log_failure("provision", &err);
            return provision_error(err);
        }
    };

    match state
        .provisioning
        .provision_detached(request.plan, request.billingcode)
        .await
    {
        Ok(instance) => (StatusCode::CREATED, Json(instance)).into_response(),
        Err(err) => {
            log_failure("provision", &err);
            provision_error(err)
        }
    }
}

fn provision_error(err: BrokerError) -> Response {
    (
        err.status_code(),
        Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}

/// Get connection details for an instance.
///
/// `GET /v1/cassandra/url/{keyspace}`
///
/// Failures return `{"status": "<code>", "msg": "<message>"}`.
pub async fn get_url(State(state): State<AppState>, Path(keyspace): Path<String>) -> Response {
    match state.provisioning.lookup(&keyspace).await {
        Ok(instance) => (StatusCode::OK, Json(instance)).into_response(),
        Err(err) => {
            log_failure("lookup", &err);
            let status = err.status_code();
            (
                status,
                Json(json!({
                    "status": status.as_u16().to_string(),
                    "msg": err.to_string()
                })),
            )
                .into_response()
        }
    }
}

/// Tear down an instance.
///
/// `DELETE /v1/cassandra/instance/{keyspace}`
///
/// `200 OK` with an empty body on success; the error message as plain
/// text otherwise.
pub async fn delete(State(state): State<AppState>, Path(keyspace): Path<String>) -> Response {
    match state.provisioning.deprovision_detached(keyspace).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => {
            log_failure("deprovision", &err);
            (err.status_code(), err.to_string()).into_response()
        }
    }
}
