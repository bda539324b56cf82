//! Plan listing.

use axum::Json;
use std::collections::BTreeMap;

use crate::plan;

/// List available plans.
///
/// `GET /v1/cassandra/plans`
///
/// # Response
///
/// ```json
/// {
///   "large": "3 replicas, SimpleStrategy",
///   "medium": "2 replicas, SimpleStrategy",
///   "small": "1 replica, SimpleStrategy"
/// }
/// ```
pub async fn list() -> Json<BTreeMap<&'static str, &'static str>> {
    Json(plan::catalog())
}
