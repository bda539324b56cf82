//! Route table for the broker API.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the application router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let health_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/v1/cassandra/health", get(handlers::api_health));

    let broker_routes = Router::new()
        .route("/v1/cassandra/plans", get(handlers::plans::list))
        .route(
            "/v1/cassandra/instance",
            post(handlers::instances::provision),
        )
        .route(
            "/v1/cassandra/url/{keyspace}",
            get(handlers::instances::get_url),
        )
        .route(
            "/v1/cassandra/instance/{keyspace}",
            delete(handlers::instances::delete),
        );

    Router::new()
        .merge(health_routes)
        .merge(broker_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
