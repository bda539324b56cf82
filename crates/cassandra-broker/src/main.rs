//! Cassandra Broker Server
//!
//! HTTP service that provisions keyspaces and login roles on a shared
//! Cassandra cluster and tracks them in a PostgreSQL catalog.

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cassandra_broker::{
    cluster::ScyllaClusterAdmin,
    config::{AppConfig, CatalogConfig, ClusterConfig},
    db::{create_pool, ensure_schema, PgCatalogStore},
    generator::Generator,
    router::build_router,
    services::ProvisioningService,
    state::AppState,
};

/// Initialize tracing/logging.
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,cassandra_broker=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let app_config = AppConfig::from_env().context("invalid BROKER_* configuration")?;

    init_tracing(app_config.log_json);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Cassandra Broker"
    );

    let cluster_config =
        ClusterConfig::from_env().context("missing or invalid CASSANDRA_* configuration")?;
    let catalog_config =
        CatalogConfig::from_env().context("missing or invalid BROKERDB_* configuration")?;

    tracing::info!(
        host = %app_config.host,
        port = app_config.port,
        name_prefix = %app_config.name_prefix,
        cluster = ?cluster_config,
        catalog = ?catalog_config,
        "Configuration loaded"
    );

    let db_pool = create_pool(&catalog_config)
        .await
        .context("failed to connect to catalog database")?;
    ensure_schema(&db_pool)
        .await
        .context("failed to create catalog schema")?;

    let cluster = ScyllaClusterAdmin::connect(&cluster_config)
        .await
        .context("failed to connect to cluster")?;

    let provisioning = ProvisioningService::new(
        Arc::new(cluster),
        Arc::new(PgCatalogStore::new(
            db_pool,
            catalog_config.statement_timeout(),
        )),
        Generator::new(app_config.name_prefix.clone()),
        cluster_config.hosts(),
    );

    let addr: SocketAddr = app_config.bind_address().parse()?;
    let shutdown_timeout = app_config.shutdown_timeout();
    let state = AppState::new(provisioning.clone(), app_config);
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;

    tracing::info!(address = %addr, "Server listening");

    // Run the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Requests are done but detached workflows may still be compensating.
    provisioning.drain(shutdown_timeout).await;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
