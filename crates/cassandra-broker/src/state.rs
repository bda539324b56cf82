//! Application state for the Cassandra Broker server.
//!
//! This module defines the shared application state that is
//! passed to all handlers via Axum's state management.

use crate::config::AppConfig;
use crate::services::ProvisioningService;
use std::sync::Arc;

/// Shared application state.
///
/// Cloned into every handler; the backends inside the provisioning
/// service are reference counted and live for the whole process.
#[derive(Clone)]
pub struct AppState {
    /// Provisioning workflow
    pub provisioning: ProvisioningService,

    /// Application configuration
    pub config: Arc<AppConfig>,

    /// Server start time for uptime calculation
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(provisioning: ProvisioningService, config: AppConfig) -> Self {
        Self {
            provisioning,
            config: Arc::new(config),
            start_time: std::time::Instant::now(),
        }
    }

    /// Get the server uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
