//! HTTP handlers for the Cassandra Broker API.

pub mod health;
pub mod instances;
pub mod plans;

pub use health::{api_health, health_check};
