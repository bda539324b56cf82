//! Catalog models.

pub mod instance;

pub use instance::*;
