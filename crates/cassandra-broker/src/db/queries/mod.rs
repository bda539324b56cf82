//! Catalog queries.

pub mod instance;
