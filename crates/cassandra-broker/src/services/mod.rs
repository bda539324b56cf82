//! Service layer for the Cassandra Broker.
//!
//! Services encapsulate the provisioning workflow and coordinate
//! between handlers, the cluster administrator and the catalog store.

pub mod cancel;
pub mod locks;
pub mod provisioning;

pub use cancel::{run_detached, CancelFlag, CancelGuard};
pub use locks::{NameGuard, NameLocks};
pub use provisioning::{ProvisionPhase, ProvisioningService};
