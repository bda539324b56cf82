//! Per-instance-name serialization of mutating workflows.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

type LockTable = HashMap<String, Arc<tokio::sync::Mutex<()>>>;

/// Table of async locks keyed by instance name.
///
/// Entries exist only while some workflow holds or waits for them.
#[derive(Clone, Default)]
pub struct NameLocks {
    table: Arc<Mutex<LockTable>>,
}

/// Held for the duration of one workflow on one name.
pub struct NameGuard {
    name: String,
    table: Arc<Mutex<LockTable>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl NameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other workflow holds `name`, then hold it.
    pub async fn acquire(&self, name: &str) -> NameGuard {
        let lock = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            table.entry(name.to_string()).or_default().clone()
        };

        let guard = lock.lock_owned().await;

        NameGuard {
            name: name.to_string(),
            table: self.table.clone(),
            guard: Some(guard),
        }
    }

    /// Number of names currently held or awaited.
    pub fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NameGuard {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for NameGuard {
    fn drop(&mut self) {
        // Release the mutex before inspecting the table so the count below
        // only sees the table's own reference and any waiters.
        drop(self.guard.take());

        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        let unused = table
            .get(&self.name)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if unused {
            table.remove(&self.name);
        }
    }
}
