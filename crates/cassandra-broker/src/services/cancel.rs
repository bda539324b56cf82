//! Caller-side cancellation for detached workflows.
//!
//! Workflows run in their own task so a dropped HTTP request cannot
//! interrupt compensation halfway. The request only raises a flag; the
//! workflow checks it between forward steps. Tasks are spawned on a
//! [`TaskTracker`] so shutdown can wait for them to finish.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::task::TaskTracker;

use crate::error::{BrokerError, BrokerResult};

/// Shared cancellation flag.
#[derive(Clone, Default, Debug)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Guard that cancels this flag when dropped, unless disarmed first.
    pub fn guard(&self) -> CancelGuard {
        CancelGuard {
            flag: self.clone(),
            armed: true,
        }
    }
}

/// Raises its flag on drop.
pub struct CancelGuard {
    flag: CancelFlag,
    armed: bool,
}

impl CancelGuard {
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if self.armed {
            self.flag.cancel();
        }
    }
}

/// Run a workflow in its own task and wait for it.
///
/// If the returned future is dropped before completion the task keeps
/// running with its flag raised, and `tasks` still counts it until it ends.
pub async fn run_detached<T, F, Fut>(tasks: &TaskTracker, workflow: F) -> BrokerResult<T>
where
    F: FnOnce(CancelFlag) -> Fut,
    Fut: Future<Output = BrokerResult<T>> + Send + 'static,
    T: Send + 'static,
{
    let flag = CancelFlag::new();
    let guard = flag.guard();

    let handle = tasks.spawn(workflow(flag));
    let joined = handle.await;
    guard.disarm();

    joined.map_err(|e| BrokerError::Internal(format!("workflow task failed: {}", e)))?
}
