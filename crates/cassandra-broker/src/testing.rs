//! In-memory backends with fault injection.
//!
//! Used by the unit and integration tests to drive the provisioning
//! workflow without a live cluster or database. Statement text is still
//! built through [`crate::cluster::statements`], so identifier
//! validation behaves exactly as in production.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::cluster::{statements, ClusterAdmin, ClusterError};
use crate::db::models::Instance;
use crate::db::{CatalogError, CatalogResult, CatalogStore};
use crate::plan::Replication;

/// Cluster operation kinds, for fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterOp {
    CreateKeyspace,
    CreateRole,
    GrantAll,
    DropRole,
    DropKeyspace,
}

/// A call received by [`MemoryClusterAdmin`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterCall {
    CreateKeyspace {
        name: String,
        replication_factor: u32,
    },
    CreateRole(String),
    GrantAll {
        keyspace: String,
        username: String,
    },
    DropRole(String),
    DropKeyspace(String),
}

#[derive(Default)]
struct ClusterState {
    keyspaces: HashMap<String, u32>,
    roles: HashMap<String, String>,
    grants: HashSet<(String, String)>,
    calls: Vec<ClusterCall>,
    failing: HashSet<ClusterOp>,
}

/// Cluster administrator that keeps keyspaces and roles in memory.
#[derive(Default)]
pub struct MemoryClusterAdmin {
    state: Mutex<ClusterState>,
}

impl MemoryClusterAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ClusterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every future call of `op` fail with an execution error.
    pub fn fail_on(&self, op: ClusterOp) {
        self.state().failing.insert(op);
    }

    pub fn clear_failures(&self) {
        self.state().failing.clear();
    }

    pub fn calls(&self) -> Vec<ClusterCall> {
        self.state().calls.clone()
    }

    pub fn has_keyspace(&self, name: &str) -> bool {
        self.state().keyspaces.contains_key(name)
    }

    pub fn has_role(&self, username: &str) -> bool {
        self.state().roles.contains_key(username)
    }

    pub fn has_grant(&self, keyspace: &str, username: &str) -> bool {
        self.state()
            .grants
            .contains(&(keyspace.to_string(), username.to_string()))
    }

    pub fn replication_factor(&self, keyspace: &str) -> Option<u32> {
        self.state().keyspaces.get(keyspace).copied()
    }

    pub fn role_password(&self, username: &str) -> Option<String> {
        self.state().roles.get(username).cloned()
    }

    pub fn keyspace_count(&self) -> usize {
        self.state().keyspaces.len()
    }

    pub fn role_count(&self) -> usize {
        self.state().roles.len()
    }

    /// Record the call and apply any injected failure.
    fn begin(&self, op: ClusterOp, call: ClusterCall) -> Result<MutexGuard<'_, ClusterState>, ClusterError> {
        let mut state = self.state();
        state.calls.push(call);
        if state.failing.contains(&op) {
            return Err(ClusterError::Execution(format!("injected failure in {:?}", op)));
        }
        Ok(state)
    }
}

#[async_trait]
impl ClusterAdmin for MemoryClusterAdmin {
    async fn create_keyspace(
        &self,
        name: &str,
        replication: Replication,
    ) -> Result<(), ClusterError> {
        statements::create_keyspace(name, replication)?;
        let mut state = self.begin(
            ClusterOp::CreateKeyspace,
            ClusterCall::CreateKeyspace {
                name: name.to_string(),
                replication_factor: replication.replication_factor,
            },
        )?;
        if state.keyspaces.contains_key(name) {
            return Err(ClusterError::Execution(format!(
                "Cannot add existing keyspace \"{}\"",
                name
            )));
        }
        state
            .keyspaces
            .insert(name.to_string(), replication.replication_factor);
        Ok(())
    }

    async fn create_role(&self, username: &str, password: &str) -> Result<(), ClusterError> {
        statements::create_role(username, password)?;
        let mut state = self.begin(
            ClusterOp::CreateRole,
            ClusterCall::CreateRole(username.to_string()),
        )?;
        if state.roles.contains_key(username) {
            return Err(ClusterError::Execution(format!(
                "{} already exists",
                username
            )));
        }
        state
            .roles
            .insert(username.to_string(), password.to_string());
        Ok(())
    }

    async fn grant_all(&self, keyspace: &str, username: &str) -> Result<(), ClusterError> {
        statements::grant_all(keyspace, username)?;
        let mut state = self.begin(
            ClusterOp::GrantAll,
            ClusterCall::GrantAll {
                keyspace: keyspace.to_string(),
                username: username.to_string(),
            },
        )?;
        if !state.keyspaces.contains_key(keyspace) {
            return Err(ClusterError::Execution(format!(
                "Resource <keyspace {}> doesn't exist",
                keyspace
            )));
        }
        if !state.roles.contains_key(username) {
            return Err(ClusterError::Execution(format!(
                "Role {} doesn't exist",
                username
            )));
        }
        state
            .grants
            .insert((keyspace.to_string(), username.to_string()));
        Ok(())
    }

    async fn drop_role(&self, username: &str) -> Result<(), ClusterError> {
        statements::drop_role(username)?;
        let mut state = self.begin(
            ClusterOp::DropRole,
            ClusterCall::DropRole(username.to_string()),
        )?;
        if state.roles.remove(username).is_none() {
            return Err(ClusterError::Missing(format!("{} doesn't exist", username)));
        }
        state.grants.retain(|(_, u)| u != username);
        Ok(())
    }

    async fn drop_keyspace(&self, name: &str) -> Result<(), ClusterError> {
        statements::drop_keyspace(name)?;
        let mut state = self.begin(
            ClusterOp::DropKeyspace,
            ClusterCall::DropKeyspace(name.to_string()),
        )?;
        if state.keyspaces.remove(name).is_none() {
            return Err(ClusterError::Missing(format!(
                "Cannot drop non existing keyspace '{}'.",
                name
            )));
        }
        state.grants.retain(|(k, _)| k != name);
        Ok(())
    }
}

/// Catalog operation kinds, for fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogOp {
    Insert,
    Find,
    Delete,
}

#[derive(Default)]
struct CatalogState {
    rows: HashMap<String, Instance>,
    failing: HashSet<CatalogOp>,
    failing_after_commit: HashSet<CatalogOp>,
}

/// Catalog store that keeps rows in memory.
#[derive(Default)]
pub struct MemoryCatalogStore {
    state: Mutex<CatalogState>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn fail_on(&self, op: CatalogOp) {
        self.state().failing.insert(op);
    }

    /// Make `op` apply its change and then report a statement timeout, like
    /// a write that committed on the server after the client gave up.
    pub fn commit_then_fail_on(&self, op: CatalogOp) {
        self.state().failing_after_commit.insert(op);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.failing.clear();
        state.failing_after_commit.clear();
    }

    /// Store a row as-is, bypassing fault injection.
    pub fn seed(&self, instance: Instance) {
        self.state().rows.insert(instance.name.clone(), instance);
    }

    pub fn get(&self, name: &str) -> Option<Instance> {
        self.state().rows.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.state().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(state: &CatalogState, op: CatalogOp) -> CatalogResult<()> {
        if state.failing.contains(&op) {
            return Err(CatalogError::Connection(format!(
                "injected failure in {:?}",
                op
            )));
        }
        Ok(())
    }

    fn committed(state: &CatalogState, op: CatalogOp) -> CatalogResult<()> {
        if state.failing_after_commit.contains(&op) {
            return Err(CatalogError::Timeout(10));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn insert(&self, instance: &Instance) -> CatalogResult<()> {
        let mut state = self.state();
        Self::check(&state, CatalogOp::Insert)?;
        if state.rows.contains_key(&instance.name) {
            return Err(CatalogError::Duplicate(instance.name.clone()));
        }
        state.rows.insert(instance.name.clone(), instance.clone());
        Self::committed(&state, CatalogOp::Insert)
    }

    async fn find_by_name(&self, name: &str) -> CatalogResult<Option<Instance>> {
        let state = self.state();
        Self::check(&state, CatalogOp::Find)?;
        Ok(state.rows.get(name).cloned())
    }

    async fn delete_by_name(&self, name: &str) -> CatalogResult<bool> {
        let mut state = self.state();
        Self::check(&state, CatalogOp::Delete)?;
        let removed = state.rows.remove(name).is_some();
        Self::committed(&state, CatalogOp::Delete)?;
        Ok(removed)
    }

    async fn ping(&self) -> bool {
        let state = self.state();
        state.failing.is_empty() && state.failing_after_commit.is_empty()
    }
}
