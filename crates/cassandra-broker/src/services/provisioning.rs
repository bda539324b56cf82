//! Provisioning workflow.
//!
//! Creating an instance touches two stores that fail independently and
//! share no transaction: the cluster (keyspace, role, grant) and the
//! catalog (one row). Provisioning runs as a saga. Each forward step that
//! fails triggers best-effort compensation of the steps already done, in
//! reverse order, and the caller always sees the original error.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;

use crate::cluster::{ClusterAdmin, ClusterError};
use crate::db::models::{Instance, InstanceResponse};
use crate::db::{CatalogError, CatalogStore};
use crate::error::{BrokerError, BrokerResult};
use crate::generator::{GeneratedCredentials, Generator};
use crate::plan::Plan;
use crate::services::cancel::{run_detached, CancelFlag};
use crate::services::locks::NameLocks;

/// Last forward step a provisioning attempt completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProvisionPhase {
    Requested,
    KeyspaceCreated,
    RoleCreated,
    GrantIssued,
    /// Insert sent but its outcome is unknown; the row may have committed.
    RecordAttempted,
    Recorded,
}

impl ProvisionPhase {
    fn row_may_exist(self) -> bool {
        self >= ProvisionPhase::RecordAttempted
    }

    fn role_exists(self) -> bool {
        self >= ProvisionPhase::RoleCreated
    }

    fn keyspace_exists(self) -> bool {
        self >= ProvisionPhase::KeyspaceCreated
    }
}

/// One failed rollback step.
#[derive(Debug)]
pub struct CompensationFailure {
    pub step: &'static str,
    pub error: BrokerError,
}

/// Outcome of rolling back a partial provisioning attempt.
#[derive(Debug, Default)]
pub struct CompensationReport {
    pub attempted: Vec<&'static str>,
    pub failures: Vec<CompensationFailure>,
}

impl CompensationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Orchestrates the generator, cluster administrator and catalog store.
#[derive(Clone)]
pub struct ProvisioningService {
    cluster: Arc<dyn ClusterAdmin>,
    catalog: Arc<dyn CatalogStore>,
    generator: Generator,
    endpoints: Arc<[String]>,
    locks: NameLocks,
    tasks: TaskTracker,
}

impl ProvisioningService {
    /// Create a new provisioning service.
    ///
    /// # Arguments
    ///
    /// * `cluster` - Cluster administrator
    /// * `catalog` - Catalog store
    /// * `generator` - Identifier and credential generator
    /// * `endpoints` - Cluster hosts reported as the instance location
    pub fn new(
        cluster: Arc<dyn ClusterAdmin>,
        catalog: Arc<dyn CatalogStore>,
        generator: Generator,
        endpoints: Vec<String>,
    ) -> Self {
        Self {
            cluster,
            catalog,
            generator,
            endpoints: endpoints.into(),
            locks: NameLocks::new(),
            tasks: TaskTracker::new(),
        }
    }

    /// Comma-joined cluster host list.
    pub fn location(&self) -> String {
        self.endpoints.join(",")
    }

    pub fn locks(&self) -> &NameLocks {
        &self.locks
    }

    /// Wait up to `limit` for detached workflows, compensation included.
    /// Call once the server has stopped taking requests. Returns false on
    /// timeout.
    pub async fn drain(&self, limit: Duration) -> bool {
        self.tasks.close();
        let running = self.tasks.len();
        if running > 0 {
            tracing::info!(running, "Waiting for in-flight workflows");
        }
        if tokio::time::timeout(limit, self.tasks.wait()).await.is_err() {
            tracing::error!(
                running = self.tasks.len(),
                limit_secs = limit.as_secs(),
                "Workflows still running at shutdown; check for orphaned keyspaces and roles"
            );
            return false;
        }
        true
    }

    /// Whether the catalog store answers.
    pub async fn catalog_healthy(&self) -> bool {
        self.catalog.ping().await
    }

    /// Provision in a detached task; dropping the returned future cancels
    /// the remaining forward steps but never the compensation.
    pub async fn provision_detached(
        &self,
        plan: String,
        billing_code: String,
    ) -> BrokerResult<InstanceResponse> {
        let service = self.clone();
        run_detached(&self.tasks, move |cancel| async move {
            service.provision(&plan, &billing_code, &cancel).await
        })
        .await
    }

    /// Deprovision in a detached task.
    pub async fn deprovision_detached(&self, name: String) -> BrokerResult<()> {
        let service = self.clone();
        run_detached(&self.tasks, move |cancel| async move {
            service.deprovision(&name, &cancel).await
        })
        .await
    }

    /// Create a keyspace, its login role and the catalog row.
    pub async fn provision(
        &self,
        plan: &str,
        billing_code: &str,
        cancel: &CancelFlag,
    ) -> BrokerResult<InstanceResponse> {
        let plan: Plan = plan.parse()?;
        let replication = plan.resolve();
        let creds = self.generator.generate();

        let _guard = self.locks.acquire(&creds.keyspace).await;

        tracing::info!(
            keyspace = %creds.keyspace,
            username = %creds.username,
            plan = %plan,
            replication_factor = replication.replication_factor,
            "Provisioning instance"
        );

        let mut phase = ProvisionPhase::Requested;

        self.checkpoint(cancel, phase, &creds).await?;
        if let Err(e) = self
            .cluster
            .create_keyspace(&creds.keyspace, replication)
            .await
        {
            tracing::error!(keyspace = %creds.keyspace, error = %e, "Keyspace creation failed");
            return Err(e.into());
        }
        phase = ProvisionPhase::KeyspaceCreated;
        tracing::debug!(keyspace = %creds.keyspace, "Keyspace created");

        self.checkpoint(cancel, phase, &creds).await?;
        if let Err(e) = self
            .cluster
            .create_role(&creds.username, &creds.password)
            .await
        {
            return Err(self.roll_back(phase, &creds, "create_role", e.into()).await);
        }
        phase = ProvisionPhase::RoleCreated;
        tracing::debug!(keyspace = %creds.keyspace, username = %creds.username, "Role created");

        self.checkpoint(cancel, phase, &creds).await?;
        if let Err(e) = self
            .cluster
            .grant_all(&creds.keyspace, &creds.username)
            .await
        {
            return Err(self.roll_back(phase, &creds, "grant_all", e.into()).await);
        }
        phase = ProvisionPhase::GrantIssued;
        tracing::debug!(keyspace = %creds.keyspace, username = %creds.username, "Grant issued");

        self.checkpoint(cancel, phase, &creds).await?;
        let instance = Instance {
            name: creds.keyspace.clone(),
            plan: plan.as_str().to_string(),
            username: creds.username.clone(),
            password: creds.password.clone(),
            billing_code: billing_code.to_string(),
            claimed: true,
        };
        if let Err(e) = self.catalog.insert(&instance).await {
            // A duplicate means the row belongs to someone else. Anything
            // else may have committed before the error surfaced.
            if !matches!(e, CatalogError::Duplicate(_)) {
                phase = ProvisionPhase::RecordAttempted;
            }
            return Err(self.roll_back(phase, &creds, "record", e.into()).await);
        }
        phase = ProvisionPhase::Recorded;

        tracing::info!(keyspace = %instance.name, phase = ?phase, "Instance provisioned");
        Ok(InstanceResponse::new(&instance, self.location()))
    }

    /// Fetch a recorded instance.
    ///
    /// Only the catalog is consulted; the cluster is not contacted.
    pub async fn lookup(&self, name: &str) -> BrokerResult<InstanceResponse> {
        let instance = self.find(name).await?;
        Ok(InstanceResponse::new(&instance, self.location()))
    }

    /// Drop the role, the keyspace and then the catalog row.
    ///
    /// A drop target that is already gone is logged and skipped, so a
    /// deprovision that failed halfway can simply be retried. Any other
    /// failure stops the workflow with the catalog row still in place.
    pub async fn deprovision(&self, name: &str, cancel: &CancelFlag) -> BrokerResult<()> {
        let _guard = self.locks.acquire(name).await;

        let instance = self.find(name).await?;

        // Once teardown has started it runs to the end; stopping between
        // drops would only widen the inconsistency window.
        if cancel.is_cancelled() {
            return Err(BrokerError::Cancelled(format!(
                "deprovisioning of '{}' cancelled before any change",
                name
            )));
        }

        tracing::info!(keyspace = %name, username = %instance.username, "Deprovisioning instance");

        tolerate_missing(
            "drop_role",
            name,
            self.cluster.drop_role(&instance.username).await,
        )?;
        tolerate_missing("drop_keyspace", name, self.cluster.drop_keyspace(name).await)?;

        if !self.catalog.delete_by_name(name).await? {
            tracing::warn!(keyspace = %name, "Catalog row already gone at delete");
        }

        tracing::info!(keyspace = %name, "Instance deprovisioned");
        Ok(())
    }

    async fn find(&self, name: &str) -> BrokerResult<Instance> {
        self.catalog
            .find_by_name(name)
            .await?
            .ok_or_else(|| BrokerError::NotFound(name.to_string()))
    }

    /// Abort with compensation if the caller has gone away.
    async fn checkpoint(
        &self,
        cancel: &CancelFlag,
        phase: ProvisionPhase,
        creds: &GeneratedCredentials,
    ) -> BrokerResult<()> {
        if !cancel.is_cancelled() {
            return Ok(());
        }
        let err = BrokerError::Cancelled(format!(
            "provisioning of '{}' cancelled after {:?}",
            creds.keyspace, phase
        ));
        Err(self.roll_back(phase, creds, "cancelled", err).await)
    }

    /// Compensate and hand back the error that caused the rollback.
    async fn roll_back(
        &self,
        phase: ProvisionPhase,
        creds: &GeneratedCredentials,
        failed_step: &'static str,
        cause: BrokerError,
    ) -> BrokerError {
        tracing::warn!(
            keyspace = %creds.keyspace,
            failed_step,
            phase = ?phase,
            error = %cause,
            "Provisioning failed, rolling back"
        );

        let report = self.compensate(phase, creds).await;
        if !report.is_clean() {
            tracing::error!(
                keyspace = %creds.keyspace,
                username = %creds.username,
                failures = report.failures.len(),
                "Rollback incomplete, orphaned catalog row or cluster objects need manual cleanup"
            );
        }
        cause
    }

    /// Undo everything up to `phase`, newest first.
    pub(crate) async fn compensate(
        &self,
        phase: ProvisionPhase,
        creds: &GeneratedCredentials,
    ) -> CompensationReport {
        let mut report = CompensationReport::default();

        if phase.row_may_exist() {
            report.attempted.push("delete_row");
            match self.catalog.delete_by_name(&creds.keyspace).await {
                Ok(true) => {
                    tracing::warn!(keyspace = %creds.keyspace, "Removed catalog row committed by a failed insert");
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        keyspace = %creds.keyspace,
                        step = "delete_row",
                        error = %e,
                        "Compensation step failed"
                    );
                    report.failures.push(CompensationFailure {
                        step: "delete_row",
                        error: e.into(),
                    });
                }
            }
        }

        if phase.role_exists() {
            report.attempted.push("drop_role");
            if let Err(e) = self.cluster.drop_role(&creds.username).await {
                record_failure(&mut report, "drop_role", creds, e);
            }
        }

        if phase.keyspace_exists() {
            report.attempted.push("drop_keyspace");
            if let Err(e) = self.cluster.drop_keyspace(&creds.keyspace).await {
                record_failure(&mut report, "drop_keyspace", creds, e);
            }
        }

        report
    }
}

fn record_failure(
    report: &mut CompensationReport,
    step: &'static str,
    creds: &GeneratedCredentials,
    error: ClusterError,
) {
    if let ClusterError::Missing(_) = error {
        tracing::debug!(keyspace = %creds.keyspace, step, "Rollback target already absent");
        return;
    }
    tracing::error!(
        keyspace = %creds.keyspace,
        username = %creds.username,
        step,
        error = %error,
        "Compensation step failed"
    );
    report.failures.push(CompensationFailure {
        step,
        error: error.into(),
    });
}

fn tolerate_missing(
    step: &'static str,
    name: &str,
    result: Result<(), ClusterError>,
) -> BrokerResult<()> {
    match result {
        Ok(()) => Ok(()),
        Err(ClusterError::Missing(msg)) => {
            tracing::warn!(keyspace = %name, step, detail = %msg, "Drop target already absent");
            Ok(())
        }
        Err(e) => {
            tracing::error!(keyspace = %name, step, error = %e, "Deprovisioning step failed");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        CatalogOp, ClusterCall, ClusterOp, MemoryCatalogStore, MemoryClusterAdmin,
    };

    fn service() -> (ProvisioningService, Arc<MemoryClusterAdmin>, Arc<MemoryCatalogStore>) {
        let cluster = Arc::new(MemoryClusterAdmin::new());
        let catalog = Arc::new(MemoryCatalogStore::new());
        let service = ProvisioningService::new(
            cluster.clone(),
            catalog.clone(),
            Generator::new("pfx"),
            vec!["host1".to_string(), "host2".to_string()],
        );
        (service, cluster, catalog)
    }

    fn creds() -> GeneratedCredentials {
        Generator::new("pfx").generate()
    }

    #[test]
    fn test_phase_ordering() {
        assert!(!ProvisionPhase::Requested.keyspace_exists());
        assert!(ProvisionPhase::KeyspaceCreated.keyspace_exists());
        assert!(!ProvisionPhase::KeyspaceCreated.role_exists());
        assert!(ProvisionPhase::GrantIssued.role_exists());
        assert!(!ProvisionPhase::GrantIssued.row_may_exist());
        assert!(ProvisionPhase::RecordAttempted.row_may_exist());
    }

    #[tokio::test]
    async fn test_compensate_nothing_before_keyspace() {
        let (service, cluster, _) = service();
        let report = service.compensate(ProvisionPhase::Requested, &creds()).await;
        assert!(report.attempted.is_empty());
        assert!(cluster.calls().is_empty());
    }

    #[tokio::test]
    async fn test_compensate_role_then_keyspace() {
        let (service, cluster, _) = service();
        let creds = creds();
        let report = service.compensate(ProvisionPhase::GrantIssued, &creds).await;
        assert_eq!(report.attempted, vec!["drop_role", "drop_keyspace"]);
        assert_eq!(
            cluster.calls(),
            vec![
                ClusterCall::DropRole(creds.username.clone()),
                ClusterCall::DropKeyspace(creds.keyspace.clone()),
            ]
        );
        // Targets never existed in the fake, so both drops report Missing,
        // which counts as already rolled back.
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_compensation_failure_is_reported_not_raised() {
        let (service, cluster, _) = service();
        cluster.fail_on(ClusterOp::DropKeyspace);
        let report = service
            .compensate(ProvisionPhase::KeyspaceCreated, &creds())
            .await;
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].step, "drop_keyspace");
    }

    #[tokio::test]
    async fn test_compensate_uncertain_insert_deletes_row_first() {
        let (service, cluster, catalog) = service();
        catalog.commit_then_fail_on(CatalogOp::Insert);

        let err = service
            .provision("small", "B1", &CancelFlag::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::Catalog(CatalogError::Timeout(_))));
        assert!(catalog.is_empty());
        assert_eq!(cluster.keyspace_count(), 0);
        assert_eq!(cluster.role_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_row_delete_is_reported() {
        let (service, _, catalog) = service();
        catalog.fail_on(CatalogOp::Delete);
        let report = service
            .compensate(ProvisionPhase::RecordAttempted, &creds())
            .await;
        assert_eq!(report.attempted, vec!["delete_row", "drop_role", "drop_keyspace"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].step, "delete_row");
        assert!(matches!(report.failures[0].error, BrokerError::Catalog(_)));
    }

    #[tokio::test]
    async fn test_compensate_leaves_catalog_alone_before_insert() {
        let (service, _, catalog) = service();
        catalog.fail_on(CatalogOp::Delete);
        let report = service.compensate(ProvisionPhase::GrantIssued, &creds()).await;
        assert!(!report.attempted.contains(&"delete_row"));
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_cancel_before_start_creates_nothing() {
        let (service, cluster, catalog) = service();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let err = service.provision("small", "B1", &cancel).await.unwrap_err();
        assert!(matches!(err, BrokerError::Cancelled(_)));
        assert!(cluster.calls().is_empty());
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_lock_released_after_provision() {
        let (service, _, _) = service();
        service
            .provision("medium", "B1", &CancelFlag::new())
            .await
            .unwrap();
        assert!(service.locks().is_empty());
    }
}
