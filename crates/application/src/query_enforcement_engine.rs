use std::sync::Arc;

use tablegate_core::{AclDenial, AppError, AppResult, DeploymentMode, Identity};
use tablegate_domain::{PolicySnapshot, Query, QueryOutcome};
use tracing::warn;

use crate::{
    AuditRepository, DenialAuditEvent, OwnershipResolver, PolicyStore, QueryStorage,
};

mod delete;
mod execution;
mod insert;
mod row_scope;
mod select;
mod update;


/// Intercepts structured queries right before execution and enforces the
/// table, column and row-ownership rules of the acting identity's group.
///
/// Each call takes one policy snapshot and either hands the (possibly
/// rewritten) query to storage or returns [`AppError::Forbidden`] without
/// touching storage. Ownership checks and the following write are two
/// separate round trips; a concurrent owner change between them is not
/// detected.
#[derive(Clone)]
pub struct QueryEnforcementEngine {
    storage: Arc<dyn QueryStorage>,
    policy_store: Arc<PolicyStore>,
    ownership_resolver: OwnershipResolver,
    audit_repository: Arc<dyn AuditRepository>,
    deployment_mode: DeploymentMode,
}

impl QueryEnforcementEngine {
    /// Creates an engine over one storage backend.
    #[must_use]
    pub fn new(
        storage: Arc<dyn QueryStorage>,
        policy_store: Arc<PolicyStore>,
        audit_repository: Arc<dyn AuditRepository>,
        deployment_mode: DeploymentMode,
    ) -> Self {
        Self {
            ownership_resolver: OwnershipResolver::new(Arc::clone(&storage)),
            storage,
            policy_store,
            audit_repository,
            deployment_mode,
        }
    }

    /// Returns the current policy snapshot.
    pub async fn policy_snapshot(&self) -> Arc<PolicySnapshot> {
        self.policy_store.snapshot().await
    }

    /// Authorizes and executes any structured query.
    pub async fn execute(&self, identity: &Identity, query: Query) -> AppResult<QueryOutcome> {
        match query {
            Query::Select(query) => self
                .execute_select(identity, query)
                .await
                .map(QueryOutcome::Rows),
            Query::Insert(query) => self
                .execute_insert(identity, query)
                .await
                .map(QueryOutcome::Inserted),
            Query::Update(query) => self
                .execute_update(identity, query)
                .await
                .map(QueryOutcome::Affected),
            Query::Delete(query) => self
                .execute_delete(identity, query)
                .await
                .map(QueryOutcome::Affected),
        }
    }

    async fn deny(&self, denial: AclDenial) -> AppError {
        warn!(
            table = denial.table(),
            tier = denial.tier(),
            columns = ?denial.columns(),
            matched_rows = ?denial.matched_rows(),
            owner_ids = ?denial.owner_ids(),
            unowned_rows = denial.unowned_rows(),
            user_id = ?denial.user_id(),
            group_id = ?denial.group_id(),
            "{}",
            denial.message()
        );

        if let Err(error) = self
            .audit_repository
            .append_denial(DenialAuditEvent::from_denial(&denial))
            .await
        {
            warn!(
                table = denial.table(),
                error = %error,
                "failed to append denial audit event"
            );
        }

        AppError::from(denial)
    }
}
