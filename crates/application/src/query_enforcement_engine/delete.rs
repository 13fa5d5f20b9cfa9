use tablegate_domain::DeleteQuery;
use tracing::debug;

use super::row_scope::RowScopedWrite;
use super::*;

impl QueryEnforcementEngine {
    /// Runs the delete ladder: `bigdelete`, then ownership, then `delete`.
    pub async fn authorize_delete(&self, identity: &Identity, query: &DeleteQuery) -> AppResult<()> {
        let snapshot = self.policy_store.snapshot().await;
        let acl = snapshot.acl_for(identity);
        let table = query.table.as_str();

        let ownership = self
            .enforce_big_tier(&acl, identity, table, &query.predicate, RowScopedWrite::Delete)
            .await?;
        self.enforce_little_tier(
            &acl,
            identity,
            table,
            &query.predicate,
            RowScopedWrite::Delete,
            ownership,
        )
        .await?;

        debug!(table, "delete authorized");
        Ok(())
    }

    /// Authorizes and executes a delete.
    pub async fn execute_delete(&self, identity: &Identity, query: DeleteQuery) -> AppResult<u64> {
        self.authorize_delete(identity, &query).await?;
        self.storage
            .delete(&query)
            .await
            .map_err(|error| self.execution_failed(error, &query))
    }
}
