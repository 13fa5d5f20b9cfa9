use tablegate_domain::UpdateQuery;
use tracing::debug;

use super::row_scope::RowScopedWrite;
use super::*;

impl QueryEnforcementEngine {
    /// Runs the edit ladder for an update.
    ///
    /// Without `bigedit` the matched rows must belong exclusively to the
    /// caller; the write blacklist applies either way; without `edit` the
    /// caller may not touch its own rows.
    pub async fn authorize_update(&self, identity: &Identity, query: &UpdateQuery) -> AppResult<()> {
        let snapshot = self.policy_store.snapshot().await;
        let acl = snapshot.acl_for(identity);
        let table = query.table.as_str();

        let ownership = self
            .enforce_big_tier(&acl, identity, table, &query.predicate, RowScopedWrite::Edit)
            .await?;

        let offending = acl.write_blacklist(table).offending(query.columns());
        if !offending.is_empty() {
            return Err(self
                .deny(AclDenial::field_write(identity, table, offending))
                .await);
        }

        self.enforce_little_tier(
            &acl,
            identity,
            table,
            &query.predicate,
            RowScopedWrite::Edit,
            ownership,
        )
        .await?;

        debug!(table, columns = query.set.len(), "update authorized");
        Ok(())
    }

    /// Authorizes and executes an update.
    pub async fn execute_update(&self, identity: &Identity, query: UpdateQuery) -> AppResult<u64> {
        self.authorize_update(identity, &query).await?;
        self.storage
            .update(&query)
            .await
            .map_err(|error| self.execution_failed(error, &query))
    }
}
