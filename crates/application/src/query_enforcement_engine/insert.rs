use tablegate_domain::{ACTIVE_COLUMN, ActiveState, GroupAcl, InsertOutcome, InsertQuery, TablePrivilege};
use tracing::debug;

use super::*;

impl QueryEnforcementEngine {
    /// Checks an insert and applies the `active` column carve-out.
    ///
    /// When `active` is write-blacklisted the caller's value is dropped, and
    /// tables that start rows inactive get the inactive sentinel instead.
    pub async fn authorize_insert(
        &self,
        identity: &Identity,
        query: InsertQuery,
    ) -> AppResult<InsertQuery> {
        let snapshot = self.policy_store.snapshot().await;
        let acl = snapshot.acl_for(identity);

        match check_insert(&acl, identity, query) {
            Ok(query) => {
                debug!(
                    table = %query.table,
                    columns = query.values.len(),
                    "insert authorized"
                );
                Ok(query)
            }
            Err(denial) => Err(self.deny(denial).await),
        }
    }

    /// Authorizes and executes an insert.
    pub async fn execute_insert(
        &self,
        identity: &Identity,
        query: InsertQuery,
    ) -> AppResult<InsertOutcome> {
        let query = self.authorize_insert(identity, query).await?;
        self.storage
            .insert(&query)
            .await
            .map_err(|error| self.execution_failed(error, &query))
    }
}

fn check_insert(
    acl: &GroupAcl<'_>,
    identity: &Identity,
    mut query: InsertQuery,
) -> Result<InsertQuery, AclDenial> {
    let table = query.table.clone();
    if !acl.has_table_privilege(&table, TablePrivilege::Add) {
        return Err(AclDenial::table_add(identity, &table));
    }

    if acl.has_table_privilege(&table, TablePrivilege::BigEdit) {
        return Ok(query);
    }

    let blacklist = acl.write_blacklist(&table);
    let force_inactive = blacklist.contains(ACTIVE_COLUMN);
    if force_inactive && query.values.remove(ACTIVE_COLUMN).is_some() {
        debug!(table = %table, "dropped caller supplied active value");
    }

    let offending = blacklist.offending(query.columns());
    if !offending.is_empty() {
        return Err(AclDenial::field_write(identity, &table, offending));
    }

    let starts_inactive = acl.table_schema(&table).is_some_and(|schema| {
        schema.is_inactive_by_default() && schema.has_column(ACTIVE_COLUMN)
    });
    if force_inactive && starts_inactive {
        query
            .values
            .insert(ACTIVE_COLUMN.to_owned(), ActiveState::Inactive.value());
    }

    Ok(query)
}
