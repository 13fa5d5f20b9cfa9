use tablegate_domain::{ColumnSelection, FieldBlacklist, GroupAcl, Row, SelectQuery};
use tracing::debug;

use super::*;

impl QueryEnforcementEngine {
    /// Checks a select against the read blacklists of every table it reads.
    ///
    /// Wildcard selections on tables with a non-empty read blacklist are
    /// rewritten to the catalog columns that remain readable.
    pub async fn authorize_select(
        &self,
        identity: &Identity,
        query: SelectQuery,
    ) -> AppResult<SelectQuery> {
        let snapshot = self.policy_store.snapshot().await;
        let acl = snapshot.acl_for(identity);

        match check_select(&acl, identity, query) {
            Ok(query) => {
                debug!(table = %query.table, joins = query.joins.len(), "select authorized");
                Ok(query)
            }
            Err(denial) => Err(self.deny(denial).await),
        }
    }

    /// Authorizes and executes a select.
    pub async fn execute_select(
        &self,
        identity: &Identity,
        query: SelectQuery,
    ) -> AppResult<Vec<Row>> {
        let query = self.authorize_select(identity, query).await?;
        self.storage
            .select(&query)
            .await
            .map_err(|error| self.execution_failed(error, &query))
    }
}

fn check_select(
    acl: &GroupAcl<'_>,
    identity: &Identity,
    mut query: SelectQuery,
) -> Result<SelectQuery, AclDenial> {
    query.columns = checked_columns(acl, identity, query.table.as_str(), query.columns)?;
    for join in &mut query.joins {
        let columns = std::mem::take(&mut join.columns);
        join.columns = checked_columns(acl, identity, join.table.as_str(), columns)?;
    }

    Ok(query)
}

fn checked_columns(
    acl: &GroupAcl<'_>,
    identity: &Identity,
    table: &str,
    columns: ColumnSelection,
) -> Result<ColumnSelection, AclDenial> {
    let blacklist = acl.read_blacklist(table);

    match columns {
        ColumnSelection::Named(names) => {
            let offending = blacklist.offending(names.iter().map(String::as_str));
            if !offending.is_empty() {
                return Err(AclDenial::field_read(identity, table, offending));
            }
            Ok(ColumnSelection::Named(names))
        }
        ColumnSelection::All if blacklist.is_empty() => Ok(ColumnSelection::All),
        ColumnSelection::All => {
            let Some(schema) = acl.table_schema(table) else {
                return Err(AclDenial::field_read(
                    identity,
                    table,
                    blacklisted_names(&blacklist, &[]),
                ));
            };

            let readable: Vec<String> = schema
                .columns()
                .iter()
                .filter(|column| !blacklist.contains(column))
                .cloned()
                .collect();
            if readable.is_empty() {
                return Err(AclDenial::field_read(
                    identity,
                    table,
                    blacklisted_names(&blacklist, schema.columns()),
                ));
            }

            Ok(ColumnSelection::Named(readable))
        }
    }
}

fn blacklisted_names(blacklist: &FieldBlacklist, catalog_columns: &[String]) -> Vec<String> {
    match blacklist {
        FieldBlacklist::Columns(columns) => columns.iter().cloned().collect(),
        FieldBlacklist::Everything if catalog_columns.is_empty() => vec!["*".to_owned()],
        FieldBlacklist::Everything => catalog_columns.to_vec(),
    }
}
