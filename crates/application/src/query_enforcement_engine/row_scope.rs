use tablegate_domain::{GroupAcl, OwnershipQueryResult, Predicate, TablePrivilege};

use super::*;

/// Privilege pair of an ownership-scoped write.
#[derive(Debug, Clone, Copy)]
pub(super) enum RowScopedWrite {
    Edit,
    Delete,
}

impl RowScopedWrite {
    fn little(self) -> TablePrivilege {
        match self {
            Self::Edit => TablePrivilege::Edit,
            Self::Delete => TablePrivilege::Delete,
        }
    }

    fn big(self) -> TablePrivilege {
        match self {
            Self::Edit => TablePrivilege::BigEdit,
            Self::Delete => TablePrivilege::BigDelete,
        }
    }

    pub(super) fn holds_big(self, acl: &GroupAcl<'_>, table: &str) -> bool {
        acl.has_table_privilege(table, self.big())
    }
}

impl QueryEnforcementEngine {
    /// Without the big privilege every matched row must belong to the caller.
    ///
    /// Returns the ownership result when one was computed so the little tier
    /// can reuse it.
    pub(super) async fn enforce_big_tier(
        &self,
        acl: &GroupAcl<'_>,
        identity: &Identity,
        table: &str,
        predicate: &Predicate,
        write: RowScopedWrite,
    ) -> AppResult<Option<OwnershipQueryResult>> {
        if write.holds_big(acl, table) {
            return Ok(None);
        }

        let Some(owner_column) = acl.owner_column(table) else {
            let denial = match write {
                RowScopedWrite::Edit => {
                    AclDenial::table_big_edit_without_owner_column(identity, table)
                }
                RowScopedWrite::Delete => {
                    AclDenial::table_big_delete_without_owner_column(identity, table)
                }
            };
            return Err(self.deny(denial).await);
        };

        let ownership = self
            .ownership_resolver
            .resolve_owners(table, owner_column, predicate)
            .await?;

        if !ownership.is_exclusively_owned_by(identity) {
            let matched_rows = ownership.matched_rows();
            let owner_ids = ownership.owner_id_list();
            let unowned_rows = ownership.unowned_rows();
            let denial = match write {
                RowScopedWrite::Edit => AclDenial::table_big_edit(
                    identity,
                    table,
                    matched_rows,
                    owner_ids,
                    unowned_rows,
                ),
                RowScopedWrite::Delete => AclDenial::table_big_delete(
                    identity,
                    table,
                    matched_rows,
                    owner_ids,
                    unowned_rows,
                ),
            };
            return Err(self.deny(denial).await);
        }

        Ok(Some(ownership))
    }

    /// Without the little privilege the caller may not touch its own rows.
    pub(super) async fn enforce_little_tier(
        &self,
        acl: &GroupAcl<'_>,
        identity: &Identity,
        table: &str,
        predicate: &Predicate,
        write: RowScopedWrite,
        ownership: Option<OwnershipQueryResult>,
    ) -> AppResult<()> {
        if acl.has_table_privilege(table, write.little()) {
            return Ok(());
        }

        let ownership = match ownership {
            Some(ownership) => ownership,
            None => match acl.owner_column(table) {
                Some(owner_column) => {
                    self.ownership_resolver
                        .resolve_owners(table, owner_column, predicate)
                        .await?
                }
                None => return Ok(()),
            },
        };

        if ownership.includes_owner(identity) {
            let matched_rows = ownership.matched_rows();
            let owner_ids = ownership.owner_id_list();
            let denial = match write {
                RowScopedWrite::Edit => {
                    AclDenial::table_edit(identity, table, matched_rows, owner_ids)
                }
                RowScopedWrite::Delete => {
                    AclDenial::table_delete(identity, table, matched_rows, owner_ids)
                }
            };
            return Err(self.deny(denial).await);
        }

        Ok(())
    }
}
