use tablegate_core::{GroupId, Identity};

use crate::privilege::{FieldBlacklist, PrivilegeRecord, PrivilegeTable, TablePrivilege};
use crate::schema::{SchemaCatalog, TableSchema};

/// Immutable privilege and schema state used for one authorization decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicySnapshot {
    privileges: PrivilegeTable,
    schema: SchemaCatalog,
}

impl PolicySnapshot {
    /// Creates a snapshot from loaded privilege and schema data.
    #[must_use]
    pub fn new(privileges: PrivilegeTable, schema: SchemaCatalog) -> Self {
        Self { privileges, schema }
    }

    /// Returns the privilege records.
    #[must_use]
    pub fn privileges(&self) -> &PrivilegeTable {
        &self.privileges
    }

    /// Returns the schema catalog.
    #[must_use]
    pub fn schema(&self) -> &SchemaCatalog {
        &self.schema
    }

    /// Binds the snapshot to the acting identity's group.
    #[must_use]
    pub fn acl_for<'a>(&'a self, identity: &Identity) -> GroupAcl<'a> {
        GroupAcl {
            snapshot: self,
            group_id: identity.group_id(),
        }
    }
}

/// Privilege lookups scoped to one group.
///
/// A caller without a group, or a group without a record for the table, holds
/// no table privileges and has every column blacklisted.
#[derive(Debug, Clone, Copy)]
pub struct GroupAcl<'a> {
    snapshot: &'a PolicySnapshot,
    group_id: Option<GroupId>,
}

impl<'a> GroupAcl<'a> {
    fn record(&self, table: &str) -> Option<&'a PrivilegeRecord> {
        self.group_id
            .and_then(|group_id| self.snapshot.privileges.find(group_id, table))
    }

    /// Returns whether the group holds the privilege on the table.
    #[must_use]
    pub fn has_table_privilege(&self, table: &str, privilege: TablePrivilege) -> bool {
        self.record(table)
            .is_some_and(|record| record.allows(privilege))
    }

    /// Returns the columns the group may not write.
    #[must_use]
    pub fn write_blacklist(&self, table: &str) -> FieldBlacklist {
        self.record(table)
            .map(|record| FieldBlacklist::Columns(record.write_blacklist().clone()))
            .unwrap_or(FieldBlacklist::Everything)
    }

    /// Returns the columns the group may not read.
    #[must_use]
    pub fn read_blacklist(&self, table: &str) -> FieldBlacklist {
        self.record(table)
            .map(|record| FieldBlacklist::Columns(record.read_blacklist().clone()))
            .unwrap_or(FieldBlacklist::Everything)
    }

    /// Returns the owner column of the table.
    #[must_use]
    pub fn owner_column(&self, table: &str) -> Option<&'a str> {
        self.snapshot.schema.owner_column_of(table)
    }

    /// Returns the catalog entry for the table.
    #[must_use]
    pub fn table_schema(&self, table: &str) -> Option<&'a TableSchema> {
        self.snapshot.schema.table(table)
    }
}
