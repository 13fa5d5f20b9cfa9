use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tablegate_core::{AppError, AppResult, GroupId, NonEmptyString};

/// Table-level operations a group may be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TablePrivilege {
    /// Insert new rows.
    Add,
    /// Update rows owned by the caller.
    Edit,
    /// Update any row regardless of owner.
    BigEdit,
    /// Delete rows owned by the caller.
    Delete,
    /// Delete any row regardless of owner.
    BigDelete,
}

impl TablePrivilege {
    /// Returns a stable storage value for this privilege.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Edit => "edit",
            Self::BigEdit => "bigedit",
            Self::Delete => "delete",
            Self::BigDelete => "bigdelete",
        }
    }

    /// Returns all known privileges.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[TablePrivilege] = &[
            TablePrivilege::Add,
            TablePrivilege::Edit,
            TablePrivilege::BigEdit,
            TablePrivilege::Delete,
            TablePrivilege::BigDelete,
        ];

        ALL
    }

    /// Parses a comma-separated storage value such as `"add,edit,bigedit"`.
    pub fn parse_list(value: &str) -> AppResult<BTreeSet<Self>> {
        split_list_value(value)
            .iter()
            .map(|item| Self::from_str(item))
            .collect()
    }
}

impl FromStr for TablePrivilege {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "add" => Ok(Self::Add),
            "edit" => Ok(Self::Edit),
            "bigedit" => Ok(Self::BigEdit),
            "delete" => Ok(Self::Delete),
            "bigdelete" => Ok(Self::BigDelete),
            _ => Err(AppError::Validation(format!(
                "unknown table privilege value '{value}'"
            ))),
        }
    }
}

/// Splits a comma-separated list column into trimmed, non-empty items.
#[must_use]
pub fn split_list_value(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Joins list items back into the comma-separated storage form.
#[must_use]
pub fn join_list_value<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    items.into_iter().collect::<Vec<_>>().join(",")
}

/// Columns excluded from reading or writing for one group and table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldBlacklist {
    /// Every column is blacklisted; used when no privilege record exists.
    Everything,
    /// Only the listed columns are blacklisted.
    Columns(BTreeSet<String>),
}

impl FieldBlacklist {
    /// Returns whether the column is blacklisted.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        match self {
            Self::Everything => true,
            Self::Columns(columns) => columns.contains(column),
        }
    }

    /// Returns whether nothing is blacklisted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Everything => false,
            Self::Columns(columns) => columns.is_empty(),
        }
    }

    /// Returns the requested columns that collide with the blacklist, in request order.
    #[must_use]
    pub fn offending<'a>(&self, requested: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut offending: Vec<String> = Vec::new();
        for column in requested {
            if self.contains(column) && !offending.iter().any(|seen| seen == column) {
                offending.push(column.to_owned());
            }
        }

        offending
    }
}

/// Privileges one group holds on one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegeRecord {
    group_id: GroupId,
    table_name: NonEmptyString,
    allowed: BTreeSet<TablePrivilege>,
    write_blacklist: BTreeSet<String>,
    read_blacklist: BTreeSet<String>,
}

impl PrivilegeRecord {
    /// Creates a validated privilege record.
    pub fn new(
        group_id: GroupId,
        table_name: impl Into<String>,
        allowed: impl IntoIterator<Item = TablePrivilege>,
        write_blacklist: impl IntoIterator<Item = String>,
        read_blacklist: impl IntoIterator<Item = String>,
    ) -> AppResult<Self> {
        Ok(Self {
            group_id,
            table_name: NonEmptyString::new(table_name)?,
            allowed: allowed.into_iter().collect(),
            write_blacklist: write_blacklist.into_iter().collect(),
            read_blacklist: read_blacklist.into_iter().collect(),
        })
    }

    /// Builds a record from the comma-separated list columns used in storage.
    pub fn from_list_values(
        group_id: GroupId,
        table_name: impl Into<String>,
        permissions: &str,
        write_field_blacklist: &str,
        read_field_blacklist: &str,
    ) -> AppResult<Self> {
        Self::new(
            group_id,
            table_name,
            TablePrivilege::parse_list(permissions)?,
            split_list_value(write_field_blacklist),
            split_list_value(read_field_blacklist),
        )
    }

    /// Returns the group the record applies to.
    #[must_use]
    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    /// Returns the table the record applies to.
    #[must_use]
    pub fn table_name(&self) -> &NonEmptyString {
        &self.table_name
    }

    /// Returns whether the operation is granted.
    #[must_use]
    pub fn allows(&self, privilege: TablePrivilege) -> bool {
        self.allowed.contains(&privilege)
    }

    /// Returns the write-blacklisted columns.
    #[must_use]
    pub fn write_blacklist(&self) -> &BTreeSet<String> {
        &self.write_blacklist
    }

    /// Returns the read-blacklisted columns.
    #[must_use]
    pub fn read_blacklist(&self) -> &BTreeSet<String> {
        &self.read_blacklist
    }

    /// Returns the comma-separated storage value of the granted operations.
    #[must_use]
    pub fn permissions_list_value(&self) -> String {
        join_list_value(self.allowed.iter().map(TablePrivilege::as_str))
    }
}

/// Privilege records indexed by (group, table).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivilegeTable {
    records: HashMap<(GroupId, String), PrivilegeRecord>,
}

impl PrivilegeTable {
    /// Indexes records, rejecting duplicate (group, table) pairs.
    pub fn from_records(records: impl IntoIterator<Item = PrivilegeRecord>) -> AppResult<Self> {
        let mut indexed = HashMap::new();
        for record in records {
            let key = (record.group_id, record.table_name.as_str().to_owned());
            if indexed.contains_key(&key) {
                return Err(AppError::Conflict(format!(
                    "duplicate privilege record for group '{}' on table '{}'",
                    key.0, key.1
                )));
            }
            indexed.insert(key, record);
        }

        Ok(Self { records: indexed })
    }

    /// Finds the record for a group and table.
    #[must_use]
    pub fn find(&self, group_id: GroupId, table: &str) -> Option<&PrivilegeRecord> {
        self.records.get(&(group_id, table.to_owned()))
    }

    /// Returns how many records are indexed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether no records are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
