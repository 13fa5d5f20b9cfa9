use std::collections::HashMap;

use serde_json::Value;
use tablegate_core::{AppError, AppResult, NonEmptyString};

/// Status column carrying [`ActiveState`] values.
pub const ACTIVE_COLUMN: &str = "active";

/// Primary key column assumed for tables unknown to the catalog.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Sentinel values stored in the `active` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActiveState {
    /// Soft-deleted row.
    Deleted,
    /// Published row.
    Active,
    /// Draft or unpublished row.
    Inactive,
}

impl ActiveState {
    /// Returns the stored integer value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Deleted => 0,
            Self::Active => 1,
            Self::Inactive => 2,
        }
    }

    /// Returns the stored value as a column value.
    #[must_use]
    pub fn value(&self) -> Value {
        Value::from(self.as_i64())
    }
}

/// Catalog entry for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: NonEmptyString,
    columns: Vec<String>,
    primary_key: String,
    owner_column: Option<String>,
    inactive_by_default: bool,
}

impl TableSchema {
    /// Creates a table entry with ordered, unique columns including the primary key.
    pub fn new(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
        primary_key: impl Into<String>,
    ) -> AppResult<Self> {
        let name = NonEmptyString::new(name)?;
        let primary_key = primary_key.into();

        let mut ordered: Vec<String> = Vec::new();
        for column in columns {
            let column = NonEmptyString::new(column)?;
            if ordered.iter().any(|seen| seen == column.as_str()) {
                return Err(AppError::Validation(format!(
                    "column '{}' is declared twice on table '{}'",
                    column, name
                )));
            }
            ordered.push(column.into());
        }

        if !ordered.contains(&primary_key) {
            return Err(AppError::Validation(format!(
                "primary key '{}' is not a column of table '{}'",
                primary_key, name
            )));
        }

        Ok(Self {
            name,
            columns: ordered,
            primary_key,
            owner_column: None,
            inactive_by_default: false,
        })
    }

    /// Marks the column that identifies each row's owner.
    pub fn with_owner_column(mut self, owner_column: impl Into<String>) -> AppResult<Self> {
        let owner_column = owner_column.into();
        if !self.has_column(owner_column.as_str()) {
            return Err(AppError::Validation(format!(
                "owner column '{}' is not a column of table '{}'",
                owner_column, self.name
            )));
        }

        self.owner_column = Some(owner_column);
        Ok(self)
    }

    /// Sets whether new rows start inactive when callers may not set `active`.
    #[must_use]
    pub fn with_inactive_by_default(mut self, inactive_by_default: bool) -> Self {
        self.inactive_by_default = inactive_by_default;
        self
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the ordered column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the primary key column.
    #[must_use]
    pub fn primary_key(&self) -> &str {
        self.primary_key.as_str()
    }

    /// Returns the owner column, if rows are ownership scoped.
    #[must_use]
    pub fn owner_column(&self) -> Option<&str> {
        self.owner_column.as_deref()
    }

    /// Returns whether new rows default to inactive.
    #[must_use]
    pub fn is_inactive_by_default(&self) -> bool {
        self.inactive_by_default
    }

    /// Returns whether the column exists.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|candidate| candidate == column)
    }
}

/// Read-only lookup of table schemas by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaCatalog {
    tables: HashMap<String, TableSchema>,
}

impl SchemaCatalog {
    /// Indexes table entries, rejecting duplicate names.
    pub fn from_tables(tables: impl IntoIterator<Item = TableSchema>) -> AppResult<Self> {
        let mut indexed = HashMap::new();
        for table in tables {
            let key = table.name().as_str().to_owned();
            if indexed.contains_key(&key) {
                return Err(AppError::Conflict(format!(
                    "table '{key}' is declared twice in the schema catalog"
                )));
            }
            indexed.insert(key, table);
        }

        Ok(Self { tables: indexed })
    }

    /// Finds a table entry.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    /// Returns the ordered columns of a table, empty when unknown.
    #[must_use]
    pub fn columns_of(&self, name: &str) -> &[String] {
        self.table(name).map(TableSchema::columns).unwrap_or(&[])
    }

    /// Returns the owner column of a table.
    #[must_use]
    pub fn owner_column_of(&self, name: &str) -> Option<&str> {
        self.table(name).and_then(TableSchema::owner_column)
    }

    /// Returns whether new rows of the table default to inactive.
    #[must_use]
    pub fn is_inactive_by_default(&self, name: &str) -> bool {
        self.table(name)
            .is_some_and(TableSchema::is_inactive_by_default)
    }

    /// Returns the primary key of a table, `id` when unknown.
    #[must_use]
    pub fn primary_key_of(&self, name: &str) -> &str {
        self.table(name)
            .map(TableSchema::primary_key)
            .unwrap_or(DEFAULT_PRIMARY_KEY)
    }

    /// Returns every table entry sorted by name.
    #[must_use]
    pub fn tables(&self) -> Vec<&TableSchema> {
        let mut tables: Vec<&TableSchema> = self.tables.values().collect();
        tables.sort_by(|left, right| left.name().as_str().cmp(right.name().as_str()));
        tables
    }
}

#[cfg(test)]
mod tests {
    use super::{ActiveState, SchemaCatalog, TableSchema};

    #[test]
    fn owner_column_must_exist() {
        let table = TableSchema::new("posts", ["id", "title"], "id")
            .unwrap_or_else(|_| unreachable!())
            .with_owner_column("author_id");
        assert!(table.is_err());
    }

    #[test]
    fn primary_key_must_be_a_column() {
        assert!(TableSchema::new("posts", ["title"], "id").is_err());
        assert!(TableSchema::new("posts", ["id", "id"], "id").is_err());
    }

    #[test]
    fn catalog_defaults_for_unknown_tables() {
        let posts = TableSchema::new("posts", ["id", "author_id", "active"], "id")
            .and_then(|table| table.with_owner_column("author_id"))
            .map(|table| table.with_inactive_by_default(true))
            .unwrap_or_else(|_| unreachable!());
        let catalog = SchemaCatalog::from_tables([posts]).unwrap_or_else(|_| unreachable!());

        assert_eq!(catalog.owner_column_of("posts"), Some("author_id"));
        assert!(catalog.is_inactive_by_default("posts"));
        assert_eq!(catalog.owner_column_of("ghost"), None);
        assert!(catalog.columns_of("ghost").is_empty());
        assert_eq!(catalog.primary_key_of("ghost"), "id");
    }

    #[test]
    fn active_state_sentinels() {
        assert_eq!(ActiveState::Deleted.as_i64(), 0);
        assert_eq!(ActiveState::Active.as_i64(), 1);
        assert_eq!(ActiveState::Inactive.value(), serde_json::json!(2));
    }
}
