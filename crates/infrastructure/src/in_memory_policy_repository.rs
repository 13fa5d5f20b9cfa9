use std::collections::HashMap;

use async_trait::async_trait;
use tablegate_application::{PrivilegeRepository, SchemaRepository};
use tablegate_core::{AppResult, GroupId};
use tablegate_domain::{PrivilegeRecord, TableSchema};
use tokio::sync::RwLock;

/// In-memory source of privilege records and table catalog entries.
#[derive(Debug, Default)]
pub struct InMemoryPolicyRepository {
    privileges: RwLock<HashMap<(GroupId, String), PrivilegeRecord>>,
    tables: RwLock<HashMap<String, TableSchema>>,
}

impl InMemoryPolicyRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            privileges: RwLock::new(HashMap::new()),
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Stores a privilege record, replacing the group's previous record for the table.
    pub async fn save_privilege(&self, record: PrivilegeRecord) {
        let key = (record.group_id(), record.table_name().as_str().to_owned());
        self.privileges.write().await.insert(key, record);
    }

    /// Removes a group's record for a table.
    pub async fn remove_privilege(&self, group_id: GroupId, table: &str) -> bool {
        self.privileges
            .write()
            .await
            .remove(&(group_id, table.to_owned()))
            .is_some()
    }

    /// Stores a catalog entry, replacing any entry of the same name.
    pub async fn save_table(&self, schema: TableSchema) {
        self.tables
            .write()
            .await
            .insert(schema.name().as_str().to_owned(), schema);
    }
}

#[async_trait]
impl PrivilegeRepository for InMemoryPolicyRepository {
    async fn list_privileges(&self) -> AppResult<Vec<PrivilegeRecord>> {
        let privileges = self.privileges.read().await;

        let mut records: Vec<PrivilegeRecord> = privileges.values().cloned().collect();
        records.sort_by(|left, right| {
            left.group_id()
                .as_i64()
                .cmp(&right.group_id().as_i64())
                .then_with(|| left.table_name().cmp(right.table_name()))
        });

        Ok(records)
    }
}

#[async_trait]
impl SchemaRepository for InMemoryPolicyRepository {
    async fn list_tables(&self) -> AppResult<Vec<TableSchema>> {
        let tables = self.tables.read().await;

        let mut values: Vec<TableSchema> = tables.values().cloned().collect();
        values.sort_by(|left, right| left.name().cmp(right.name()));

        Ok(values)
    }
}
