use std::any::Any;
use std::collections::BTreeMap;

use serde_json::Value;
use tablegate_core::{AppResult, GroupId, Identity};
use tablegate_domain::{Predicate, Row, split_list_value};

use super::TableGateway;
use crate::{FetchOptions, RecordGateway};

/// Table holding group privilege records.
pub const PRIVILEGES_TABLE: &str = "acl_privileges";

/// Columns stored as comma-separated lists.
pub const PRIVILEGE_LIST_COLUMNS: &[&str] =
    &["permissions", "write_field_blacklist", "read_field_blacklist"];

/// Gateway for the privilege records table.
#[derive(Clone)]
pub struct PrivilegesTableGateway {
    records: RecordGateway,
}

impl PrivilegesTableGateway {
    /// Wraps the record gateway of the privileges table.
    #[must_use]
    pub fn new(records: RecordGateway) -> Self {
        Self { records }
    }

    /// Returns a group's privilege rows keyed by table name, list columns split.
    pub async fn fetch_group_privileges(
        &self,
        identity: &Identity,
        group_id: GroupId,
    ) -> AppResult<BTreeMap<String, Row>> {
        let rows = self.fetch_group_privileges_raw(identity, group_id).await?;

        let mut by_table = BTreeMap::new();
        for mut row in rows {
            for column in PRIVILEGE_LIST_COLUMNS {
                if let Some(Value::String(list)) = row.get(*column) {
                    let items = split_list_value(list)
                        .into_iter()
                        .map(Value::String)
                        .collect();
                    row.insert((*column).to_owned(), Value::Array(items));
                }
            }

            let table_name = match row.get("table_name") {
                Some(Value::String(table_name)) => table_name.clone(),
                _ => continue,
            };
            by_table.insert(table_name, row);
        }

        Ok(by_table)
    }

    /// Returns a group's privilege rows as stored.
    pub async fn fetch_group_privileges_raw(
        &self,
        identity: &Identity,
        group_id: GroupId,
    ) -> AppResult<Vec<Row>> {
        self.records
            .fetch_all(
                identity,
                FetchOptions {
                    predicate: Predicate::eq("group_id", group_id.as_i64()),
                    ..FetchOptions::default()
                },
            )
            .await
    }
}

impl TableGateway for PrivilegesTableGateway {
    fn table_name(&self) -> &str {
        PRIVILEGES_TABLE
    }

    fn records(&self) -> &RecordGateway {
        &self.records
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
