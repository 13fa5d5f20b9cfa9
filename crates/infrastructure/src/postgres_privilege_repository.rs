use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use tablegate_application::PrivilegeRepository;
use tablegate_core::{AppError, AppResult, GroupId};
use tablegate_domain::{PrivilegeRecord, join_list_value};

#[cfg(test)]
mod tests;

/// PostgreSQL-backed repository for group privilege records.
#[derive(Clone)]
pub struct PostgresPrivilegeRepository {
    pool: PgPool,
}

impl PostgresPrivilegeRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts or replaces a group's record for a table.
    pub async fn save_privilege(&self, record: &PrivilegeRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO acl_privileges (
                group_id,
                table_name,
                permissions,
                write_field_blacklist,
                read_field_blacklist
            )
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (group_id, table_name) DO UPDATE
            SET permissions = EXCLUDED.permissions,
                write_field_blacklist = EXCLUDED.write_field_blacklist,
                read_field_blacklist = EXCLUDED.read_field_blacklist
            "#,
        )
        .bind(record.group_id().as_i64())
        .bind(record.table_name().as_str())
        .bind(record.permissions_list_value())
        .bind(join_columns(record.write_blacklist()))
        .bind(join_columns(record.read_blacklist()))
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to save privilege record: {error}")))?;

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct PrivilegeRow {
    group_id: i64,
    table_name: String,
    permissions: String,
    write_field_blacklist: String,
    read_field_blacklist: String,
}

#[async_trait]
impl PrivilegeRepository for PostgresPrivilegeRepository {
    async fn list_privileges(&self) -> AppResult<Vec<PrivilegeRecord>> {
        let rows = sqlx::query_as::<_, PrivilegeRow>(
            r#"
            SELECT group_id, table_name, permissions, write_field_blacklist, read_field_blacklist
            FROM acl_privileges
            ORDER BY group_id, table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load privileges: {error}")))?;

        rows.into_iter()
            .map(|row| {
                PrivilegeRecord::from_list_values(
                    GroupId::new(row.group_id),
                    row.table_name.as_str(),
                    row.permissions.as_str(),
                    row.write_field_blacklist.as_str(),
                    row.read_field_blacklist.as_str(),
                )
                .map_err(|error| {
                    AppError::Internal(format!(
                        "failed to decode privileges of group '{}' on table '{}': {error}",
                        row.group_id, row.table_name
                    ))
                })
            })
            .collect()
    }
}

fn join_columns(columns: &BTreeSet<String>) -> String {
    join_list_value(columns.iter().map(String::as_str))
}
