use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::error::ErrorKind;

use tablegate_application::QueryStorage;
use tablegate_core::{StorageError, StorageResult};
use tablegate_domain::{
    DEFAULT_PRIMARY_KEY, DeleteQuery, InsertOutcome, InsertQuery, Row, SelectQuery, TableSchema,
    UpdateQuery,
};
use tracing::debug;

mod sql;


/// PostgreSQL-backed query storage executing structured queries as dynamic SQL.
///
/// Rows are decoded as jsonb objects and written values are typed through
/// `jsonb_populate_record`, so no per-table row types are needed.
#[derive(Clone)]
pub struct PostgresQueryStorage {
    pool: PgPool,
    primary_keys: HashMap<String, String>,
}

impl PostgresQueryStorage {
    /// Creates a storage with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            primary_keys: HashMap::new(),
        }
    }

    /// Registers the primary keys reported after inserts.
    #[must_use]
    pub fn with_primary_keys<'a>(mut self, schemas: impl IntoIterator<Item = &'a TableSchema>) -> Self {
        self.primary_keys.extend(schemas.into_iter().map(|schema| {
            (
                schema.name().as_str().to_owned(),
                schema.primary_key().to_owned(),
            )
        }));
        self
    }

    fn primary_key(&self, table: &str) -> &str {
        self.primary_keys
            .get(table)
            .map(String::as_str)
            .unwrap_or(DEFAULT_PRIMARY_KEY)
    }
}

#[async_trait]
impl QueryStorage for PostgresQueryStorage {
    async fn select(&self, query: &SelectQuery) -> StorageResult<Vec<Row>> {
        let mut builder = sql::select_statement(query)?;
        debug!(sql = builder.sql(), "executing select");

        let values = builder
            .build_query_scalar::<Value>()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        values
            .into_iter()
            .map(|value| match value {
                Value::Object(row) => Ok(row),
                other => Err(StorageError::InvalidQuery(format!(
                    "select on '{}' produced a non-object row: {other}",
                    query.table
                ))),
            })
            .collect()
    }

    async fn insert(&self, query: &InsertQuery) -> StorageResult<InsertOutcome> {
        let mut builder = sql::insert_statement(query, self.primary_key(query.table.as_str()));
        debug!(sql = builder.sql(), "executing insert");

        let returned = builder
            .build_query_scalar::<Value>()
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(InsertOutcome {
            affected_rows: u64::from(returned.is_some()),
            last_insert_id: returned.as_ref().and_then(Value::as_i64),
        })
    }

    async fn update(&self, query: &UpdateQuery) -> StorageResult<u64> {
        let mut builder = sql::update_statement(query)?;
        debug!(sql = builder.sql(), "executing update");

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, query: &DeleteQuery) -> StorageResult<u64> {
        let mut builder = sql::delete_statement(query);
        debug!(sql = builder.sql(), "executing delete");

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(result.rows_affected())
    }
}

fn storage_error(error: sqlx::Error) -> StorageError {
    match &error {
        sqlx::Error::Database(database_error) => match database_error.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation => StorageError::Constraint(error.to_string()),
            _ => StorageError::InvalidQuery(error.to_string()),
        },
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StorageError::Connectivity(error.to_string()),
        _ => StorageError::InvalidQuery(error.to_string()),
    }
}
