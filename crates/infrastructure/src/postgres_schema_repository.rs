use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use tablegate_application::SchemaRepository;
use tablegate_core::{AppError, AppResult};
use tablegate_domain::TableSchema;


/// PostgreSQL-backed table catalog.
///
/// Ownership and default-active settings come from `acl_table_schemas`; the
/// column list is read from `information_schema` of the current schema.
#[derive(Clone)]
pub struct PostgresSchemaRepository {
    pool: PgPool,
}

impl PostgresSchemaRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registers or updates the gateway settings of a table.
    pub async fn save_table_settings(&self, schema: &TableSchema) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO acl_table_schemas (
                table_name,
                primary_key,
                owner_column,
                inactive_by_default
            )
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (table_name) DO UPDATE
            SET primary_key = EXCLUDED.primary_key,
                owner_column = EXCLUDED.owner_column,
                inactive_by_default = EXCLUDED.inactive_by_default
            "#,
        )
        .bind(schema.name().as_str())
        .bind(schema.primary_key())
        .bind(schema.owner_column())
        .bind(schema.is_inactive_by_default())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to save table settings: {error}")))?;

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct TableSchemaRow {
    table_name: String,
    primary_key: String,
    owner_column: Option<String>,
    inactive_by_default: bool,
    column_names: Vec<String>,
}

impl TableSchemaRow {
    fn into_schema(self) -> AppResult<TableSchema> {
        let schema = TableSchema::new(
            self.table_name.as_str(),
            self.column_names,
            self.primary_key,
        )?
        .with_inactive_by_default(self.inactive_by_default);

        match self.owner_column {
            Some(owner_column) => schema.with_owner_column(owner_column),
            None => Ok(schema),
        }
    }
}

#[async_trait]
impl SchemaRepository for PostgresSchemaRepository {
    async fn list_tables(&self) -> AppResult<Vec<TableSchema>> {
        let rows = sqlx::query_as::<_, TableSchemaRow>(
            r#"
            SELECT
                settings.table_name,
                settings.primary_key,
                settings.owner_column,
                settings.inactive_by_default,
                ARRAY(
                    SELECT columns.column_name::text
                    FROM information_schema.columns AS columns
                    WHERE columns.table_schema = current_schema()
                        AND columns.table_name = settings.table_name
                    ORDER BY columns.ordinal_position
                ) AS column_names
            FROM acl_table_schemas AS settings
            ORDER BY settings.table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load table catalog: {error}")))?;

        rows.into_iter()
            .map(|row| {
                let table_name = row.table_name.clone();
                row.into_schema().map_err(|error| {
                    AppError::Internal(format!(
                        "failed to decode catalog entry for table '{table_name}': {error}"
                    ))
                })
            })
            .collect()
    }
}
