use async_trait::async_trait;
use sqlx::PgPool;

use tablegate_application::{AuditRepository, DenialAuditEvent};
use tablegate_core::{AppError, AppResult};

/// PostgreSQL-backed append-only log of authorization denials.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_denial(&self, event: DenialAuditEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO acl_denial_events (
                user_id,
                group_id,
                table_name,
                kind,
                detail
            )
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event.user_id.map(|user_id| user_id.as_i64()))
        .bind(event.group_id.map(|group_id| group_id.as_i64()))
        .bind(event.table_name)
        .bind(event.kind.as_str())
        .bind(event.detail)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append denial event: {error}")))?;

        Ok(())
    }
}
