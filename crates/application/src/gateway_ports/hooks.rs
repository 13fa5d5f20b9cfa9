use async_trait::async_trait;
use tablegate_core::{AppResult, Identity};
use tablegate_domain::Row;

/// Post-processing run after a record gateway write succeeds.
///
/// Both callbacks default to doing nothing so hooks only implement the
/// events they care about.
#[async_trait]
pub trait RecordHook: Send + Sync {
    /// Called after a row was inserted; `values` carries the assigned primary key.
    async fn post_insert(&self, identity: &Identity, table: &str, values: &Row) -> AppResult<()> {
        let _ = (identity, table, values);
        Ok(())
    }

    /// Called after a row was updated by primary key.
    async fn post_update(&self, identity: &Identity, table: &str, values: &Row) -> AppResult<()> {
        let _ = (identity, table, values);
        Ok(())
    }
}
