use async_trait::async_trait;
use tablegate_core::AppResult;
use tablegate_domain::{PrivilegeRecord, TableSchema};

/// Repository port for group privilege records.
#[async_trait]
pub trait PrivilegeRepository: Send + Sync {
    /// Lists every privilege record of every group.
    async fn list_privileges(&self) -> AppResult<Vec<PrivilegeRecord>>;
}

/// Repository port for the schema catalog.
#[async_trait]
pub trait SchemaRepository: Send + Sync {
    /// Lists the catalog entry of every known table.
    async fn list_tables(&self) -> AppResult<Vec<TableSchema>>;
}
