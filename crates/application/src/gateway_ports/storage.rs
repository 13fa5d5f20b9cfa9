use async_trait::async_trait;
use tablegate_core::StorageResult;
use tablegate_domain::{DeleteQuery, InsertOutcome, InsertQuery, Row, SelectQuery, UpdateQuery};

/// Port for the storage engine that executes structured queries.
///
/// Implementations never authorize; callers go through the enforcement
/// engine, except the ownership resolver which reads directly.
#[async_trait]
pub trait QueryStorage: Send + Sync {
    /// Returns the rows matched by a select.
    async fn select(&self, query: &SelectQuery) -> StorageResult<Vec<Row>>;

    /// Inserts one row.
    async fn insert(&self, query: &InsertQuery) -> StorageResult<InsertOutcome>;

    /// Updates matching rows and returns how many changed.
    async fn update(&self, query: &UpdateQuery) -> StorageResult<u64>;

    /// Deletes matching rows and returns how many were removed.
    async fn delete(&self, query: &DeleteQuery) -> StorageResult<u64>;
}
