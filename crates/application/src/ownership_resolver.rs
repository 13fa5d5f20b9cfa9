use std::sync::Arc;

use tablegate_core::{AppError, AppResult};
use tablegate_domain::{ColumnSelection, OwnershipQueryResult, Predicate, SelectQuery};
use tracing::debug;

use crate::QueryStorage;

/// Reads the owners of the rows a write predicate would touch.
///
/// The read goes straight to storage and is not itself authorized.
#[derive(Clone)]
pub struct OwnershipResolver {
    storage: Arc<dyn QueryStorage>,
}

impl OwnershipResolver {
    /// Creates a resolver over the storage the writes will run against.
    #[must_use]
    pub fn new(storage: Arc<dyn QueryStorage>) -> Self {
        Self { storage }
    }

    /// Runs `SELECT owner_column FROM table WHERE predicate` and tallies owners.
    pub async fn resolve_owners(
        &self,
        table: &str,
        owner_column: &str,
        predicate: &Predicate,
    ) -> AppResult<OwnershipQueryResult> {
        let select = SelectQuery::new(table)
            .columns(ColumnSelection::named([owner_column]))
            .filter(predicate.clone());

        let rows = self.storage.select(&select).await.map_err(|error| {
            AppError::Resolution(format!(
                "failed to resolve owners of `{table}` rows through column `{owner_column}`: {error}"
            ))
        })?;

        let result = OwnershipQueryResult::from_owner_values(
            rows.iter().map(|row| row.get(owner_column)),
        );

        debug!(
            table,
            owner_column,
            matched_rows = result.matched_rows(),
            owner_count = result.owner_ids().len(),
            unowned_rows = result.unowned_rows(),
            "resolved row owners"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;
    use tablegate_core::{AppError, StorageError, StorageResult, UserId};
    use tablegate_domain::{
        ColumnSelection, DeleteQuery, InsertOutcome, InsertQuery, Predicate, Row, SelectQuery,
        UpdateQuery,
    };
    use tokio::sync::Mutex;

    use crate::QueryStorage;

    use super::OwnershipResolver;

    struct FakeOwnerStorage {
        owners: Vec<serde_json::Value>,
        selects: Mutex<Vec<SelectQuery>>,
        fail: bool,
    }

    #[async_trait]
    impl QueryStorage for FakeOwnerStorage {
        async fn select(&self, query: &SelectQuery) -> StorageResult<Vec<Row>> {
            self.selects.lock().await.push(query.clone());
            if self.fail {
                return Err(StorageError::InvalidQuery(
                    "column \"ghost\" does not exist".to_owned(),
                ));
            }
            Ok(self
                .owners
                .iter()
                .map(|owner| {
                    let mut row = Row::new();
                    row.insert("author_id".to_owned(), owner.clone());
                    row
                })
                .collect())
        }

        async fn insert(&self, _query: &InsertQuery) -> StorageResult<InsertOutcome> {
            unreachable!("resolver never inserts")
        }

        async fn update(&self, _query: &UpdateQuery) -> StorageResult<u64> {
            unreachable!("resolver never updates")
        }

        async fn delete(&self, _query: &DeleteQuery) -> StorageResult<u64> {
            unreachable!("resolver never deletes")
        }
    }

    #[tokio::test]
    async fn resolves_distinct_owners_with_scoped_select() {
        let storage = Arc::new(FakeOwnerStorage {
            owners: vec![json!(7), json!(9), json!(7)],
            selects: Mutex::new(Vec::new()),
            fail: false,
        });
        let resolver = OwnershipResolver::new(storage.clone());

        let result = resolver
            .resolve_owners("posts", "author_id", &Predicate::gt("id", 10))
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(result.matched_rows(), 3);
        assert_eq!(result.owner_id_list(), vec![UserId::new(7), UserId::new(9)]);

        let selects = storage.selects.lock().await;
        assert_eq!(selects.len(), 1);
        assert_eq!(selects[0].table, "posts");
        assert_eq!(selects[0].columns, ColumnSelection::named(["author_id"]));
        assert_eq!(selects[0].predicate, Predicate::gt("id", 10));
    }

    #[tokio::test]
    async fn storage_failure_is_a_resolution_error() {
        let resolver = OwnershipResolver::new(Arc::new(FakeOwnerStorage {
            owners: Vec::new(),
            selects: Mutex::new(Vec::new()),
            fail: true,
        }));

        let result = resolver
            .resolve_owners("posts", "author_id", &Predicate::eq("ghost", 1))
            .await;

        assert!(matches!(result, Err(AppError::Resolution(message)) if message.contains("ghost")));
    }
}
