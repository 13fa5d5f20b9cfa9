use std::sync::Arc;

use tablegate_core::AppResult;
use tablegate_domain::{PolicySnapshot, PrivilegeTable, SchemaCatalog};
use tokio::sync::RwLock;
use tracing::info;

use crate::{PrivilegeRepository, SchemaRepository};

/// Holds the current policy snapshot and rebuilds it from its repositories.
pub struct PolicyStore {
    privilege_repository: Arc<dyn PrivilegeRepository>,
    schema_repository: Arc<dyn SchemaRepository>,
    current: RwLock<Arc<PolicySnapshot>>,
}

impl PolicyStore {
    /// Creates a store and loads the first snapshot.
    pub async fn load(
        privilege_repository: Arc<dyn PrivilegeRepository>,
        schema_repository: Arc<dyn SchemaRepository>,
    ) -> AppResult<Self> {
        let snapshot = build_snapshot(
            privilege_repository.as_ref(),
            schema_repository.as_ref(),
        )
        .await?;

        Ok(Self {
            privilege_repository,
            schema_repository,
            current: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// Returns the snapshot every check of one call should use.
    pub async fn snapshot(&self) -> Arc<PolicySnapshot> {
        Arc::clone(&*self.current.read().await)
    }

    /// Rebuilds the snapshot and swaps it in.
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn refresh(&self) -> AppResult<Arc<PolicySnapshot>> {
        let snapshot = Arc::new(
            build_snapshot(
                self.privilege_repository.as_ref(),
                self.schema_repository.as_ref(),
            )
            .await?,
        );

        *self.current.write().await = Arc::clone(&snapshot);
        Ok(snapshot)
    }
}

async fn build_snapshot(
    privilege_repository: &dyn PrivilegeRepository,
    schema_repository: &dyn SchemaRepository,
) -> AppResult<PolicySnapshot> {
    let privileges = PrivilegeTable::from_records(privilege_repository.list_privileges().await?)?;
    let schema = SchemaCatalog::from_tables(schema_repository.list_tables().await?)?;

    info!(
        privilege_records = privileges.len(),
        tables = schema.tables().len(),
        "policy snapshot loaded"
    );

    Ok(PolicySnapshot::new(privileges, schema))
}
