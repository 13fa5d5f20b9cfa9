use std::sync::Arc;

use tablegate_core::{AppResult, Identity};
use tablegate_domain::{ColumnSelection, OrderBy, Predicate, Row, SelectQuery};

use crate::{QueryEnforcementEngine, RecordHook};

mod fetch;
mod write;


/// Select modifiers accepted by the list operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOptions {
    /// Columns to read; wildcard by default.
    pub columns: ColumnSelection,
    /// Row filter.
    pub predicate: Predicate,
    /// Ordering instructions.
    pub order_by: Vec<OrderBy>,
    /// Maximum rows returned.
    pub limit: Option<usize>,
}

impl FetchOptions {
    fn into_select(self, table: &str) -> SelectQuery {
        SelectQuery {
            columns: self.columns,
            predicate: self.predicate,
            order_by: self.order_by,
            limit: self.limit,
            ..SelectQuery::new(table)
        }
    }
}

/// CRUD convenience operations over one table.
///
/// Every operation builds a structured query and dispatches it through the
/// enforcement engine.
#[derive(Clone)]
pub struct RecordGateway {
    table: String,
    engine: Arc<QueryEnforcementEngine>,
    hooks: Vec<Arc<dyn RecordHook>>,
}

impl RecordGateway {
    /// Creates a gateway for one table.
    #[must_use]
    pub fn new(table: impl Into<String>, engine: Arc<QueryEnforcementEngine>) -> Self {
        Self {
            table: table.into(),
            engine,
            hooks: Vec::new(),
        }
    }

    /// Adds hooks run after [`RecordGateway::add_or_update_record`] writes.
    #[must_use]
    pub fn with_hooks(mut self, hooks: impl IntoIterator<Item = Arc<dyn RecordHook>>) -> Self {
        self.hooks.extend(hooks);
        self
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        self.table.as_str()
    }

    /// Returns the engine the gateway dispatches through.
    #[must_use]
    pub fn engine(&self) -> &Arc<QueryEnforcementEngine> {
        &self.engine
    }

    async fn primary_key(&self) -> String {
        self.engine
            .policy_snapshot()
            .await
            .schema()
            .primary_key_of(self.table.as_str())
            .to_owned()
    }

    async fn select(&self, identity: &Identity, select: SelectQuery) -> AppResult<Vec<Row>> {
        self.engine.execute_select(identity, select).await
    }
}
