use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{QueryEnforcementEngine, RecordGateway, RecordHook};

mod privileges;
mod social_posts;

#[cfg(test)]
mod tests;

pub use privileges::{PRIVILEGE_LIST_COLUMNS, PRIVILEGES_TABLE, PrivilegesTableGateway};
pub use social_posts::{SOCIAL_POSTS_TABLE, SocialPostsTableGateway};

/// Table-specific gateway resolved by name through [`GatewayRegistry`].
pub trait TableGateway: Send + Sync {
    /// Returns the table this gateway serves.
    fn table_name(&self) -> &str;

    /// Returns the generic CRUD operations for the table.
    fn records(&self) -> &RecordGateway;

    /// Allows callers to recover the concrete gateway type.
    fn as_any(&self) -> &dyn Any;
}

/// Gateway for tables without specialised operations.
#[derive(Clone)]
pub struct GenericTableGateway {
    records: RecordGateway,
}

impl GenericTableGateway {
    /// Wraps the record gateway of a table.
    #[must_use]
    pub fn new(records: RecordGateway) -> Self {
        Self { records }
    }
}

impl TableGateway for GenericTableGateway {
    fn table_name(&self) -> &str {
        self.records.table()
    }

    fn records(&self) -> &RecordGateway {
        &self.records
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Builds a specialised gateway from the table's record gateway.
pub type GatewayFactory = Arc<dyn Fn(RecordGateway) -> Arc<dyn TableGateway> + Send + Sync>;

/// Resolves table names to gateways, falling back to [`GenericTableGateway`].
#[derive(Clone)]
pub struct GatewayRegistry {
    engine: Arc<QueryEnforcementEngine>,
    factories: HashMap<String, GatewayFactory>,
    hooks: Vec<Arc<dyn RecordHook>>,
}

impl GatewayRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(engine: Arc<QueryEnforcementEngine>) -> Self {
        Self {
            engine,
            factories: HashMap::new(),
            hooks: Vec::new(),
        }
    }

    /// Creates a registry with the built-in specialised gateways.
    #[must_use]
    pub fn with_builtin_gateways(engine: Arc<QueryEnforcementEngine>) -> Self {
        let mut registry = Self::new(engine);
        registry.register(
            PRIVILEGES_TABLE,
            |records| Arc::new(PrivilegesTableGateway::new(records)),
        );
        registry.register(
            SOCIAL_POSTS_TABLE,
            |records| Arc::new(SocialPostsTableGateway::new(records)),
        );
        registry
    }

    /// Registers the factory used for a table, replacing any previous one.
    pub fn register<F>(&mut self, table: impl Into<String>, factory: F)
    where
        F: Fn(RecordGateway) -> Arc<dyn TableGateway> + Send + Sync + 'static,
    {
        self.factories.insert(table.into(), Arc::new(factory));
    }

    /// Adds a hook to every gateway built afterwards.
    pub fn add_hook(&mut self, hook: Arc<dyn RecordHook>) {
        self.hooks.push(hook);
    }

    /// Returns whether a specialised gateway is registered for the table.
    #[must_use]
    pub fn is_registered(&self, table: &str) -> bool {
        self.factories.contains_key(table)
    }

    /// Builds the gateway for a table.
    #[must_use]
    pub fn gateway_for(&self, table: &str) -> Arc<dyn TableGateway> {
        let records = RecordGateway::new(table, Arc::clone(&self.engine))
            .with_hooks(self.hooks.iter().cloned());

        match self.factories.get(table) {
            Some(factory) => factory(records),
            None => Arc::new(GenericTableGateway::new(records)),
        }
    }
}
