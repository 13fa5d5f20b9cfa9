use async_trait::async_trait;
use tablegate_application::{AuditRepository, DenialAuditEvent};
use tablegate_core::AppResult;
use tokio::sync::RwLock;

/// Append-only audit repository kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryAuditRepository {
    events: RwLock<Vec<DenialAuditEvent>>,
}

impl InMemoryAuditRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events in append order.
    pub async fn events(&self) -> Vec<DenialAuditEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append_denial(&self, event: DenialAuditEvent) -> AppResult<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}
