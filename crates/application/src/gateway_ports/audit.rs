use async_trait::async_trait;
use tablegate_core::{AclDenial, AclDenialKind, AppResult, GroupId, UserId};

/// Immutable record of one authorization denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenialAuditEvent {
    /// Acting user, `None` for anonymous callers.
    pub user_id: Option<UserId>,
    /// Acting group.
    pub group_id: Option<GroupId>,
    /// Table the denied query targeted.
    pub table_name: String,
    /// Denial category.
    pub kind: AclDenialKind,
    /// Human-readable denial message.
    pub detail: String,
}

impl DenialAuditEvent {
    /// Captures the audit-relevant parts of a denial.
    #[must_use]
    pub fn from_denial(denial: &AclDenial) -> Self {
        Self {
            user_id: denial.user_id(),
            group_id: denial.group_id(),
            table_name: denial.table().to_owned(),
            kind: denial.kind(),
            detail: denial.message().to_owned(),
        }
    }
}

/// Port for persisting append-only denial events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one denial event.
    async fn append_denial(&self, event: DenialAuditEvent) -> AppResult<()>;
}
