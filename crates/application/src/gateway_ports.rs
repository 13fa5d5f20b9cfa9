mod audit;
mod hooks;
mod policy;
mod storage;

pub use audit::{AuditRepository, DenialAuditEvent};
pub use hooks::RecordHook;
pub use policy::{PrivilegeRepository, SchemaRepository};
pub use storage::QueryStorage;
