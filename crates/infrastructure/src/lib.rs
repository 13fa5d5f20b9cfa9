//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod gateway_config;
mod in_memory_audit_repository;
mod in_memory_policy_repository;
mod in_memory_query_storage;
mod postgres_audit_repository;
mod postgres_privilege_repository;
mod postgres_query_storage;
mod postgres_schema_repository;

pub use gateway_config::{GatewayConfig, connect_pool, init_tracing};
pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_policy_repository::InMemoryPolicyRepository;
pub use in_memory_query_storage::InMemoryQueryStorage;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_privilege_repository::PostgresPrivilegeRepository;
pub use postgres_query_storage::PostgresQueryStorage;
pub use postgres_schema_repository::PostgresSchemaRepository;
