//! Application services and ports.

#![forbid(unsafe_code)]

mod gateway_ports;
mod ownership_resolver;
mod policy_store;
mod query_enforcement_engine;
mod record_gateway;
mod table_gateways;

pub use gateway_ports::{
    AuditRepository, DenialAuditEvent, PrivilegeRepository, QueryStorage, RecordHook,
    SchemaRepository,
};
pub use ownership_resolver::OwnershipResolver;
pub use policy_store::PolicyStore;
pub use query_enforcement_engine::QueryEnforcementEngine;
pub use record_gateway::{FetchOptions, RecordGateway};
pub use table_gateways::{
    GatewayFactory, GatewayRegistry, GenericTableGateway, PRIVILEGE_LIST_COLUMNS,
    PRIVILEGES_TABLE, PrivilegesTableGateway, SOCIAL_POSTS_TABLE, SocialPostsTableGateway,
    TableGateway,
};
