use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tablegate_core::{AppResult, DeploymentMode, GroupId, Identity, StorageResult, UserId};
use tablegate_domain::{
    DeleteQuery, InsertOutcome, InsertQuery, Predicate, PrivilegeRecord, Row, SelectQuery,
    TableSchema, UpdateQuery,
};
use tokio::sync::Mutex;

use crate::{
    AuditRepository, DenialAuditEvent, PolicyStore, PrivilegeRepository, QueryEnforcementEngine,
    QueryStorage, SchemaRepository,
};

use super::{
    GatewayRegistry, GenericTableGateway, PRIVILEGES_TABLE, PrivilegesTableGateway,
    SOCIAL_POSTS_TABLE, SocialPostsTableGateway,
};

struct CannedStorage {
    rows: Vec<Row>,
    selects: Mutex<Vec<SelectQuery>>,
}

#[async_trait]
impl QueryStorage for CannedStorage {
    async fn select(&self, query: &SelectQuery) -> StorageResult<Vec<Row>> {
        self.selects.lock().await.push(query.clone());
        Ok(self.rows.clone())
    }

    async fn insert(&self, _query: &InsertQuery) -> StorageResult<InsertOutcome> {
        Ok(InsertOutcome {
            affected_rows: 1,
            last_insert_id: None,
        })
    }

    async fn update(&self, _query: &UpdateQuery) -> StorageResult<u64> {
        Ok(0)
    }

    async fn delete(&self, _query: &DeleteQuery) -> StorageResult<u64> {
        Ok(0)
    }
}

struct ReaderPolicy;

#[async_trait]
impl PrivilegeRepository for ReaderPolicy {
    async fn list_privileges(&self) -> AppResult<Vec<PrivilegeRecord>> {
        [PRIVILEGES_TABLE, SOCIAL_POSTS_TABLE]
            .into_iter()
            .map(|table| PrivilegeRecord::from_list_values(GroupId::new(1), table, "", "", ""))
            .collect()
    }
}

#[async_trait]
impl SchemaRepository for ReaderPolicy {
    async fn list_tables(&self) -> AppResult<Vec<TableSchema>> {
        Ok(Vec::new())
    }
}

struct NoopAuditRepository;

#[async_trait]
impl AuditRepository for NoopAuditRepository {
    async fn append_denial(&self, _event: DenialAuditEvent) -> AppResult<()> {
        Ok(())
    }
}

async fn registry(rows: Vec<Row>) -> (GatewayRegistry, Arc<CannedStorage>) {
    let storage = Arc::new(CannedStorage {
        rows,
        selects: Mutex::new(Vec::new()),
    });
    let policy = Arc::new(ReaderPolicy);
    let policy_store = PolicyStore::load(policy.clone(), policy)
        .await
        .unwrap_or_else(|_| unreachable!());
    let engine = QueryEnforcementEngine::new(
        storage.clone(),
        Arc::new(policy_store),
        Arc::new(NoopAuditRepository),
        DeploymentMode::Development,
    );

    (
        GatewayRegistry::with_builtin_gateways(Arc::new(engine)),
        storage,
    )
}

fn reader() -> Identity {
    Identity::authenticated(UserId::new(3), Some(GroupId::new(1)))
}

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn unregistered_tables_get_the_generic_gateway() {
    let (registry, _) = registry(Vec::new()).await;

    let gateway = registry.gateway_for("articles");
    assert_eq!(gateway.table_name(), "articles");
    assert!(gateway.as_any().is::<GenericTableGateway>());
    assert!(!registry.is_registered("articles"));

    let privileges = registry.gateway_for(PRIVILEGES_TABLE);
    assert!(privileges.as_any().is::<PrivilegesTableGateway>());
}

#[tokio::test]
async fn group_privileges_are_keyed_by_table_with_split_lists() {
    let (registry, storage) = registry(vec![
        row(json!({
            "id": 1,
            "group_id": 1,
            "table_name": "posts",
            "permissions": "add,edit",
            "write_field_blacklist": "active",
            "read_field_blacklist": ""
        })),
        row(json!({
            "id": 2,
            "group_id": 1,
            "table_name": "users",
            "permissions": "bigedit",
            "write_field_blacklist": "password,salt",
            "read_field_blacklist": "password"
        })),
    ])
    .await;

    let gateway = registry.gateway_for(PRIVILEGES_TABLE);
    let privileges = gateway
        .as_any()
        .downcast_ref::<PrivilegesTableGateway>()
        .unwrap_or_else(|| unreachable!());

    let by_table = privileges
        .fetch_group_privileges(&reader(), GroupId::new(1))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(by_table.len(), 2);
    assert_eq!(by_table["posts"]["permissions"], json!(["add", "edit"]));
    assert_eq!(by_table["posts"]["read_field_blacklist"], json!([]));
    assert_eq!(
        by_table["users"]["write_field_blacklist"],
        json!(["password", "salt"])
    );

    let raw = privileges
        .fetch_group_privileges_raw(&reader(), GroupId::new(1))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(raw[0]["permissions"], json!("add,edit"));

    let selects = storage.selects.lock().await;
    assert_eq!(selects[0].predicate, Predicate::eq("group_id", 1));
}

#[tokio::test]
async fn feed_foreign_id_lookup_returns_existing_post() {
    let (registry, storage) =
        registry(vec![row(json!({"id": 5, "foreign_id": "tweet-99", "feed": 4}))]).await;

    let gateway = registry.gateway_for(SOCIAL_POSTS_TABLE);
    let social_posts = gateway
        .as_any()
        .downcast_ref::<SocialPostsTableGateway>()
        .unwrap_or_else(|| unreachable!());

    let existing = social_posts
        .feed_foreign_id_exists(&reader(), "tweet-99", 4)
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());
    assert_eq!(existing["id"], json!(5));

    let selects = storage.selects.lock().await;
    assert_eq!(selects[0].limit, Some(1));
    assert_eq!(
        selects[0].predicate,
        Predicate::eq("foreign_id", "tweet-99").and(Predicate::eq("feed", 4))
    );
}

#[tokio::test]
async fn feed_foreign_id_lookup_is_empty_when_not_imported() {
    let (registry, _) = registry(Vec::new()).await;

    let gateway = registry.gateway_for(SOCIAL_POSTS_TABLE);
    let social_posts = gateway
        .as_any()
        .downcast_ref::<SocialPostsTableGateway>()
        .unwrap_or_else(|| unreachable!());

    let existing = social_posts
        .feed_foreign_id_exists(&reader(), "tweet-100", 4)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(existing.is_none());
}
