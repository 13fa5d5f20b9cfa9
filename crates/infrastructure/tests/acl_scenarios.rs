//! End-to-end authorization scenarios over the in-memory adapters.

use std::sync::Arc;

use serde_json::{Value, json};
use tablegate_application::{GatewayRegistry, PolicyStore, QueryEnforcementEngine, QueryStorage};
use tablegate_core::{AclDenialKind, AppError, DeploymentMode, GroupId, Identity, UserId};
use tablegate_domain::{
    ColumnSelection, DeleteQuery, InsertQuery, Predicate, PrivilegeRecord, Query, QueryOutcome,
    Row, SelectQuery, TableSchema, UpdateQuery,
};
use tablegate_infrastructure::{InMemoryAuditRepository, InMemoryPolicyRepository, InMemoryQueryStorage};

const EDITORS: i64 = 2;
const CALLER: i64 = 7;
const OTHER: i64 = 9;

struct Harness {
    storage: Arc<InMemoryQueryStorage>,
    policy: Arc<InMemoryPolicyRepository>,
    policy_store: Arc<PolicyStore>,
    audit: Arc<InMemoryAuditRepository>,
    engine: Arc<QueryEnforcementEngine>,
}

fn tables() -> Vec<TableSchema> {
    let posts = TableSchema::new("posts", ["id", "title", "body", "author_id", "active"], "id")
        .and_then(|table| table.with_owner_column("author_id"))
        .map(|table| table.with_inactive_by_default(true))
        .unwrap_or_else(|_| unreachable!());
    let privileges = TableSchema::new(
        "acl_privileges",
        [
            "id",
            "group_id",
            "table_name",
            "permissions",
            "write_field_blacklist",
            "read_field_blacklist",
        ],
        "id",
    )
    .unwrap_or_else(|_| unreachable!());

    vec![posts, privileges]
}

fn grant(table: &str, permissions: &str, write: &str, read: &str) -> PrivilegeRecord {
    PrivilegeRecord::from_list_values(GroupId::new(EDITORS), table, permissions, write, read)
        .unwrap_or_else(|_| unreachable!())
}

fn caller() -> Identity {
    Identity::authenticated(UserId::new(CALLER), Some(GroupId::new(EDITORS)))
}

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

async fn harness_with_mode(privileges: Vec<PrivilegeRecord>, mode: DeploymentMode) -> Harness {
    let tables = tables();
    let storage = Arc::new(InMemoryQueryStorage::with_tables(tables.iter()));
    let policy = Arc::new(InMemoryPolicyRepository::new());
    for table in tables {
        policy.save_table(table).await;
    }
    for record in privileges {
        policy.save_privilege(record).await;
    }

    let seed = [
        ("mine", Some(CALLER)),
        ("also mine", Some(CALLER)),
        ("theirs", Some(OTHER)),
        ("orphan", None),
    ];
    for (title, author) in seed {
        let inserted = storage
            .insert(
                &InsertQuery::new("posts")
                    .value("title", title)
                    .value("body", "text")
                    .value("author_id", author.map(Value::from).unwrap_or(Value::Null))
                    .value("active", 1),
            )
            .await;
        assert!(inserted.is_ok());
    }

    let policy_store = Arc::new(
        PolicyStore::load(policy.clone(), policy.clone())
            .await
            .unwrap_or_else(|_| unreachable!()),
    );
    let audit = Arc::new(InMemoryAuditRepository::new());
    let engine = Arc::new(QueryEnforcementEngine::new(
        storage.clone(),
        policy_store.clone(),
        audit.clone(),
        mode,
    ));

    Harness {
        storage,
        policy,
        policy_store,
        audit,
        engine,
    }
}

async fn harness(privileges: Vec<PrivilegeRecord>) -> Harness {
    harness_with_mode(privileges, DeploymentMode::Development).await
}

fn denial_kind<T>(result: &Result<T, AppError>) -> Option<AclDenialKind> {
    result
        .as_ref()
        .err()
        .and_then(AppError::denial)
        .map(|denial| denial.kind())
}

async fn titles(harness: &Harness) -> Vec<String> {
    harness
        .storage
        .dump("posts")
        .await
        .unwrap_or_else(|_| unreachable!())
        .iter()
        .filter_map(|row| row.get("title").and_then(Value::as_str).map(str::to_owned))
        .collect()
}

#[tokio::test]
async fn editing_rows_owned_only_by_the_caller_succeeds() {
    let harness = harness(vec![grant("posts", "edit", "", "")]).await;

    let updated = harness
        .engine
        .execute_update(
            &caller(),
            UpdateQuery::new("posts")
                .set("title", "edited")
                .filter(Predicate::eq("author_id", CALLER)),
        )
        .await;

    assert_eq!(updated.unwrap_or_else(|_| unreachable!()), 2);
    assert!(harness.audit.events().await.is_empty());
}

#[tokio::test]
async fn editing_rows_with_another_owner_names_every_owner() {
    let harness = harness(vec![grant("posts", "edit", "", "")]).await;

    let result = harness
        .engine
        .execute_update(
            &caller(),
            UpdateQuery::new("posts")
                .set("title", "edited")
                .filter(Predicate::in_list("author_id", [CALLER, OTHER])),
        )
        .await;

    assert_eq!(denial_kind(&result), Some(AclDenialKind::TableBigEditForbidden));
    let error = result.err().unwrap_or_else(|| unreachable!());
    let denial = error.denial().unwrap_or_else(|| unreachable!());
    assert_eq!(denial.matched_rows(), Some(3));
    assert_eq!(denial.owner_ids(), &[UserId::new(CALLER), UserId::new(OTHER)]);
    assert!(titles(&harness).await.iter().all(|title| title != "edited"));

    let events = harness.audit.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, AclDenialKind::TableBigEditForbidden);
    assert_eq!(events[0].table_name, "posts");
}

#[tokio::test]
async fn unowned_rows_block_editing_without_bigedit() {
    let harness = harness(vec![grant("posts", "edit", "", "")]).await;

    let result = harness
        .engine
        .execute_update(
            &caller(),
            UpdateQuery::new("posts")
                .set("title", "edited")
                .filter(Predicate::eq("title", "orphan")),
        )
        .await;

    assert_eq!(denial_kind(&result), Some(AclDenialKind::TableBigEditForbidden));
    let error = result.err().unwrap_or_else(|| unreachable!());
    assert_eq!(error.denial().map(|denial| denial.unowned_rows()), Some(1));
}

#[tokio::test]
async fn tables_without_owner_column_need_bigedit_even_for_empty_matches() {
    let harness = harness(vec![grant("acl_privileges", "add,edit,delete", "", "")]).await;

    let update = harness
        .engine
        .execute_update(
            &caller(),
            UpdateQuery::new("acl_privileges")
                .set("permissions", "bigedit")
                .filter(Predicate::eq("id", 999)),
        )
        .await;
    assert_eq!(denial_kind(&update), Some(AclDenialKind::TableBigEditForbidden));

    let delete = harness
        .engine
        .execute_delete(
            &caller(),
            DeleteQuery::new("acl_privileges").filter(Predicate::eq("id", 999)),
        )
        .await;
    assert_eq!(denial_kind(&delete), Some(AclDenialKind::TableBigDeleteForbidden));
}

#[tokio::test]
async fn inserts_into_inactive_by_default_tables_are_forced_inactive() {
    let harness = harness(vec![grant("posts", "add", "active", "")]).await;

    for values in [
        json!({"title": "draft", "author_id": CALLER}),
        json!({"title": "sneaky", "author_id": CALLER, "active": 1}),
    ] {
        let outcome = harness
            .engine
            .execute_insert(&caller(), InsertQuery::from_row("posts", row(values)))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(outcome.affected_rows, 1);
    }

    let rows = harness.storage.dump("posts").await.unwrap_or_else(|_| unreachable!());
    let inserted: Vec<&Value> = rows
        .iter()
        .filter(|row| row["title"] == json!("draft") || row["title"] == json!("sneaky"))
        .map(|row| &row["active"])
        .collect();
    assert_eq!(inserted, vec![&json!(2), &json!(2)]);
}

#[tokio::test]
async fn inserts_without_add_never_reach_storage() {
    let harness = harness(vec![grant("posts", "edit,bigedit", "", "")]).await;
    let before = titles(&harness).await;

    let first = harness
        .engine
        .execute(
            &caller(),
            Query::Insert(InsertQuery::new("posts").value("title", "nope")),
        )
        .await;
    let second = harness
        .engine
        .execute(
            &caller(),
            Query::Insert(InsertQuery::new("posts").value("title", "nope")),
        )
        .await;

    assert_eq!(denial_kind(&first), Some(AclDenialKind::TableAddForbidden));
    assert_eq!(
        first.err().map(|error| error.to_string()),
        second.err().map(|error| error.to_string())
    );
    assert_eq!(titles(&harness).await, before);
    assert_eq!(harness.audit.events().await.len(), 2);
}

#[tokio::test]
async fn write_blacklist_applies_even_with_bigedit() {
    let harness = harness(vec![grant("posts", "edit,bigedit", "author_id", "")]).await;

    let result = harness
        .engine
        .execute_update(
            &caller(),
            UpdateQuery::new("posts")
                .set("author_id", CALLER)
                .filter(Predicate::eq("author_id", OTHER)),
        )
        .await;

    assert_eq!(denial_kind(&result), Some(AclDenialKind::FieldWriteForbidden));
    let error = result.err().unwrap_or_else(|| unreachable!());
    assert_eq!(
        error.denial().map(|denial| denial.columns().to_vec()),
        Some(vec!["author_id".to_owned()])
    );
}

#[tokio::test]
async fn own_rows_need_the_little_privilege() {
    let harness = harness(vec![grant("posts", "bigedit,bigdelete", "", "")]).await;

    let update = harness
        .engine
        .execute_update(
            &caller(),
            UpdateQuery::new("posts")
                .set("title", "edited")
                .filter(Predicate::eq("title", "mine")),
        )
        .await;
    assert_eq!(denial_kind(&update), Some(AclDenialKind::TableEditForbidden));

    let delete = harness
        .engine
        .execute_delete(
            &caller(),
            DeleteQuery::new("posts").filter(Predicate::eq("title", "theirs")),
        )
        .await;
    assert_eq!(delete.unwrap_or_else(|_| unreachable!()), 1);
}

#[tokio::test]
async fn deleting_follows_the_delete_ladder() {
    let harness = harness(vec![grant("posts", "delete", "", "")]).await;

    let denied = harness
        .engine
        .execute_delete(
            &caller(),
            DeleteQuery::new("posts").filter(Predicate::eq("active", 1)),
        )
        .await;
    assert_eq!(denial_kind(&denied), Some(AclDenialKind::TableBigDeleteForbidden));

    let deleted = harness
        .engine
        .execute_delete(
            &caller(),
            DeleteQuery::new("posts").filter(Predicate::eq("author_id", CALLER)),
        )
        .await;
    assert_eq!(deleted.unwrap_or_else(|_| unreachable!()), 2);
    assert_eq!(titles(&harness).await, vec!["theirs", "orphan"]);
}

#[tokio::test]
async fn read_blacklist_hides_wildcards_and_rejects_named_columns() {
    let harness = harness(vec![grant("posts", "", "", "body")]).await;

    let rows = harness
        .engine
        .execute_select(&caller(), SelectQuery::new("posts"))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|row| !row.contains_key("body") && row.contains_key("title")));

    let named = harness
        .engine
        .execute_select(
            &caller(),
            SelectQuery::new("posts").columns(ColumnSelection::named(["title", "body"])),
        )
        .await;
    assert_eq!(denial_kind(&named), Some(AclDenialKind::FieldReadForbidden));
}

#[tokio::test]
async fn callers_without_a_group_hold_no_privileges() {
    let harness = harness(vec![grant("posts", "add,edit,bigedit", "", "")]).await;
    let anonymous = Identity::anonymous(None);

    let insert = harness
        .engine
        .execute_insert(&anonymous, InsertQuery::new("posts").value("title", "x"))
        .await;
    assert_eq!(denial_kind(&insert), Some(AclDenialKind::TableAddForbidden));

    let select = harness
        .engine
        .execute_select(&anonymous, SelectQuery::new("posts"))
        .await;
    assert_eq!(denial_kind(&select), Some(AclDenialKind::FieldReadForbidden));
}

#[tokio::test]
async fn refreshed_policy_applies_to_later_queries() {
    let harness = harness(vec![grant("posts", "edit", "", "")]).await;
    let query = UpdateQuery::new("posts")
        .set("title", "edited")
        .filter(Predicate::eq("author_id", OTHER));

    let before = harness.engine.execute_update(&caller(), query.clone()).await;
    assert_eq!(denial_kind(&before), Some(AclDenialKind::TableBigEditForbidden));

    harness
        .policy
        .save_privilege(grant("posts", "edit,bigedit", "", ""))
        .await;
    let refreshed = harness.policy_store.refresh().await;
    assert!(refreshed.is_ok());

    let after = harness.engine.execute_update(&caller(), query).await;
    assert_eq!(after.unwrap_or_else(|_| unreachable!()), 1);
}

#[tokio::test]
async fn storage_failures_expose_query_text_only_outside_production() {
    for (mode, exposes) in [
        (DeploymentMode::Development, true),
        (DeploymentMode::Production, false),
    ] {
        let harness = harness_with_mode(vec![grant("posts", "add,bigedit", "", "")], mode).await;

        let result = harness
            .engine
            .execute_insert(&caller(), InsertQuery::new("posts").value("id", 1))
            .await;

        match result {
            Err(AppError::ExecutionFailed { query, .. }) => {
                assert_eq!(query.is_some(), exposes);
                if let Some(query) = query {
                    assert!(query.starts_with("INSERT INTO \"posts\""));
                }
            }
            other => panic!("expected execution failure, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn record_gateway_inserts_updates_and_rereads() {
    let harness = harness(vec![grant("posts", "add,edit", "active", "body")]).await;
    let registry = GatewayRegistry::with_builtin_gateways(harness.engine.clone());
    let gateway = registry.gateway_for("posts");

    let created = gateway
        .records()
        .add_or_update_record(
            &caller(),
            row(json!({"title": "fresh", "body": "hidden", "author_id": CALLER})),
        )
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());
    assert_eq!(created["title"], json!("fresh"));
    assert_eq!(created["active"], json!(2));
    assert!(!created.contains_key("body"));

    let id = created["id"].clone();
    let updated = gateway
        .records()
        .add_or_update_record(&caller(), row(json!({"id": id, "title": "renamed"})))
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());
    assert_eq!(updated["title"], json!("renamed"));

    let composite = gateway
        .records()
        .add_or_update_record(&caller(), row(json!({"title": ["a", "b"]})))
        .await;
    assert!(matches!(
        composite,
        Err(AppError::ArrayAsScalarColumnValue { column, .. }) if column == "title"
    ));
}

#[tokio::test]
async fn execute_dispatches_every_query_kind() {
    let harness = harness(vec![grant("posts", "add,edit,bigedit,delete,bigdelete", "", "")]).await;
    let identity = caller();

    let outcome = harness
        .engine
        .execute(
            &identity,
            Query::Select(SelectQuery::new("posts").filter(Predicate::eq("author_id", OTHER))),
        )
        .await;
    assert!(matches!(outcome, Ok(QueryOutcome::Rows(rows)) if rows.len() == 1));

    let outcome = harness
        .engine
        .execute(&identity, Query::Insert(InsertQuery::new("posts").value("title", "new")))
        .await;
    assert!(matches!(outcome, Ok(QueryOutcome::Inserted(inserted)) if inserted.last_insert_id == Some(5)));

    let outcome = harness
        .engine
        .execute(
            &identity,
            Query::Update(UpdateQuery::new("posts").set("body", "b").filter(Predicate::All)),
        )
        .await;
    assert!(matches!(outcome, Ok(QueryOutcome::Affected(5))));

    let outcome = harness
        .engine
        .execute(&identity, Query::Delete(DeleteQuery::new("posts")))
        .await;
    assert!(matches!(outcome, Ok(QueryOutcome::Affected(5))));
}
