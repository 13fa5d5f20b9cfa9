use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use tablegate_application::PrivilegeRepository;
use tablegate_core::GroupId;
use tablegate_domain::{PrivilegeRecord, TablePrivilege};

use super::PostgresPrivilegeRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres privilege repository tests: {error}");
    }

    Some(pool)
}

#[tokio::test]
async fn saving_twice_replaces_the_group_record() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresPrivilegeRepository::new(pool);
    let group_id = GroupId::new(9_001);

    let initial =
        PrivilegeRecord::from_list_values(group_id, "catalog_articles", "add", "active", "")
            .unwrap_or_else(|_| unreachable!());
    assert!(repository.save_privilege(&initial).await.is_ok());

    let replacement = PrivilegeRecord::from_list_values(
        group_id,
        "catalog_articles",
        "add,edit,bigedit",
        "",
        "secret,token",
    )
    .unwrap_or_else(|_| unreachable!());
    assert!(repository.save_privilege(&replacement).await.is_ok());

    let records = repository
        .list_privileges()
        .await
        .unwrap_or_else(|_| unreachable!());
    let stored: Vec<&PrivilegeRecord> = records
        .iter()
        .filter(|record| {
            record.group_id() == group_id && record.table_name().as_str() == "catalog_articles"
        })
        .collect();

    assert_eq!(stored, vec![&replacement]);
    assert!(stored[0].allows(TablePrivilege::BigEdit));
    assert!(stored[0].write_blacklist().is_empty());
}
