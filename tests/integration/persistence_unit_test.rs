// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    capture_logs, create_test_persistence, customer_config, table_columns, table_exists,
};
use customer_datasource::config::customer::{CustomerPersistence, CUSTOMER_PERSISTENCE_UNIT};
use customer_datasource::infrastructure::database::entities::{customer, customer_entities};
use customer_datasource::infrastructure::database::persistence::build_persistence_context_factory;
use customer_datasource::utils::errors::BindingError;
use customer_datasource::utils::telemetry::SQL_LOG_TARGET;
use sea_orm::{ActiveModelTrait, DbErr, EntityTrait, PaginatorTrait, Set, TransactionError};

/// 测试开启 generate-ddl 后在空库上建表，列与实体字段一致
#[tokio::test]
async fn test_generate_ddl_creates_customer_table() {
    let persistence = create_test_persistence().await;
    let db = persistence.entity_manager.connection();

    assert!(table_exists(db, "customer").await);
    let columns = table_columns(db, "customer").await;
    assert_eq!(columns, vec!["id", "first_name", "last_name"]);

    persistence.shutdown().await.unwrap();
}

/// 测试 generate-ddl 可以重复执行
#[tokio::test]
async fn test_generate_ddl_is_repeatable() {
    let persistence = create_test_persistence().await;

    let again = build_persistence_context_factory(
        &persistence.jpa,
        &persistence.data_source,
        &customer_entities(),
        CUSTOMER_PERSISTENCE_UNIT,
    )
    .await;
    assert!(again.is_ok());
}

/// 测试未开启 generate-ddl 时不建表
#[tokio::test]
async fn test_without_generate_ddl_schema_is_untouched() {
    let persistence = CustomerPersistence::initialize(&customer_config(""))
        .await
        .unwrap();

    assert!(!persistence.jpa.generate_ddl);
    assert!(!table_exists(persistence.entity_manager.connection(), "customer").await);
}

/// 测试持久化单元的名称、实体集合与合并后的属性
#[tokio::test]
async fn test_persistence_unit_metadata() {
    let persistence = CustomerPersistence::initialize(&customer_config(
        r#"
        generate-ddl = true
        show-sql = true
        database = "sqlite"
        [app.customer.jpa.properties]
        "hibernate.format_sql" = "true"
        "#,
    ))
    .await
    .unwrap();

    let factory = &persistence.entity_manager;
    assert_eq!(factory.unit_name(), CUSTOMER_PERSISTENCE_UNIT);
    assert!(factory.manages("customer"));
    assert!(!factory.manages("orders"));
    assert_eq!(factory.property("show-sql"), Some("true"));
    assert_eq!(factory.property("database"), Some("sqlite"));
    assert_eq!(factory.property("hibernate.format_sql"), Some("true"));
}

/// 测试开启 show-sql 后执行的语句写入 SQL 日志
#[tokio::test]
async fn test_show_sql_logs_statements() {
    let (logs, _guard) = capture_logs();
    let persistence = CustomerPersistence::initialize(&customer_config(
        "generate-ddl = true\nshow-sql = true",
    ))
    .await
    .unwrap();

    customer::ActiveModel {
        first_name: Set("Logged".to_string()),
        last_name: Set("Statement".to_string()),
        ..Default::default()
    }
    .insert(persistence.entity_manager.connection())
    .await
    .unwrap();

    let output = logs.contents();
    let sql_lines: Vec<&str> = output
        .lines()
        .filter(|line| line.contains(SQL_LOG_TARGET))
        .collect();
    assert!(sql_lines.iter().any(|line| line.contains("CREATE TABLE")));
    assert!(sql_lines.iter().any(|line| line.contains("INSERT INTO")));
}

/// 测试关闭 show-sql 时不记录语句
#[tokio::test]
async fn test_without_show_sql_no_statements_are_logged() {
    let (logs, _guard) = capture_logs();
    let persistence = CustomerPersistence::initialize(&customer_config("generate-ddl = true"))
        .await
        .unwrap();

    customer::ActiveModel {
        first_name: Set("Quiet".to_string()),
        last_name: Set("Statement".to_string()),
        ..Default::default()
    }
    .insert(persistence.entity_manager.connection())
    .await
    .unwrap();

    let count = customer::Entity::find()
        .count(persistence.entity_manager.connection())
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert!(!logs.contents().contains(SQL_LOG_TARGET));
}

/// 测试数据库平台与连接不一致时启动失败
#[tokio::test]
async fn test_platform_mismatch_aborts_startup() {
    let result = CustomerPersistence::initialize(&customer_config(
        r#"
        generate-ddl = true
        database-platform = "postgres"
        "#,
    ))
    .await;

    assert!(matches!(result, Err(BindingError::Configuration(_))));
}

/// 测试空实体集合无法构建持久化单元
#[tokio::test]
async fn test_empty_entity_set_is_a_mapping_error() {
    let persistence = create_test_persistence().await;

    let result = build_persistence_context_factory(
        &persistence.jpa,
        &persistence.data_source,
        &[],
        "emptyUnit",
    )
    .await;

    match result {
        Err(BindingError::Mapping { unit, .. }) => assert_eq!(unit, "emptyUnit"),
        other => panic!("expected mapping error, got {other:?}"),
    }
}

/// 测试事务协调器在回调成功时提交、失败时回滚
#[tokio::test]
async fn test_transaction_commit_and_rollback() {
    let persistence = create_test_persistence().await;
    let transactions = &persistence.transaction_manager;
    let db = persistence.entity_manager.connection();

    let result: Result<(), TransactionError<DbErr>> = transactions
        .execute(|txn| {
            Box::pin(async move {
                customer::ActiveModel {
                    first_name: Set("Rolled".to_string()),
                    last_name: Set("Back".to_string()),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
                Err(DbErr::Custom("abort".to_string()))
            })
        })
        .await;
    assert!(matches!(result, Err(TransactionError::Transaction(_))));
    assert_eq!(customer::Entity::find().count(db).await.unwrap(), 0);

    transactions
        .execute(|txn| {
            Box::pin(async move {
                customer::ActiveModel {
                    first_name: Set("Kept".to_string()),
                    last_name: Set("Row".to_string()),
                    ..Default::default()
                }
                .insert(txn)
                .await
            })
        })
        .await
        .unwrap();
    assert_eq!(customer::Entity::find().count(db).await.unwrap(), 1);
}
