// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    create_test_persistence, customer_config, table_columns, table_exists, table_indexes,
};
use customer_datasource::config::customer::CustomerPersistence;
use customer_datasource::domain::models::customer::Customer;
use customer_datasource::domain::repositories::customer_repository::CustomerRepository;
use migration::{Migrator, MigratorTrait};

/// 测试关闭 generate-ddl 时由迁移提供表结构
#[tokio::test]
async fn test_migrations_supply_customer_schema() {
    let persistence = CustomerPersistence::initialize(&customer_config(""))
        .await
        .unwrap();
    let db = persistence.data_source.connection();
    assert!(!table_exists(db, "customer").await);

    Migrator::up(db, None).await.unwrap();

    assert!(table_exists(db, "customer").await);
    assert_eq!(
        table_columns(db, "customer").await,
        vec!["id", "first_name", "last_name"]
    );

    let repo = persistence.customer_repository();
    let saved = repo.save(&Customer::new("John", "Smith")).await.unwrap();
    assert!(saved.id.is_some());
}

/// 测试迁移与 generate-ddl 产生相同的表结构
#[tokio::test]
async fn test_migrations_and_generated_schema_agree() {
    let migrated = CustomerPersistence::initialize(&customer_config(""))
        .await
        .unwrap();
    Migrator::up(migrated.data_source.connection(), None)
        .await
        .unwrap();
    let generated = create_test_persistence().await;

    let migrated_db = migrated.data_source.connection();
    let generated_db = generated.data_source.connection();
    assert_eq!(
        table_columns(migrated_db, "customer").await,
        table_columns(generated_db, "customer").await
    );
    assert_eq!(
        table_indexes(migrated_db, "customer").await,
        table_indexes(generated_db, "customer").await
    );

    migrated.shutdown().await.unwrap();
    generated.shutdown().await.unwrap();
}
