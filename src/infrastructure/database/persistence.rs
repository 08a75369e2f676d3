// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::BTreeMap;

use sea_orm::{DatabaseConnection, DbBackend};
use tracing::debug;

use super::connection::ConnectionPool;
use super::vendor::{EntityRegistration, SeaOrmVendorAdapter, VendorAdapter};
use crate::config::settings::JpaOptions;
use crate::utils::errors::BindingError;

/// 持久化上下文工厂
///
/// 绑定到一个命名的持久化单元，构建完成后只读，可在线程间共享
#[derive(Debug, Clone)]
pub struct PersistenceContextFactory {
    unit_name: String,
    backend: DbBackend,
    connection: DatabaseConnection,
    tables: Vec<String>,
    properties: BTreeMap<String, String>,
}

impl PersistenceContextFactory {
    pub(crate) fn new(
        unit_name: String,
        backend: DbBackend,
        connection: DatabaseConnection,
        tables: Vec<String>,
        properties: BTreeMap<String, String>,
    ) -> Self {
        Self {
            unit_name,
            backend,
            connection,
            tables,
            properties,
        }
    }

    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    pub fn backend(&self) -> DbBackend {
        self.backend
    }

    /// 本持久化单元使用的数据库连接
    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    /// 判断某张表是否属于本持久化单元
    pub fn manages(&self, table: &str) -> bool {
        self.tables.iter().any(|t| t == table)
    }

    pub fn managed_tables(&self) -> &[String] {
        &self.tables
    }

    /// 合并后的厂商属性
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// 构建持久化上下文工厂
///
/// # 参数
///
/// * `options` - `<prefix>.jpa.*` 选项
/// * `pool` - 已初始化的连接池
/// * `entities` - 持久化单元包含的实体类型
/// * `unit_name` - 持久化单元名称
pub async fn build_persistence_context_factory(
    options: &JpaOptions,
    pool: &ConnectionPool,
    entities: &[EntityRegistration],
    unit_name: &str,
) -> Result<PersistenceContextFactory, BindingError> {
    let mut adapter = SeaOrmVendorAdapter::new();
    adapter.configure(options)?;
    debug!(unit = unit_name, ?adapter, "Vendor adapter configured");

    adapter.build(pool, entities, unit_name).await
}
