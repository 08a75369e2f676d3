// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use async_trait::async_trait;
use sea_orm::sea_query::TableCreateStatement;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, EntityName, EntityTrait, Iterable, Schema,
};
use tracing::{debug, info};

use super::connection::ConnectionPool;
use super::persistence::PersistenceContextFactory;
use crate::config::settings::JpaOptions;
use crate::utils::errors::BindingError;
use crate::utils::telemetry::SQL_LOG_TARGET;

/// 持久化单元中的一个实体类型
///
/// 保存表名、主键列数量以及生成建表语句的函数
#[derive(Clone)]
pub struct EntityRegistration {
    table_name: String,
    primary_key_columns: usize,
    create_table: fn(&Schema) -> TableCreateStatement,
}

impl EntityRegistration {
    /// 注册一个 SeaORM 实体
    pub fn of<E>() -> Self
    where
        E: EntityTrait,
    {
        Self {
            table_name: E::default().table_name().to_string(),
            primary_key_columns: <E::PrimaryKey as Iterable>::iter().count(),
            create_table: create_table_for::<E>,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn primary_key_columns(&self) -> usize {
        self.primary_key_columns
    }

    pub fn create_table_statement(&self, schema: &Schema) -> TableCreateStatement {
        (self.create_table)(schema)
    }
}

impl fmt::Debug for EntityRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRegistration")
            .field("table_name", &self.table_name)
            .field("primary_key_columns", &self.primary_key_columns)
            .finish_non_exhaustive()
    }
}

fn create_table_for<E: EntityTrait>(schema: &Schema) -> TableCreateStatement {
    schema.create_table_from_entity(E::default())
}

/// 厂商适配器
///
/// 把通用的持久化选项转换为具体 ORM 后端的设置，并构建持久化上下文工厂
#[async_trait]
pub trait VendorAdapter: Send + Sync {
    /// 应用 `<prefix>.jpa.*` 选项
    fn configure(&mut self, options: &JpaOptions) -> Result<(), BindingError>;

    /// 将实体集合与连接池绑定到指定的持久化单元
    async fn build(
        &self,
        pool: &ConnectionPool,
        entities: &[EntityRegistration],
        unit_name: &str,
    ) -> Result<PersistenceContextFactory, BindingError>;
}

/// SeaORM 厂商适配器
#[derive(Debug, Clone, Default)]
pub struct SeaOrmVendorAdapter {
    show_sql: bool,
    generate_ddl: bool,
    database: Option<DbBackend>,
    database_platform: Option<DbBackend>,
    properties: BTreeMap<String, String>,
}

impl SeaOrmVendorAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 实际使用的后端：平台优先于数据库类型，二者都未配置时沿用连接池的后端
    fn resolve_backend(&self, pool_backend: DbBackend) -> Result<DbBackend, BindingError> {
        let backend = self
            .database_platform
            .or(self.database)
            .unwrap_or(pool_backend);

        if backend != pool_backend {
            return Err(BindingError::Configuration(format!(
                "configured database platform {backend:?} does not match the connection backend {pool_backend:?}"
            )));
        }
        Ok(backend)
    }

    /// 适配器自身产生的属性，用户在 `properties.*` 中的同名键会覆盖它们
    fn vendor_properties(&self) -> BTreeMap<String, String> {
        let mut properties = BTreeMap::new();
        properties.insert("show-sql".to_string(), self.show_sql.to_string());
        properties.insert("generate-ddl".to_string(), self.generate_ddl.to_string());
        if let Some(database) = self.database {
            properties.insert("database".to_string(), backend_name(database).to_string());
        }
        if let Some(platform) = self.database_platform {
            properties.insert(
                "database-platform".to_string(),
                backend_name(platform).to_string(),
            );
        }
        properties.extend(self.properties.clone());
        properties
    }
}

#[async_trait]
impl VendorAdapter for SeaOrmVendorAdapter {
    fn configure(&mut self, options: &JpaOptions) -> Result<(), BindingError> {
        self.show_sql = options.show_sql;
        self.generate_ddl = options.generate_ddl;
        self.database = options
            .database
            .as_deref()
            .map(|database| parse_backend("database", database))
            .transpose()?;
        self.database_platform = options
            .database_platform
            .as_deref()
            .map(|platform| parse_backend("database-platform", platform))
            .transpose()?;
        self.properties = options.properties.clone();
        Ok(())
    }

    async fn build(
        &self,
        pool: &ConnectionPool,
        entities: &[EntityRegistration],
        unit_name: &str,
    ) -> Result<PersistenceContextFactory, BindingError> {
        validate_entities(unit_name, entities)?;
        let backend = self.resolve_backend(pool.backend())?;

        let mut connection = pool.connection().clone();
        if self.show_sql {
            connection.set_metric_callback(|info| {
                tracing::info!(
                    target: SQL_LOG_TARGET,
                    elapsed_ms = info.elapsed.as_millis() as u64,
                    failed = info.failed,
                    "{}",
                    info.statement.sql
                );
            });
        }

        if self.generate_ddl {
            generate_schema(&connection, backend, unit_name, entities).await?;
        }

        let tables = entities
            .iter()
            .map(|entity| entity.table_name().to_string())
            .collect();

        info!(
            unit = unit_name,
            pool = pool.name(),
            entities = entities.len(),
            "Persistence unit initialized"
        );

        Ok(PersistenceContextFactory::new(
            unit_name.to_string(),
            backend,
            connection,
            tables,
            self.vendor_properties(),
        ))
    }
}

fn parse_backend(key: &str, value: &str) -> Result<DbBackend, BindingError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "sqlite" => Ok(DbBackend::Sqlite),
        "postgres" | "postgresql" => Ok(DbBackend::Postgres),
        other => Err(BindingError::Configuration(format!(
            "unsupported {key} '{other}'"
        ))),
    }
}

fn backend_name(backend: DbBackend) -> &'static str {
    match backend {
        DbBackend::Sqlite => "sqlite",
        DbBackend::Postgres => "postgres",
        DbBackend::MySql => "mysql",
    }
}

/// 校验实体集合：非空、表名唯一、每个实体都有主键
fn validate_entities(unit_name: &str, entities: &[EntityRegistration]) -> Result<(), BindingError> {
    if entities.is_empty() {
        return Err(BindingError::mapping(unit_name, "no entity types registered"));
    }

    let mut seen = HashSet::new();
    for entity in entities {
        if entity.primary_key_columns == 0 {
            return Err(BindingError::mapping(
                unit_name,
                format!("entity '{}' has no identity column", entity.table_name),
            ));
        }
        if !seen.insert(entity.table_name.as_str()) {
            return Err(BindingError::mapping(
                unit_name,
                format!("table '{}' is mapped more than once", entity.table_name),
            ));
        }
    }
    Ok(())
}

async fn generate_schema(
    connection: &DatabaseConnection,
    backend: DbBackend,
    unit_name: &str,
    entities: &[EntityRegistration],
) -> Result<(), BindingError> {
    let schema = Schema::new(backend);
    for entity in entities {
        let mut statement = entity.create_table_statement(&schema);
        statement.if_not_exists();
        connection
            .execute(backend.build(&statement))
            .await
            .map_err(|e| {
                BindingError::mapping(
                    unit_name,
                    format!("failed to create table '{}': {e}", entity.table_name),
                )
            })?;
        debug!(unit = unit_name, table = %entity.table_name, "Ensured table exists");
    }
    Ok(())
}
