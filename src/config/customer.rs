// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use config::Config;
use tracing::info;

use crate::config::settings::{
    load_datasource_options, load_jpa_options, DatasourceOptions, JpaOptions,
};
use crate::infrastructure::database::connection::{build_connection_pool, ConnectionPool};
use crate::infrastructure::database::entities::customer_entities;
use crate::infrastructure::database::persistence::{
    build_persistence_context_factory, PersistenceContextFactory,
};
use crate::infrastructure::database::transaction::{
    build_transaction_coordinator, TransactionCoordinator,
};
use crate::infrastructure::repositories::customer_repo_impl::CustomerRepositoryImpl;
use crate::utils::errors::BindingError;

/// 客户数据源的配置前缀
pub const CUSTOMER_PREFIX: &str = "app.customer";
/// 客户持久化单元名称
pub const CUSTOMER_PERSISTENCE_UNIT: &str = "customersDs";
/// 客户连接池名称
pub const CUSTOMER_DATA_SOURCE: &str = "customerDataSource";

/// 客户持久化单元的全部句柄
///
/// 由 [`CustomerPersistence::initialize`] 按顺序构建：
/// 选项 → 连接池 → 持久化上下文工厂 → 事务协调器
#[derive(Debug, Clone)]
pub struct CustomerPersistence {
    /// `app.customer.jpa.*`
    pub jpa: JpaOptions,
    /// `app.customer.datasource.*`
    pub datasource: DatasourceOptions,
    pub data_source: ConnectionPool,
    pub entity_manager: Arc<PersistenceContextFactory>,
    pub transaction_manager: TransactionCoordinator,
}

impl CustomerPersistence {
    /// 使用 `app.customer.*` 配置初始化
    pub async fn initialize(config: &Config) -> Result<Self, BindingError> {
        Self::initialize_with_prefix(config, CUSTOMER_PREFIX).await
    }

    /// 使用指定前缀初始化，只读取该前缀下的配置
    pub async fn initialize_with_prefix(
        config: &Config,
        prefix: &str,
    ) -> Result<Self, BindingError> {
        let jpa = load_jpa_options(config, prefix)?;
        let datasource = load_datasource_options(config, prefix)?;

        let mut pool_properties = datasource.properties.clone();
        pool_properties
            .entry("pool-name".to_string())
            .or_insert_with(|| CUSTOMER_DATA_SOURCE.to_string());
        let data_source = build_connection_pool(&datasource, &pool_properties).await?;

        let entity_manager = Arc::new(
            build_persistence_context_factory(
                &jpa,
                &data_source,
                &customer_entities(),
                CUSTOMER_PERSISTENCE_UNIT,
            )
            .await?,
        );
        let transaction_manager = build_transaction_coordinator(entity_manager.clone());

        info!(
            prefix,
            unit = CUSTOMER_PERSISTENCE_UNIT,
            pool = data_source.name(),
            "Customer persistence initialized"
        );

        Ok(Self {
            jpa,
            datasource,
            data_source,
            entity_manager,
            transaction_manager,
        })
    }

    /// 绑定到客户事务协调器的仓库
    pub fn customer_repository(&self) -> CustomerRepositoryImpl {
        CustomerRepositoryImpl::new(self.transaction_manager.clone())
    }

    /// 关闭连接池
    pub async fn shutdown(self) -> Result<(), BindingError> {
        let name = self.data_source.name().to_string();
        self.data_source
            .close()
            .await
            .map_err(|e| BindingError::pool(name, format!("failed to close: {e}")))
    }
}
