// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use sea_orm::{DatabaseTransaction, DbErr, TransactionError, TransactionTrait};
use tracing::{debug, warn};

use super::persistence::PersistenceContextFactory;

/// 事务协调器
///
/// 只为所绑定的持久化单元划定事务边界
#[derive(Debug, Clone)]
pub struct TransactionCoordinator {
    factory: Arc<PersistenceContextFactory>,
}

/// 创建绑定到指定工厂的事务协调器
pub fn build_transaction_coordinator(
    factory: Arc<PersistenceContextFactory>,
) -> TransactionCoordinator {
    debug!(unit = factory.unit_name(), "Transaction coordinator created");
    TransactionCoordinator { factory }
}

impl TransactionCoordinator {
    pub fn factory(&self) -> &Arc<PersistenceContextFactory> {
        &self.factory
    }

    /// 手动开启事务，未提交的事务在 drop 时回滚
    pub async fn begin(&self) -> Result<DatabaseTransaction, DbErr> {
        self.factory.connection().begin().await
    }

    /// 在事务中执行回调
    ///
    /// 回调返回 `Ok` 时提交，返回 `Err` 时回滚
    pub async fn execute<F, T, E>(&self, callback: F) -> Result<T, TransactionError<E>>
    where
        F: for<'c> FnOnce(
                &'c DatabaseTransaction,
            ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'c>>
            + Send,
        T: Send,
        E: std::error::Error + Send,
    {
        let result = self.factory.connection().transaction(callback).await;
        if let Err(e) = &result {
            warn!(unit = self.factory.unit_name(), error = %e, "Transaction rolled back");
        }
        result
    }
}
