// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::customer::Customer;
use async_trait::async_trait;
use sea_orm::{DbErr, TransactionError};
use thiserror::Error;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
}

impl From<TransactionError<DbErr>> for RepositoryError {
    fn from(err: TransactionError<DbErr>) -> Self {
        match err {
            TransactionError::Connection(e) | TransactionError::Transaction(e) => match e {
                DbErr::RecordNotUpdated => Self::NotFound,
                other => Self::Database(other),
            },
        }
    }
}

/// 客户仓库特质
///
/// 定义客户数据访问接口
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// 保存客户，未分配ID时插入，否则更新
    async fn save(&self, customer: &Customer) -> Result<Customer, RepositoryError>;
    /// 根据ID查找客户
    async fn find_by_id(&self, id: i32) -> Result<Option<Customer>, RepositoryError>;
    /// 查找全部客户
    async fn find_all(&self) -> Result<Vec<Customer>, RepositoryError>;
    /// 根据姓氏查找客户
    async fn find_by_last_name(&self, last_name: &str) -> Result<Vec<Customer>, RepositoryError>;
    /// 统计客户数量
    async fn count(&self) -> Result<u64, RepositoryError>;
    /// 根据ID删除客户，返回是否删除了记录
    async fn delete_by_id(&self, id: i32) -> Result<bool, RepositoryError>;
}
