// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, ModelTrait, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, Set, Unchanged,
};

use crate::domain::models::customer::Customer;
use crate::domain::repositories::customer_repository::{CustomerRepository, RepositoryError};
use crate::infrastructure::database::entities::customer;
use crate::infrastructure::database::transaction::TransactionCoordinator;

/// 客户仓库实现
///
/// 写操作通过事务协调器执行，读操作直接使用持久化单元的连接
#[derive(Clone)]
pub struct CustomerRepositoryImpl {
    transactions: TransactionCoordinator,
}

impl CustomerRepositoryImpl {
    /// 创建新的客户仓库实现
    pub fn new(transactions: TransactionCoordinator) -> Self {
        Self { transactions }
    }
}

#[async_trait]
impl CustomerRepository for CustomerRepositoryImpl {
    async fn save(&self, customer: &Customer) -> Result<Customer, RepositoryError> {
        let model = customer::ActiveModel {
            id: match customer.id {
                Some(id) => Unchanged(id),
                None => NotSet,
            },
            first_name: Set(customer.first_name.clone()),
            last_name: Set(customer.last_name.clone()),
        };
        let is_new = customer.is_new();

        let saved = self
            .transactions
            .execute(|txn| {
                Box::pin(async move {
                    if is_new {
                        model.insert(txn).await
                    } else {
                        model.update(txn).await
                    }
                })
            })
            .await?;

        Ok(saved.into())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Customer>, RepositoryError> {
        let model = customer::Entity::find_by_id(id)
            .one(self.transactions.factory().connection())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn find_all(&self) -> Result<Vec<Customer>, RepositoryError> {
        let models = customer::Entity::find()
            .order_by_asc(customer::Column::Id)
            .all(self.transactions.factory().connection())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_by_last_name(&self, last_name: &str) -> Result<Vec<Customer>, RepositoryError> {
        let models = customer::Entity::find()
            .filter(customer::Column::LastName.eq(last_name))
            .order_by_asc(customer::Column::Id)
            .all(self.transactions.factory().connection())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count = customer::Entity::find()
            .count(self.transactions.factory().connection())
            .await?;
        Ok(count)
    }

    async fn delete_by_id(&self, id: i32) -> Result<bool, RepositoryError> {
        let deleted = self
            .transactions
            .execute(|txn| {
                Box::pin(async move {
                    match customer::Entity::find_by_id(id).one(txn).await? {
                        Some(model) => {
                            model.delete(txn).await?;
                            Ok::<bool, DbErr>(true)
                        }
                        None => Ok(false),
                    }
                })
            })
            .await?;

        Ok(deleted)
    }
}

impl From<customer::Model> for Customer {
    fn from(model: customer::Model) -> Self {
        Self {
            id: Some(model.id),
            first_name: model.first_name,
            last_name: model.last_name,
        }
    }
}
