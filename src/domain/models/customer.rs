// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 客户实体
///
/// `id` 在首次保存前为空，由持久化层分配
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// 客户唯一标识符
    pub id: Option<i32>,
    pub first_name: String,
    pub last_name: String,
}

impl Customer {
    /// 创建一个尚未保存的客户
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// 是否尚未持久化
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}
