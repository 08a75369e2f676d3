// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::vendor::EntityRegistration;

/// 数据库实体模块
///
/// 定义客户持久化单元中的表对应的实体结构
/// 使用SeaORM框架进行对象关系映射
pub mod customer;

/// 客户持久化单元包含的全部实体
pub fn customer_entities() -> Vec<EntityRegistration> {
    vec![EntityRegistration::of::<customer::Entity>()]
}
