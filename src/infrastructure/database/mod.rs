// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据库模块
///
/// 提供连接池、实体映射、持久化上下文工厂和事务协调器
pub mod connection;
pub mod entities;
pub mod persistence;
pub mod transaction;
pub mod vendor;
