// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 读取客户数据源的配置，并按顺序装配连接池、持久化上下文工厂和事务协调器
pub mod customer;
pub mod settings;
