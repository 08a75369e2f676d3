// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 读取客户数据源配置并装配持久化单元
pub mod config;

/// 领域模块
///
/// 包含客户实体和仓库接口
pub mod domain;

/// 基础设施模块
///
/// 提供数据库连接池、实体映射、事务和仓库实现
pub mod infrastructure;

/// 工具模块
///
/// 提供错误类型和遥测初始化
pub mod utils;
