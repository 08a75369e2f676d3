// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::ConfigError;
use thiserror::Error;

/// 数据源装配错误类型
///
/// 装配阶段的所有错误都是启动期致命错误，不会在本地恢复
#[derive(Error, Debug)]
pub enum BindingError {
    /// 缺失或无效的必需配置
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 连接池无法建立（数据库不可达、凭据错误或驱动无效）
    #[error("Failed to initialize connection pool '{pool}': {reason}")]
    PoolInitialization { pool: String, reason: String },

    /// 实体类型无法映射到持久化单元
    #[error("Mapping error in persistence unit '{unit}': {reason}")]
    Mapping { unit: String, reason: String },
}

impl BindingError {
    pub fn pool(pool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PoolInitialization {
            pool: pool.into(),
            reason: reason.into(),
        }
    }

    pub fn mapping(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Mapping {
            unit: unit.into(),
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for BindingError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
