// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::BTreeMap;
use std::time::Duration;

use sea_orm::{
    sqlx, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr,
    RuntimeErr,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::settings::{DatasourceOptions, EMBEDDED_SQLITE_URL};
use crate::utils::errors::BindingError;

const DEFAULT_POOL_NAME: &str = "pool";
const DEFAULT_MAXIMUM_POOL_SIZE: u32 = 10;
const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_IDLE_TIMEOUT_MS: u64 = 600_000;
const DEFAULT_MAX_LIFETIME_MS: u64 = 1_800_000;

/// 连接池句柄
///
/// 内部的 [`DatabaseConnection`] 持有共享的连接池，克隆代价很低
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    name: String,
    backend: DbBackend,
    connection: DatabaseConnection,
}

impl ConnectionPool {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend(&self) -> DbBackend {
        self.backend
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    /// 检查连接池是否可用
    pub async fn ping(&self) -> Result<(), DbErr> {
        self.connection.ping().await
    }

    /// 关闭连接池，释放所有物理连接
    pub async fn close(self) -> Result<(), DbErr> {
        info!(pool = %self.name, "Closing connection pool");
        self.connection.close().await
    }
}

/// 连接池调优参数
///
/// 键名沿用 Hikari 的命名，时间单位为毫秒
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub pool_name: String,
    pub maximum_pool_size: u32,
    pub minimum_idle: u32,
    pub connection_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl PoolSettings {
    /// 从属性表解析连接池参数，未识别的键只记录警告
    pub fn from_properties(properties: &BTreeMap<String, String>) -> Result<Self, BindingError> {
        let mut pool_name = None;
        let mut maximum_pool_size = None;
        let mut minimum_idle = None;
        let mut connection_timeout = DEFAULT_CONNECTION_TIMEOUT_MS;
        let mut idle_timeout = DEFAULT_IDLE_TIMEOUT_MS;
        let mut max_lifetime = DEFAULT_MAX_LIFETIME_MS;

        for (key, value) in properties {
            match key.replace('_', "-").as_str() {
                "pool-name" => pool_name = Some(value.clone()),
                "maximum-pool-size" => maximum_pool_size = Some(parse_number(key, value)?),
                "minimum-idle" => minimum_idle = Some(parse_number(key, value)?),
                "connection-timeout" => connection_timeout = parse_number(key, value)?,
                "idle-timeout" => idle_timeout = parse_number(key, value)?,
                "max-lifetime" => max_lifetime = parse_number(key, value)?,
                _ => warn!(property = %key, "Ignoring unknown connection pool property"),
            }
        }

        let maximum_pool_size = maximum_pool_size.unwrap_or(DEFAULT_MAXIMUM_POOL_SIZE);
        if maximum_pool_size == 0 {
            return Err(BindingError::Configuration(
                "'maximum-pool-size' must be at least 1".to_string(),
            ));
        }
        let minimum_idle = minimum_idle.unwrap_or(maximum_pool_size);
        if minimum_idle > maximum_pool_size {
            return Err(BindingError::Configuration(format!(
                "'minimum-idle' ({minimum_idle}) exceeds 'maximum-pool-size' ({maximum_pool_size})"
            )));
        }

        Ok(Self {
            pool_name: pool_name.unwrap_or_else(|| DEFAULT_POOL_NAME.to_string()),
            maximum_pool_size,
            minimum_idle,
            connection_timeout: Duration::from_millis(connection_timeout),
            idle_timeout: Duration::from_millis(idle_timeout),
            max_lifetime: Duration::from_millis(max_lifetime),
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, BindingError> {
    value.trim().parse().map_err(|_| {
        BindingError::Configuration(format!(
            "connection pool property '{key}' must be a non-negative integer, got '{value}'"
        ))
    })
}

/// 创建并校验连接池
///
/// # 参数
///
/// * `options` - 数据源配置
/// * `pool_properties` - 连接池调优属性
///
/// # 返回值
///
/// * `Ok(ConnectionPool)` - 已完成首次连接校验的连接池
/// * `Err(BindingError)` - 配置无效或数据库不可用
pub async fn build_connection_pool(
    options: &DatasourceOptions,
    pool_properties: &BTreeMap<String, String>,
) -> Result<ConnectionPool, BindingError> {
    let settings = PoolSettings::from_properties(pool_properties)?;
    let name = settings.pool_name.clone();

    if options.url.trim().is_empty() {
        return Err(BindingError::Configuration(
            "datasource url must not be empty".to_string(),
        ));
    }

    let normalized = normalize_url(&options.url);
    let backend = backend_for_url(&normalized).ok_or_else(|| {
        BindingError::pool(&name, format!("unsupported driver for url '{normalized}'"))
    })?;

    if let Some(driver) = options.driver_class_name.as_deref() {
        let driver_backend = backend_for_driver(driver)
            .ok_or_else(|| BindingError::pool(&name, format!("invalid driver '{driver}'")))?;
        if driver_backend != backend {
            return Err(BindingError::pool(
                &name,
                format!("driver '{driver}' does not match url '{normalized}'"),
            ));
        }
    }

    let url = match backend {
        DbBackend::Sqlite => normalized,
        _ => apply_credentials(&normalized, options)
            .map_err(|reason| BindingError::pool(&name, reason))?,
    };

    let mut opt = ConnectOptions::new(url);
    opt.max_connections(settings.maximum_pool_size)
        .min_connections(settings.minimum_idle)
        .connect_timeout(settings.connection_timeout)
        .acquire_timeout(settings.connection_timeout)
        .idle_timeout(settings.idle_timeout)
        .max_lifetime(settings.max_lifetime)
        .sqlx_logging(false);

    debug!(pool = %name, ?backend, ?settings, "Connecting to database");

    let connection = Database::connect(opt)
        .await
        .map_err(|e| BindingError::pool(&name, describe_connect_error(&e)))?;
    connection
        .ping()
        .await
        .map_err(|e| BindingError::pool(&name, describe_connect_error(&e)))?;

    let backend = connection.get_database_backend();
    info!(pool = %name, ?backend, embedded = options.embedded, "Connection pool initialized");

    Ok(ConnectionPool {
        name,
        backend,
        connection,
    })
}

/// 把 JDBC 风格的地址转换为 sqlx 可识别的地址
pub fn normalize_url(raw: &str) -> String {
    let url = raw.trim();
    let url = url.strip_prefix("jdbc:").unwrap_or(url);

    if url.starts_with("h2:mem:") {
        // JVM 内嵌内存库在这里对应内存中的 SQLite
        return EMBEDDED_SQLITE_URL.to_string();
    }
    if let Some(rest) = url.strip_prefix("postgresql://") {
        return format!("postgres://{rest}");
    }
    url.to_string()
}

fn backend_for_url(url: &str) -> Option<DbBackend> {
    if url.starts_with("sqlite:") {
        Some(DbBackend::Sqlite)
    } else if url.starts_with("postgres://") {
        Some(DbBackend::Postgres)
    } else {
        None
    }
}

fn backend_for_driver(driver: &str) -> Option<DbBackend> {
    match driver.trim().to_ascii_lowercase().as_str() {
        "sqlite" | "org.sqlite.jdbc" | "org.h2.driver" => Some(DbBackend::Sqlite),
        "postgres" | "postgresql" | "org.postgresql.driver" => Some(DbBackend::Postgres),
        _ => None,
    }
}

/// 显式配置的用户名和密码覆盖URL中的认证信息
fn apply_credentials(url: &str, options: &DatasourceOptions) -> Result<String, String> {
    if options.username.is_none() && options.password.is_none() {
        return Ok(url.to_string());
    }

    let mut parsed = Url::parse(url).map_err(|e| format!("invalid url: {e}"))?;
    if let Some(username) = options.username.as_deref() {
        parsed
            .set_username(username)
            .map_err(|_| "url cannot carry a username".to_string())?;
    }
    if let Some(password) = options.password.as_deref() {
        parsed
            .set_password(Some(password))
            .map_err(|_| "url cannot carry a password".to_string())?;
    }
    Ok(parsed.to_string())
}

fn describe_connect_error(err: &DbErr) -> String {
    let kind = match err {
        DbErr::Conn(RuntimeErr::SqlxError(sqlx_err)) => match sqlx_err {
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::Tls(_) => {
                "database unreachable"
            }
            sqlx::Error::Database(_) => "connection rejected by database",
            sqlx::Error::Configuration(_) => "invalid connection settings",
            _ => "connection failed",
        },
        _ => "connection failed",
    };
    format!("{kind}: {err}")
}
