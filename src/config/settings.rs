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
use std::fmt;
use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::utils::errors::BindingError;

/// 嵌入式数据库的连接地址
pub const EMBEDDED_SQLITE_URL: &str = "sqlite::memory:";

/// JPA 风格的持久化选项
///
/// 对应 `<prefix>.jpa.*` 配置项
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct JpaOptions {
    /// 是否记录执行的 SQL 语句
    pub show_sql: bool,
    /// 是否在启动时生成表结构
    pub generate_ddl: bool,
    /// 目标数据库类型
    pub database: Option<String>,
    /// 数据库平台，优先级高于 `database`
    pub database_platform: Option<String>,
    /// 透传给厂商适配器的附加属性
    #[serde(deserialize_with = "flatten_properties")]
    pub properties: BTreeMap<String, String>,
}

/// 嵌入式数据库回退选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddedDatabaseConnection {
    #[default]
    None,
    Sqlite,
}

/// 数据源选项
///
/// 对应 `<prefix>.datasource.*` 配置项，`url` 在加载时已解析完成
#[derive(Clone, PartialEq, Eq)]
pub struct DatasourceOptions {
    /// 数据库连接URL
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub driver_class_name: Option<String>,
    /// URL 是否来自嵌入式数据库回退
    pub embedded: bool,
    /// 透传给连接池的调优属性
    pub properties: BTreeMap<String, String>,
}

impl fmt::Debug for DatasourceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasourceOptions")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "******"))
            .field("driver_class_name", &self.driver_class_name)
            .field("embedded", &self.embedded)
            .field("properties", &self.properties)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct RawDatasourceOptions {
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    driver_class_name: Option<String>,
    embedded_database_connection: EmbeddedDatabaseConnection,
    #[serde(deserialize_with = "flatten_properties")]
    properties: BTreeMap<String, String>,
}

/// 加载应用程序配置
///
/// 依次叠加 `config/default`、`config/{APP_ENVIRONMENT}` 和 `CUSTOMERDS__` 前缀的环境变量
pub fn load_configuration() -> Result<Config, ConfigError> {
    let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
    load_configuration_from(Path::new("config"), &env)
}

/// 从指定目录加载应用程序配置
pub fn load_configuration_from(dir: &Path, environment: &str) -> Result<Config, ConfigError> {
    load_configuration_with_vars(dir, environment, std::env::vars())
}

/// 从指定目录和给定的环境变量集合加载应用程序配置
pub fn load_configuration_with_vars<I>(
    dir: &Path,
    environment: &str,
    vars: I,
) -> Result<Config, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let default_file = dir.join("default");
    let env_file = dir.join(environment);

    Config::builder()
        .set_default("app.customer.jpa.show-sql", false)?
        .set_default("app.customer.jpa.generate-ddl", false)?
        .add_source(File::with_name(&default_file.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_file.to_string_lossy()).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .source(Some(environment_overrides(vars))),
        )
        .build()
}

const ENV_PREFIX: &str = "CUSTOMERDS";
const ENV_SEPARATOR: &str = "__";

/// 选出带前缀的环境变量，并把键名转换为与配置文件一致的 kebab-case
///
/// `properties` 段之后的键原样保留
fn environment_overrides<I>(vars: I) -> config::Map<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let prefix = format!("{ENV_PREFIX}{ENV_SEPARATOR}");
    vars.into_iter()
        .filter(|(name, _)| name.to_ascii_uppercase().starts_with(&prefix))
        .map(|(name, value)| (kebab_env_key(&name), value))
        .collect()
}

fn kebab_env_key(name: &str) -> String {
    let mut in_properties = false;
    name.split(ENV_SEPARATOR)
        .map(|segment| {
            if in_properties {
                return segment.to_string();
            }
            in_properties = segment.eq_ignore_ascii_case("properties");
            segment.replace('_', "-")
        })
        .collect::<Vec<_>>()
        .join(ENV_SEPARATOR)
}

/// 读取 `<prefix>.jpa.*` 为 [`JpaOptions`]
///
/// 缺失的配置段使用默认值，未识别的键被忽略
pub fn load_jpa_options(config: &Config, prefix: &str) -> Result<JpaOptions, BindingError> {
    let key = format!("{prefix}.jpa");
    match config.get::<JpaOptions>(&key) {
        Ok(options) => {
            debug!(prefix, ?options, "Loaded JPA options");
            Ok(options)
        }
        Err(ConfigError::NotFound(_)) => {
            debug!(prefix, "No JPA options configured, using defaults");
            Ok(JpaOptions::default())
        }
        Err(e) => Err(BindingError::Configuration(format!("invalid '{key}': {e}"))),
    }
}

/// 读取 `<prefix>.datasource.*` 为 [`DatasourceOptions`]
///
/// 只读取本前缀下的键。缺少连接URL且未配置嵌入式回退时返回配置错误
pub fn load_datasource_options(
    config: &Config,
    prefix: &str,
) -> Result<DatasourceOptions, BindingError> {
    let key = format!("{prefix}.datasource");
    let raw = match config.get::<RawDatasourceOptions>(&key) {
        Ok(raw) => raw,
        Err(ConfigError::NotFound(_)) => RawDatasourceOptions::default(),
        Err(e) => {
            return Err(BindingError::Configuration(format!("invalid '{key}': {e}")));
        }
    };

    let configured_url = raw.url.filter(|url| !url.trim().is_empty());
    let (url, embedded) = match (configured_url, raw.embedded_database_connection) {
        (Some(url), _) => (url.trim().to_string(), false),
        (None, EmbeddedDatabaseConnection::Sqlite) => (EMBEDDED_SQLITE_URL.to_string(), true),
        (None, EmbeddedDatabaseConnection::None) => {
            return Err(BindingError::Configuration(format!(
                "'{key}.url' is required and no embedded database connection is configured"
            )));
        }
    };

    let options = DatasourceOptions {
        url,
        username: raw.username,
        password: raw.password,
        driver_class_name: raw.driver_class_name,
        embedded,
        properties: raw.properties,
    };
    debug!(prefix, ?options, "Loaded datasource options");
    Ok(options)
}

/// 将嵌套的属性表展开为以 `.` 连接的键
fn flatten_properties<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let mut out = BTreeMap::new();
    if let Some(value) = value {
        flatten_into(&mut out, None, value);
    }
    Ok(out)
}

fn flatten_into(out: &mut BTreeMap<String, String>, prefix: Option<&str>, value: Value) {
    let join = |key: &str| match prefix {
        Some(prefix) => format!("{prefix}.{key}"),
        None => key.to_string(),
    };

    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let full_key = join(&key);
                flatten_into(out, Some(&full_key), nested);
            }
        }
        Value::Null => {}
        leaf => {
            if let Some(key) = prefix {
                out.insert(key.to_string(), scalar_to_string(leaf));
            }
        }
    }
}

fn scalar_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Array(items) => items
            .into_iter()
            .map(scalar_to_string)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}
