use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use toml::{Table, Value};

/// 指定配置目录的环境变量
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
pub const DEFAULT_CONFIG_DIR: &str = "./config";
/// 主配置文件名（不含扩展名）
pub const PRIMARY_CONFIG_NAME: &str = "config";
const CONFIG_EXTENSION: &str = "toml";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PUBLIC_URL: &str = "http:localhost:3000";
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 32 * 1024 * 1024;

/// 即使配置文件中未出现也允许被环境变量覆盖的配置项
const SCHEMA_KEYS: &[(&str, ValueKind)] = &[
    ("server.host", ValueKind::String),
    ("server.port", ValueKind::Integer),
    ("server.public_url", ValueKind::String),
    ("server.max_upload_bytes", ValueKind::Integer),
    ("mail.api-key", ValueKind::String),
    ("mail.endpoint", ValueKind::String),
];

/// 应用程序配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub mail: MailConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 上传成功后返回的访问地址前缀
    pub public_url: String,
    pub max_upload_bytes: u64,
}

/// 对象存储配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub services: Vec<StorageServiceConfig>,
}

/// 单个存储服务描述
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageServiceConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub bucket: String,
    pub config: StorageCredentialConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageCredentialConfig {
    /// JSON格式的访问凭证
    pub json_credential: String,
}

/// 邮件服务配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    #[serde(rename = "api-key")]
    pub api_key: String,
    pub endpoint: String,
}

impl AppConfig {
    /// 从 `CONFIG_PATH`（默认 `./config`）加载配置，并应用进程环境变量覆盖
    pub fn load(ignore: &[&str]) -> AppResult<Self> {
        let dir =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
        Self::load_from_dir(dir, ignore, |name| std::env::var(name).ok())
    }

    /// 从指定目录加载配置
    ///
    /// 先读取主配置文件，再按文件名顺序合并目录中其余的服务配置文件（`ignore`
    /// 中列出的服务名除外），最后用 `env` 查询环境变量覆盖。
    pub fn load_from_dir<P, F>(dir: P, ignore: &[&str], env: F) -> AppResult<Self>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let dir = dir.as_ref();
        let primary_path = dir.join(format!("{}.{}", PRIMARY_CONFIG_NAME, CONFIG_EXTENSION));
        let mut merged = read_document(&primary_path)?;
        tracing::info!("已加载配置文件: {}", primary_path.display());

        for (service, path) in service_documents(dir, ignore)? {
            let document = read_document(&path)?;
            merge_service_config(&mut merged, document);
            tracing::debug!("已合并服务配置: {}", service);
        }

        apply_env_overrides(&mut merged, env)?;

        let config: AppConfig = Value::Table(merged)
            .try_into()
            .map_err(|e| AppError::config(format!("解析配置失败: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> AppResult<()> {
        if self.server.port == 0 {
            return Err(AppError::config("服务器端口不能为0"));
        }

        self.primary_storage()?;

        Ok(())
    }

    /// 当前唯一使用的存储服务（列表第一项）
    pub fn primary_storage(&self) -> AppResult<&StorageServiceConfig> {
        self.storage
            .services
            .first()
            .ok_or_else(|| AppError::config("至少需要配置一个存储服务"))
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        let host = if self.server.host.is_empty() {
            DEFAULT_HOST
        } else {
            self.server.host.as_str()
        };
        format!("{}:{}", host, self.server.port)
    }

    pub fn public_url(&self) -> String {
        if self.server.public_url.is_empty() {
            DEFAULT_PUBLIC_URL.to_string()
        } else {
            self.server.public_url.trim_end_matches('/').to_string()
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        match self.server.max_upload_bytes {
            0 => DEFAULT_MAX_UPLOAD_BYTES as usize,
            n => n as usize,
        }
    }
}

fn read_document(path: &Path) -> AppResult<Table> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::config(format!("读取配置文件 {} 失败: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| AppError::config(format!("解析配置文件 {} 失败: {}", path.display(), e)))
}

/// 列出目录中的服务配置文件，返回 (服务名, 路径)，按服务名排序
fn service_documents(dir: &Path, ignore: &[&str]) -> AppResult<Vec<(String, PathBuf)>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| AppError::config(format!("读取配置目录 {} 失败: {}", dir.display(), e)))?;

    let mut documents = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(CONFIG_EXTENSION)
        {
            continue;
        }
        let Some(service) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        if service == PRIMARY_CONFIG_NAME || ignore.contains(&service.as_str()) {
            continue;
        }
        documents.push((service, path));
    }
    documents.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(documents)
}

/// 将一个服务配置合并进已有配置
///
/// 顶层键冲突且新值为表时不覆盖，而是变为 `[新值, 旧值]` 两元素数组；
/// 其他类型的值直接被后来者覆盖。
pub fn merge_service_config(target: &mut Table, incoming: Table) {
    for (key, value) in incoming {
        match target.remove(&key) {
            Some(previous) if value.is_table() => {
                target.insert(key, Value::Array(vec![value, previous]));
            }
            _ => {
                target.insert(key, value);
            }
        }
    }
}

/// `server.port` -> `SERVER_PORT`，`mail.api-key` -> `MAIL_API_KEY`
pub fn env_var_name(key: &str) -> String {
    key.replace(['.', '-'], "_").to_uppercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    String,
    Integer,
    Float,
    Boolean,
}

impl ValueKind {
    fn of(value: &Value) -> Self {
        match value {
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::Boolean(_) => ValueKind::Boolean,
            _ => ValueKind::String,
        }
    }

    fn coerce(self, raw: &str) -> Option<Value> {
        match self {
            ValueKind::String => Some(Value::String(raw.to_string())),
            ValueKind::Integer => raw.trim().parse().ok().map(Value::Integer),
            ValueKind::Float => raw.trim().parse().ok().map(Value::Float),
            ValueKind::Boolean => raw.trim().parse().ok().map(Value::Boolean),
        }
    }
}

fn apply_env_overrides<F>(table: &mut Table, env: F) -> AppResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let mut keys = Vec::new();
    collect_scalar_keys(table, "", &mut keys);
    for (key, kind) in SCHEMA_KEYS {
        if !keys.iter().any(|(existing, _)| existing.as_str() == *key) {
            keys.push((key.to_string(), *kind));
        }
    }

    for (key, kind) in keys {
        let name = env_var_name(&key);
        let Some(raw) = env(&name) else {
            continue;
        };
        let value = kind
            .coerce(&raw)
            .ok_or_else(|| AppError::config(format!("环境变量 {} 的值无效: {}", name, raw)))?;
        if set_path(table, &key, value) {
            tracing::debug!("环境变量 {} 覆盖配置项 {}", name, key);
        }
    }

    Ok(())
}

/// 收集所有标量叶子节点的点分路径，数组不参与覆盖
fn collect_scalar_keys(table: &Table, prefix: &str, out: &mut Vec<(String, ValueKind)>) {
    for (key, value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Table(inner) => collect_scalar_keys(inner, &path, out),
            Value::Array(_) => {}
            scalar => out.push((path, ValueKind::of(scalar))),
        }
    }
}

fn set_path(table: &mut Table, key: &str, value: Value) -> bool {
    let mut segments: Vec<&str> = key.split('.').collect();
    let Some(last) = segments.pop() else {
        return false;
    };

    let mut current = table;
    for segment in segments {
        let next = current
            .entry(segment)
            .or_insert_with(|| Value::Table(Table::new()));
        let Value::Table(inner) = next else {
            return false;
        };
        current = inner;
    }
    current.insert(last.to_string(), value);

    true
}
