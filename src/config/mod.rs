// 配置管理模块

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// 接口配置
    #[serde(default)]
    pub api: ApiConfig,
    /// 上传配置
    #[serde(default)]
    pub upload: UploadEndpointConfig,
    /// 会话配置
    #[serde(default)]
    pub session: SessionConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 接口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// 接口域名
    #[serde(default)]
    pub base_url: String,
    /// 接口地址前缀
    #[serde(default)]
    pub url_prefix: String,
    /// 请求超时时间（毫秒）
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// 客户端版本号，随请求头上报
    #[serde(default = "default_version")]
    pub version: String,
    /// 超时重试次数（只对 GET 生效）
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    /// 重试等待时间（毫秒）
    #[serde(default = "default_retry_timeout_ms")]
    pub retry_timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    6000
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_timeout_ms() -> u64 {
    1000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            url_prefix: String::new(),
            timeout_ms: default_timeout_ms(),
            version: default_version(),
            retry_count: default_retry_count(),
            retry_timeout_ms: default_retry_timeout_ms(),
        }
    }
}

/// 上传配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadEndpointConfig {
    /// 上传地址
    #[serde(default)]
    pub url: String,
    /// 单文件大小上限（MB）
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,
    /// 并发上传数
    #[serde(default = "default_concurrent")]
    pub concurrent: usize,
}

fn default_max_size_mb() -> u64 {
    10
}

fn default_concurrent() -> usize {
    3
}

impl Default for UploadEndpointConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_size_mb: default_max_size_mb(),
            concurrent: default_concurrent(),
        }
    }
}

/// 会话配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// 会话文件路径
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

fn default_session_file() -> PathBuf {
    PathBuf::from("data/session.json")
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_file: default_session_file(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 是否启用日志文件持久化
    #[serde(default = "default_log_enabled")]
    pub enabled: bool,
    /// 日志文件保存目录
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// 日志保留天数（默认 7 天）
    #[serde(default = "default_log_retention_days")]
    pub retention_days: u32,
    /// 日志级别（默认 info）
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_enabled() -> bool {
    true
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_retention_days() -> u32 {
    7
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: default_log_enabled(),
            log_dir: default_log_dir(),
            retention_days: default_log_retention_days(),
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// 从文件加载配置
    pub async fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;
        let config: AppConfig = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 保存配置到文件
    pub async fn save_to_file(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        // 确保父目录存在
        if let Some(parent) = std::path::Path::new(path).parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        fs::write(path, content)
            .await
            .context("Failed to write config file")?;

        tracing::info!("配置已保存: {}", path);
        Ok(())
    }

    /// 加载或创建默认配置
    pub async fn load_or_default(path: &str) -> Self {
        match Self::load_from_file(path).await {
            Ok(config) => {
                tracing::info!("配置文件加载成功: {}", path);
                config
            }
            Err(e) => {
                tracing::warn!("配置文件加载失败，使用默认配置: {}", e);
                let default_config = Self::default();
                if let Err(e) = default_config.save_to_file(path).await {
                    tracing::error!("保存默认配置失败: {}", e);
                }
                default_config
            }
        }
    }
}
