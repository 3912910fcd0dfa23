// 请求选项与配置定义

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// HTTP 请求方法
///
/// 接口层只使用 GET / POST 两种方法；重试策略只对 GET 生效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl Default for HttpMethod {
    fn default() -> Self {
        HttpMethod::Get
    }
}

/// 单次请求的调用方意图
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// 请求地址（相对路径，请求拦截阶段补全前缀与域名）
    pub url: String,
    /// 请求方法
    pub method: HttpMethod,
    /// 请求数据（GET 序列化为查询参数，POST 序列化为 JSON 请求体）
    pub data: Option<serde_json::Value>,
    /// 请求头
    pub header: HashMap<String, String>,
    /// 超时时间（毫秒），未指定时使用实例默认值
    pub timeout_ms: Option<u64>,
}

impl RequestOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.header.insert(key.into(), value.into());
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// 以实例默认选项为底，合并调用方选项
    ///
    /// 请求头逐键合并（调用方优先），data / timeout 在调用方给出时整体覆盖
    pub fn merged_with(&self, caller: RequestOptions) -> RequestOptions {
        let mut header = self.header.clone();
        header.extend(caller.header);

        RequestOptions {
            url: caller.url,
            method: caller.method,
            data: caller.data.or_else(|| self.data.clone()),
            header,
            timeout_ms: caller.timeout_ms.or(self.timeout_ms),
        }
    }
}

/// 响应处理策略
///
/// 原样返回 / 只取响应体 / 解析业务信封，单次请求只有一种策略生效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// 返回完整原始响应（需要读取响应头等信息时使用）
    Raw,
    /// 返回 JSON 响应体，不做业务码分流
    Body,
    /// 解析业务信封 {code, msg, data, show} 并按 code 分流
    Transform,
}

impl Default for ResponseMode {
    fn default() -> Self {
        ResponseMode::Transform
    }
}

/// 合并后的请求配置
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// 接口域名
    pub base_url: String,
    /// 接口地址前缀
    pub url_prefix: String,
    /// 是否自动携带 token
    pub with_token: bool,
    /// 接口是否要求登录态（影响 token 失效后的自动重登）
    pub is_auth: bool,
    /// 响应处理策略
    pub response_mode: ResponseMode,
    /// 忽略重复请求取消
    pub ignore_cancel: bool,
    /// 超时重试次数上限
    pub retry_count: u32,
    /// 重试等待时间（毫秒）
    pub retry_timeout_ms: u64,
    /// 已消耗的重试次数，初始未设置，上限为 retry_count
    pub has_retry_count: Option<u32>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            url_prefix: String::new(),
            with_token: true,
            is_auth: true,
            response_mode: ResponseMode::Transform,
            ignore_cancel: false,
            retry_count: 2,
            retry_timeout_ms: 1000,
            has_retry_count: None,
        }
    }
}

impl RequestConfig {
    /// 以实例配置为底，合并调用方覆盖项
    pub fn merged_with(&self, overrides: &RequestOverrides) -> RequestConfig {
        let mut config = self.clone();
        if let Some(ref base_url) = overrides.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(ref url_prefix) = overrides.url_prefix {
            config.url_prefix = url_prefix.clone();
        }
        if let Some(with_token) = overrides.with_token {
            config.with_token = with_token;
        }
        if let Some(is_auth) = overrides.is_auth {
            config.is_auth = is_auth;
        }
        if let Some(response_mode) = overrides.response_mode {
            config.response_mode = response_mode;
        }
        if let Some(ignore_cancel) = overrides.ignore_cancel {
            config.ignore_cancel = ignore_cancel;
        }
        if let Some(retry_count) = overrides.retry_count {
            config.retry_count = retry_count;
        }
        if let Some(retry_timeout_ms) = overrides.retry_timeout_ms {
            config.retry_timeout_ms = retry_timeout_ms;
        }
        config
    }

    /// 消耗一次重试机会
    ///
    /// 计数达到 retry_count 后拒绝继续重试
    pub fn try_consume_retry(&mut self) -> bool {
        let used = self.has_retry_count.unwrap_or(0);
        if used >= self.retry_count {
            return false;
        }
        self.has_retry_count = Some(used + 1);
        true
    }
}

/// 调用方对单次请求的配置覆盖
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    pub base_url: Option<String>,
    pub url_prefix: Option<String>,
    pub with_token: Option<bool>,
    pub is_auth: Option<bool>,
    pub response_mode: Option<ResponseMode>,
    pub ignore_cancel: Option<bool>,
    pub retry_count: Option<u32>,
    pub retry_timeout_ms: Option<u64>,
}

impl RequestOverrides {
    pub fn response_mode(mut self, mode: ResponseMode) -> Self {
        self.response_mode = Some(mode);
        self
    }

    pub fn retry(mut self, count: u32, timeout_ms: u64) -> Self {
        self.retry_count = Some(count);
        self.retry_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_token(mut self, with_token: bool) -> Self {
        self.with_token = Some(with_token);
        self
    }

    pub fn ignore_cancel(mut self, ignore_cancel: bool) -> Self {
        self.ignore_cancel = Some(ignore_cancel);
        self
    }
}
