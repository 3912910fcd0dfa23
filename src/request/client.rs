// HTTP 客户端
//
// 对网络原语的封装：配置合并、生命周期拦截、进行中请求取消、
// 超时重试。业务语义全部由注入的拦截器承载，客户端本身只关心
// 请求的发出与失败分流。

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::RequestError;
use crate::notify::Notifier;
use crate::request::cancel::CancelRegistry;
use crate::request::hooks::{RawResponse, RequestHooks, ResponseValue};
use crate::request::types::{HttpMethod, RequestConfig, RequestOptions, RequestOverrides};

/// 文件上传请求参数
#[derive(Debug, Clone)]
pub struct UploadFileOptions {
    /// 上传地址
    pub url: String,
    /// 本地文件路径
    pub file_path: PathBuf,
    /// 附加表单字段
    pub form_data: HashMap<String, String>,
    /// 请求头
    pub header: HashMap<String, String>,
}

impl UploadFileOptions {
    pub fn new(url: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            file_path: file_path.into(),
            form_data: HashMap::new(),
            header: HashMap::new(),
        }
    }
}

/// HTTP 客户端
pub struct HttpClient {
    http: reqwest::Client,
    /// 实例默认请求选项（超时等）
    default_options: RequestOptions,
    /// 实例配置
    config: RequestConfig,
    /// 生命周期拦截器
    hooks: Arc<dyn RequestHooks>,
    /// 用户提示（重试等待期间的加载指示）
    notifier: Arc<dyn Notifier>,
    /// 进行中请求注册表
    cancel: CancelRegistry,
}

impl HttpClient {
    pub fn new(
        config: RequestConfig,
        default_options: RequestOptions,
        hooks: Arc<dyn RequestHooks>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, RequestError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(RequestError::from)?;
        Ok(Self {
            http,
            default_options,
            config,
            hooks,
            notifier,
            cancel: CancelRegistry::new(),
        })
    }

    /// 进行中请求注册表
    pub fn cancel_registry(&self) -> &CancelRegistry {
        &self.cancel
    }

    /// GET 请求
    pub async fn get(
        &self,
        mut options: RequestOptions,
        overrides: Option<RequestOverrides>,
    ) -> Result<ResponseValue, RequestError> {
        options.method = HttpMethod::Get;
        self.request(options, overrides).await
    }

    /// POST 请求
    pub async fn post(
        &self,
        mut options: RequestOptions,
        overrides: Option<RequestOverrides>,
    ) -> Result<ResponseValue, RequestError> {
        options.method = HttpMethod::Post;
        self.request(options, overrides).await
    }

    /// 请求入口
    ///
    /// 合并选项与配置、执行请求拦截后发出请求。传输层超时走重试
    /// 策略，其余传输层失败交给错误拦截；成功响应交给响应拦截。
    pub async fn request(
        &self,
        options: RequestOptions,
        overrides: Option<RequestOverrides>,
    ) -> Result<ResponseValue, RequestError> {
        // 取消注册表以调用方传入的原始 URL 为键
        let cancel_key = options.url.clone();
        let mut merged = self.default_options.merged_with(options);
        let mut config = match overrides {
            Some(ref o) => self.config.merged_with(o),
            None => self.config.clone(),
        };
        self.hooks.before_request(&mut merged, &config);

        let mut result = self.dispatch(&merged, &config, &cancel_key).await;
        loop {
            match result {
                Ok(raw) => return self.hooks.after_response(raw, &config).await,
                Err(err) if err.is_timeout() => {
                    if !Self::retry_allowed(&merged, &mut config) {
                        // 重试资格不足或次数耗尽，直接以超时失败返回
                        return Err(err);
                    }
                    debug!(
                        "请求超时，{}ms 后重试: {} ({}/{})",
                        config.retry_timeout_ms,
                        merged.url,
                        config.has_retry_count.unwrap_or(0),
                        config.retry_count
                    );
                    self.notifier.show_loading("加载中...");
                    tokio::time::sleep(Duration::from_millis(config.retry_timeout_ms)).await;
                    // 重试复用已经拦截过的请求选项，不再次执行请求拦截
                    result = self.dispatch(&merged, &config, &cancel_key).await;
                    self.notifier.hide_loading();
                }
                Err(err) => return Err(self.hooks.on_error(&merged, err).await),
            }
        }
    }

    /// 重试资格：只有设置了重试次数的 GET 请求可以重试
    fn retry_allowed(options: &RequestOptions, config: &mut RequestConfig) -> bool {
        if config.retry_count == 0 || options.method == HttpMethod::Post {
            return false;
        }
        config.try_consume_retry()
    }

    /// 发出一次请求，并按配置登记到取消注册表
    async fn dispatch(
        &self,
        options: &RequestOptions,
        config: &RequestConfig,
        cancel_key: &str,
    ) -> Result<RawResponse, RequestError> {
        let mut builder = match options.method {
            HttpMethod::Get => self.http.get(&options.url),
            HttpMethod::Post => self.http.post(&options.url),
        };
        for (key, value) in &options.header {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(timeout_ms) = options.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        if let Some(ref data) = options.data {
            builder = match options.method {
                HttpMethod::Get => builder.query(&flatten_query(data)),
                HttpMethod::Post => builder.json(data),
            };
        }

        if config.ignore_cancel {
            return self.send(builder).await;
        }

        let token = CancellationToken::new();
        self.cancel.add(cancel_key, token.clone());
        tokio::select! {
            _ = token.cancelled() => {
                // 键已被顶替的新请求接管，不从注册表移除
                Err(RequestError::Aborted)
            }
            result = self.send(builder) => {
                self.cancel.remove(cancel_key);
                result
            }
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<RawResponse, RequestError> {
        let response = builder.send().await.map_err(RequestError::from)?;
        let status = response.status().as_u16();
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(text) = value.to_str() {
                headers.insert(name.to_string(), text.to_string());
            }
        }
        let body = response.text().await.map_err(RequestError::from)?;
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }

    /// 文件上传
    ///
    /// 与 request 相同的合并与拦截协议，走 multipart 上传原语；
    /// 表单字段名服务端约定固定为 file。只有 HTTP 200 视为成功，
    /// 响应体解析为 JSON 后交给响应拦截。
    pub async fn upload_file(
        &self,
        options: UploadFileOptions,
        overrides: Option<RequestOverrides>,
    ) -> Result<ResponseValue, RequestError> {
        let config = match overrides {
            Some(ref o) => self.config.merged_with(o),
            None => self.config.clone(),
        };
        let mut merged = self.default_options.merged_with(RequestOptions {
            url: options.url.clone(),
            method: HttpMethod::Post,
            data: None,
            header: options.header.clone(),
            timeout_ms: None,
        });
        self.hooks.before_request(&mut merged, &config);

        let file_name = options
            .file_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());
        let bytes = tokio::fs::read(&options.file_path)
            .await
            .map_err(|e| RequestError::Other(format!("读取上传文件失败: {}", e)))?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/octet-stream")
            .map_err(RequestError::from)?;
        let mut form = reqwest::multipart::Form::new();
        for (key, value) in &options.form_data {
            form = form.text(key.clone(), value.clone());
        }
        form = form.part("file", part);

        let mut builder = self.http.post(&merged.url).multipart(form);
        for (key, value) in &merged.header {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(timeout_ms) = merged.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }

        match self.send(builder).await {
            Ok(raw) => {
                if raw.status != 200 {
                    return Err(RequestError::UnexpectedStatus(raw.status));
                }
                self.hooks.after_response(raw, &config).await
            }
            Err(err) => Err(self.hooks.on_error(&merged, err).await),
        }
    }
}

/// GET 请求的数据对象转查询参数
///
/// 标量转为字符串，复合值序列化为 JSON 文本
fn flatten_query(data: &serde_json::Value) -> Vec<(String, String)> {
    match data {
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), text)
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_query_scalars() {
        let pairs = flatten_query(&json!({"page": 1, "keyword": "钱包", "desc": true}));
        let map: HashMap<_, _> = pairs.into_iter().collect();
        assert_eq!(map.get("page").unwrap(), "1");
        assert_eq!(map.get("keyword").unwrap(), "钱包");
        assert_eq!(map.get("desc").unwrap(), "true");
    }

    #[test]
    fn test_flatten_query_non_object() {
        assert!(flatten_query(&json!([1, 2, 3])).is_empty());
        assert!(flatten_query(&json!("plain")).is_empty());
    }
}
