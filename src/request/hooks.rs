// 请求生命周期拦截
//
// 拦截器在固定的生命周期节点观察或改写请求选项、响应与错误；
// 默认实现承载登录态注入、地址补全与业务信封分流

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};
use tracing::warn;

use crate::error::RequestError;
use crate::notify::Notifier;
use crate::request::client::HttpClient;
use crate::request::envelope::{ApiResponse, ResponseCode};
use crate::request::types::{HttpMethod, RequestConfig, RequestOptions, ResponseMode};
use crate::session::SessionStore;

/// 传输层成功的原始响应
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP 状态码
    pub status: u16,
    /// 响应头
    pub headers: HashMap<String, String>,
    /// 响应体文本
    pub body: String,
}

/// 响应拦截的产出：原始响应或已提取的业务数据
#[derive(Debug, Clone)]
pub enum ResponseValue {
    /// 完整原始响应（Raw 策略）
    Raw(RawResponse),
    /// JSON 数据（Body / Transform 策略）
    Json(serde_json::Value),
}

impl ResponseValue {
    /// 反序列化为目标类型
    pub fn json<T: DeserializeOwned>(self) -> Result<T, RequestError> {
        match self {
            ResponseValue::Json(value) => Ok(serde_json::from_value(value)?),
            ResponseValue::Raw(raw) => Ok(serde_json::from_str(&raw.body)?),
        }
    }

    /// 取出 JSON 数据（Raw 响应返回 None）
    pub fn into_value(self) -> Option<serde_json::Value> {
        match self {
            ResponseValue::Json(value) => Some(value),
            ResponseValue::Raw(_) => None,
        }
    }
}

/// 请求生命周期拦截接口
#[async_trait]
pub trait RequestHooks: Send + Sync {
    /// 请求前处理：改写即将发出的请求选项
    fn before_request(&self, _options: &mut RequestOptions, _config: &RequestConfig) {}

    /// 响应后处理：把传输层成功的响应转换为业务结果，可以失败
    async fn after_response(
        &self,
        response: RawResponse,
        _config: &RequestConfig,
    ) -> Result<ResponseValue, RequestError> {
        Ok(ResponseValue::Raw(response))
    }

    /// 传输层失败处理：只观察不恢复，返回（可替换的）错误
    async fn on_error(&self, _options: &RequestOptions, error: RequestError) -> RequestError {
        error
    }
}

/// 空拦截器，用于测试和不需要拦截的场景
#[derive(Debug, Default)]
pub struct NoopHooks;

#[async_trait]
impl RequestHooks for NoopHooks {}

/// 默认拦截器
///
/// 请求前：补全 urlPrefix 与 baseUrl、注入 Bearer token、写入版本号请求头。
/// 响应后：按 ResponseMode 分流，Transform 策略下解析业务信封并按 code 处理，
/// token 失效时触发一次自动重登。
/// 失败时：POST 请求向用户提示通用失败信息。
pub struct DefaultHooks {
    session: Arc<SessionStore>,
    notifier: Arc<dyn Notifier>,
    /// 客户端版本号，随请求头上报
    version: String,
    /// 回指客户端，供 token 失效后的自动重登使用；Weak 避免引用环
    http: OnceLock<Weak<HttpClient>>,
}

impl DefaultHooks {
    pub fn new(session: Arc<SessionStore>, notifier: Arc<dyn Notifier>, version: String) -> Self {
        Self {
            session,
            notifier,
            version,
            http: OnceLock::new(),
        }
    }

    /// 绑定客户端（构造后由工厂函数调用一次）
    pub fn bind_client(&self, client: &Arc<HttpClient>) {
        let _ = self.http.set(Arc::downgrade(client));
    }

    fn client(&self) -> Option<Arc<HttpClient>> {
        self.http.get().and_then(Weak::upgrade)
    }
}

#[async_trait]
impl RequestHooks for DefaultHooks {
    fn before_request(&self, options: &mut RequestOptions, config: &RequestConfig) {
        if !config.url_prefix.is_empty() {
            options.url = format!("{}{}", config.url_prefix, options.url);
        }
        if !config.base_url.is_empty() {
            options.url = format!("{}{}", config.base_url, options.url);
        }

        // 注入 token；调用方显式设置过 Authorization 时不覆盖
        if config.with_token && !options.header.contains_key("Authorization") {
            options.header.insert(
                "Authorization".to_string(),
                format!("Bearer {}", self.session.token()),
            );
        }
        options
            .header
            .insert("version".to_string(), self.version.clone());
    }

    async fn after_response(
        &self,
        response: RawResponse,
        config: &RequestConfig,
    ) -> Result<ResponseValue, RequestError> {
        match config.response_mode {
            // 返回默认响应，需要获取响应头及其他数据时使用
            ResponseMode::Raw => Ok(ResponseValue::Raw(response)),
            ResponseMode::Body => Ok(ResponseValue::Json(serde_json::from_str(&response.body)?)),
            ResponseMode::Transform => {
                let envelope: ApiResponse = serde_json::from_str(&response.body)?;
                match ResponseCode::from_code(envelope.code) {
                    ResponseCode::Success => {
                        if envelope.show && !envelope.msg.is_empty() {
                            self.notifier.toast(&envelope.msg);
                        }
                        Ok(ResponseValue::Json(envelope.data))
                    }
                    ResponseCode::Failed => {
                        self.notifier.toast(&envelope.msg);
                        Err(RequestError::Business {
                            code: envelope.code,
                            msg: envelope.msg,
                        })
                    }
                    ResponseCode::TokenInvalid => {
                        if config.is_auth && !self.session.is_logged_in() {
                            if let Some(http) = self.client() {
                                // 重登结果不影响本次请求的失败返回，调用方自行重试
                                if let Err(e) = self.session.auto_login(&http).await {
                                    warn!("token 失效后自动重登失败: {}", e);
                                }
                            }
                        }
                        Err(RequestError::TokenInvalid(envelope.msg))
                    }
                    ResponseCode::Other(_) => Ok(ResponseValue::Json(envelope.data)),
                }
            }
        }
    }

    async fn on_error(&self, options: &RequestOptions, error: RequestError) -> RequestError {
        if options.method == HttpMethod::Post {
            self.notifier.toast("请求失败，请重试");
        }
        error
    }
}
