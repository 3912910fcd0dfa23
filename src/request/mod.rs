// 请求层模块
//
// 客户端 + 取消注册表 + 生命周期拦截 + 业务信封

pub mod cancel;
pub mod client;
pub mod envelope;
pub mod hooks;
pub mod types;

pub use cancel::CancelRegistry;
pub use client::{HttpClient, UploadFileOptions};
pub use envelope::{ApiResponse, ResponseCode};
pub use hooks::{DefaultHooks, NoopHooks, RawResponse, RequestHooks, ResponseValue};
pub use types::{HttpMethod, RequestConfig, RequestOptions, RequestOverrides, ResponseMode};

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::error::RequestError;
use crate::notify::Notifier;
use crate::session::SessionStore;

/// 按应用配置装配默认客户端
///
/// 默认拦截器持有会话与提示能力，装配完成后回绑客户端，
/// 供 token 失效后的自动重登使用
pub fn create_client(
    api: &ApiConfig,
    session: Arc<SessionStore>,
    notifier: Arc<dyn Notifier>,
) -> Result<Arc<HttpClient>, RequestError> {
    let hooks = Arc::new(DefaultHooks::new(
        session,
        notifier.clone(),
        api.version.clone(),
    ));

    let config = RequestConfig {
        base_url: api.base_url.clone(),
        url_prefix: api.url_prefix.clone(),
        retry_count: api.retry_count,
        retry_timeout_ms: api.retry_timeout_ms,
        ..Default::default()
    };
    let default_options = RequestOptions::default().timeout_ms(api.timeout_ms);

    let shared_hooks: Arc<dyn RequestHooks> = hooks.clone();
    let client = Arc::new(HttpClient::new(
        config,
        default_options,
        shared_hooks,
        notifier,
    )?);
    hooks.bind_client(&client);
    Ok(client)
}
