// 请求层错误类型定义

use thiserror::Error;

/// 请求层统一错误
///
/// 按失败来源分类：传输层失败（网络/超时/取消）、业务失败（响应码非成功）、
/// 登录态失效、本地校验失败、响应解析失败
#[derive(Debug, Error)]
pub enum RequestError {
    /// 网络请求失败（连接失败、TLS错误等传输层问题）
    #[error("网络请求失败: {0}")]
    Network(String),

    /// 请求超时（触发重试策略的唯一错误类型）
    #[error("请求超时")]
    Timeout,

    /// 请求被取消（同 URL 的新请求顶替了旧请求）
    #[error("请求已取消")]
    Aborted,

    /// 业务失败（响应信封中的 code 表示失败）
    #[error("业务错误 [{code}]: {msg}")]
    Business { code: i64, msg: String },

    /// 登录态失效（响应信封中的 code 表示 token 无效）
    #[error("登录状态已失效: {0}")]
    TokenInvalid(String),

    /// 本地校验失败（如选择的文件超过大小上限）
    #[error("{0}")]
    Validation(String),

    /// 响应体解析失败
    #[error("响应解析失败: {0}")]
    Decode(#[from] serde_json::Error),

    /// 非预期的 HTTP 状态码（上传接口只认 200）
    #[error("非预期的 HTTP 状态码: {0}")]
    UnexpectedStatus(u16),

    /// 其他错误
    #[error("{0}")]
    Other(String),
}

impl RequestError {
    /// 是否为超时错误（重试策略只对超时生效）
    pub fn is_timeout(&self) -> bool {
        matches!(self, RequestError::Timeout)
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RequestError::Timeout
        } else {
            RequestError::Network(err.to_string())
        }
    }
}
