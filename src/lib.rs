// 小程序客户端核心库
// 登录会话、请求层与文件上传

// 接口封装模块
pub mod api;

// 配置管理模块
pub mod config;

// 错误类型模块
pub mod error;

// 日志模块
pub mod logging;

// 用户提示模块
pub mod notify;

// 请求层模块
pub mod request;

// 用户会话模块
pub mod session;

// 文件上传模块
pub mod upload;

// 导出常用类型
pub use api::LoginData;
pub use config::{ApiConfig, AppConfig, LogConfig, SessionConfig, UploadEndpointConfig};
pub use error::RequestError;
pub use notify::{LogNotifier, Notifier};
pub use request::{
    create_client, ApiResponse, CancelRegistry, DefaultHooks, HttpClient, HttpMethod, NoopHooks,
    RawResponse, RequestConfig, RequestHooks, RequestOptions, RequestOverrides, ResponseCode,
    ResponseMode, ResponseValue, UploadFileOptions,
};
pub use session::{LoginCodeProvider, PersistedSession, SessionState, SessionStore, UserInfo};
pub use upload::{FileItem, FileUploader, UploadFile, UploadOptions, UploadStatus};
