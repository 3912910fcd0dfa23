//! 集成测试公共装配：mock 服务 + 默认拦截器 + 会话
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::MockServer;

use miniapp_client::{
    create_client, ApiConfig, HttpClient, LoginCodeProvider, Notifier, RequestError, SessionStore,
};

/// 记录型提示实现
#[derive(Default)]
pub struct RecordingNotifier {
    pub toasts: Mutex<Vec<String>>,
    pub loading_shown: AtomicUsize,
    pub loading_hidden: AtomicUsize,
}

impl Notifier for RecordingNotifier {
    fn toast(&self, message: &str) {
        self.toasts.lock().push(message.to_string());
    }

    fn show_loading(&self, _title: &str) {
        self.loading_shown.fetch_add(1, Ordering::SeqCst);
    }

    fn hide_loading(&self) {
        self.loading_hidden.fetch_add(1, Ordering::SeqCst);
    }
}

/// 固定 code 的平台登录凭证提供者
pub struct FixedCode(pub String);

#[async_trait]
impl LoginCodeProvider for FixedCode {
    async fn login_code(&self) -> Result<String, RequestError> {
        Ok(self.0.clone())
    }
}

pub struct TestContext {
    pub server: MockServer,
    pub client: Arc<HttpClient>,
    pub session: Arc<SessionStore>,
    pub notifier: Arc<RecordingNotifier>,
    // 会话文件落在临时目录，随测试清理
    pub dir: TempDir,
}

/// 搭一套指向 mock 服务的默认装配
///
/// 地址拼接规则：base_url + url_prefix + url，与正式装配一致
pub async fn setup() -> TestContext {
    setup_with(|_| {}).await
}

pub async fn setup_with(tweak: impl FnOnce(&mut ApiConfig)) -> TestContext {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let session = Arc::new(SessionStore::new(
        dir.path().join("session.json"),
        Arc::new(FixedCode("code-123".to_string())),
    ));
    let notifier = Arc::new(RecordingNotifier::default());

    let mut api = ApiConfig {
        base_url: format!("{}/", server.uri()),
        url_prefix: "api/".to_string(),
        timeout_ms: 200,
        version: "1.0.0".to_string(),
        retry_count: 2,
        retry_timeout_ms: 50,
    };
    tweak(&mut api);

    let client = create_client(&api, Arc::clone(&session), notifier.clone()).unwrap();

    TestContext {
        server,
        client,
        session,
        notifier,
        dir,
    }
}
