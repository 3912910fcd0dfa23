// 用户会话管理
//
// 登录态与用户资料的唯一持有者，显式传入请求层，不做全局查找。
// 生命周期：anonymous → authenticating → authenticated；
// 登出或资料拉取失败回到 anonymous。

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api;
use crate::error::RequestError;
use crate::request::client::HttpClient;
use crate::session::types::{PersistedSession, SessionState, UserInfo};

/// 平台登录凭证提供者
///
/// 宿主平台的身份握手（小程序环境的 login 调用），由调用方注入
#[async_trait]
pub trait LoginCodeProvider: Send + Sync {
    /// 获取一次性登录凭证 code
    async fn login_code(&self) -> Result<String, RequestError>;
}

/// 用户会话
pub struct SessionStore {
    /// 生命周期状态
    state: RwLock<SessionState>,
    /// 访问令牌，空串表示未登录
    token: RwLock<String>,
    /// 用户资料
    user_info: RwLock<UserInfo>,
    /// 登录时间戳
    login_time: RwLock<i64>,
    /// 平台登录凭证提供者
    code_provider: Arc<dyn LoginCodeProvider>,
    /// 会话文件路径
    session_file: PathBuf,
}

impl SessionStore {
    pub fn new(session_file: PathBuf, code_provider: Arc<dyn LoginCodeProvider>) -> Self {
        Self {
            state: RwLock::new(SessionState::Anonymous),
            token: RwLock::new(String::new()),
            user_info: RwLock::new(UserInfo::default()),
            login_time: RwLock::new(0),
            code_provider,
            session_file,
        }
    }

    // ========== 读取 ==========

    pub fn token(&self) -> String {
        self.token.read().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        !self.token.read().is_empty()
    }

    pub fn current_user(&self) -> UserInfo {
        self.user_info.read().clone()
    }

    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    // ========== 写入 ==========

    /// 设置访问令牌并持久化
    pub fn set_token(&self, token: &str) {
        *self.token.write() = token.to_string();
        *self.login_time.write() = chrono::Utc::now().timestamp();
        self.persist();
    }

    /// 更新用户资料并持久化
    pub fn update_user_info(&self, info: UserInfo) {
        *self.user_info.write() = info;
        self.persist();
    }

    /// 清除会话：令牌、资料一并清空，回到未登录状态
    pub fn clear_session(&self) {
        *self.token.write() = String::new();
        *self.user_info.write() = UserInfo::default();
        *self.login_time.write() = 0;
        *self.state.write() = SessionState::Anonymous;
        self.persist();
    }

    /// 登出
    pub fn logout(&self) {
        info!("用户登出，清除会话");
        self.clear_session();
    }

    // ========== 登录流程 ==========

    /// 自动登录
    ///
    /// 获取平台 code → 调用登录接口换取 access_token → 保存令牌 → 拉取用户资料。
    /// 任一步失败都会清除会话并返回错误；登录进行中时拒绝重入。
    pub async fn auto_login(&self, http: &HttpClient) -> Result<(), RequestError> {
        {
            let mut state = self.state.write();
            if *state == SessionState::Authenticating {
                return Err(RequestError::Other("登录流程进行中".to_string()));
            }
            *state = SessionState::Authenticating;
        }

        let result = self.login_flow(http).await;
        match result {
            Ok(()) => {
                *self.state.write() = SessionState::Authenticated;
                self.persist();
                info!("自动登录成功, user_id={}", self.current_user().user_id);
                Ok(())
            }
            Err(e) => {
                warn!("自动登录失败: {}", e);
                self.clear_session();
                Err(e)
            }
        }
    }

    async fn login_flow(&self, http: &HttpClient) -> Result<(), RequestError> {
        // 1. 获取平台登录凭证
        let code = self.code_provider.login_code().await?;

        // 2. 调用登录接口
        let login = api::auto_login(http, &code).await?;

        // 3. 保存令牌
        self.set_token(&login.access_token);

        // 4. 拉取用户资料
        self.get_user_info(http).await?;

        Ok(())
    }

    /// 拉取用户资料
    ///
    /// 失败时清除整个会话（令牌与资料），调用方需要重新登录
    pub async fn get_user_info(&self, http: &HttpClient) -> Result<UserInfo, RequestError> {
        match api::get_user(http).await {
            Ok(info) => {
                self.update_user_info(info.clone());
                Ok(info)
            }
            Err(e) => {
                warn!("拉取用户资料失败，清除会话: {}", e);
                self.clear_session();
                Err(e)
            }
        }
    }

    /// 应用启动时恢复会话
    ///
    /// 读取持久化记录；存在令牌时重新走一遍登录流程刷新会话
    pub async fn restore(&self, http: &HttpClient) -> Result<(), RequestError> {
        let persisted = match self.load_persisted() {
            Ok(record) => record,
            Err(e) => {
                warn!("读取会话文件失败: {}", e);
                None
            }
        };

        let Some(record) = persisted else {
            return Ok(());
        };

        *self.token.write() = record.token.clone();
        *self.user_info.write() = record.user_info;
        *self.login_time.write() = record.login_time;
        if !record.token.is_empty() {
            *self.state.write() = SessionState::Authenticated;
            info!("检测到持久化会话，自动刷新登录态");
            self.auto_login(http).await?;
        }
        Ok(())
    }

    // ========== 持久化 ==========

    /// 写入会话文件（尽力而为，失败只记录日志）
    fn persist(&self) {
        let record = PersistedSession {
            token: self.token.read().clone(),
            user_info: self.user_info.read().clone(),
            login_time: *self.login_time.read(),
        };
        if let Err(e) = self.write_record(&record) {
            warn!("会话持久化失败: {}", e);
        }
    }

    fn write_record(&self, record: &PersistedSession) -> Result<()> {
        if let Some(parent) = self.session_file.parent() {
            std::fs::create_dir_all(parent).context("Failed to create session directory")?;
        }
        let content = serde_json::to_string_pretty(record).context("Failed to serialize session")?;
        std::fs::write(&self.session_file, content).context("Failed to write session file")?;
        Ok(())
    }

    fn load_persisted(&self) -> Result<Option<PersistedSession>> {
        if !self.session_file.exists() {
            return Ok(None);
        }
        let content =
            std::fs::read_to_string(&self.session_file).context("Failed to read session file")?;
        let record: PersistedSession =
            serde_json::from_str(&content).context("Failed to parse session file")?;
        Ok(Some(record))
    }
}
