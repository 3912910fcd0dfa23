// 会话数据类型定义

use serde::{Deserialize, Serialize};

/// 用户资料
///
/// 未拉取到资料前所有字段保持零值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    /// 用户ID
    pub user_id: i64,
    /// 昵称
    pub nickname: String,
    /// 头像URL
    pub avatar: String,
    /// 性别（0=未知）
    pub sex: i32,
    /// 邀请码
    pub invite_code: String,
}

/// 会话生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// 未登录
    Anonymous,
    /// 登录流程进行中
    Authenticating,
    /// 已登录
    Authenticated,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Anonymous
    }
}

/// 持久化的会话记录
///
/// 以单条 JSON 记录写入会话文件，应用重启时恢复
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSession {
    /// 访问令牌
    pub token: String,
    /// 用户资料
    #[serde(default)]
    pub user_info: UserInfo,
    /// 登录时间戳 (Unix timestamp)
    #[serde(default)]
    pub login_time: i64,
}
