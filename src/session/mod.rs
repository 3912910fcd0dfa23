// 用户会话模块

pub mod store;
pub mod types;

pub use store::{LoginCodeProvider, SessionStore};
pub use types::{PersistedSession, SessionState, UserInfo};
