// 进行中请求注册表
//
// 以调用方传入的原始 URL 为键，同一 URL 的新请求顶替并取消旧请求

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

/// 进行中请求注册表
#[derive(Debug, Default)]
pub struct CancelRegistry {
    tasks: DashMap<String, CancellationToken>,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self {
            tasks: DashMap::new(),
        }
    }

    /// 注册进行中的请求
    ///
    /// 同一 URL 已有请求时先取消旧请求，防止重复的在途调用
    pub fn add(&self, url: &str, token: CancellationToken) {
        if let Some(old) = self.tasks.insert(url.to_string(), token) {
            old.cancel();
        }
    }

    /// 请求完成后注销
    ///
    /// 被顶替而中止的请求不调用本方法：此时键已归新请求所有
    pub fn remove(&self, url: &str) {
        self.tasks.remove(url);
    }

    /// 当前在途请求数
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_replaces_and_cancels_previous() {
        let registry = CancelRegistry::new();
        let first = CancellationToken::new();
        let second = CancellationToken::new();

        registry.add("user/userinfo", first.clone());
        assert_eq!(registry.pending(), 1);
        assert!(!first.is_cancelled());

        // 同 URL 再次注册：旧请求被取消，新请求接管键
        registry.add("user/userinfo", second.clone());
        assert_eq!(registry.pending(), 1);
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
    }

    #[test]
    fn test_remove_clears_entry() {
        let registry = CancelRegistry::new();
        registry.add("login/auto_login", CancellationToken::new());
        registry.add("user/userinfo", CancellationToken::new());
        assert_eq!(registry.pending(), 2);

        registry.remove("login/auto_login");
        assert_eq!(registry.pending(), 1);

        // 注销不存在的键不报错
        registry.remove("login/auto_login");
        assert_eq!(registry.pending(), 1);
    }
}
