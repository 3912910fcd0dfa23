// 用户提示接口
//
// 宿主环境的轻提示/加载指示由调用方注入，核心层不直接依赖任何 UI 能力

use tracing::info;

/// 用户提示接口
///
/// 抽象宿主的 toast 轻提示与 loading 加载指示。请求层在业务失败、
/// 重试等待等场景通过该接口向用户反馈，测试中可注入记录型实现。
pub trait Notifier: Send + Sync {
    /// 显示一条轻提示
    fn toast(&self, message: &str);

    /// 显示加载指示
    fn show_loading(&self, title: &str);

    /// 隐藏加载指示
    fn hide_loading(&self);
}

/// 默认实现：仅写入日志
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn toast(&self, message: &str) {
        info!("[toast] {}", message);
    }

    fn show_loading(&self, title: &str) {
        info!("[loading] {}", title);
    }

    fn hide_loading(&self) {
        info!("[loading] 结束");
    }
}
