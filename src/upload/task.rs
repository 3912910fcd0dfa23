// 上传条目定义

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// 上传条目状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// 待上传
    Pending,
    /// 上传中
    Uploading,
    /// 上传成功
    Success,
    /// 上传失败
    Error,
}

/// 待上传的本地文件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFile {
    /// 文件名
    pub name: String,
    /// 文件大小（字节）
    pub size: u64,
    /// MIME 类型
    #[serde(rename = "type")]
    pub file_type: String,
    /// 本地路径
    pub path: PathBuf,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, size: u64, file_type: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            size,
            file_type: file_type.into(),
            path: path.into(),
        }
    }
}

/// 上传条目
///
/// 选择文件时创建（pending），提交后进入 uploading，
/// 终态为 success 或 error，互不影响
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileItem {
    /// 条目ID
    pub id: String,
    /// 文件信息
    pub file: UploadFile,
    /// 上传进度 0..=100
    pub progress: u8,
    /// 条目状态
    pub status: UploadStatus,
    /// 服务端响应（成功时）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    /// 错误信息（失败时）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 创建时间 (Unix timestamp)
    pub created_at: i64,
}

impl FileItem {
    /// 创建新的上传条目
    pub fn new(file: UploadFile) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            file,
            progress: 0,
            status: UploadStatus::Pending,
            response: None,
            error: None,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// 更新上传进度
    pub fn set_progress(&mut self, progress: u8) {
        self.progress = progress.min(100);
    }

    /// 标记为上传中
    pub fn mark_uploading(&mut self) {
        self.status = UploadStatus::Uploading;
    }

    /// 标记为上传成功
    pub fn mark_success(&mut self, response: serde_json::Value) {
        self.status = UploadStatus::Success;
        self.response = Some(response);
        self.progress = 100;
    }

    /// 标记为上传失败
    pub fn mark_error(&mut self, error: String) {
        self.status = UploadStatus::Error;
        self.error = Some(error);
    }

    /// 是否已到终态
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, UploadStatus::Success | UploadStatus::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item() -> FileItem {
        FileItem::new(UploadFile::new("photo.jpg", 1024, "image/jpeg", "./photo.jpg"))
    }

    #[test]
    fn test_item_creation() {
        let item = item();
        assert_eq!(item.status, UploadStatus::Pending);
        assert_eq!(item.progress, 0);
        assert!(item.response.is_none());
        assert!(item.error.is_none());
        assert!(!item.is_terminal());
    }

    #[test]
    fn test_status_transitions() {
        let mut item = item();

        item.mark_uploading();
        assert_eq!(item.status, UploadStatus::Uploading);

        item.mark_success(json!({"url": "https://cdn.example/photo.jpg"}));
        assert_eq!(item.status, UploadStatus::Success);
        assert_eq!(item.progress, 100);
        assert!(item.is_terminal());

        let mut failed = self::item();
        failed.mark_uploading();
        failed.mark_error("网络请求失败".to_string());
        assert_eq!(failed.status, UploadStatus::Error);
        assert_eq!(failed.error.as_deref(), Some("网络请求失败"));
        assert!(failed.is_terminal());
    }

    #[test]
    fn test_progress_clamped() {
        let mut item = item();
        item.set_progress(50);
        assert_eq!(item.progress, 50);
        item.set_progress(150);
        assert_eq!(item.progress, 100);
    }
}
