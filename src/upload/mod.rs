// 文件上传模块

pub mod manager;
pub mod task;

pub use manager::{FileUploader, UploadOptions};
pub use task::{FileItem, UploadFile, UploadStatus};
