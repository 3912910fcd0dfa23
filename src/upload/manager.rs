// 文件上传器
//
// 页面级的文件选择与批量上传：选择阶段做大小校验，上传阶段用
// 固定大小的工作池并发提交，单个文件的失败只落在它自己的条目上。
// 上传直连上传接口，不经过请求层的取消与重试。

use futures::StreamExt;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::error::RequestError;
use crate::session::SessionStore;
use crate::upload::task::{FileItem, UploadFile, UploadStatus};

/// 上传器配置
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// 上传地址
    pub url: String,
    /// 附加请求头
    pub header: HashMap<String, String>,
    /// 附加表单字段
    pub form_data: HashMap<String, String>,
    /// 单文件大小上限（MB）
    pub max_size_mb: u64,
    /// 传递给平台文件选择器的类型过滤（如 image/*）
    pub accept: Option<String>,
    /// 是否允许多选
    pub multiple: bool,
    /// 并发上传数
    pub concurrent: usize,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            url: String::new(),
            header: HashMap::new(),
            form_data: HashMap::new(),
            max_size_mb: 10,
            accept: None,
            multiple: false,
            concurrent: 3,
        }
    }
}

impl UploadOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// 文件上传器
pub struct FileUploader {
    options: Arc<UploadOptions>,
    http: reqwest::Client,
    session: Arc<SessionStore>,
    /// 上传条目列表，上传任务并发更新各自条目
    files: Arc<Mutex<Vec<FileItem>>>,
    is_uploading: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl FileUploader {
    pub fn new(options: UploadOptions, session: Arc<SessionStore>) -> Result<Self, RequestError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(RequestError::from)?;
        Ok(Self {
            options: Arc::new(options),
            http,
            session,
            files: Arc::new(Mutex::new(Vec::new())),
            is_uploading: AtomicBool::new(false),
            last_error: Mutex::new(None),
        })
    }

    /// 条目列表快照
    pub fn files(&self) -> Vec<FileItem> {
        self.files.lock().clone()
    }

    pub fn is_uploading(&self) -> bool {
        self.is_uploading.load(Ordering::SeqCst)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    /// 加入选择的文件
    ///
    /// 逐个校验大小上限，任一文件超限则整批拒绝，列表保持不变；
    /// 校验通过的文件以 pending 状态追加
    pub fn choose_file(&self, picked: Vec<UploadFile>) -> Result<(), RequestError> {
        if !self.options.multiple && picked.len() > 1 {
            return Err(self.record_error("一次只能选择一个文件"));
        }

        let max_bytes = self.options.max_size_mb * 1024 * 1024;
        for file in &picked {
            if file.size > max_bytes {
                return Err(self.record_error(&format!(
                    "文件大小不能超过 {}MB",
                    self.options.max_size_mb
                )));
            }
        }

        let mut files = self.files.lock();
        files.extend(picked.into_iter().map(FileItem::new));
        *self.last_error.lock() = None;
        Ok(())
    }

    fn record_error(&self, msg: &str) -> RequestError {
        *self.last_error.lock() = Some(msg.to_string());
        RequestError::Validation(msg.to_string())
    }

    /// 上传所有待上传条目
    ///
    /// 固定大小的工作池并发提交；每个条目独立收敛到 success 或 error，
    /// 第一个（按选择顺序）失败同时返回给调用方，但不中断其余条目
    pub async fn upload(&self) -> Result<(), RequestError> {
        self.is_uploading.store(true, Ordering::SeqCst);
        *self.last_error.lock() = None;

        let pending: Vec<usize> = {
            let files = self.files.lock();
            files
                .iter()
                .enumerate()
                .filter(|(_, item)| item.status == UploadStatus::Pending)
                .map(|(index, _)| index)
                .collect()
        };
        debug!("开始上传 {} 个文件, 并发数={}", pending.len(), self.options.concurrent);

        let semaphore = Arc::new(Semaphore::new(self.options.concurrent.max(1)));
        let mut handles = Vec::with_capacity(pending.len());
        for index in pending {
            let semaphore = Arc::clone(&semaphore);
            let files = Arc::clone(&self.files);
            let options = Arc::clone(&self.options);
            let http = self.http.clone();
            let token = self.session.token();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| RequestError::Other(format!("获取上传并发额度失败: {}", e)))?;
                single_upload(index, files, http, options, token).await
            }));
        }

        let results = futures::future::join_all(handles).await;
        self.is_uploading.store(false, Ordering::SeqCst);

        let mut first_error: Option<RequestError> = None;
        for result in results {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => Err(RequestError::Other(format!("上传任务意外终止: {}", e))),
            };
            if let Err(e) = outcome {
                if first_error.is_none() {
                    *self.last_error.lock() = Some(e.to_string());
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// 取消上传
    ///
    /// 目前只复位上传标记。
    /// TODO: 维护在途任务句柄，真正中断进行中的上传请求
    pub fn cancel_upload(&self) {
        self.is_uploading.store(false, Ordering::SeqCst);
    }

    /// 重置状态
    pub fn reset(&self) {
        self.files.lock().clear();
        self.is_uploading.store(false, Ordering::SeqCst);
        *self.last_error.lock() = None;
    }
}

/// 上传单个条目，结果只写回该条目自身
async fn single_upload(
    index: usize,
    files: Arc<Mutex<Vec<FileItem>>>,
    http: reqwest::Client,
    options: Arc<UploadOptions>,
    token: String,
) -> Result<(), RequestError> {
    let (path, name, size, file_type) = {
        let mut files = files.lock();
        let Some(item) = files.get_mut(index) else {
            return Ok(());
        };
        item.mark_uploading();
        (
            item.file.path.clone(),
            item.file.name.clone(),
            item.file.size,
            item.file.file_type.clone(),
        )
    };

    let result = do_upload(
        &path,
        &name,
        size,
        &file_type,
        Arc::clone(&files),
        index,
        http,
        options,
        token,
    )
    .await;

    let mut files = files.lock();
    let Some(item) = files.get_mut(index) else {
        return Ok(());
    };
    match result {
        Ok(response) => {
            item.mark_success(response);
            Ok(())
        }
        Err(e) => {
            warn!("文件上传失败: {} - {}", name, e);
            item.mark_error(e.to_string());
            Err(e)
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn do_upload(
    path: &PathBuf,
    name: &str,
    size: u64,
    file_type: &str,
    files: Arc<Mutex<Vec<FileItem>>>,
    index: usize,
    http: reqwest::Client,
    options: Arc<UploadOptions>,
    token: String,
) -> Result<Value, RequestError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| RequestError::Other(format!("读取上传文件失败: {}", e)))?;

    // 字节计数流：消费多少字节就推进多少进度，成功后由条目补到 100
    let sent = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&sent);
    let stream = ReaderStream::new(file).inspect(move |chunk| {
        if let Ok(bytes) = chunk {
            let total_sent = counter.fetch_add(bytes.len() as u64, Ordering::Relaxed)
                + bytes.len() as u64;
            let percent = if size == 0 {
                99
            } else {
                ((total_sent * 100 / size).min(99)) as u8
            };
            if let Some(item) = files.lock().get_mut(index) {
                item.set_progress(percent);
            }
        }
    });

    let mime = if file_type.is_empty() {
        "application/octet-stream"
    } else {
        file_type
    };
    let part = reqwest::multipart::Part::stream_with_length(
        reqwest::Body::wrap_stream(stream),
        size,
    )
    .file_name(name.to_string())
    .mime_str(mime)
    .map_err(RequestError::from)?;

    let mut form = reqwest::multipart::Form::new();
    for (key, value) in &options.form_data {
        form = form.text(key.clone(), value.clone());
    }
    form = form.part("file", part);

    let mut builder = http
        .post(&options.url)
        .header("Authorization", format!("Bearer {}", token))
        .multipart(form);
    for (key, value) in &options.header {
        builder = builder.header(key.as_str(), value.as_str());
    }

    let response = builder.send().await.map_err(RequestError::from)?;
    let status = response.status().as_u16();
    let body = response.text().await.map_err(RequestError::from)?;
    if status >= 400 {
        return Err(RequestError::UnexpectedStatus(status));
    }

    if body.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(serde_json::from_str(&body)?)
    }
}
