use crate::{
    error::AppResult,
    mail::Notifier,
    storage::ObjectStorage,
};
use chrono::{DateTime, Utc};
use std::{sync::Arc, time::Duration};

/// 签名URL有效期
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(60 * 60);
/// 通知邮件发件人
pub const NOTIFY_FROM: &str = "uploads@example.com";
/// 通知邮件收件人
pub const NOTIFY_TO: &str = "ops@example.com";

/// 上传/获取服务
///
/// 上传时先写入对象存储，再发送通知邮件；任一步失败整个操作即失败。
/// 邮件失败时已写入的对象不会被回滚删除。
#[derive(Clone)]
pub struct FileService {
    storage: Arc<dyn ObjectStorage>,
    notifier: Arc<dyn Notifier>,
}

impl FileService {
    pub fn new(storage: Arc<dyn ObjectStorage>, notifier: Arc<dyn Notifier>) -> Self {
        Self { storage, notifier }
    }

    /// 上传文件并发送通知，成功时返回原始文件名
    pub async fn upload_file(&self, file_name: &str, content: &[u8]) -> AppResult<String> {
        let path_prefix = upload_prefix(Utc::now());

        self.storage.upload(&path_prefix, file_name, content).await?;

        if let Err(e) = self.notifier.send(NOTIFY_FROM, NOTIFY_TO).await {
            tracing::warn!("文件已写入 {}{}，但通知邮件发送失败", path_prefix, file_name);
            return Err(e);
        }

        Ok(file_name.to_string())
    }

    /// 获取文件的签名URL，固定有效期一小时
    pub async fn get_signed_url(&self, file_name: &str) -> AppResult<String> {
        self.storage.signed_url(file_name, SIGNED_URL_TTL).await
    }
}

/// 按UTC日期生成上传目录，例如 `upload/20240105/`
pub fn upload_prefix(now: DateTime<Utc>) -> String {
    format!("upload/{}/", now.format("%Y%m%d"))
}
