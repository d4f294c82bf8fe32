pub mod sendgrid;

pub use sendgrid::SendGridMailer;

use crate::error::AppResult;

/// 通知邮件固定主题
pub const NOTIFY_SUBJECT: &str = "File Upload Notification";
/// 通知邮件固定正文
pub const NOTIFY_BODY: &str = "Upload File Successfully.";

/// 邮件通知接口
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// 发送上传成功通知，不重试
    async fn send(&self, from: &str, to: &str) -> AppResult<()>;
}
