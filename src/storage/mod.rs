pub mod s3;

pub use s3::S3Storage;

use crate::error::AppResult;
use std::time::Duration;

/// 签名URL使用的固定对象前缀
pub const SIGNED_URL_PREFIX: &str = "branch/inbound";
/// 签名URL使用的固定日期目录
pub const SIGNED_URL_DATE: &str = "20231222";

/// 对象存储抽象接口
#[async_trait::async_trait]
pub trait ObjectStorage: Send + Sync {
    /// 将内容写入 `path_prefix + file_name`，已存在时直接覆盖
    async fn upload(&self, path_prefix: &str, file_name: &str, content: &[u8]) -> AppResult<()>;

    /// 为文件生成有效期为 `ttl` 的只读签名URL，不检查对象是否存在
    async fn signed_url(&self, file_name: &str, ttl: Duration) -> AppResult<String>;
}

/// 上传时使用的对象键
pub fn upload_key(path_prefix: &str, file_name: &str) -> String {
    format!("{}{}", path_prefix, file_name)
}

/// 签名时使用的对象键
///
/// 与 [`upload_key`] 生成的键不同：签名固定指向 `branch/inbound/20231222/` 目录。
pub fn signed_url_key(file_name: &str) -> String {
    format!("{}/{}/{}", SIGNED_URL_PREFIX, SIGNED_URL_DATE, file_name)
}
