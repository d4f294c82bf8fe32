// 服务层模块
pub mod file_service;

pub use file_service::{FileService, SIGNED_URL_TTL, upload_prefix};
