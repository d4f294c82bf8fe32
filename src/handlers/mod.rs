pub mod files;

pub use files::{UploadForm, UploadResponse, get_file, upload_file};

use crate::{
    error::{AppError, AppResult},
    services::FileService,
};

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub service: FileService,
    /// 用于回源签名URL的HTTP客户端
    pub http: reqwest::Client,
    /// 上传响应中URL的前缀
    pub public_url: String,
}

impl AppState {
    pub fn new(service: FileService, public_url: impl Into<String>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::config(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            service,
            http,
            public_url: public_url.into(),
        })
    }
}
