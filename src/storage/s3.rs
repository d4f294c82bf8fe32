use super::{ObjectStorage, signed_url_key, upload_key};
use crate::{
    config::StorageServiceConfig,
    error::{AppError, AppResult},
};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{Client, config::Credentials, presigning::PresigningConfig, primitives::ByteStream};
use serde::Deserialize;
use std::{sync::Arc, time::Duration};

const DEFAULT_REGION: &str = "us-east-1";

/// `json_credential` 中的访问凭证
///
/// 适用于 S3 及兼容 S3 协议的服务（MinIO、GCS 互操作接口等）。
#[derive(Debug, Clone, Deserialize)]
pub struct S3Credential {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// MinIO 等自建服务需要路径样式
    #[serde(default)]
    pub force_path_style: bool,
}

impl S3Credential {
    pub fn from_json(raw: &str) -> AppResult<Self> {
        serde_json::from_str(raw).map_err(|e| AppError::config(format!("解析存储凭证失败: {}", e)))
    }
}

/// S3兼容对象存储实现
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: Arc<Client>,
    bucket: String,
}

impl S3Storage {
    /// 根据存储服务描述创建客户端
    pub fn new(service: &StorageServiceConfig) -> AppResult<Self> {
        if service.bucket.is_empty() {
            return Err(AppError::config(format!(
                "存储服务 {} 的bucket不能为空",
                service.name
            )));
        }

        let credential = S3Credential::from_json(&service.config.json_credential)?;

        let credentials = Credentials::new(
            &credential.access_key_id,
            &credential.secret_access_key,
            None, // session token
            None, // expiration
            "json-credential",
        );

        let region = credential
            .region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let mut builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(region))
            .force_path_style(credential.force_path_style)
            .behavior_version(BehaviorVersion::latest());

        if let Some(endpoint) = &credential.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(builder.build());

        tracing::info!(
            "已初始化存储服务: {} (类型: {}, bucket: {})",
            service.name,
            service.kind,
            service.bucket
        );

        Ok(Self {
            client: Arc::new(client),
            bucket: service.bucket.clone(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait::async_trait]
impl ObjectStorage for S3Storage {
    async fn upload(&self, path_prefix: &str, file_name: &str, content: &[u8]) -> AppResult<()> {
        let key = upload_key(path_prefix, file_name);

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(content.to_vec()));

        if let Some(kind) = infer::get(content) {
            request = request.content_type(kind.mime_type());
        }

        request
            .send()
            .await
            .map_err(|e| AppError::storage(format!("上传文件失败: {}", e)))?;

        tracing::info!("成功上传文件: {}/{} ({} 字节)", self.bucket, key, content.len());

        Ok(())
    }

    async fn signed_url(&self, file_name: &str, ttl: Duration) -> AppResult<String> {
        let key = signed_url_key(file_name);

        let presigning_config = PresigningConfig::expires_in(ttl)
            .map_err(|e| AppError::storage(format!("预签名配置错误: {}", e)))?;

        let presigned_request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .presigned(presigning_config)
            .await
            .map_err(|e| {
                AppError::storage(format!("Bucket({}).SignedURL 生成失败: {}", self.bucket, e))
            })?;

        tracing::debug!("已生成签名URL: {}/{}", self.bucket, key);

        Ok(presigned_request.uri().to_string())
    }
}
