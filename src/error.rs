use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("存储错误: {0}")]
    Storage(String),

    #[error("邮件发送错误: {0}")]
    Email(String),

    #[error("上游获取失败: {0}")]
    UpstreamFetch(String),

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("内部错误: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// 对客户端暴露的通用消息，不携带内部细节
    fn public_message(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "Failed to parse form file",
            AppError::Storage(_) => "Failed to access storage",
            AppError::Email(_) => "Failed to send notification",
            AppError::UpstreamFetch(_) => "Failed to open file",
            AppError::Config(_) | AppError::Io(_) | AppError::Internal(_) => {
                "Internal server error"
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // 记录错误日志
        tracing::error!("应用错误: {}", self);

        (self.status_code(), self.public_message()).into_response()
    }
}

/// 应用程序Result类型别名
pub type AppResult<T> = Result<T, AppError>;

/// 错误构造辅助函数
impl AppError {
    pub fn bad_request<T: Into<String>>(msg: T) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn storage<T: Into<String>>(msg: T) -> Self {
        Self::Storage(msg.into())
    }

    pub fn email<T: Into<String>>(msg: T) -> Self {
        Self::Email(msg.into())
    }

    pub fn upstream<T: Into<String>>(msg: T) -> Self {
        Self::UpstreamFetch(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = AppError::config("缺少存储服务");
        assert!(matches!(err, AppError::Config(_)));
        assert_eq!(err.to_string(), "配置错误: 缺少存储服务");
    }

    #[test]
    fn test_bad_request_maps_to_400() {
        let response = AppError::bad_request("缺少file字段").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_backend_errors_map_to_500() {
        for err in [
            AppError::storage("写入失败"),
            AppError::email("status=401"),
            AppError::upstream("status=404"),
            AppError::Internal(anyhow::anyhow!("boom")),
        ] {
            assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
