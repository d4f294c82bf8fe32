use crate::{error::AppError, handlers::AppState};
use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::{Json, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 文件上传响应
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// 文件访问地址（由文件名拼接而成，不是签名URL）
    pub url: String,
}

/// 上传表单
#[derive(Debug, ToSchema)]
pub struct UploadForm {
    /// 待上传文件，文件名不能为空
    #[schema(value_type = String, format = Binary)]
    pub file: String,
}

/// 文件上传处理器
///
/// 读取表单字段 `file`，写入对象存储并发送通知邮件。
#[utoipa::path(
    post,
    path = "/upload",
    tag = "files",
    request_body(content = UploadForm, content_type = "multipart/form-data", description = "表单字段 file 为待上传文件"),
    responses(
        (status = 200, description = "上传成功", body = UploadResponse),
        (status = 400, description = "缺少file字段或表单格式错误"),
        (status = 500, description = "读取文件、写入存储或发送邮件失败")
    )
)]
pub async fn upload_file(
    State(app_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload = None;

    // 解析multipart数据
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("解析上传表单失败: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let Some(file_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            return Err(AppError::bad_request("file字段缺少文件名"));
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("读取文件数据失败: {}", e)))?;

        upload = Some((file_name, data));
        break;
    }

    let (file_name, data) = upload.ok_or_else(|| AppError::bad_request("缺少file字段"))?;

    let stored_name = app_state.service.upload_file(&file_name, &data).await?;

    tracing::info!("文件上传成功: {} (大小: {} 字节)", stored_name, data.len());

    Ok(Json(UploadResponse {
        url: format!("{}/{}", app_state.public_url, stored_name),
    }))
}

/// 文件获取处理器
///
/// 为文件生成签名URL并回源获取内容，按上游的 `Content-Type` 流式返回。
#[utoipa::path(
    get,
    path = "/{file_url}",
    tag = "files",
    params(("file_url" = String, Path, description = "文件名")),
    responses(
        (status = 200, description = "文件内容"),
        (status = 500, description = "签名失败、回源失败或上游返回非200")
    )
)]
pub async fn get_file(
    State(app_state): State<AppState>,
    Path(file_url): Path<String>,
) -> Result<Response, AppError> {
    let signed_url = app_state.service.get_signed_url(&file_url).await?;

    let upstream = app_state
        .http
        .get(&signed_url)
        .send()
        .await
        .map_err(|e| AppError::upstream(format!("请求签名URL失败: {}", e)))?;

    if upstream.status() != reqwest::StatusCode::OK {
        return Err(AppError::upstream(format!(
            "获取文件 {} 失败: status={}",
            file_url,
            upstream.status()
        )));
    }

    let mut builder = Response::builder().status(StatusCode::OK);
    if let Some(content_type) = upstream.headers().get(header::CONTENT_TYPE) {
        builder = builder.header(header::CONTENT_TYPE, content_type.clone());
    }

    tracing::info!("回源获取文件: {}", file_url);

    builder
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("构建响应失败: {}", e)))
}
