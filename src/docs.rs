use crate::handlers::files::{UploadForm, UploadResponse};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::files::upload_file,
        crate::handlers::files::get_file,
    ),
    components(schemas(UploadForm, UploadResponse)),
    tags(
        (name = "files", description = "文件上传与获取")
    ),
    info(
        title = "Upload Service API",
        version = "0.1.0",
        description = "文件上传至对象存储并发送邮件通知，按文件名回源获取"
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_file_routes() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert!(doc["paths"]["/upload"]["post"].is_object());
        assert!(doc["paths"]["/{file_url}"]["get"].is_object());
        assert!(doc["components"]["schemas"]["UploadResponse"].is_object());
        assert!(doc["components"]["schemas"]["UploadForm"].is_object());
        assert!(
            doc["paths"]["/upload"]["post"]["requestBody"]["content"]["multipart/form-data"]
                .is_object()
        );
    }
}
