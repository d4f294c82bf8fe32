use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use super::{NOTIFY_BODY, NOTIFY_SUBJECT, Notifier};
use crate::{
    config::MailConfig,
    error::{AppError, AppResult},
};

pub const DEFAULT_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";
const SENDER_NAME: &str = "Upload Service";
const RECIPIENT_NAME: &str = "Recipient";

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    mime: &'a str,
    value: &'a str,
}

/// SendGrid v3 `mail/send` 请求体
#[derive(Debug, Serialize)]
struct SendMailRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

impl<'a> SendMailRequest<'a> {
    fn upload_notice(from: &'a str, to: &'a str) -> Self {
        Self {
            personalizations: vec![Personalization {
                to: vec![Address {
                    email: to,
                    name: RECIPIENT_NAME,
                }],
            }],
            from: Address {
                email: from,
                name: SENDER_NAME,
            },
            subject: NOTIFY_SUBJECT,
            content: vec![Content {
                mime: "text/plain",
                value: NOTIFY_BODY,
            }],
        }
    }
}

/// 基于 SendGrid HTTP API 的邮件通知
#[derive(Debug, Clone)]
pub struct SendGridMailer {
    http: Client,
    api_key: String,
    endpoint: String,
}

impl SendGridMailer {
    pub fn new(config: &MailConfig) -> AppResult<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| AppError::config(format!("创建HTTP客户端失败: {}", e)))?;

        if config.api_key.is_empty() {
            tracing::warn!("未配置邮件API密钥，邮件发送将被拒绝");
        }

        let endpoint = if config.endpoint.is_empty() {
            DEFAULT_ENDPOINT.to_string()
        } else {
            config.endpoint.clone()
        };

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            endpoint,
        })
    }
}

#[async_trait::async_trait]
impl Notifier for SendGridMailer {
    async fn send(&self, from: &str, to: &str) -> AppResult<()> {
        let message = SendMailRequest::upload_notice(from, to);

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&message)
            .send()
            .await
            .map_err(|e| {
                error!("发送邮件失败: {}", e);
                AppError::email(format!("发送邮件失败: {}", e))
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let preview = text.chars().take(200).collect::<String>();
            error!(%status, preview = %preview, "邮件服务返回错误");
            return Err(AppError::email(format!(
                "邮件服务返回错误: status={}, body_preview={}",
                status, preview
            )));
        }

        info!(%status, "邮件发送成功: {} -> {}", from, to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_server;
    use axum::{
        Json, Router,
        extract::State,
        http::{HeaderMap, StatusCode},
        routing::post,
    };
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<(String, Value)>>>;

    async fn mail_backend(status: StatusCode) -> (String, Captured) {
        let captured = Captured::default();
        let router = Router::new()
            .route(
                "/v3/mail/send",
                post(
                    move |State(seen): State<Captured>,
                          headers: HeaderMap,
                          Json(body): Json<Value>| async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        seen.lock().unwrap().push((auth, body));
                        (status, "{\"errors\":[{\"message\":\"rejected\"}]}")
                    },
                ),
            )
            .with_state(captured.clone());
        let base = spawn_server(router).await;
        (format!("{}/v3/mail/send", base), captured)
    }

    fn mailer(endpoint: String) -> SendGridMailer {
        SendGridMailer::new(&MailConfig {
            api_key: "sg-test".to_string(),
            endpoint,
        })
        .unwrap()
    }

    #[test]
    fn test_default_endpoint() {
        let mailer = SendGridMailer::new(&MailConfig::default()).unwrap();
        assert_eq!(mailer.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(SendMailRequest::upload_notice("a@example.com", "b@example.com"))
            .unwrap();
        assert_eq!(body["from"]["email"], "a@example.com");
        assert_eq!(body["personalizations"][0]["to"][0]["email"], "b@example.com");
        assert_eq!(body["subject"], NOTIFY_SUBJECT);
        assert_eq!(body["content"][0]["type"], "text/plain");
        assert_eq!(body["content"][0]["value"], "Upload File Successfully.");
    }

    #[tokio::test]
    async fn test_send_posts_authorized_message() {
        let (endpoint, captured) = mail_backend(StatusCode::ACCEPTED).await;

        mailer(endpoint)
            .send("a@example.com", "b@example.com")
            .await
            .unwrap();

        let seen = captured.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "Bearer sg-test");
        assert_eq!(seen[0].1["personalizations"][0]["to"][0]["email"], "b@example.com");
    }

    #[tokio::test]
    async fn test_non_success_status_is_email_error() {
        let (endpoint, _captured) = mail_backend(StatusCode::UNAUTHORIZED).await;

        let err = mailer(endpoint)
            .send("a@example.com", "b@example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Email(_)));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_email_error() {
        // 绑定后立即释放端口，使连接被拒绝
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = mailer(format!("http://{}/v3/mail/send", addr))
            .send("a@example.com", "b@example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Email(_)));
    }
}
