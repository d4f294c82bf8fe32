//! 测试用的存储/邮件替身与本地HTTP服务

use crate::{
    error::{AppError, AppResult},
    mail::Notifier,
    storage::ObjectStorage,
};
use axum::Router;
use std::{sync::Mutex, time::Duration};

#[derive(Default)]
pub struct MockStorage {
    fail_upload: bool,
    fail_sign: bool,
    signed_base: String,
    uploads: Mutex<Vec<(String, String, Vec<u8>)>>,
    signed: Mutex<Vec<(String, Duration)>>,
}

impl MockStorage {
    pub fn failing() -> Self {
        Self {
            fail_upload: true,
            fail_sign: true,
            ..Self::default()
        }
    }

    /// 签名URL为 `<base>/<file_name>`
    pub fn with_signed_base(base: impl Into<String>) -> Self {
        Self {
            signed_base: base.into(),
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> Vec<(String, String, Vec<u8>)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn signed(&self) -> Vec<(String, Duration)> {
        self.signed.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ObjectStorage for MockStorage {
    async fn upload(&self, path_prefix: &str, file_name: &str, content: &[u8]) -> AppResult<()> {
        if self.fail_upload {
            return Err(AppError::storage("模拟写入失败"));
        }
        self.uploads.lock().unwrap().push((
            path_prefix.to_string(),
            file_name.to_string(),
            content.to_vec(),
        ));
        Ok(())
    }

    async fn signed_url(&self, file_name: &str, ttl: Duration) -> AppResult<String> {
        if self.fail_sign {
            return Err(AppError::storage("模拟签名失败"));
        }
        self.signed.lock().unwrap().push((file_name.to_string(), ttl));
        Ok(format!("{}/{}", self.signed_base, file_name))
    }
}

#[derive(Default)]
pub struct MockNotifier {
    fail: bool,
    sent: Mutex<Vec<(String, String)>>,
}

impl MockNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, from: &str, to: &str) -> AppResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((from.to_string(), to.to_string()));
        if self.fail {
            return Err(AppError::email("模拟邮件服务返回 401"));
        }
        Ok(())
    }
}

/// 在随机端口启动路由，返回 `http://127.0.0.1:<port>`
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}
