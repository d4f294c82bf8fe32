/*
 * Upload Service - File upload gateway with object storage and email notification
 * Copyright (c) 2024 Upload Service Project
 *
 * This work is licensed under CC BY-NC-SA 4.0
 * https://creativecommons.org/licenses/by-nc-sa/4.0/
 */

use std::{future::IntoFuture, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use upload_service::{
    config::AppConfig,
    error::AppResult,
    handlers::AppState,
    mail::SendGridMailer,
    routes::create_router,
    services::FileService,
    storage::S3Storage,
};

/// 等待终止信号，返回信号名称
#[cfg(unix)]
async fn shutdown_signal() -> AppResult<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut quit = signal(SignalKind::quit())?;
    let mut terminate = signal(SignalKind::terminate())?;

    let name = tokio::select! {
        _ = hangup.recv() => "SIGHUP",
        _ = interrupt.recv() => "SIGINT",
        _ = quit.recv() => "SIGQUIT",
        _ = terminate.recv() => "SIGTERM",
    };

    Ok(name)
}

#[cfg(not(unix))]
async fn shutdown_signal() -> AppResult<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl+C")
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "upload_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置，失败时直接退出
    let config = AppConfig::load(&[])?;
    tracing::info!("服务器配置: {}", config.server_addr());

    let storage = S3Storage::new(config.primary_storage()?)?;
    let mailer = SendGridMailer::new(&config.mail)?;

    let service = FileService::new(Arc::new(storage), Arc::new(mailer));
    let app_state = AppState::new(service, config.public_url())?;

    let app = create_router(app_state, config.max_upload_bytes());

    // 启动服务器
    let listener = tokio::net::TcpListener::bind(&config.server_addr()).await?;
    tracing::info!("🚀 服务器启动成功，监听地址: {}", config.server_addr());

    tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            if let Err(e) = result {
                tracing::error!("服务器错误: {}", e);
                return Err(e.into());
            }
        }
        signal = shutdown_signal() => {
            let name = signal?;
            tracing::info!("收到终止信号 {}，停止服务", name);
        }
    }

    tracing::info!("shutting down...");

    Ok(())
}
