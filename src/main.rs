// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay Service
//!
//! Accepts `POST /api/contact` submissions from a website form and relays
//! them to a fixed mailbox.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (a `.env` file in the
//! working directory is honoured):
//!
//! - `PORT`: Listening port (default: 8080)
//! - `ORIGIN`: Comma-separated allowed browser origins (default: any)
//! - `SMTP_USER` / `SMTP_PASS`: Relay credentials (required)
//! - `SMTP_HOST` / `SMTP_PORT`: Relay address (default: smtp.gmail.com:465)
//! - `TO_EMAIL`: Destination mailbox (default: `SMTP_USER`)
//! - `RATE_LIMIT_MAX` / `RATE_LIMIT_WINDOW_SECS`: Per-client budget (default: 20 per 60s)
//! - `TRUST_PROXY_HOPS`: Reverse proxies trusted for X-Forwarded-For (default: 1)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_relay::{app, config::Config, handlers::AppState, mailer::SmtpMailer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        allowed_origins = ?config.cors.allowed_origins,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        smtp_host = %config.mail.smtp_host,
        smtp_port = config.mail.smtp_port,
        "Starting contact relay"
    );

    // Create application state
    let mailer = SmtpMailer::new(&config.mail)?;
    let addr: SocketAddr = config.bind_addr.parse()?;
    let state = Arc::new(AppState::new(config, Arc::new(mailer))?);

    // Spawn cleanup task
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            cleanup_state.limiter.cleanup().await;
        }
    });

    let app = app::router(state);

    // Start server
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "API listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
