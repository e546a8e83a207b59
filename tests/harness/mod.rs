// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Shared test harness for the contact relay.
//!
//! Builds the full router over a stub mailer and provides request and
//! response helpers.

#![allow(dead_code)]

pub mod generators;
pub mod mailer;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response},
    Router,
};
use contact_relay::{
    app,
    config::{Config, CorsConfig, MailConfig},
    handlers::AppState,
};
use mailer::StubMailer;
use serde_json::Value;
use std::net::IpAddr;
use std::sync::Arc;

pub const ALLOWED_ORIGIN: &str = "https://example.com";

/// Default configuration with one allowed origin and dummy credentials.
pub fn test_config() -> Config {
    Config {
        cors: CorsConfig {
            allowed_origins: vec![ALLOWED_ORIGIN.to_string()],
        },
        mail: MailConfig {
            username: "relay@example.com".to_string(),
            password: "secret".to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Build the router and keep a handle on its state.
pub fn build_app(config: Config, mailer: Arc<StubMailer>) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, mailer).expect("metrics registry"));
    (app::router(state.clone()), state)
}

/// A JSON POST to the contact endpoint from `client` (via X-Forwarded-For).
pub fn contact_request(body: impl Into<String>, client: IpAddr) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/contact")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", client.to_string())
        .body(Body::from(body.into()))
        .unwrap()
}

/// The minimal valid submission.
pub fn valid_payload() -> String {
    r#"{"name":"Jo","email":"jo@x.com","message":"Hello"}"#.to_string()
}

pub fn client(last_octet: u8) -> IpAddr {
    IpAddr::from([203, 0, 113, last_octet])
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn read_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
