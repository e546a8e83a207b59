// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact relay service.
//!
//! The contact handler runs behind the origin guard, body limit and rate
//! limit middleware (see [`crate::app`]); by the time it is called the
//! request has been admitted.

use crate::config::Config;
use crate::error::{self, ContactError};
use crate::limiter::RateLimiter;
use crate::mailer::{DispatchError, Mailer};
use crate::metrics::{Metrics, Outcome};
use crate::renderer::render;
use crate::validator::{SubmissionValidator, Violation};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Shared application state.
pub struct AppState {
    pub limiter: RateLimiter,
    pub validator: SubmissionValidator,
    pub mailer: Arc<dyn Mailer>,
    pub metrics: Metrics,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, mailer: Arc<dyn Mailer>) -> Result<Self, prometheus::Error> {
        Ok(Self {
            limiter: RateLimiter::new(config.rate_limit.clone()),
            validator: SubmissionValidator::new(config.validation.clone()),
            mailer,
            metrics: Metrics::new()?,
            config,
        })
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub up: bool,
}

/// Contact endpoint response body.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<Violation>>,
}

impl ContactResponse {
    pub fn success() -> Self {
        Self {
            ok: true,
            error: None,
            details: None,
        }
    }

    pub fn failure(error: &'static str) -> Self {
        Self {
            ok: false,
            error: Some(error),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Vec<Violation>) -> Self {
        self.details = Some(details);
        self
    }
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { up: true })
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Accept a contact form submission and relay it by email.
pub async fn contact(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ContactResponse>, ContactError> {
    let result = relay(&state, &headers, &body).await;

    state.metrics.record(match &result {
        Ok(()) => Outcome::Sent,
        Err(err) => err.outcome(),
    });

    result.map(|()| Json(ContactResponse::success()))
}

/// Validate, render and dispatch one submission.
async fn relay(state: &AppState, headers: &HeaderMap, body: &[u8]) -> error::Result<()> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    state.validator.validate_content_type(content_type)?;

    let input: Value = serde_json::from_slice(body).map_err(|err| {
        debug!(error = %err, "Request body is not valid JSON");
        ContactError::Malformed(err.to_string())
    })?;

    let submission = state.validator.validate(&input).map_err(|err| {
        info!(error = %err, "Validation failed");
        ContactError::from(err)
    })?;

    let message = render(&submission);
    let timeout = state.config.mail.timeout();
    let started = Instant::now();
    let sent = tokio::time::timeout(timeout, state.mailer.send(message)).await;
    state
        .metrics
        .observe_dispatch(started.elapsed().as_secs_f64());

    match sent {
        Ok(Ok(())) => {
            info!("Contact message relayed");
            Ok(())
        }
        Ok(Err(err)) => {
            error!(error = %err, "Failed to relay contact message");
            Err(err.into())
        }
        Err(_) => {
            let err = DispatchError::Timeout(timeout);
            error!(error = %err, "Failed to relay contact message");
            Err(err.into())
        }
    }
}
