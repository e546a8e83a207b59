// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Request-level errors and their HTTP mapping.
//!
//! Only validation details are returned to the caller; everything else is
//! reduced to a fixed message.

use crate::handlers::ContactResponse;
use crate::limiter::ceil_secs;
use crate::mailer::DispatchError;
use crate::metrics::Outcome;
use crate::validator::ValidationError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::time::Duration;
use thiserror::Error;

/// Application error types
#[derive(Debug, Error)]
pub enum ContactError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Rate limit of {limit} requests exceeded, retry after {retry_after:?}")]
    RateLimited { limit: u32, retry_after: Duration },

    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Malformed request: {0}")]
    Malformed(String),

    #[error("Origin not allowed: {0}")]
    OriginRejected(String),
}

impl ContactError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(ValidationError::InvalidContentType { .. }) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            Self::Validation(ValidationError::InvalidPayload(_)) => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Malformed(_) => StatusCode::BAD_REQUEST,
            Self::OriginRejected(_) => StatusCode::FORBIDDEN,
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Validation(ValidationError::InvalidContentType { .. }) | Self::Malformed(_) => {
                Outcome::Malformed
            }
            Self::Validation(ValidationError::InvalidPayload(_)) => Outcome::Invalid,
            Self::RateLimited { .. } => Outcome::RateLimited,
            Self::Dispatch(_) => Outcome::Failed,
            Self::OriginRejected(_) => Outcome::OriginRejected,
        }
    }
}

impl IntoResponse for ContactError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Validation(ValidationError::InvalidPayload(details)) => (
                status,
                Json(ContactResponse::failure("Invalid payload").with_details(details)),
            )
                .into_response(),
            Self::Validation(ValidationError::InvalidContentType { .. }) => (
                status,
                Json(ContactResponse::failure("Unsupported media type")),
            )
                .into_response(),
            Self::RateLimited { retry_after, .. } => (
                status,
                [(header::RETRY_AFTER, ceil_secs(retry_after).to_string())],
                Json(ContactResponse::failure(
                    "Too many requests, please try again later.",
                )),
            )
                .into_response(),
            Self::Dispatch(_) => {
                (status, Json(ContactResponse::failure("Failed to send"))).into_response()
            }
            Self::Malformed(_) => {
                (status, Json(ContactResponse::failure("Malformed request"))).into_response()
            }
            Self::OriginRejected(_) => {
                (status, Json(ContactResponse::failure("Origin not allowed"))).into_response()
            }
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ContactError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_details_not_exposed() {
        let err = ContactError::Dispatch(DispatchError::Rejected("554".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.outcome(), Outcome::Failed);
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = ContactError::RateLimited {
            limit: 20,
            retry_after: Duration::from_millis(12_300),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "13");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ContactError::Validation(ValidationError::InvalidPayload(Vec::new())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ContactError::Validation(ValidationError::InvalidContentType {
                expected: vec!["application/json".to_string()],
                actual: None,
            })
            .status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            ContactError::Malformed("eof".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ContactError::OriginRejected("https://evil.example".to_string()).status(),
            StatusCode::FORBIDDEN
        );
    }
}
