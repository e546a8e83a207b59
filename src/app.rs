// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Router assembly and request middleware.
//!
//! Layer order on `/api/contact`, outermost first: CORS, origin guard,
//! body size limit, rate limit, handler. `/health` only sees CORS and
//! tracing.

use crate::config::CorsConfig;
use crate::error::ContactError;
use crate::handlers::{contact, health, metrics, AppState};
use crate::limiter::{ceil_secs, client_ip, RateLimitResult};
use crate::metrics::Outcome;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

const RATELIMIT_POLICY: HeaderName = HeaderName::from_static("ratelimit-policy");
const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let config = &state.config;

    let contact_routes = Router::new()
        .route("/api/contact", post(contact))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .route_layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
        .route_layer(middleware::from_fn_with_state(state.clone(), guard_origin));

    let mut app = Router::new()
        .route("/health", get(health))
        .merge(contact_routes);

    if config.metrics.enabled {
        app = app.route(&config.metrics.path, get(metrics));
    }

    app.layer(cors_layer(&config.cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy: POST and OPTIONS only, from the configured origins.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins = if config.allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            config
                .allowed_origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
}

/// Reject browser requests whose `Origin` is not on the allow list.
///
/// Requests without an `Origin` header pass; an empty allow list admits
/// every origin.
pub async fn guard_origin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let allowed = &state.config.cors.allowed_origins;

    if let Some(origin) = request.headers().get(header::ORIGIN) {
        let origin = origin.to_str().unwrap_or_default();
        if !allowed.is_empty() && !allowed.iter().any(|a| a == origin) {
            warn!(origin, "Rejected request from disallowed origin");
            state.metrics.record(Outcome::OriginRejected);
            return ContactError::OriginRejected(origin.to_string()).into_response();
        }
    }

    next.run(request).await
}

/// Gate requests through the per-client rate limiter and attach the
/// standard `RateLimit-*` headers to the response.
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let config = state.limiter.config();
    let ip = client_ip(request.headers(), peer, config.trust_proxy_hops);
    let window_secs = config.window_secs;

    match state.limiter.check(ip).await {
        RateLimitResult::Allowed {
            limit,
            remaining,
            reset_in,
        } => {
            let mut response = next.run(request).await;
            insert_rate_limit_headers(
                response.headers_mut(),
                limit,
                window_secs,
                remaining,
                reset_in,
            );
            response
        }
        RateLimitResult::Limited { limit, retry_after } => {
            info!(
                %ip,
                retry_after_secs = ceil_secs(retry_after),
                "Request rate limited"
            );
            state.metrics.record(Outcome::RateLimited);
            let mut response = ContactError::RateLimited { limit, retry_after }.into_response();
            insert_rate_limit_headers(response.headers_mut(), limit, window_secs, 0, retry_after);
            response
        }
    }
}

fn insert_rate_limit_headers(
    headers: &mut HeaderMap,
    limit: u32,
    window_secs: u64,
    remaining: u32,
    reset_in: Duration,
) {
    if let Ok(policy) = HeaderValue::from_str(&format!("{limit};w={window_secs}")) {
        headers.insert(RATELIMIT_POLICY, policy);
    }
    headers.insert(RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(RATELIMIT_REMAINING, HeaderValue::from(remaining));
    headers.insert(RATELIMIT_RESET, HeaderValue::from(ceil_secs(reset_in)));
}
