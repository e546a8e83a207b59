// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter for the contact endpoint.
//!
//! Each client (identified by IP address, see [`client_ip`]) may make
//! `max_requests` requests per window. Counters live in a [`CounterStore`];
//! the default [`MemoryStore`] keeps them in process memory only.

use crate::config::RateLimitConfig;
use async_trait::async_trait;
use axum::http::HeaderMap;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Requests admitted per window
        limit: u32,
        /// Remaining requests in current window
        remaining: u32,
        /// Time until window resets
        reset_in: Duration,
    },
    /// Request is rate limited
    Limited {
        /// Requests admitted per window
        limit: u32,
        /// Time until the window resets
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Counter state after recording one hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHit {
    /// Hits recorded in the current window, including this one
    pub count: u32,
    /// Time until the current window closes
    pub reset_in: Duration,
}

/// Storage for per-client window counters.
///
/// `increment` must be atomic with respect to concurrent calls for the
/// same key: two callers can never observe the same count.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Record one hit for `key`, opening a fresh window if none is active.
    async fn increment(&self, key: IpAddr, window: Duration) -> WindowHit;

    /// Drop windows that have already closed.
    async fn cleanup(&self);
}

#[derive(Debug)]
struct Window {
    count: u32,
    resets_at: Instant,
}

/// In-memory counter store. State is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    windows: RwLock<HashMap<IpAddr, Window>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of clients currently tracked.
    pub async fn len(&self) -> usize {
        self.windows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn increment(&self, key: IpAddr, window: Duration) -> WindowHit {
        let now = Instant::now();
        // Write lock is held across the read-modify-write
        let mut windows = self.windows.write().await;
        let entry = windows.entry(key).or_insert_with(|| Window {
            count: 0,
            resets_at: now + window,
        });

        if now >= entry.resets_at {
            entry.count = 0;
            entry.resets_at = now + window;
        }
        entry.count = entry.count.saturating_add(1);

        WindowHit {
            count: entry.count,
            reset_in: entry.resets_at.duration_since(now),
        }
    }

    async fn cleanup(&self) {
        let now = Instant::now();
        let mut windows = self.windows.write().await;
        windows.retain(|_, window| now < window.resets_at);
    }
}

/// Thread-safe rate limiter.
pub struct RateLimiter {
    config: RateLimitConfig,
    store: Arc<dyn CounterStore>,
}

impl RateLimiter {
    /// Create a new rate limiter backed by a [`MemoryStore`].
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Create a rate limiter over an existing counter store.
    pub fn with_store(config: RateLimitConfig, store: Arc<dyn CounterStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count a request from `ip` and decide whether it is admitted.
    pub async fn check(&self, ip: IpAddr) -> RateLimitResult {
        let limit = self.config.max_requests;
        let hit = self
            .store
            .increment(ip, self.config.window_duration())
            .await;

        if hit.count <= limit {
            RateLimitResult::Allowed {
                limit,
                remaining: limit - hit.count,
                reset_in: hit.reset_in,
            }
        } else {
            debug!(%ip, count = hit.count, limit, "Client rate limit exceeded");
            RateLimitResult::Limited {
                limit,
                retry_after: hit.reset_in,
            }
        }
    }

    /// Clean up expired entries (should be called periodically).
    pub async fn cleanup(&self) {
        self.store.cleanup().await;
    }
}

/// Whole seconds, rounded up, as used by `Retry-After` and `RateLimit-Reset`.
pub fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

/// Derive the client address used as the rate limit key.
///
/// With `trusted_hops` proxies in front of the service, the client is the
/// `trusted_hops`-th X-Forwarded-For entry counted from the right (or the
/// leftmost entry if the chain is shorter). With zero trusted hops, or when
/// the chosen entry does not parse, the peer address is used.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trusted_hops: usize) -> IpAddr {
    let fallback = peer.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    if trusted_hops == 0 {
        return fallback;
    }

    let chain: Vec<&str> = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect();

    if chain.is_empty() {
        return fallback;
    }

    let index = chain.len().saturating_sub(trusted_hops);
    chain[index].parse().unwrap_or(fallback)
}
