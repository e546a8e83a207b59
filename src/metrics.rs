// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for the contact relay.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};

/// Final outcome of a request to the contact endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Sent,
    Invalid,
    Malformed,
    RateLimited,
    OriginRejected,
    Failed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Invalid => "invalid",
            Self::Malformed => "malformed",
            Self::RateLimited => "rate_limited",
            Self::OriginRejected => "origin_rejected",
            Self::Failed => "failed",
        }
    }
}

/// Service-local metrics registry.
pub struct Metrics {
    registry: Registry,
    requests: IntCounterVec,
    dispatch_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("contact_requests_total", "Contact form requests by outcome"),
            &["outcome"],
        )?;
        let dispatch_seconds = Histogram::with_opts(HistogramOpts::new(
            "contact_dispatch_seconds",
            "Time spent handing messages to the mail relay",
        ))?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(dispatch_seconds.clone()))?;

        Ok(Self {
            registry,
            requests,
            dispatch_seconds,
        })
    }

    pub fn record(&self, outcome: Outcome) {
        self.requests.with_label_values(&[outcome.as_str()]).inc();
    }

    pub fn observe_dispatch(&self, seconds: f64) {
        self.dispatch_seconds.observe(seconds);
    }

    /// Requests recorded so far with the given outcome.
    pub fn count(&self, outcome: Outcome) -> u64 {
        self.requests.with_label_values(&[outcome.as_str()]).get()
    }

    /// Encode all metrics in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
