// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay
//!
//! This crate accepts website contact form submissions and relays them by
//! email through an SMTP relay:
//!
//! - Per-client rate limiting (20 requests per 60 second window)
//! - Content-Type and payload schema validation
//! - HTML-escaped notification rendering
//! - SMTP dispatch with a bounded timeout

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod mailer;
pub mod metrics;
pub mod renderer;
pub mod validator;

pub use config::Config;
pub use error::ContactError;
pub use limiter::{RateLimitResult, RateLimiter};
pub use mailer::{DispatchError, Mailer, SmtpMailer};
pub use validator::{Submission, SubmissionValidator, ValidationError};
