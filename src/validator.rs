// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Contact submission validator.
//!
//! Implements ingress-level validation for contact form requests:
//! - Content-Type validation
//! - Field presence, type and length bounds
//! - Email address syntax
//!
//! Every failing field produces its own [`Violation`]; validation never
//! stops at the first problem.

use crate::config::ValidationConfig;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

pub const NAME_MAX: usize = 100;
pub const PHONE_MAX: usize = 40;
pub const SUBJECT_MAX: usize = 140;
pub const MESSAGE_MAX: usize = 5000;

/// A validated contact form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub email: lettre::Address,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
}

/// Kind of a single schema violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCode {
    InvalidType,
    TooSmall,
    TooBig,
    InvalidString,
}

/// One failed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: Vec<String>,
    pub code: ViolationCode,
    pub message: String,
}

impl Violation {
    fn new(field: &str, code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            path: if field.is_empty() {
                Vec::new()
            } else {
                vec![field.to_string()]
            },
            code,
            message: message.into(),
        }
    }

    /// The field this violation refers to, if any.
    pub fn field(&self) -> Option<&str> {
        self.path.first().map(String::as_str)
    }
}

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid Content-Type: expected one of {expected:?}, got {actual:?}")]
    InvalidContentType {
        expected: Vec<String>,
        actual: Option<String>,
    },

    #[error("Invalid payload: {} violation(s)", .0.len())]
    InvalidPayload(Vec<Violation>),
}

/// Contact submission validator.
pub struct SubmissionValidator {
    config: ValidationConfig,
}

impl SubmissionValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate the Content-Type header.
    pub fn validate_content_type(&self, content_type: Option<&str>) -> Result<(), ValidationError> {
        let ct = content_type.map(|s| {
            // Extract just the media type, ignoring charset etc.
            s.split(';').next().unwrap_or(s).trim().to_lowercase()
        });

        let accepted = match &ct {
            Some(actual) => self
                .config
                .require_content_type
                .iter()
                .any(|expected| expected.eq_ignore_ascii_case(actual)),
            None => false,
        };

        if accepted {
            Ok(())
        } else {
            debug!(content_type = ?ct, "Content-Type invalid");
            Err(ValidationError::InvalidContentType {
                expected: self.config.require_content_type.clone(),
                actual: ct,
            })
        }
    }

    /// Validate an untrusted JSON document against the submission schema.
    pub fn validate(&self, input: &Value) -> Result<Submission, ValidationError> {
        let Some(fields) = input.as_object() else {
            return Err(ValidationError::InvalidPayload(vec![Violation::new(
                "",
                ViolationCode::InvalidType,
                format!("Expected object, received {}", type_name(input)),
            )]));
        };

        let mut violations = Vec::new();

        let name = required_string(fields, "name", 1, NAME_MAX, &mut violations);
        let email = required_string(fields, "email", 0, usize::MAX, &mut violations)
            .and_then(|raw| match raw.parse::<lettre::Address>() {
                Ok(address) if has_public_domain(&address) => Some(address),
                _ => {
                    violations.push(Violation::new(
                        "email",
                        ViolationCode::InvalidString,
                        "Invalid email",
                    ));
                    None
                }
            });
        let phone = optional_string(fields, "phone", PHONE_MAX, &mut violations);
        let subject = optional_string(fields, "subject", SUBJECT_MAX, &mut violations);
        let message = required_string(fields, "message", 1, MESSAGE_MAX, &mut violations);

        match (name, email, phone, subject, message) {
            (Some(name), Some(email), Ok(phone), Ok(subject), Some(message))
                if violations.is_empty() =>
            {
                Ok(Submission {
                    name,
                    email,
                    phone,
                    subject,
                    message,
                })
            }
            _ => {
                debug!(violations = violations.len(), "Submission invalid");
                Err(ValidationError::InvalidPayload(violations))
            }
        }
    }
}

/// Fetch a required string field with a min..=max length bound.
fn required_string(
    fields: &Map<String, Value>,
    field: &str,
    min: usize,
    max: usize,
    violations: &mut Vec<Violation>,
) -> Option<String> {
    match fields.get(field) {
        None | Some(Value::Null) => {
            violations.push(Violation::new(field, ViolationCode::InvalidType, "Required"));
            None
        }
        Some(Value::String(s)) => check_length(field, s, min, max, violations).then(|| s.clone()),
        Some(other) => {
            violations.push(type_mismatch(field, other));
            None
        }
    }
}

/// Fetch an optional string field. Absent and null both mean `None`.
/// `Err(())` marks a field that produced a violation.
fn optional_string(
    fields: &Map<String, Value>,
    field: &str,
    max: usize,
    violations: &mut Vec<Violation>,
) -> Result<Option<String>, ()> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            if check_length(field, s, 0, max, violations) {
                Ok(Some(s.clone()))
            } else {
                Err(())
            }
        }
        Some(other) => {
            violations.push(type_mismatch(field, other));
            Err(())
        }
    }
}

fn check_length(
    field: &str,
    value: &str,
    min: usize,
    max: usize,
    violations: &mut Vec<Violation>,
) -> bool {
    let len = value.chars().count();
    if len < min {
        violations.push(Violation::new(
            field,
            ViolationCode::TooSmall,
            format!("String must contain at least {min} character(s)"),
        ));
        false
    } else if len > max {
        violations.push(Violation::new(
            field,
            ViolationCode::TooBig,
            format!("String must contain at most {max} character(s)"),
        ));
        false
    } else {
        true
    }
}

/// The domain must be a dotted hostname ending in an alphabetic label of at
/// least two letters. Bare hosts and IP literals are rejected.
fn has_public_domain(address: &lettre::Address) -> bool {
    let domain = address.domain();
    if domain.starts_with('[') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    match labels.split_last() {
        Some((tld, rest)) if !rest.is_empty() => {
            tld.len() >= 2
                && tld.chars().all(|c| c.is_ascii_alphabetic())
                && rest.iter().all(|label| !label.is_empty())
        }
        _ => false,
    }
}

fn type_mismatch(field: &str, value: &Value) -> Violation {
    Violation::new(
        field,
        ViolationCode::InvalidType,
        format!("Expected string, received {}", type_name(value)),
    )
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
