// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Notification rendering.
//!
//! Turns a validated [`Submission`] into the subject, plain-text body and
//! HTML body of the notification email. User-supplied strings never reach
//! the HTML body unescaped, and never reach a header with line breaks.

use crate::validator::Submission;
use lettre::message::Mailbox;

/// A notification ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub text: String,
    pub html: String,
    /// Submitter mailbox, used as Reply-To
    pub reply_to: Mailbox,
}

/// Render the notification for a submission.
pub fn render(submission: &Submission) -> RenderedMessage {
    RenderedMessage {
        subject: header_safe(&subject_line(submission)),
        text: text_body(submission),
        html: html_body(submission),
        reply_to: Mailbox::new(
            Some(header_safe(&submission.name)),
            submission.email.clone(),
        ),
    }
}

/// Subject falls back to the sender's name when absent or empty.
fn subject_line(submission: &Submission) -> String {
    match submission.subject.as_deref() {
        Some(subject) if !subject.is_empty() => subject.to_string(),
        _ => format!("New message from {}", submission.name),
    }
}

fn text_body(submission: &Submission) -> String {
    format!(
        "Name: {}\nEmail: {}\nPhone: {}\n\n{}",
        submission.name,
        submission.email,
        submission.phone.as_deref().unwrap_or_default(),
        submission.message
    )
}

fn html_body(submission: &Submission) -> String {
    let mut html = String::from("<div style=\"font-family:system-ui,Arial,sans-serif\">\n");
    html.push_str("  <h2>New Website Inquiry</h2>\n");
    html.push_str(&field("Name", &submission.name));
    html.push_str(&field("Email", submission.email.as_ref()));
    if let Some(phone) = non_empty(&submission.phone) {
        html.push_str(&field("Phone", phone));
    }
    if let Some(subject) = non_empty(&submission.subject) {
        html.push_str(&field("Subject", subject));
    }
    html.push_str("  <hr/>\n");
    html.push_str(&format!(
        "  <pre style=\"white-space:pre-wrap\">{}</pre>\n",
        escape_html(&submission.message)
    ));
    html.push_str("</div>\n");
    html
}

fn field(label: &str, value: &str) -> String {
    format!("  <p><b>{label}:</b> {}</p>\n", escape_html(value))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Escape the five HTML-reserved characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Replace control characters (CR and LF included) with spaces so the value
/// can only ever occupy a single header line.
pub fn header_safe(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}
