// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for abuse simulation.

use serde_json::json;
use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of IP addresses for testing.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// Message bodies carrying markup that must never reach the HTML body raw.
pub fn generate_markup_payloads() -> Vec<&'static str> {
    vec![
        "<script>alert(1)</script>",
        "<img src=x onerror=alert(1)>",
        "\"><svg onload=alert(1)>",
        "'; DROP TABLE users; --",
        "</pre><iframe src=\"https://evil.example\"></iframe>",
        "&lt;already escaped&gt;",
    ]
}

/// Display names attempting to smuggle extra headers.
pub fn generate_header_injections() -> Vec<&'static str> {
    vec![
        "Jo\r\nBcc: victim@example.com",
        "Jo\nSubject: spoofed",
        "Jo\rX-Mailer: evil",
        "Jo\u{0}Cc: victim@example.com",
    ]
}

/// Email addresses that must fail validation.
pub fn generate_invalid_emails() -> Vec<&'static str> {
    vec![
        "",
        "plainaddress",
        "@missing-user.com",
        "missing-domain@",
        "two@@example.com",
        "spaces in@example.com",
        "jo@x.com\r\nBcc: victim@example.com",
        "jo@localhost",
        "jo@x",
        "jo@[127.0.0.1]",
    ]
}

/// A valid submission with the given name and message.
pub fn submission(name: &str, message: &str) -> String {
    json!({ "name": name, "email": "jo@x.com", "message": message }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ips() {
        let ips = generate_ips(256);
        assert_eq!(ips.len(), 256);
        // All should be unique
        let unique: std::collections::HashSet<_> = ips.iter().collect();
        assert_eq!(unique.len(), 256);
    }
}
