// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Mail dispatch.
//!
//! [`Mailer`] is the seam between the request pipeline and the outbound
//! relay. [`SmtpMailer`] talks to an SMTP relay through `lettre`.

use crate::config::MailConfig;
use crate::renderer::RenderedMessage;
use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Port used for implicit TLS; anything else negotiates STARTTLS.
const SMTPS_PORT: u16 = 465;

/// Dispatch error types.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid mailbox address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("SMTP relay rejected the message with code {0}")]
    Rejected(String),

    #[error("Dispatch timed out after {0:?}")]
    Timeout(Duration),
}

/// Hands a rendered notification to the outbound relay.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: RenderedMessage) -> Result<(), DispatchError>;
}

/// Fixed sender and recipient of every notification.
#[derive(Debug, Clone)]
pub struct Envelope {
    from: Mailbox,
    to: Mailbox,
}

impl Envelope {
    pub fn from_config(config: &MailConfig) -> Result<Self, DispatchError> {
        Ok(Self {
            from: Mailbox::new(Some(config.sender_name.clone()), config.username.parse()?),
            to: Mailbox::new(None, config.recipient().parse()?),
        })
    }

    /// Build the multipart (text + HTML) email for a rendered notification.
    pub fn build(&self, message: RenderedMessage) -> Result<Message, DispatchError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .reply_to(message.reply_to)
            .subject(message.subject)
            .multipart(MultiPart::alternative_plain_html(message.text, message.html))
            .map_err(Into::into)
    }
}

/// SMTP relay mailer.
pub struct SmtpMailer {
    envelope: Envelope,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, DispatchError> {
        let builder = if config.smtp_port == SMTPS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
        };

        let transport = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(config.timeout()))
            .build();

        Ok(Self {
            envelope: Envelope::from_config(config)?,
            transport,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: RenderedMessage) -> Result<(), DispatchError> {
        let email = self.envelope.build(message)?;
        let response = self.transport.send(email).await?;

        if response.is_positive() {
            debug!(code = %response.code(), "Relay accepted message");
            Ok(())
        } else {
            Err(DispatchError::Rejected(response.code().to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::render;
    use crate::validator::Submission;

    fn mail_config() -> MailConfig {
        MailConfig {
            username: "relay@example.com".to_string(),
            password: "secret".to_string(),
            ..Default::default()
        }
    }

    fn rendered() -> RenderedMessage {
        render(&Submission {
            name: "Jo".to_string(),
            email: "jo@x.com".parse().unwrap(),
            phone: None,
            subject: None,
            message: "Hello".to_string(),
        })
    }

    #[test]
    fn test_recipient_defaults_to_relay_account() {
        let envelope = Envelope::from_config(&mail_config()).unwrap();
        let email = envelope.build(rendered()).unwrap();

        assert_eq!(
            email.envelope().from().map(ToString::to_string).as_deref(),
            Some("relay@example.com")
        );
        let to: Vec<String> = email.envelope().to().iter().map(ToString::to_string).collect();
        assert_eq!(to, vec!["relay@example.com"]);
    }

    #[test]
    fn test_recipient_override_and_headers() {
        let config = MailConfig {
            recipient: Some("inbox@example.org".to_string()),
            ..mail_config()
        };
        let email = Envelope::from_config(&config)
            .unwrap()
            .build(rendered())
            .unwrap();

        let to: Vec<String> = email.envelope().to().iter().map(ToString::to_string).collect();
        assert_eq!(to, vec!["inbox@example.org"]);

        let formatted = String::from_utf8(email.formatted()).unwrap();
        assert!(formatted.contains("Subject: New message from Jo"));
        assert!(formatted.contains("Reply-To: "));
        assert!(formatted.contains("<jo@x.com>"));
        assert!(formatted.contains("Website Form"));
        assert!(formatted.contains("multipart/alternative"));
        assert!(formatted.contains("text/html"));
    }

    #[test]
    fn test_invalid_sender_rejected() {
        let config = MailConfig {
            username: "not-an-address".to_string(),
            ..mail_config()
        };
        assert!(matches!(
            Envelope::from_config(&config),
            Err(DispatchError::Address(_))
        ));
    }

    #[tokio::test]
    async fn test_smtp_mailer_builds_without_connecting() {
        assert!(SmtpMailer::new(&mail_config()).is_ok());
        assert!(SmtpMailer::new(&MailConfig {
            smtp_port: 587,
            ..mail_config()
        })
        .is_ok());
    }
}
