// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Stub mailer that records what it was asked to send.

use async_trait::async_trait;
use contact_relay::{mailer::DispatchError, renderer::RenderedMessage, Mailer};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
enum Behaviour {
    Succeed,
    Fail,
    Hang(Duration),
}

pub struct StubMailer {
    behaviour: Behaviour,
    sent: Mutex<Vec<RenderedMessage>>,
}

impl StubMailer {
    fn with(behaviour: Behaviour) -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            behaviour,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn succeeding() -> std::sync::Arc<Self> {
        Self::with(Behaviour::Succeed)
    }

    /// Fails every dispatch the way a relay refusing the message would.
    pub fn failing() -> std::sync::Arc<Self> {
        Self::with(Behaviour::Fail)
    }

    /// Never completes within `delay`.
    pub fn hanging(delay: Duration) -> std::sync::Arc<Self> {
        Self::with(Behaviour::Hang(delay))
    }

    /// Messages handed to this mailer so far.
    pub fn sent(&self) -> Vec<RenderedMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for StubMailer {
    async fn send(&self, message: RenderedMessage) -> Result<(), DispatchError> {
        if let Behaviour::Hang(delay) = self.behaviour {
            tokio::time::sleep(delay).await;
        }

        self.sent.lock().unwrap().push(message);

        match self.behaviour {
            Behaviour::Fail => Err(DispatchError::Rejected(
                "554 5.7.1 relay access denied".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
