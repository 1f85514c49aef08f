use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credentials::CredentialError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationReceipt {
    pub provider: String,
    pub message_id: String,
    pub accepted_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("notification undeliverable: {0}")]
    Undeliverable(String),
    #[error("notification credential unavailable: {0}")]
    CredentialUnavailable(#[from] CredentialError),
}

impl NotifyError {
    /// Delivery errors may be transient; a missing or malformed credential never is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Undeliverable(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    pub destination: String,
    pub subject: String,
    pub body: String,
}

/// Delivery backend. Picked once per deployment, not per request.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn provider(&self) -> &'static str;

    async fn send(
        &self,
        destination: &str,
        subject: &str,
        body: &str,
    ) -> Result<NotificationReceipt, NotifyError>;
}

/// Records every send and can be scripted to fail or stall.
#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<OutboundMessage>>,
    failure: Option<NotifyError>,
    failures_remaining: Mutex<usize>,
    delay: Option<Duration>,
}

impl RecordingNotifier {
    pub fn failing(error: NotifyError) -> Self {
        Self { failure: Some(error), failures_remaining: Mutex::new(usize::MAX), ..Self::default() }
    }

    /// Fails the first `failures` sends with a delivery error, then succeeds.
    pub fn flaky(failures: usize) -> Self {
        Self {
            failure: Some(NotifyError::Undeliverable("provider temporarily unavailable".into())),
            failures_remaining: Mutex::new(failures),
            ..Self::default()
        }
    }

    pub fn stalled(delay: Duration) -> Self {
        Self { delay: Some(delay), ..Self::default() }
    }

    pub fn calls(&self) -> Vec<OutboundMessage> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    fn take_failure(&self) -> Option<NotifyError> {
        let failure = self.failure.as_ref()?;
        let mut remaining = match self.failures_remaining.lock() {
            Ok(remaining) => remaining,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *remaining == 0 {
            return None;
        }
        *remaining = remaining.saturating_sub(1);
        Some(failure.clone())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn provider(&self) -> &'static str {
        "recording"
    }

    async fn send(
        &self,
        destination: &str,
        subject: &str,
        body: &str,
    ) -> Result<NotificationReceipt, NotifyError> {
        let message = OutboundMessage {
            destination: destination.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        };
        match self.calls.lock() {
            Ok(mut calls) => calls.push(message),
            Err(poisoned) => poisoned.into_inner().push(message),
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.take_failure() {
            return Err(error);
        }

        Ok(NotificationReceipt {
            provider: self.provider().to_string(),
            message_id: format!("rec-{}", self.call_count()),
            accepted_at: Utc::now(),
        })
    }
}
