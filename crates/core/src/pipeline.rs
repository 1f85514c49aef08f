//! Booking request pipeline.
//!
//! `book` validates, generates the id, persists once, then notifies. Persistence
//! is the commit point: once the store accepts the record the caller gets a
//! confirmation, whatever happens to the notification afterwards. A store failure
//! ends the request before the notifier is touched.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, TracingAuditSink};
use crate::config::NotifierConfig;
use crate::domain::booking::{
    Booking, BookingId, BookingRequest, BookingStage, CONFIRMATION_SUBJECT,
};
use crate::errors::{ApplicationError, DomainError};
use crate::notify::{NotificationReceipt, Notifier, NotifyError};

const ACTOR: &str = "booking-pipeline";
const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("booking `{0}` already exists")]
    DuplicateKey(BookingId),
    #[error("booking store backend error: {0}")]
    Backend(String),
}

/// Durable booking persistence. `create` is a plain insert and must never overwrite.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create(&self, booking: &Booking) -> Result<(), StoreError>;
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, StoreError>;
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BookingError {
    #[error(transparent)]
    InvalidRequest(#[from] DomainError),
    #[error("booking failed: {0}")]
    BookingFailed(#[source] StoreError),
}

impl From<BookingError> for ApplicationError {
    fn from(value: BookingError) -> Self {
        match value {
            BookingError::InvalidRequest(error) => Self::Domain(error),
            BookingError::BookingFailed(error) => Self::Persistence(error.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationOutcome {
    Sent(NotificationReceipt),
    Failed(NotifyError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingConfirmation {
    pub booking_id: BookingId,
    pub notification: NotificationOutcome,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotifyPolicy {
    /// Budget for the whole notify step, retries and backoff included.
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl Default for NotifyPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(200),
        }
    }
}

impl From<&NotifierConfig> for NotifyPolicy {
    fn from(config: &NotifierConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }
}

impl NotifyPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.retry_base_delay.saturating_mul(factor).min(MAX_RETRY_DELAY)
    }
}

pub struct BookingPipeline {
    store: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
    policy: NotifyPolicy,
    audit: Arc<dyn AuditSink>,
}

impl BookingPipeline {
    pub fn new(
        store: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
        policy: NotifyPolicy,
    ) -> Self {
        Self { store, notifier, policy, audit: Arc::new(TracingAuditSink) }
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn notifier_provider(&self) -> &'static str {
        self.notifier.provider()
    }

    pub async fn book(
        &self,
        request: BookingRequest,
        correlation_id: &str,
    ) -> Result<BookingConfirmation, BookingError> {
        let stage = BookingStage::Received;

        if let Err(error) = request.validate() {
            warn!(
                event_name = "booking.request.rejected",
                correlation_id = %correlation_id,
                error = %error,
                "booking request failed validation"
            );
            self.audit.emit(
                AuditEvent::new(
                    None,
                    correlation_id,
                    "booking.request.rejected",
                    AuditCategory::Ingress,
                    ACTOR,
                    AuditOutcome::Rejected,
                )
                .with_metadata("reason", error.to_string()),
            );
            return Err(error.into());
        }

        let booking = Booking::accept(BookingId::generate(), request);

        if let Err(store_error) = self.store.create(&booking).await {
            error!(
                event_name = "booking.persist.failed",
                correlation_id = %correlation_id,
                booking_id = %booking.id,
                error = %store_error,
                "booking could not be persisted; notification skipped"
            );
            self.audit.emit(
                AuditEvent::new(
                    Some(booking.id.clone()),
                    correlation_id,
                    "booking.persist.failed",
                    AuditCategory::Persistence,
                    ACTOR,
                    AuditOutcome::Failed,
                )
                .with_metadata("error", store_error.to_string()),
            );
            return Err(BookingError::BookingFailed(store_error));
        }

        let stage = advance(&booking.id, stage, BookingStage::Persisted);
        info!(
            event_name = "booking.persisted",
            correlation_id = %correlation_id,
            booking_id = %booking.id,
            course_id = %booking.course_id.0,
            "booking persisted"
        );

        let notification = self.notify(&booking, correlation_id).await;
        let stage = match &notification {
            NotificationOutcome::Sent(receipt) => {
                info!(
                    event_name = "booking.notify.sent",
                    correlation_id = %correlation_id,
                    booking_id = %booking.id,
                    provider = %receipt.provider,
                    message_id = %receipt.message_id,
                    "booking confirmation accepted by delivery backend"
                );
                self.audit.emit(
                    AuditEvent::new(
                        Some(booking.id.clone()),
                        correlation_id,
                        "booking.notify.sent",
                        AuditCategory::Notification,
                        ACTOR,
                        AuditOutcome::Success,
                    )
                    .with_metadata("provider", receipt.provider.clone())
                    .with_metadata("message_id", receipt.message_id.clone()),
                );
                advance(&booking.id, stage, BookingStage::NotifySent)
            }
            NotificationOutcome::Failed(notify_error) => {
                warn!(
                    event_name = "booking.notify.failed",
                    correlation_id = %correlation_id,
                    booking_id = %booking.id,
                    provider = self.notifier.provider(),
                    error = %notify_error,
                    "booking saved but confirmation could not be delivered"
                );
                self.audit.emit(
                    AuditEvent::new(
                        Some(booking.id.clone()),
                        correlation_id,
                        "booking.notify.failed",
                        AuditCategory::Notification,
                        ACTOR,
                        AuditOutcome::Failed,
                    )
                    .with_metadata("provider", self.notifier.provider())
                    .with_metadata("error", notify_error.to_string()),
                );
                advance(&booking.id, stage, BookingStage::NotifyFailed)
            }
        };
        advance(&booking.id, stage, BookingStage::Completed);

        Ok(BookingConfirmation { booking_id: booking.id, notification })
    }

    async fn notify(&self, booking: &Booking, correlation_id: &str) -> NotificationOutcome {
        tokio::time::timeout(self.policy.timeout, self.deliver(booking, correlation_id))
            .await
            .unwrap_or_else(|_| {
                NotificationOutcome::Failed(NotifyError::Undeliverable(format!(
                    "delivery backend did not confirm within {}ms",
                    self.policy.timeout.as_millis()
                )))
            })
    }

    async fn deliver(&self, booking: &Booking, correlation_id: &str) -> NotificationOutcome {
        let body = booking.confirmation_body();
        let mut attempt: u32 = 0;

        loop {
            let sent =
                self.notifier.send(&booking.contact_address, CONFIRMATION_SUBJECT, &body).await;

            match sent {
                Ok(receipt) => return NotificationOutcome::Sent(receipt),
                Err(notify_error)
                    if notify_error.is_retryable() && attempt < self.policy.max_retries =>
                {
                    let delay = self.policy.backoff(attempt);
                    attempt += 1;
                    warn!(
                        event_name = "booking.notify.retry",
                        correlation_id = %correlation_id,
                        booking_id = %booking.id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %notify_error,
                        "retrying booking confirmation"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(notify_error) => return NotificationOutcome::Failed(notify_error),
            }
        }
    }
}

fn advance(booking_id: &BookingId, from: BookingStage, to: BookingStage) -> BookingStage {
    debug_assert!(from.can_advance_to(to), "illegal booking stage move {from:?} -> {to:?}");
    debug!(
        event_name = "booking.stage",
        booking_id = %booking_id,
        from = from.as_str(),
        to = to.as_str(),
        "booking stage advanced"
    );
    to
}
