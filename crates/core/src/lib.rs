pub mod audit;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod errors;
pub mod notify;
pub mod pipeline;

pub use audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
pub use credentials::{Credential, CredentialError, CredentialResolver, SecretStore};
pub use domain::booking::{Booking, BookingId, BookingRequest, BookingStage};
pub use domain::course::{Course, CourseId, CourseQuery};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use notify::{NotificationReceipt, Notifier, NotifyError, RecordingNotifier};
pub use pipeline::{
    BookingConfirmation, BookingError, BookingPipeline, BookingStore, NotificationOutcome,
    NotifyPolicy, StoreError,
};
