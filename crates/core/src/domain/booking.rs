use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::course::CourseId;
use crate::errors::DomainError;

pub const CONFIRMATION_SUBJECT: &str = "Tee Time Booked";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub String);

impl BookingId {
    /// Random v4 identifier; never derived from a counter or from request data.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub course_id: String,
    pub date: String,
    pub time: String,
    pub contact_address: String,
}

impl BookingRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        let fields = [
            ("course_id", &self.course_id),
            ("date", &self.date),
            ("time", &self.time),
            ("contact_address", &self.contact_address),
        ];

        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(DomainError::InvalidRequest {
                field: (*field).to_string(),
                reason: "must be present and non-empty".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub course_id: CourseId,
    pub date: String,
    pub time: String,
    pub contact_address: String,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn accept(id: BookingId, request: BookingRequest) -> Self {
        Self {
            id,
            course_id: CourseId(request.course_id),
            date: request.date,
            time: request.time,
            contact_address: request.contact_address,
            created_at: Utc::now(),
        }
    }

    pub fn confirmation_body(&self) -> String {
        format!(
            "Your tee time at course {} is booked for {} at {}.",
            self.course_id.0, self.date, self.time
        )
    }
}

/// Per-request lifecycle. `Persisted` is the durability commit point; nothing moves back from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStage {
    Received,
    Persisted,
    NotifySent,
    NotifyFailed,
    Completed,
}

impl BookingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Persisted => "persisted",
            Self::NotifySent => "notify_sent",
            Self::NotifyFailed => "notify_failed",
            Self::Completed => "completed",
        }
    }

    pub fn can_advance_to(self, next: BookingStage) -> bool {
        matches!(
            (self, next),
            (Self::Received, Self::Persisted)
                | (Self::Persisted, Self::NotifySent)
                | (Self::Persisted, Self::NotifyFailed)
                | (Self::NotifySent, Self::Completed)
                | (Self::NotifyFailed, Self::Completed)
        )
    }
}
