use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Request body for creating a new event.
///
/// Only `name`, `recipient_name` and `recipient_email` are mandatory; the
/// remaining text fields default to an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    /// Calendar date of the event (`YYYY-MM-DD`).
    pub event_date: time::Date,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub coordinator: String,
    #[serde(default)]
    pub coordinator_contact: String,
    pub recipient_name: String,
    pub recipient_email: String,
}

impl CreateEventRequest {
    /// Check required fields and that `event_date` is not before `today`.
    pub fn validate(&self, today: time::Date) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.recipient_name.trim().is_empty() {
            return Err(ValidationError::MissingField("recipient_name"));
        }
        if self.recipient_email.trim().is_empty() {
            return Err(ValidationError::MissingField("recipient_email"));
        }
        if self.event_date < today {
            return Err(ValidationError::DateInPast);
        }
        Ok(())
    }
}

/// Full event details returned after creation or lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventResponse {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub event_date: time::Date,
    pub coordinator: String,
    pub coordinator_contact: String,
    pub recipient_name: String,
    pub website_link: String,
    /// Unix timestamp of when the event was created.
    pub created_at: i64,
}

/// Lightweight event entry for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPreviewResponse {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub event_date: time::Date,
    pub recipient_name: String,
    pub submission_count: i64,
}
