//! Event store abstraction used by the lifecycle, notifier and schedulers.
//!
//! [`PgEventStore`] is the production implementation; it forwards each call
//! to a query processor in [`crate::entities`].

#[cfg(test)]
pub(crate) mod memory;
mod postgres;

pub use postgres::PgEventStore;

use crate::entities::{Event, Submission};
use crate::utils::schedule::DayWindow;
use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

/// Errors raised by an [`EventStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Non-database backend failure
    #[error("store backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Unsent events dated inside `window`, in the store's default order.
    async fn list_due(&self, window: DayWindow) -> Result<Vec<Event>, StoreError>;

    /// Notified, archived events whose notification is at or before `cutoff`.
    async fn list_deletion_eligible(
        &self,
        cutoff: OffsetDateTime,
    ) -> Result<Vec<Event>, StoreError>;

    /// Atomically set `email_sent`, clear `active` and stamp `email_sent_at`.
    ///
    /// Returns `false` if the event was already notified or no longer exists.
    async fn mark_notified(&self, event_id: i64, at: OffsetDateTime) -> Result<bool, StoreError>;

    /// Delete a notified event and its submissions.
    ///
    /// Returns the artifact references that belonged to the deleted
    /// submissions. An event that is missing or not in the notified state is
    /// left alone and yields `None`.
    async fn delete_event(&self, event_id: i64) -> Result<Option<Vec<String>>, StoreError>;

    /// Submissions of an event, most recent first.
    async fn list_submissions(&self, event_id: i64) -> Result<Vec<Submission>, StoreError>;
}
