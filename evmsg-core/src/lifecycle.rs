//! Event lifecycle: `Active -> Notified -> Deleted`.
//!
//! The predicates are pure and take the current instant explicitly. The
//! transitions go through an [`EventStore`] and refuse to run when the event
//! is not in the expected state.

use crate::artifacts::ArtifactStore;
use crate::entities::{Event, EventState};
use crate::store::{EventStore, StoreError};
use crate::utils::schedule::DayWindow;
use std::sync::Arc;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Store failure
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// The event was notified before; its first notification time is kept.
    #[error("event {0} is already notified")]
    AlreadyNotified(i64),

    /// The event is not past its grace period in the notified state, or no
    /// longer exists.
    #[error("event {0} is not eligible for deletion")]
    NotEligibleForDeletion(i64),
}

/// Whether `event` should be notified during the local day `today`.
pub fn is_due_for_notification(event: &Event, today: &DayWindow) -> bool {
    event.state() == EventState::Active && today.contains(event.event_date)
}

/// Whether `event` may be deleted at `now`.
///
/// The grace period is inclusive: an event notified exactly `grace` ago is
/// eligible.
pub fn is_deletion_eligible(event: &Event, grace: Duration, now: OffsetDateTime) -> bool {
    match event.email_sent_at {
        Some(sent_at) if event.state() == EventState::Notified && !event.active => {
            now - sent_at >= grace
        }
        _ => false,
    }
}

/// Applies lifecycle transitions through the store.
#[derive(Clone)]
pub struct EventLifecycle {
    store: Arc<dyn EventStore>,
    artifacts: Arc<dyn ArtifactStore>,
}

impl EventLifecycle {
    pub fn new(store: Arc<dyn EventStore>, artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self { store, artifacts }
    }

    /// Move `event` to the notified state, stamped with `now`.
    ///
    /// `event` is updated in place once the store accepted the change.
    pub async fn mark_notified(
        &self,
        event: &mut Event,
        now: OffsetDateTime,
    ) -> Result<(), LifecycleError> {
        if event.state() == EventState::Notified {
            return Err(LifecycleError::AlreadyNotified(event.id));
        }
        if !self.store.mark_notified(event.id, now).await? {
            return Err(LifecycleError::AlreadyNotified(event.id));
        }
        event.email_sent = true;
        event.active = false;
        event.email_sent_at = Some(now);
        debug!(event_id = event.id, "Event marked as notified");
        Ok(())
    }

    /// Delete a notified event together with its submissions and images.
    ///
    /// Returns the number of image artifacts removed. Artifacts that cannot
    /// be removed are logged and left behind; the event is gone either way.
    pub async fn delete(
        &self,
        event: &Event,
        grace: Duration,
        now: OffsetDateTime,
    ) -> Result<usize, LifecycleError> {
        if !is_deletion_eligible(event, grace, now) {
            return Err(LifecycleError::NotEligibleForDeletion(event.id));
        }

        let references = self
            .store
            .delete_event(event.id)
            .await?
            .ok_or(LifecycleError::NotEligibleForDeletion(event.id))?;
        let mut removed = 0;
        for reference in &references {
            match self.artifacts.remove(reference).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(
                    event_id = event.id,
                    reference = %reference,
                    error = %e,
                    "Failed to remove image of deleted event"
                ),
            }
        }

        info!(
            event_id = event.id,
            slug = %event.slug,
            images = removed,
            "Deleted event"
        );
        Ok(removed)
    }
}
