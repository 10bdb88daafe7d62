use super::{EventStore, StoreError};
use crate::entities::event::{
    DeleteNotifiedEvent, ListEventsDueInWindow, ListEventsNotifiedBefore, MarkEventNotified,
};
use crate::entities::submission::ListSubmissionsForEvent;
use crate::entities::{Event, Submission};
use crate::framework::DatabaseProcessor;
use crate::utils::schedule::DayWindow;
use async_trait::async_trait;
use kanau::processor::Processor;
use sqlx::PgPool;
use time::OffsetDateTime;

/// [`EventStore`] backed by Postgres.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    db: DatabaseProcessor,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            db: DatabaseProcessor::new(pool),
        }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn list_due(&self, window: DayWindow) -> Result<Vec<Event>, StoreError> {
        let events = self
            .db
            .process(ListEventsDueInWindow {
                start: window.start(),
                end: window.end(),
            })
            .await?;
        Ok(events)
    }

    async fn list_deletion_eligible(
        &self,
        cutoff: OffsetDateTime,
    ) -> Result<Vec<Event>, StoreError> {
        let events = self.db.process(ListEventsNotifiedBefore { cutoff }).await?;
        Ok(events)
    }

    async fn mark_notified(&self, event_id: i64, at: OffsetDateTime) -> Result<bool, StoreError> {
        let updated = self.db.process(MarkEventNotified { event_id, at }).await?;
        Ok(updated)
    }

    async fn delete_event(&self, event_id: i64) -> Result<Option<Vec<String>>, StoreError> {
        let images = self.db.process(DeleteNotifiedEvent { event_id }).await?;
        Ok(images)
    }

    async fn list_submissions(&self, event_id: i64) -> Result<Vec<Submission>, StoreError> {
        let submissions = self
            .db
            .process(ListSubmissionsForEvent { event_id })
            .await?;
        Ok(submissions)
    }
}
