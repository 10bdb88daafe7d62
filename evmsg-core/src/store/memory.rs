use super::{EventStore, StoreError};
use crate::entities::{Event, Submission};
use crate::utils::schedule::DayWindow;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::Mutex;

/// In-memory [`EventStore`] with switchable failures.
#[derive(Default)]
pub struct MemoryEventStore {
    inner: Mutex<Inner>,
    fail_queries: AtomicBool,
    fail_mark_notified: AtomicBool,
    mark_delay_ms: AtomicU64,
    mark_calls: AtomicUsize,
}

#[derive(Default)]
struct Inner {
    events: Vec<Event>,
    submissions: Vec<Submission>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_event(&self, event: Event) {
        self.inner.lock().await.events.push(event);
    }

    pub async fn insert_submission(&self, submission: Submission) {
        self.inner.lock().await.submissions.push(submission);
    }

    pub async fn event(&self, event_id: i64) -> Option<Event> {
        let inner = self.inner.lock().await;
        inner.events.iter().find(|e| e.id == event_id).cloned()
    }

    pub async fn submission_count(&self, event_id: i64) -> usize {
        let inner = self.inner.lock().await;
        inner
            .submissions
            .iter()
            .filter(|s| s.event_id == event_id)
            .count()
    }

    /// Make the listing queries fail.
    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Make `mark_notified` fail.
    pub fn set_fail_mark_notified(&self, fail: bool) {
        self.fail_mark_notified.store(fail, Ordering::SeqCst);
    }

    /// Make `mark_notified` sleep before applying the update.
    pub fn set_mark_delay(&self, delay: Duration) {
        self.mark_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn mark_calls(&self) -> usize {
        self.mark_calls.load(Ordering::SeqCst)
    }

    fn check_queries(&self) -> Result<(), StoreError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("query failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn list_due(&self, window: DayWindow) -> Result<Vec<Event>, StoreError> {
        self.check_queries()?;
        let inner = self.inner.lock().await;
        Ok(inner
            .events
            .iter()
            .filter(|e| window.contains(e.event_date) && !e.email_sent)
            .cloned()
            .collect())
    }

    async fn list_deletion_eligible(
        &self,
        cutoff: OffsetDateTime,
    ) -> Result<Vec<Event>, StoreError> {
        self.check_queries()?;
        let inner = self.inner.lock().await;
        Ok(inner
            .events
            .iter()
            .filter(|e| {
                e.email_sent && !e.active && e.email_sent_at.is_some_and(|at| at <= cutoff)
            })
            .cloned()
            .collect())
    }

    async fn mark_notified(&self, event_id: i64, at: OffsetDateTime) -> Result<bool, StoreError> {
        self.mark_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_mark_notified.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("update failure".to_string()));
        }
        let delay = self.mark_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        let mut inner = self.inner.lock().await;
        match inner
            .events
            .iter_mut()
            .find(|e| e.id == event_id && !e.email_sent)
        {
            Some(event) => {
                event.email_sent = true;
                event.active = false;
                event.email_sent_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_event(&self, event_id: i64) -> Result<Option<Vec<String>>, StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(pos) = inner
            .events
            .iter()
            .position(|e| e.id == event_id && e.email_sent && !e.active)
        else {
            return Ok(None);
        };
        inner.events.remove(pos);
        let images = inner
            .submissions
            .iter()
            .filter(|s| s.event_id == event_id)
            .filter_map(|s| s.image.clone())
            .collect();
        inner.submissions.retain(|s| s.event_id != event_id);
        Ok(Some(images))
    }

    async fn list_submissions(&self, event_id: i64) -> Result<Vec<Submission>, StoreError> {
        self.check_queries()?;
        let inner = self.inner.lock().await;
        let mut submissions: Vec<_> = inner
            .submissions
            .iter()
            .filter(|s| s.event_id == event_id)
            .cloned()
            .collect();
        submissions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(submissions)
    }
}
