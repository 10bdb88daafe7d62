//! CleanupScheduler processor.
//!
//! Every week at 02:00 local time, deletes the events whose notification is
//! older than the grace period, together with their submissions and images.

use crate::config::{CLEANUP_PERIOD, CLEANUP_TIME, ConfigStore, SchedulerConfig};
use crate::lifecycle::EventLifecycle;
use crate::store::{EventStore, StoreError};
use crate::utils::schedule::{next_run_at, wait_duration};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Counters for one cleanup run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub eligible: usize,
    pub deleted: usize,
    pub failed: usize,
}

pub struct CleanupScheduler {
    store: Arc<dyn EventStore>,
    lifecycle: EventLifecycle,
    config: ConfigStore<SchedulerConfig>,
}

impl CleanupScheduler {
    pub fn new(
        store: Arc<dyn EventStore>,
        lifecycle: EventLifecycle,
        config: ConfigStore<SchedulerConfig>,
    ) -> Self {
        Self {
            store,
            lifecycle,
            config,
        }
    }

    /// Run the CleanupScheduler until `shutdown_rx` turns true.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("CleanupScheduler started");

        let mut config_rx = self.config.subscribe();
        let mut last_fire: Option<OffsetDateTime> = None;

        loop {
            if *shutdown_rx.borrow() {
                info!("CleanupScheduler received shutdown signal");
                break;
            }

            let offset = self.config.snapshot().utc_offset;
            let now = OffsetDateTime::now_utc();
            let base = last_fire.map_or(now, |fired| now.max(fired + time::Duration::SECOND));
            let next = next_run_at(base, offset, CLEANUP_TIME, CLEANUP_PERIOD);
            let wait = wait_duration(now, next);
            debug!(next_run = %next, wait_secs = wait.as_secs(), "Next cleanup run scheduled");

            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("CleanupScheduler received shutdown signal");
                        break;
                    }
                }

                changed = config_rx.changed() => {
                    if changed.is_ok() {
                        info!("Scheduler config changed, recomputing next cleanup run");
                    }
                }

                _ = tokio::time::sleep(wait) => {
                    last_fire = Some(next);
                    self.run_bounded(OffsetDateTime::now_utc()).await;
                }
            }
        }

        info!("CleanupScheduler shutdown complete");
    }

    async fn run_bounded(&self, now: OffsetDateTime) -> Option<CleanupSummary> {
        let timeout = self.config.snapshot().task_timeout;
        match tokio::time::timeout(timeout, self.run_once(now)).await {
            Ok(Ok(summary)) => {
                info!(
                    eligible = summary.eligible,
                    deleted = summary.deleted,
                    failed = summary.failed,
                    "Cleanup run finished"
                );
                Some(summary)
            }
            Ok(Err(e)) => {
                error!(error = %e, "Cleanup run aborted: could not list eligible events");
                None
            }
            Err(_) => {
                warn!(
                    timeout_secs = timeout.as_secs(),
                    "Cleanup run timed out and was abandoned"
                );
                None
            }
        }
    }

    /// Delete every event whose grace period has ended by `now`.
    pub async fn run_once(&self, now: OffsetDateTime) -> Result<CleanupSummary, StoreError> {
        let grace = self.config.snapshot().grace_period();
        let events = self.store.list_deletion_eligible(now - grace).await?;

        let mut summary = CleanupSummary {
            eligible: events.len(),
            ..CleanupSummary::default()
        };

        for event in events {
            match self.lifecycle.delete(&event, grace, now).await {
                Ok(_) => summary.deleted += 1,
                Err(e) => {
                    summary.failed += 1;
                    error!(
                        event_id = event.id,
                        slug = %event.slug,
                        error = %e,
                        "Failed to delete event"
                    );
                }
            }
        }

        Ok(summary)
    }
}
