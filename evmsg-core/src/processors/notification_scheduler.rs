//! NotificationScheduler processor.
//!
//! Once at startup and then every day at the configured local time, the
//! NotificationScheduler:
//! - Lists the unsent events dated today
//! - Hands each one to the [`Notifier`]
//! - Logs per-event failures and carries on with the next event
//!
//! Failed events are simply picked up again by the next run.

use super::notifier::{Notifier, NotifyOutcome};
use crate::config::{ConfigStore, NOTIFICATION_PERIOD, SchedulerConfig};
use crate::lifecycle::is_due_for_notification;
use crate::store::{EventStore, StoreError};
use crate::utils::schedule::{DayWindow, next_run_at, wait_duration};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Counters for one notification run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub due: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct NotificationScheduler {
    store: Arc<dyn EventStore>,
    notifier: Notifier,
    config: ConfigStore<SchedulerConfig>,
}

impl NotificationScheduler {
    pub fn new(
        store: Arc<dyn EventStore>,
        notifier: Notifier,
        config: ConfigStore<SchedulerConfig>,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Run the NotificationScheduler until `shutdown_rx` turns true.
    ///
    /// Waiting for the next run is interrupted by shutdown and by scheduler
    /// config changes; a run in progress always completes (or times out).
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("NotificationScheduler started");

        let mut config_rx = self.config.subscribe();
        self.run_bounded(OffsetDateTime::now_utc()).await;
        let mut last_fire: Option<OffsetDateTime> = None;

        loop {
            if *shutdown_rx.borrow() {
                info!("NotificationScheduler received shutdown signal");
                break;
            }

            let config = self.config.snapshot();
            let now = OffsetDateTime::now_utc();
            // Never pick the slot that was just served again.
            let base = last_fire.map_or(now, |fired| now.max(fired + time::Duration::SECOND));
            let next = next_run_at(
                base,
                config.utc_offset,
                config.notification_time,
                NOTIFICATION_PERIOD,
            );
            let wait = wait_duration(now, next);
            debug!(next_run = %next, wait_secs = wait.as_secs(), "Next notification run scheduled");

            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("NotificationScheduler received shutdown signal");
                        break;
                    }
                }

                changed = config_rx.changed() => {
                    if changed.is_ok() {
                        info!("Scheduler config changed, recomputing next notification run");
                    }
                }

                _ = tokio::time::sleep(wait) => {
                    last_fire = Some(next);
                    self.run_bounded(OffsetDateTime::now_utc()).await;
                }
            }
        }

        info!("NotificationScheduler shutdown complete");
    }

    /// [`Self::run_once`] bounded by the configured task timeout.
    async fn run_bounded(&self, now: OffsetDateTime) -> Option<RunSummary> {
        let timeout = self.config.snapshot().task_timeout;
        match tokio::time::timeout(timeout, self.run_once(now)).await {
            Ok(Ok(summary)) => {
                info!(
                    due = summary.due,
                    sent = summary.sent,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    "Notification run finished"
                );
                Some(summary)
            }
            Ok(Err(e)) => {
                error!(error = %e, "Notification run aborted: could not list due events");
                None
            }
            Err(_) => {
                warn!(
                    timeout_secs = timeout.as_secs(),
                    "Notification run timed out and was abandoned"
                );
                None
            }
        }
    }

    /// Notify every event due on the local day containing `now`.
    ///
    /// Only the initial query can fail the run; per-event errors are logged
    /// and counted.
    pub async fn run_once(&self, now: OffsetDateTime) -> Result<RunSummary, StoreError> {
        let config = self.config.snapshot();
        let today = DayWindow::containing(now, config.utc_offset);
        let events = self.store.list_due(today).await?;
        debug!(date = %today.date(), due = events.len(), "Listed due events");

        let mut summary = RunSummary {
            due: events.len(),
            ..RunSummary::default()
        };

        for mut event in events {
            if !is_due_for_notification(&event, &today) {
                summary.skipped += 1;
                continue;
            }

            match self
                .notifier
                .notify(&mut event, config.submission_cap, config.utc_offset, now)
                .await
            {
                Ok(NotifyOutcome::Sent { .. }) => summary.sent += 1,
                Ok(NotifyOutcome::NothingToSend | NotifyOutcome::AlreadyNotified) => {
                    summary.skipped += 1
                }
                Err(e) => {
                    summary.failed += 1;
                    error!(
                        event_id = event.id,
                        slug = %event.slug,
                        error = %e,
                        "Failed to notify event"
                    );
                }
            }
        }

        Ok(summary)
    }
}
