//! Notifier: builds, renders and sends the notification email of one event,
//! then records the event as notified.
//!
//! The steps are strictly ordered. The state write happens only after the
//! transport accepted the message, so a crash in between causes a duplicate
//! send on the next run rather than a lost notification.

use crate::artifacts::ArtifactStore;
use crate::batch::BatchBuilder;
use crate::entities::{Event, EventState};
use crate::lifecycle::{EventLifecycle, LifecycleError};
use crate::mail::{DeliveryError, MailTransport, OutgoingMail};
use crate::render::{RenderError, TemplateRenderer};
use crate::store::{EventStore, StoreError};
use std::sync::Arc;
use thiserror::Error;
use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, error, info, warn};

/// Payload size above which a warning is logged, in KB.
const LARGE_EMAIL_KB: usize = 15_000;

/// Errors that can occur while notifying one event.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Submissions could not be read
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// The email body could not be rendered
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// The transport did not accept the email; nothing was recorded
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// The email went out but the event could not be marked as notified
    #[error("email sent but state update failed: {0}")]
    StateUpdate(LifecycleError),

    /// The task recording the notification panicked
    #[error("email sent but state update task failed: {0}")]
    StateTask(tokio::task::JoinError),
}

/// Result of a successful [`Notifier::notify`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// One email was delivered and the event is now notified.
    Sent { submissions: usize },
    /// The event has no submissions yet; it stays active.
    NothingToSend,
    /// The event was notified before; nothing was done.
    AlreadyNotified,
}

pub struct Notifier {
    store: Arc<dyn EventStore>,
    artifacts: Arc<dyn ArtifactStore>,
    renderer: Arc<dyn TemplateRenderer>,
    transport: Arc<dyn MailTransport>,
    lifecycle: EventLifecycle,
}

impl Notifier {
    pub fn new(
        store: Arc<dyn EventStore>,
        artifacts: Arc<dyn ArtifactStore>,
        renderer: Arc<dyn TemplateRenderer>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        let lifecycle = EventLifecycle::new(store.clone(), artifacts.clone());
        Self {
            store,
            artifacts,
            renderer,
            transport,
            lifecycle,
        }
    }

    /// Notify `event`, keeping at most `cap` submissions.
    ///
    /// `utc_offset` decides the local event date shown in the email and `now`
    /// is the recorded notification time. On success `event` reflects the new
    /// state.
    pub async fn notify(
        &self,
        event: &mut Event,
        cap: usize,
        utc_offset: UtcOffset,
        now: OffsetDateTime,
    ) -> Result<NotifyOutcome, NotifyError> {
        if event.state() == EventState::Notified {
            debug!(event_id = event.id, "Event already notified, skipping");
            return Ok(NotifyOutcome::AlreadyNotified);
        }

        let submissions = self.store.list_submissions(event.id).await?;
        let batch = BatchBuilder::new(self.artifacts.clone(), cap, utc_offset)
            .build(event, submissions)
            .await;

        if batch.is_empty() {
            info!(
                event_id = event.id,
                slug = %event.slug,
                "No submissions yet, not sending"
            );
            return Ok(NotifyOutcome::NothingToSend);
        }

        let html = self.renderer.render(&batch)?;
        let size_kb = html.len() / 1024;
        debug!(event_id = event.id, size_kb, "Rendered notification email");
        if size_kb > LARGE_EMAIL_KB {
            warn!(
                event_id = event.id,
                size_kb,
                "Notification email is very large and may be rejected"
            );
        }

        let mail = OutgoingMail {
            to: event.recipient_email.clone(),
            subject: format!("Your {} Messages", event.name),
            html,
        };
        self.transport.send(&mail).await?;

        // Detached: once the email is out, dropping this future must not
        // cancel the state write.
        let lifecycle = self.lifecycle.clone();
        let mut marked = event.clone();
        let update = tokio::spawn(async move {
            let result = lifecycle.mark_notified(&mut marked, now).await;
            (marked, result)
        });
        let result = match update.await {
            Ok((marked, result)) => {
                *event = marked;
                result.map_err(NotifyError::StateUpdate)
            }
            Err(e) => Err(NotifyError::StateTask(e)),
        };

        if let Err(e) = result {
            error!(
                event_id = event.id,
                slug = %event.slug,
                error = %e,
                "CRITICAL: email was delivered but the event could not be marked as notified; it may be sent again"
            );
            return Err(e);
        }

        info!(
            event_id = event.id,
            slug = %event.slug,
            to = %event.recipient_email,
            submissions = batch.len(),
            total = batch.metadata.total_count,
            "Sent notification email"
        );
        Ok(NotifyOutcome::Sent {
            submissions: batch.len(),
        })
    }
}
