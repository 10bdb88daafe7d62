//! Notification batch assembly.
//!
//! A [`NotificationBatch`] is the bounded, self-contained content of one
//! notification email: at most `cap` submissions in store order, each with
//! its image resolved to inline bytes.

use crate::artifacts::{ArtifactStore, InlineArtifact};
use crate::entities::{Event, Submission};
use std::sync::Arc;
use time::UtcOffset;
use tracing::{debug, info, warn};

/// One submission as it appears in the email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub message: String,
    pub author: String,
    /// `None` when the submission had no image or it could not be encoded.
    pub image: Option<InlineArtifact>,
}

/// Event-level data shown alongside the entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchMetadata {
    pub event_name: String,
    pub recipient_name: String,
    pub recipient_email: String,
    /// Local calendar date of the event.
    pub event_date: time::Date,
    pub coordinator_name: String,
    /// Number of submissions before truncation.
    pub total_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationBatch {
    pub metadata: BatchMetadata,
    pub entries: Vec<BatchEntry>,
}

impl NotificationBatch {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_truncated(&self) -> bool {
        self.entries.len() < self.metadata.total_count
    }
}

/// Builds [`NotificationBatch`]es, resolving images through an [`ArtifactStore`].
pub struct BatchBuilder {
    artifacts: Arc<dyn ArtifactStore>,
    cap: usize,
    utc_offset: UtcOffset,
}

impl BatchBuilder {
    pub fn new(artifacts: Arc<dyn ArtifactStore>, cap: usize, utc_offset: UtcOffset) -> Self {
        Self {
            artifacts,
            cap,
            utc_offset,
        }
    }

    /// Build the batch for `event` from its full submission list.
    ///
    /// `submissions` must be in store order (most recent first); the first
    /// `cap` are kept. A failing image only drops that image.
    pub async fn build(&self, event: &Event, mut submissions: Vec<Submission>) -> NotificationBatch {
        let total_count = submissions.len();
        if total_count > self.cap {
            info!(
                event_id = event.id,
                total = total_count,
                cap = self.cap,
                "Capping submissions for email size"
            );
            submissions.truncate(self.cap);
        }

        let mut entries = Vec::with_capacity(submissions.len());
        for submission in submissions {
            let image = match submission.image.as_deref() {
                None | Some("") => None,
                Some(reference) => match self.artifacts.encode_inline(reference).await {
                    Ok(inline) => Some(inline),
                    Err(e) => {
                        warn!(
                            event_id = event.id,
                            submission_id = submission.id,
                            author = %submission.author_name,
                            error = %e,
                            "Could not encode image, sending submission without it"
                        );
                        None
                    }
                },
            };
            entries.push(BatchEntry {
                message: submission.message,
                author: submission.author_name,
                image,
            });
        }

        debug!(
            event_id = event.id,
            entries = entries.len(),
            total = total_count,
            "Built notification batch"
        );

        NotificationBatch {
            metadata: BatchMetadata {
                event_name: event.name.clone(),
                recipient_name: event.recipient_name.clone(),
                recipient_email: event.recipient_email.clone(),
                event_date: event.event_date.to_offset(self.utc_offset).date(),
                coordinator_name: event.coordinator_name.clone(),
                total_count,
            },
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MapArtifactStore, sample_event, sample_submission};
    use time::macros::{date, datetime, offset};

    fn builder(artifacts: MapArtifactStore, cap: usize) -> BatchBuilder {
        BatchBuilder::new(Arc::new(artifacts), cap, offset!(UTC))
    }

    #[tokio::test]
    async fn test_truncates_to_cap_and_keeps_total() {
        let event = sample_event(1, datetime!(2026-10-14 00:00 UTC));
        let submissions: Vec<_> = (0..200).map(|i| sample_submission(i, 1, None)).collect();

        let batch = builder(MapArtifactStore::new(), 150)
            .build(&event, submissions)
            .await;

        assert_eq!(batch.len(), 150);
        assert_eq!(batch.metadata.total_count, 200);
        assert!(batch.is_truncated());
        // First `cap` in store order are kept.
        assert_eq!(batch.entries[0].author, "author-0");
        assert_eq!(batch.entries[149].author, "author-149");
    }

    #[tokio::test]
    async fn test_under_cap_is_untouched() {
        let event = sample_event(1, datetime!(2026-10-14 00:00 UTC));
        let submissions: Vec<_> = (0..3).map(|i| sample_submission(i, 1, None)).collect();

        let batch = builder(MapArtifactStore::new(), 150)
            .build(&event, submissions)
            .await;

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.metadata.total_count, 3);
        assert!(!batch.is_truncated());
    }

    #[tokio::test]
    async fn test_failed_image_keeps_text_and_author() {
        let event = sample_event(1, datetime!(2026-10-14 00:00 UTC));
        let artifacts = MapArtifactStore::new().with("good.png", b"png");
        let submissions = vec![
            sample_submission(1, 1, Some("good.png")),
            sample_submission(2, 1, Some("missing.jpg")),
            sample_submission(3, 1, None),
        ];

        let batch = builder(artifacts, 150).build(&event, submissions).await;

        assert_eq!(batch.len(), 3);
        assert_eq!(
            batch.entries[0].image.as_ref().map(|i| i.media_type),
            Some("image/png")
        );
        assert_eq!(batch.entries[1].image, None);
        assert_eq!(batch.entries[1].author, "author-2");
        assert_eq!(batch.entries[1].message, "message from author-2");
        assert_eq!(batch.entries[2].image, None);
    }

    #[tokio::test]
    async fn test_empty_submissions_give_empty_batch() {
        let event = sample_event(1, datetime!(2026-10-14 00:00 UTC));
        let batch = builder(MapArtifactStore::new(), 150)
            .build(&event, Vec::new())
            .await;
        assert!(batch.is_empty());
        assert_eq!(batch.metadata.total_count, 0);
    }

    #[tokio::test]
    async fn test_metadata_uses_local_date() {
        // Midnight at +09:00 is still the previous day in UTC.
        let event = sample_event(1, datetime!(2026-10-14 00:00 +09:00));
        let batch = BatchBuilder::new(Arc::new(MapArtifactStore::new()), 150, offset!(+09:00))
            .build(&event, Vec::new())
            .await;
        assert_eq!(batch.metadata.event_date, date!(2026 - 10 - 14));
        assert_eq!(batch.metadata.event_name, event.name);
        assert_eq!(batch.metadata.recipient_email, event.recipient_email);
    }
}
