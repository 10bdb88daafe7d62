//! Fixtures and doubles shared by the unit tests.

use crate::artifacts::{ArtifactError, ArtifactStore, InlineArtifact, media_type_for};
use crate::batch::NotificationBatch;
use crate::entities::{Event, Submission};
use crate::mail::{DeliveryError, MailTransport, OutgoingMail};
use crate::render::{RenderError, TemplateRenderer};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

const CREATED_BASE: OffsetDateTime = datetime!(2026-09-01 12:00 UTC);

/// An unsent, active event dated at `event_date`.
pub fn sample_event(id: i64, event_date: OffsetDateTime) -> Event {
    Event {
        id,
        name: format!("Event {id}"),
        slug: format!("event-{id}"),
        description: String::new(),
        event_date,
        active: true,
        coordinator_name: "Coordinator".to_string(),
        coordinator_contact: "coordinator@example.com".to_string(),
        recipient_name: "Recipient".to_string(),
        recipient_email: format!("recipient-{id}@example.com"),
        email_sent: false,
        email_sent_at: None,
        website_link: format!("https://messages.example.com/event/event-{id}/messages"),
        created_at: CREATED_BASE,
    }
}

/// An event already notified at `sent_at`.
pub fn notified_event(id: i64, sent_at: OffsetDateTime) -> Event {
    Event {
        active: false,
        email_sent: true,
        email_sent_at: Some(sent_at),
        ..sample_event(id, sent_at)
    }
}

/// Submission `i` of `event_id`. Higher `i` means older.
pub fn sample_submission(i: i64, event_id: i64, image: Option<&str>) -> Submission {
    Submission {
        id: event_id * 10_000 + i,
        event_id,
        author_name: format!("author-{i}"),
        message: format!("message from author-{i}"),
        image: image.map(str::to_string),
        created_at: CREATED_BASE - Duration::minutes(i),
    }
}

/// In-memory [`ArtifactStore`] keyed by reference.
#[derive(Default)]
pub struct MapArtifactStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
    removed: Mutex<Vec<String>>,
    fail_remove: AtomicBool,
}

impl MapArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reference: &str, bytes: &[u8]) -> Self {
        if let Ok(files) = self.files.get_mut() {
            files.insert(reference.to_string(), bytes.to_vec());
        }
        self
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.files.lock().unwrap().contains_key(reference)
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }

    pub fn set_fail_remove(&self, fail: bool) {
        self.fail_remove.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ArtifactStore for MapArtifactStore {
    async fn store(&self, bytes: &[u8], _media_type: &str) -> Result<String, ArtifactError> {
        let mut files = self.files.lock().unwrap();
        let reference = format!("artifact-{}.png", files.len());
        files.insert(reference.clone(), bytes.to_vec());
        Ok(reference)
    }

    async fn encode_inline(&self, reference: &str) -> Result<InlineArtifact, ArtifactError> {
        let files = self.files.lock().unwrap();
        match files.get(reference) {
            Some(bytes) => Ok(InlineArtifact {
                bytes: bytes.clone(),
                media_type: media_type_for(reference),
            }),
            None => Err(ArtifactError::Io(std::io::Error::from(
                std::io::ErrorKind::NotFound,
            ))),
        }
    }

    async fn remove(&self, reference: &str) -> Result<(), ArtifactError> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(ArtifactError::Io(std::io::Error::other("remove failure")));
        }
        self.files.lock().unwrap().remove(reference);
        self.removed.lock().unwrap().push(reference.to_string());
        Ok(())
    }
}

/// [`MailTransport`] that records every mail and can be told to fail.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutgoingMail>>,
    fail: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let transport = Self::default();
        transport.set_fail(true);
        transport
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), DeliveryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeliveryError::Transport("relay unreachable".to_string()));
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

/// [`TemplateRenderer`] listing authors and messages as plain lines.
pub struct PlainRenderer;

impl TemplateRenderer for PlainRenderer {
    fn render(&self, batch: &NotificationBatch) -> Result<String, RenderError> {
        let mut out = format!(
            "{} ({} of {})\n",
            batch.metadata.event_name,
            batch.len(),
            batch.metadata.total_count
        );
        for entry in &batch.entries {
            out.push_str(&format!("{}: {}\n", entry.author, entry.message));
        }
        Ok(out)
    }
}

/// [`TemplateRenderer`] that always fails.
pub struct BrokenRenderer;

impl TemplateRenderer for BrokenRenderer {
    fn render(&self, _batch: &NotificationBatch) -> Result<String, RenderError> {
        Err(RenderError::Io(std::io::Error::other("template unavailable")))
    }
}
