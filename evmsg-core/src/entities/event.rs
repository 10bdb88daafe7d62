use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Local midnight of the event's calendar date, as an instant.
    pub event_date: OffsetDateTime,
    pub active: bool,
    pub coordinator_name: String,
    pub coordinator_contact: String,
    pub recipient_name: String,
    pub recipient_email: String,
    pub email_sent: bool,
    /// Set if and only if `email_sent` is true.
    pub email_sent_at: Option<OffsetDateTime>,
    pub website_link: String,
    pub created_at: OffsetDateTime,
}

/// Position of an event in its lifecycle.
///
/// `Deleted` has no variant: a deleted event has no record left to inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventState {
    /// Collecting submissions, notification not yet sent.
    Active,
    /// Notification delivered; the event is archived and waits for cleanup.
    Notified,
}

impl Event {
    pub fn state(&self) -> EventState {
        if self.email_sent {
            EventState::Notified
        } else {
            EventState::Active
        }
    }
}

/// Optional event fields. Every field defaults to an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDetails {
    pub description: String,
    pub coordinator_name: String,
    pub coordinator_contact: String,
    pub recipient_name: String,
    pub recipient_email: String,
    pub website_link: String,
}

/// Data for inserting a new event.
///
/// New events always start `active = true`, `email_sent = false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub name: String,
    pub slug: String,
    pub event_date: OffsetDateTime,
    pub details: EventDetails,
}

/// Event summary with its submission count, for listings.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EventPreview {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub event_date: OffsetDateTime,
    pub recipient_name: String,
    pub submission_count: i64,
}

#[derive(Debug, Clone)]
/// Insert a new event and return the stored row.
pub struct InsertEvent {
    pub event: NewEvent,
}

impl Processor<InsertEvent> for DatabaseProcessor {
    type Output = Event;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertEvent")]
    async fn process(&self, insert: InsertEvent) -> Result<Event, sqlx::Error> {
        let NewEvent {
            name,
            slug,
            event_date,
            details,
        } = insert.event;
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (
                name, slug, description, event_date, active,
                coordinator_name, coordinator_contact,
                recipient_name, recipient_email, website_link
            )
            VALUES ($1, $2, $3, $4, TRUE, $5, $6, $7, $8, $9)
            RETURNING
                id, name, slug, description, event_date, active,
                coordinator_name, coordinator_contact,
                recipient_name, recipient_email,
                email_sent, email_sent_at, website_link, created_at
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(details.description)
        .bind(event_date)
        .bind(details.coordinator_name)
        .bind(details.coordinator_contact)
        .bind(details.recipient_name)
        .bind(details.recipient_email)
        .bind(details.website_link)
        .fetch_one(&self.pool)
        .await?;
        Ok(event)
    }
}

#[derive(Debug, Clone)]
/// Whether any event, active or archived, already uses `slug`.
pub struct SlugExists {
    pub slug: String,
}

impl Processor<SlugExists> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:SlugExists")]
    async fn process(&self, query: SlugExists) -> Result<bool, sqlx::Error> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (SELECT 1 FROM events WHERE slug = $1)"#,
        )
        .bind(query.slug)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

#[derive(Debug, Clone)]
/// Look up an active event by slug.
pub struct GetActiveEventBySlug {
    pub slug: String,
}

impl Processor<GetActiveEventBySlug> for DatabaseProcessor {
    type Output = Option<Event>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetActiveEventBySlug")]
    async fn process(&self, query: GetActiveEventBySlug) -> Result<Option<Event>, sqlx::Error> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT
                id, name, slug, description, event_date, active,
                coordinator_name, coordinator_contact,
                recipient_name, recipient_email,
                email_sent, email_sent_at, website_link, created_at
            FROM events
            WHERE slug = $1 AND active = TRUE
            "#,
        )
        .bind(query.slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }
}

#[derive(Debug, Clone)]
/// Look up an event by slug, whatever its state.
pub struct GetEventBySlug {
    pub slug: String,
}

impl Processor<GetEventBySlug> for DatabaseProcessor {
    type Output = Option<Event>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetEventBySlug")]
    async fn process(&self, query: GetEventBySlug) -> Result<Option<Event>, sqlx::Error> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT
                id, name, slug, description, event_date, active,
                coordinator_name, coordinator_contact,
                recipient_name, recipient_email,
                email_sent, email_sent_at, website_link, created_at
            FROM events
            WHERE slug = $1
            "#,
        )
        .bind(query.slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }
}

#[derive(Debug, Clone)]
/// List active events with their submission counts, latest event date first.
pub struct ListActiveEventPreviews;

impl Processor<ListActiveEventPreviews> for DatabaseProcessor {
    type Output = Vec<EventPreview>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListActiveEventPreviews")]
    async fn process(&self, _query: ListActiveEventPreviews) -> Result<Vec<EventPreview>, sqlx::Error> {
        let previews = sqlx::query_as::<_, EventPreview>(
            r#"
            SELECT
                e.id, e.name, e.slug, e.description, e.event_date,
                e.recipient_name,
                COUNT(s.id) AS submission_count
            FROM events e
            LEFT JOIN submissions s ON e.id = s.event_id
            WHERE e.active = TRUE
            GROUP BY e.id
            ORDER BY e.event_date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(previews)
    }
}

#[derive(Debug, Clone)]
/// Unsent events whose `event_date` falls in `[start, end)`.
pub struct ListEventsDueInWindow {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl Processor<ListEventsDueInWindow> for DatabaseProcessor {
    type Output = Vec<Event>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListEventsDueInWindow")]
    async fn process(&self, query: ListEventsDueInWindow) -> Result<Vec<Event>, sqlx::Error> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT
                id, name, slug, description, event_date, active,
                coordinator_name, coordinator_contact,
                recipient_name, recipient_email,
                email_sent, email_sent_at, website_link, created_at
            FROM events
            WHERE event_date >= $1
              AND event_date < $2
              AND email_sent = FALSE
            "#,
        )
        .bind(query.start)
        .bind(query.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }
}

#[derive(Debug, Clone)]
/// Notified, archived events whose notification was sent at or before `cutoff`.
pub struct ListEventsNotifiedBefore {
    pub cutoff: OffsetDateTime,
}

impl Processor<ListEventsNotifiedBefore> for DatabaseProcessor {
    type Output = Vec<Event>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListEventsNotifiedBefore")]
    async fn process(&self, query: ListEventsNotifiedBefore) -> Result<Vec<Event>, sqlx::Error> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT
                id, name, slug, description, event_date, active,
                coordinator_name, coordinator_contact,
                recipient_name, recipient_email,
                email_sent, email_sent_at, website_link, created_at
            FROM events
            WHERE email_sent = TRUE
              AND active = FALSE
              AND email_sent_at IS NOT NULL
              AND email_sent_at <= $1
            "#,
        )
        .bind(query.cutoff)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }
}

#[derive(Debug, Clone)]
/// Record a successful notification.
///
/// Only an unsent event is updated, so the first `email_sent_at` wins.
/// Returns `false` when no row changed.
pub struct MarkEventNotified {
    pub event_id: i64,
    pub at: OffsetDateTime,
}

impl Processor<MarkEventNotified> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:MarkEventNotified")]
    async fn process(&self, update: MarkEventNotified) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET email_sent = TRUE, active = FALSE, email_sent_at = $2
            WHERE id = $1 AND email_sent = FALSE
            "#,
        )
        .bind(update.event_id)
        .bind(update.at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[derive(Debug, Clone)]
/// Delete a notified event; submissions go with it through `ON DELETE CASCADE`.
///
/// Returns the artifact references of the deleted submissions so the caller
/// can remove the files, or `None` when no notified event with that id
/// exists.
pub struct DeleteNotifiedEvent {
    pub event_id: i64,
}

impl Processor<DeleteNotifiedEvent> for DatabaseProcessor {
    type Output = Option<Vec<String>>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:DeleteNotifiedEvent")]
    async fn process(
        &self,
        delete: DeleteNotifiedEvent,
    ) -> Result<Option<Vec<String>>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let images = sqlx::query_scalar::<_, String>(
            r#"
            SELECT image
            FROM submissions
            WHERE event_id = $1 AND image IS NOT NULL
            "#,
        )
        .bind(delete.event_id)
        .fetch_all(&mut *tx)
        .await?;

        let result = sqlx::query(
            r#"
            DELETE FROM events
            WHERE id = $1 AND email_sent = TRUE AND active = FALSE
            "#,
        )
        .bind(delete.event_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(images))
    }
}
