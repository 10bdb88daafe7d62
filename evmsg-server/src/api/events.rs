use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use evmsg_core::entities::event::{
    GetActiveEventBySlug, InsertEvent, ListActiveEventPreviews, SlugExists,
};
use evmsg_core::entities::{Event, EventDetails, EventPreview, NewEvent};
use evmsg_core::framework::DatabaseProcessor;
use evmsg_core::utils::schedule::local_midnight;
use evmsg_core::utils::slug::{slug_candidate, slugify};
use evmsg_sdk::objects::{CreateEventRequest, EventPreviewResponse, EventResponse};
use kanau::processor::Processor;
use time::UtcOffset;

use super::ApiError;
use crate::state::AppState;

/// Upper bound on `-N` suffixes tried for one name.
const MAX_SLUG_ATTEMPTS: u32 = 100;

/// Slug used when the name has no ASCII letters or digits.
const FALLBACK_SLUG: &str = "event";

/// Inserts tried when a concurrent create takes the chosen slug first.
const MAX_INSERT_ATTEMPTS: u32 = 3;

fn to_response(event: &Event, offset: UtcOffset) -> EventResponse {
    EventResponse {
        slug: event.slug.clone(),
        name: event.name.clone(),
        description: event.description.clone(),
        event_date: event.event_date.to_offset(offset).date(),
        coordinator: event.coordinator_name.clone(),
        coordinator_contact: event.coordinator_contact.clone(),
        recipient_name: event.recipient_name.clone(),
        website_link: event.website_link.clone(),
        created_at: event.created_at.unix_timestamp(),
    }
}

fn to_preview_response(preview: EventPreview, offset: UtcOffset) -> EventPreviewResponse {
    EventPreviewResponse {
        slug: preview.slug,
        name: preview.name,
        description: preview.description,
        event_date: preview.event_date.to_offset(offset).date(),
        recipient_name: preview.recipient_name,
        submission_count: preview.submission_count,
    }
}

/// First free slug derived from `name`.
async fn unique_slug(processor: &DatabaseProcessor, name: &str) -> Result<String, ApiError> {
    let mut base = slugify(name);
    if base.is_empty() {
        base = FALLBACK_SLUG.to_string();
    }

    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let slug = slug_candidate(&base, attempt);
        let taken = processor
            .process(SlugExists { slug: slug.clone() })
            .await
            .map_err(ApiError::Database)?;
        if !taken {
            return Ok(slug);
        }
    }
    Err(ApiError::SlugUnavailable)
}

/// Whether the insert lost a race for its slug.
fn is_slug_conflict(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

/// `POST /events`: create an event.
pub(super) async fn create_event(
    state: State<AppState>,
    Json(body): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let offset = state.utc_offset();
    body.validate(state.today())?;

    let processor = state.processor();
    for _ in 0..MAX_INSERT_ATTEMPTS {
        let slug = unique_slug(&processor, &body.name).await?;
        let website_link = state.server.website_link(&slug);

        let inserted = processor
            .process(InsertEvent {
                event: NewEvent {
                    name: body.name.trim().to_string(),
                    slug: slug.clone(),
                    event_date: local_midnight(body.event_date, offset),
                    details: EventDetails {
                        description: body.description.clone(),
                        coordinator_name: body.coordinator.clone(),
                        coordinator_contact: body.coordinator_contact.clone(),
                        recipient_name: body.recipient_name.clone(),
                        recipient_email: body.recipient_email.trim().to_string(),
                        website_link,
                    },
                },
            })
            .await;

        match inserted {
            Ok(event) => {
                tracing::info!(event_id = event.id, slug = %event.slug, "Event created");
                return Ok((StatusCode::CREATED, Json(to_response(&event, offset))));
            }
            Err(e) if is_slug_conflict(&e) => {
                tracing::warn!(slug = %slug, "Slug taken by a concurrent create, retrying");
            }
            Err(e) => return Err(ApiError::Database(e)),
        }
    }
    Err(ApiError::SlugUnavailable)
}

/// `GET /events`: list active events, latest event date first.
pub(super) async fn list_events(state: State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let offset = state.utc_offset();
    let previews = state
        .processor()
        .process(ListActiveEventPreviews)
        .await
        .map_err(ApiError::Database)?;

    let body: Vec<EventPreviewResponse> = previews
        .into_iter()
        .map(|p| to_preview_response(p, offset))
        .collect();
    Ok(Json(body))
}

/// `GET /events/{slug}`: show one active event.
pub(super) async fn get_event(
    state: State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let event = state
        .processor()
        .process(GetActiveEventBySlug { slug })
        .await
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(to_response(&event, state.utc_offset())))
}
