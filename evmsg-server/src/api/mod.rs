//! JSON API handlers.
//!
//! # Endpoints
//!
//! - `POST /events`                     – create an event
//! - `GET  /events`                     – list active events
//! - `GET  /events/{slug}`              – show one active event
//! - `POST /events/{slug}/submissions`  – add a message to an active event
//! - `GET  /events/{slug}/submissions`  – list the messages of an event
//! - `GET  /events/{slug}/submissions/{id}/image` – the image of a message
//!
//! [`website_router`] serves the event page linked from the notification
//! email, `/event/{slug}/messages`, outside the `/api` prefix.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use evmsg_core::artifacts::ArtifactError;
use evmsg_sdk::objects::{MAX_IMAGE_BYTES, ValidationError};

use crate::state::AppState;

mod events;
mod submissions;

/// Request body limit: a maximal image in base64 plus the text fields.
const MAX_BODY_BYTES: usize = MAX_IMAGE_BYTES / 3 * 4 + 64 * 1024;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", post(events::create_event).get(events::list_events))
        .route("/events/{slug}", get(events::get_event))
        .route(
            "/events/{slug}/submissions",
            post(submissions::create_submission).get(submissions::list_submissions),
        )
        .route(
            "/events/{slug}/submissions/{id}/image",
            get(submissions::get_submission_image),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

/// Routes behind the `website_link` of an event.
pub fn website_router() -> Router<AppState> {
    Router::new().route(
        "/event/{slug}/messages",
        get(submissions::list_submissions),
    )
}

/// Errors that can occur in API handlers.
#[derive(Debug)]
enum ApiError {
    /// A database query failed.
    Database(sqlx::Error),
    /// Storing or reading an image failed.
    Artifact(ArtifactError),
    /// The request body failed validation.
    Invalid(ValidationError),
    /// No event with that slug (or it no longer accepts submissions).
    NotFound,
    /// The submission does not exist or has no stored image.
    ImageNotFound,
    /// No free slug could be derived from the event name.
    SlugUnavailable,
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Invalid(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Database(e) => {
                tracing::error!(error = %e, "API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            ApiError::Artifact(e) => {
                tracing::error!(error = %e, "API artifact storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            ApiError::Invalid(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "event not found").into_response(),
            ApiError::ImageNotFound => (StatusCode::NOT_FOUND, "image not found").into_response(),
            ApiError::SlugUnavailable => (
                StatusCode::CONFLICT,
                "could not derive a unique slug from the event name",
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Invalid(ValidationError::DateInPast)
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::ImageNotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::SlugUnavailable.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Database(sqlx::Error::RowNotFound)
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
