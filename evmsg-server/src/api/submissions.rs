use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use evmsg_core::artifacts::{ArtifactError, InlineArtifact};
use evmsg_core::entities::event::{GetActiveEventBySlug, GetEventBySlug};
use evmsg_core::entities::submission::{GetSubmission, InsertSubmission, ListSubmissionsForEvent};
use evmsg_core::entities::{Submission, SubmissionInsert};
use evmsg_sdk::objects::{CreateSubmissionRequest, SubmissionResponse};
use kanau::processor::Processor;

use super::ApiError;
use crate::state::AppState;

/// Stored image reference, if the submission has one.
fn image_reference(submission: &Submission) -> Option<&str> {
    submission.image.as_deref().filter(|r| !r.is_empty())
}

fn image_url(slug: &str, submission_id: i64) -> String {
    format!("/api/events/{slug}/submissions/{submission_id}/image")
}

fn to_response(slug: &str, submission: &Submission) -> SubmissionResponse {
    SubmissionResponse {
        id: submission.id,
        name: submission.author_name.clone(),
        message: submission.message.clone(),
        image_url: image_reference(submission).map(|_| image_url(slug, submission.id)),
        created_at: submission.created_at.unix_timestamp(),
    }
}

fn image_response(image: InlineArtifact) -> Response {
    (
        [
            (header::CONTENT_TYPE, image.media_type),
            (header::CACHE_CONTROL, "private, max-age=86400"),
        ],
        image.bytes,
    )
        .into_response()
}

/// `POST /events/{slug}/submissions`: add a message to an active event.
///
/// The image, if any, is written to the artifact store before the row is
/// inserted and removed again if the insert fails.
pub(super) async fn create_submission(
    state: State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<CreateSubmissionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let image = body.validate()?;

    let processor = state.processor();
    let event = processor
        .process(GetActiveEventBySlug { slug })
        .await
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let reference = match image {
        Some((media_type, bytes)) => Some(
            state
                .artifacts
                .store(&bytes, &media_type)
                .await
                .map_err(ApiError::Artifact)?,
        ),
        None => None,
    };

    let inserted = processor
        .process(InsertSubmission {
            submission: SubmissionInsert {
                event_id: event.id,
                author_name: body.name.trim().to_string(),
                message: body.message.trim().to_string(),
                image: reference.clone(),
            },
        })
        .await;

    let submission = match inserted {
        Ok(submission) => submission,
        Err(e) => {
            if let Some(reference) = reference {
                if let Err(remove_err) = state.artifacts.remove(&reference).await {
                    tracing::warn!(
                        reference = %reference,
                        error = %remove_err,
                        "Failed to remove image of rejected submission"
                    );
                }
            }
            return Err(ApiError::Database(e));
        }
    };

    tracing::info!(
        event_id = event.id,
        submission_id = submission.id,
        has_image = submission.image.is_some(),
        "Submission stored"
    );
    Ok((
        StatusCode::CREATED,
        Json(to_response(&event.slug, &submission)),
    ))
}

/// `GET /events/{slug}/submissions`: messages of an event, most recent first.
///
/// Works for notified events too, until cleanup deletes them.
pub(super) async fn list_submissions(
    state: State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let processor = state.processor();
    let event = processor
        .process(GetEventBySlug { slug })
        .await
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let submissions = processor
        .process(ListSubmissionsForEvent { event_id: event.id })
        .await
        .map_err(ApiError::Database)?;

    let body: Vec<SubmissionResponse> = submissions
        .iter()
        .map(|s| to_response(&event.slug, s))
        .collect();
    Ok(Json(body))
}

/// `GET /events/{slug}/submissions/{id}/image`: the stored image bytes.
pub(super) async fn get_submission_image(
    state: State<AppState>,
    Path((slug, submission_id)): Path<(String, i64)>,
) -> Result<Response, ApiError> {
    let processor = state.processor();
    let event = processor
        .process(GetEventBySlug { slug })
        .await
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound)?;

    let submission = processor
        .process(GetSubmission {
            event_id: event.id,
            submission_id,
        })
        .await
        .map_err(ApiError::Database)?
        .ok_or(ApiError::ImageNotFound)?;
    let reference = image_reference(&submission).ok_or(ApiError::ImageNotFound)?;

    match state.artifacts.encode_inline(reference).await {
        Ok(image) => Ok(image_response(image)),
        Err(ArtifactError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(
                submission_id,
                reference = %reference,
                "Image of submission is missing from storage"
            );
            Err(ApiError::ImageNotFound)
        }
        Err(e) => Err(ApiError::Artifact(e)),
    }
}
