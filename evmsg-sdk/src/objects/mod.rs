//! HTTP API request and response types.
//!
//! Requests carry their own `validate()` so that limits are enforced the same
//! way by the server and by any client that wants to check input early.

pub mod events;
pub mod submissions;

pub use events::{CreateEventRequest, EventPreviewResponse, EventResponse};
pub use submissions::{
    ALLOWED_IMAGE_TYPES, CreateSubmissionRequest, ImageUpload, MAX_IMAGE_BYTES,
    MAX_MESSAGE_LENGTH, MAX_NAME_LENGTH, SubmissionResponse,
};

/// Reasons a request body is rejected before it reaches the database.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("event date must not be in the past")]
    DateInPast,

    #[error("unsupported image type: {0}")]
    UnsupportedImageType(String),

    #[error("image data is not valid base64")]
    InvalidImageEncoding,

    #[error("image exceeds {max} bytes")]
    ImageTooLarge { max: usize },
}
