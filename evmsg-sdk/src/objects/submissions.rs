use serde::{Deserialize, Serialize};

use super::ValidationError;

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_MESSAGE_LENGTH: usize = 500;
/// 10 MB, measured on the decoded bytes.
pub const MAX_IMAGE_BYTES: usize = 10 << 20;

pub const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Request body for adding a message to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSubmissionRequest {
    pub name: String,
    pub message: String,
    #[serde(default)]
    pub image: Option<ImageUpload>,
}

/// An image attached to a submission, base64 encoded (RFC 4648, padded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUpload {
    pub media_type: String,
    pub data: String,
}

impl CreateSubmissionRequest {
    /// Validate text limits and decode the attached image, if any.
    ///
    /// Returns the decoded image bytes together with the declared media type.
    pub fn validate(&self) -> Result<Option<(String, Vec<u8>)>, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.message.trim().is_empty() {
            return Err(ValidationError::MissingField("message"));
        }
        if self.name.chars().count() > MAX_NAME_LENGTH {
            return Err(ValidationError::TooLong {
                field: "name",
                max: MAX_NAME_LENGTH,
            });
        }
        if self.message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ValidationError::TooLong {
                field: "message",
                max: MAX_MESSAGE_LENGTH,
            });
        }

        let Some(image) = &self.image else {
            return Ok(None);
        };

        let media_type = image.media_type.to_ascii_lowercase();
        if !ALLOWED_IMAGE_TYPES.contains(&media_type.as_str()) {
            return Err(ValidationError::UnsupportedImageType(media_type));
        }

        // Encoded length already over the limit: skip decoding.
        if image.data.len() / 4 * 3 > MAX_IMAGE_BYTES + 2 {
            return Err(ValidationError::ImageTooLarge {
                max: MAX_IMAGE_BYTES,
            });
        }
        let bytes = fast32::base64::RFC4648
            .decode_str(&image.data)
            .map_err(|_| ValidationError::InvalidImageEncoding)?;
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ValidationError::ImageTooLarge {
                max: MAX_IMAGE_BYTES,
            });
        }

        Ok(Some((media_type, bytes)))
    }
}

/// A stored submission as returned to the contributor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub id: i64,
    pub name: String,
    pub message: String,
    /// Path of the attached image, relative to the site root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Unix timestamp of when the submission was stored.
    pub created_at: i64,
}
