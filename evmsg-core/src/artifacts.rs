//! Storage of submission images.
//!
//! An artifact is referenced by a bare file name such as
//! `c0ffee….jpg`. [`FsArtifactStore`] keeps the files in one directory.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while reading or writing artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The reference is empty or tries to leave the artifact directory.
    #[error("invalid artifact reference: {0:?}")]
    InvalidReference(String),

    /// Filesystem error
    #[error("artifact I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An artifact resolved to its bytes and media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineArtifact {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
}

impl InlineArtifact {
    /// `data:` URI with the bytes base64 encoded.
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.media_type,
            fast32::base64::RFC4648.encode(&self.bytes)
        )
    }
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist `bytes` and return the new reference.
    async fn store(&self, bytes: &[u8], media_type: &str) -> Result<String, ArtifactError>;

    /// Load an artifact for embedding into an email.
    async fn encode_inline(&self, reference: &str) -> Result<InlineArtifact, ArtifactError>;

    /// Remove an artifact. Removing a missing artifact is not an error.
    async fn remove(&self, reference: &str) -> Result<(), ArtifactError>;
}

/// Media type announced for a stored file, derived from its extension.
pub fn media_type_for(reference: &str) -> &'static str {
    let ext = Path::new(reference)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

/// File extension used when storing an upload of `media_type`.
pub fn extension_for(media_type: &str) -> &'static str {
    match media_type {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

/// [`ArtifactStore`] keeping files in a single directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the directory if needed.
    pub async fn init(&self) -> Result<(), ArtifactError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn path_for(&self, reference: &str) -> Result<PathBuf, ArtifactError> {
        let invalid = reference.is_empty()
            || reference.contains(['/', '\\'])
            || reference == "."
            || reference.contains("..");
        if invalid {
            return Err(ArtifactError::InvalidReference(reference.to_string()));
        }
        Ok(self.root.join(reference))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn store(&self, bytes: &[u8], media_type: &str) -> Result<String, ArtifactError> {
        let reference = format!("{}.{}", uuid::Uuid::new_v4(), extension_for(media_type));
        let path = self.path_for(&reference)?;
        tokio::fs::write(&path, bytes).await?;
        debug!(reference = %reference, size = bytes.len(), "Stored artifact");
        Ok(reference)
    }

    async fn encode_inline(&self, reference: &str) -> Result<InlineArtifact, ArtifactError> {
        let path = self.path_for(reference)?;
        let bytes = tokio::fs::read(&path).await?;
        Ok(InlineArtifact {
            bytes,
            media_type: media_type_for(reference),
        })
    }

    async fn remove(&self, reference: &str) -> Result<(), ArtifactError> {
        let path = self.path_for(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
