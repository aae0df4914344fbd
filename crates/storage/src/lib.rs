//! Remote media storage: upload, URL-to-id inversion, best-effort destroy.
//!
//! The remote store fails independently of the database; record mutations
//! must never block on asset deletion, so [`destroy_by_url`] logs and
//! swallows every failure.

pub mod cloudinary;
pub mod public_id;

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use thiserror::Error;

pub use cloudinary::CloudinaryClient;
pub use public_id::resolve_public_id;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("no payload supplied")]
    EmptyPayload,

    #[error("malformed image payload: {0}")]
    InvalidPayload(String),

    #[error("remote storage request failed: {0}")]
    Remote(#[from] reqwest::Error),

    #[error("remote storage rejected the request: {0}")]
    Rejected(String),
}

/// Remote object-storage boundary.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Transmit an in-memory payload, returning the resulting public URL.
    async fn upload(&self, bytes: Bytes, content_type: &str) -> Result<String, UploadError>;

    /// Delete a remote asset by its public id.
    async fn destroy(&self, public_id: &str) -> Result<(), UploadError>;
}

/// Best-effort deletion of the asset behind a stored URL.
///
/// A URL that does not resolve to a public id means there is nothing to
/// delete; a failed remote call is logged and swallowed. Callers proceed
/// with the record mutation unconditionally.
pub async fn destroy_by_url(media: &dyn MediaStorage, asset_url: &str) {
    let Some(public_id) = resolve_public_id(asset_url) else {
        tracing::debug!(url = %asset_url, "asset URL carries no public id, nothing to delete");
        return;
    };

    if let Err(err) = media.destroy(&public_id).await {
        tracing::warn!(%public_id, error = %err, "failed to delete remote image");
    }
}

/// Decode an inline image payload into bytes and a content type.
///
/// Accepts a `data:<mime>;base64,<data>` URI or bare base64 (defaulting to
/// `image/jpeg`).
pub fn decode_data_uri(payload: &str) -> Result<(Bytes, String), UploadError> {
    let (content_type, data) = match payload.strip_prefix("data:") {
        Some(rest) => {
            let (mime, data) = rest
                .split_once(";base64,")
                .ok_or_else(|| UploadError::InvalidPayload("expected ';base64,' marker".into()))?;
            (mime.to_string(), data)
        }
        None => ("image/jpeg".to_string(), payload),
    };

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|err| UploadError::InvalidPayload(err.to_string()))?;

    if bytes.is_empty() {
        return Err(UploadError::EmptyPayload);
    }

    Ok((Bytes::from(bytes), content_type))
}
