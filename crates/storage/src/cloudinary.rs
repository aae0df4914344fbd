//! Cloudinary-backed implementation of [`MediaStorage`].

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use time::OffsetDateTime;

use bookworm_kernel::settings::StorageSettings;

use crate::{MediaStorage, UploadError};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Signed Cloudinary API client.
///
/// Credentials are read once at startup from settings; the client is
/// immutable afterwards and shared across request tasks.
pub struct CloudinaryClient {
    http: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryClient {
    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            cloud_name: settings.cloud_name.clone(),
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
            folder: settings.upload_folder.clone(),
        }
    }

    /// Hex SHA-1 over the sorted parameter string plus the API secret.
    fn sign(&self, params: &str) -> String {
        let mut hasher = Sha1::new();
        hasher.update(params.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{API_BASE}/{}/image/{action}", self.cloud_name)
    }
}

#[async_trait]
impl MediaStorage for CloudinaryClient {
    async fn upload(&self, bytes: Bytes, content_type: &str) -> Result<String, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::EmptyPayload);
        }

        // The payload travels as a base64 data URI, matching the provider's
        // inline upload contract.
        let data_uri = format!(
            "data:{content_type};base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&bytes)
        );

        let timestamp = OffsetDateTime::now_utc().unix_timestamp();
        let signature = self.sign(&format!("folder={}&timestamp={timestamp}", self.folder));

        let form = [
            ("file", data_uri),
            ("api_key", self.api_key.clone()),
            ("folder", self.folder.clone()),
            ("timestamp", timestamp.to_string()),
            ("signature", signature),
        ];

        let response = self.http.post(self.endpoint("upload")).form(&form).send().await?;

        if !response.status().is_success() {
            return Err(UploadError::Rejected(format!(
                "upload returned {}",
                response.status()
            )));
        }

        let body: UploadResponse = response.json().await?;
        Ok(body.secure_url)
    }

    async fn destroy(&self, public_id: &str) -> Result<(), UploadError> {
        let timestamp = OffsetDateTime::now_utc().unix_timestamp();
        let signature = self.sign(&format!("public_id={public_id}&timestamp={timestamp}"));

        let form = [
            ("public_id", public_id.to_string()),
            ("api_key", self.api_key.clone()),
            ("timestamp", timestamp.to_string()),
            ("signature", signature),
        ];

        let response = self
            .http
            .post(self.endpoint("destroy"))
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UploadError::Rejected(format!(
                "destroy returned {}",
                response.status()
            )));
        }

        let body: DestroyResponse = response.json().await?;
        // "not found" still counts as deleted for lifecycle purposes.
        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(UploadError::Rejected(format!(
                "destroy result '{other}'"
            ))),
        }
    }
}
