use async_trait::async_trait;
use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use serde_json::json;

use bookworm_auth::CurrentUser;
use bookworm_http::AppError;
use bookworm_kernel::{InitCtx, Module};
use bookworm_storage::UploadError;

use crate::state::AppState;

/// Cover-image upload endpoint: multipart in, public URL out.
pub struct UploadsModule {
    state: AppState,
}

#[async_trait]
impl Module for UploadsModule {
    fn name(&self) -> &'static str {
        "uploads"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "uploads module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", post(upload_image))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Upload a cover image",
                        "tags": ["Uploads"],
                        "requestBody": {
                            "content": {
                                "multipart/form-data": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "file": {"type": "string", "format": "binary"}
                                        },
                                        "required": ["file"]
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Public URL of the stored image",
                                "content": {"application/json": {"schema": {
                                    "type": "object",
                                    "properties": {"imageUrl": {"type": "string", "format": "uri"}},
                                    "required": ["imageUrl"]
                                }}}
                            },
                            "400": {"description": "No file supplied", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}},
                            "500": {"description": "Remote storage failure", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}}
                        }
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "uploads module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "uploads module stopped");
        Ok(())
    }
}

/// Map storage failures onto the HTTP taxonomy: bad payloads are the
/// caller's fault, everything remote is a 500.
pub(crate) fn map_upload_error(err: UploadError) -> AppError {
    match err {
        UploadError::EmptyPayload | UploadError::InvalidPayload(_) => {
            AppError::validation(vec![json!({"field": "file", "error": "invalid"})], err.to_string())
        }
        UploadError::Remote(_) | UploadError::Rejected(_) => {
            tracing::error!(error = %err, "remote image upload failed");
            AppError::upload("Image upload failed")
        }
    }
}

async fn upload_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::validation(vec![], "Malformed multipart body"))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::validation(vec![], "Malformed multipart body"))?;

        if bytes.is_empty() {
            return Err(AppError::validation(
                vec![json!({"field": "file", "error": "required"})],
                "No file uploaded",
            ));
        }

        let image_url = state
            .media
            .upload(bytes, &content_type)
            .await
            .map_err(map_upload_error)?;

        tracing::info!(user_id = %user.id, "cover image uploaded");

        return Ok(Json(json!({ "imageUrl": image_url })));
    }

    Err(AppError::validation(
        vec![json!({"field": "file", "error": "required"})],
        "No file uploaded",
    ))
}

/// Create a new instance of the uploads module.
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(UploadsModule { state })
}
