use async_trait::async_trait;
use axum::Router;

use crate::settings::Settings;

/// Context provided to modules during initialization and startup.
pub struct InitCtx<'a> {
    pub settings: &'a Settings,
}

/// Core module trait that all bookworm modules implement.
///
/// A module owns a slice of the API surface: it contributes a router that is
/// mounted under `/api/{name}`, an optional OpenAPI fragment merged into the
/// service spec, and lifecycle hooks invoked around the HTTP server.
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name for this module; also the mount path segment.
    fn name(&self) -> &'static str;

    /// Initialize the module with the provided context.
    /// Called during application startup before the server binds.
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Return the Axum router for this module's routes.
    /// Routes will be mounted under `/api/{module_name}`.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// Return an OpenAPI specification fragment for this module as JSON.
    /// Will be merged with other modules' fragments.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Start background tasks for this module.
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Stop the module and clean up resources.
    /// Called during application shutdown.
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
