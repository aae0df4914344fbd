use std::sync::Arc;

use anyhow::Context;

use bookworm_app::{modules, AppState};
use bookworm_db::{
    store::{BookStore, UserStore},
    MemoryStore,
};
use bookworm_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use bookworm_storage::CloudinaryClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load bookworm settings")?;

    bookworm_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        "bookworm-app bootstrap starting"
    );

    let store = Arc::new(MemoryStore::new());
    let users: Arc<dyn UserStore> = store.clone();
    let books: Arc<dyn BookStore> = store;
    let media = Arc::new(CloudinaryClient::from_settings(&settings.storage));

    let state = AppState::new(settings.clone(), users, books, media);

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &state);

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    tracing::info!("bookworm-app bootstrap complete");

    bookworm_http::start_server(&registry, &settings).await
}
