use std::sync::Arc;

use bookworm_auth::{AuthState, TokenIssuer};
use bookworm_db::store::{BookStore, UserStore};
use bookworm_kernel::settings::Settings;
use bookworm_storage::MediaStorage;

/// Shared application state handed to every handler.
///
/// Everything here is read-only after startup; the stores and the media
/// client manage their own interior synchronization.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub users: Arc<dyn UserStore>,
    pub books: Arc<dyn BookStore>,
    pub media: Arc<dyn MediaStorage>,
    pub issuer: Arc<TokenIssuer>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        users: Arc<dyn UserStore>,
        books: Arc<dyn BookStore>,
        media: Arc<dyn MediaStorage>,
    ) -> Self {
        let issuer = Arc::new(TokenIssuer::from_settings(&settings.auth));
        Self {
            settings: Arc::new(settings),
            users,
            books,
            media,
            issuer,
        }
    }
}

impl AuthState for AppState {
    fn token_issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    fn user_store(&self) -> &dyn UserStore {
        self.users.as_ref()
    }
}
