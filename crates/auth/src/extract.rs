//! Bearer-token authorization gate.
//!
//! Every protected handler takes a [`CurrentUser`] extractor. Extraction
//! verifies the token against the server secret and then re-reads the user by
//! id, so the handler always sees the current persisted projection (username
//! or profile fields may have changed since the token was issued, and a
//! deleted account must stop authenticating even with a valid token).

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use bookworm_db::{store::UserStore, User};
use bookworm_http::AppError;

use crate::token::{TokenError, TokenIssuer};

/// The verified, live identity attached to a request.
pub struct CurrentUser(pub User);

/// State the gate needs from the application.
pub trait AuthState: Send + Sync {
    fn token_issuer(&self) -> &TokenIssuer;
    fn user_store(&self) -> &dyn UserStore;
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: AuthState,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Malformed authorization header"))?;

        let claims = state.token_issuer().verify(token).map_err(|err| {
            tracing::debug!(error = %err, "token verification failed");
            match err {
                TokenError::Expired => AppError::unauthorized("Token expired"),
                TokenError::Invalid => AppError::unauthorized("Invalid token"),
            }
        })?;

        let subject = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized("Invalid token"))?;

        let user = state
            .user_store()
            .user_by_id(subject)
            .await
            .map_err(AppError::Internal)?
            .ok_or_else(|| AppError::unauthorized("Invalid token"))?;

        Ok(CurrentUser(user))
    }
}
