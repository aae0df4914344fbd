use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookworm_db::User;

/// Registration payload. Fields are optional at the serde level so that
/// missing input surfaces as our validation error rather than a
/// deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// User fields safe to return to clients. Never carries the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProjection {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub profile_picture: String,
}

impl From<&User> for UserProjection {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            profile_picture: user.profile_picture.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserProjection,
    pub token: String,
}
