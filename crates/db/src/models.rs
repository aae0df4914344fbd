use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// A registered account.
///
/// Identity (id, email, username) is immutable once created. The password is
/// stored only as a salted bcrypt hash; the hash string carries its own cost
/// factor so future re-hash rotation does not need a schema change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub profile_picture: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A catalog record owned by exactly one user.
///
/// `owner_id` is set once at creation and never reassigned; every mutation
/// must verify it against the requesting identity first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub description: String,
    pub owner_id: Uuid,
    pub published_date: Date,
    pub page_count: u32,
    /// Public URL of the cover image on remote storage.
    pub cover_image: String,
    /// Bounded 0..=5.
    pub rating: f32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
