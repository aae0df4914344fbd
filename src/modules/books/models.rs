use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use bookworm_db::{Book, User};

/// Creation payload. All fields are required by the handler (including
/// `author` — it is client-supplied, never derived from the identity); they
/// are optional here so missing input maps to our validation error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub published_date: Option<Date>,
    pub page_count: Option<u32>,
    /// Public URL returned by the upload endpoint.
    pub cover_image: Option<String>,
    pub rating: Option<f32>,
}

/// Update payload: replace-if-provided for every mutable field. Owner and id
/// are never part of it. `cover_image` here is an inline image payload
/// (data URI or bare base64) that gets uploaded before the URL is replaced.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub published_date: Option<Date>,
    pub page_count: Option<u32>,
    pub cover_image: Option<String>,
    pub rating: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

#[derive(Debug, Deserialize)]
pub struct RecommendedQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    5
}

/// A record as returned from create/update: the owner appears as a bare id.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub description: String,
    pub user: Uuid,
    pub published_date: Date,
    pub page_count: u32,
    pub cover_image: String,
    pub rating: f32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            description: book.description,
            user: book.owner_id,
            published_date: book.published_date,
            page_count: book.page_count,
            cover_image: book.cover_image,
            rating: book.rating,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

/// Owner fields exposed in listings: never email, never the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerProjection {
    pub username: String,
    pub profile_picture: String,
}

impl From<&User> for OwnerProjection {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            profile_picture: user.profile_picture.clone(),
        }
    }
}

/// A record in a listing, with the owner projected.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedBook {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub description: String,
    pub user: Option<OwnerProjection>,
    pub published_date: Date,
    pub page_count: u32,
    pub cover_image: String,
    pub rating: f32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ListedBook {
    pub fn new(book: Book, owner: Option<OwnerProjection>) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            description: book.description,
            user: owner,
            published_date: book.published_date,
            page_count: book.page_count,
            cover_image: book.cover_image,
            rating: book.rating,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub books: Vec<ListedBook>,
    pub current_page: u64,
    pub total_books: u64,
    pub total_pages: u64,
}
