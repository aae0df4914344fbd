pub mod models;

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use bookworm_auth::{ownership, CurrentUser};
use bookworm_db::Book;
use bookworm_http::AppError;
use bookworm_kernel::{InitCtx, Module};
use bookworm_storage::{decode_data_uri, destroy_by_url};

use crate::modules::uploads::map_upload_error;
use crate::state::AppState;
use self::models::{
    BookResponse, CreateBookRequest, ListResponse, ListedBook, OwnerProjection, Pagination,
    RecommendedQuery, UpdateBookRequest,
};

/// Book CRUD with per-record ownership enforcement.
pub struct BooksModule {
    state: AppState,
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", post(create_book).get(list_books))
            .route("/user/recommended", get(recommended_books))
            .route("/{id}", axum::routing::put(update_book).delete(delete_book))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "responses": {
                            "201": {"description": "Created record", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Book"}}}},
                            "400": {"description": "Missing required field", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}},
                            "401": {"description": "Missing or invalid token", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}}
                        }
                    },
                    "get": {
                        "summary": "List books, newest first, paginated",
                        "tags": ["Books"],
                        "parameters": [
                            {"name": "page", "in": "query", "schema": {"type": "integer", "default": 1}},
                            {"name": "limit", "in": "query", "schema": {"type": "integer", "default": 5}}
                        ],
                        "responses": {
                            "200": {"description": "One page of records with owner projections"},
                            "404": {"description": "Computed page is empty", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}}
                        }
                    }
                },
                "/user/recommended": {
                    "get": {
                        "summary": "Caller's own books, newest first",
                        "tags": ["Books"],
                        "responses": {
                            "200": {"description": "Array of records"},
                            "404": {"description": "Caller owns no books", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}}
                        }
                    }
                },
                "/{id}": {
                    "put": {
                        "summary": "Update an owned book (optional inline image replace)",
                        "tags": ["Books"],
                        "responses": {
                            "200": {"description": "Updated record", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Book"}}}},
                            "403": {"description": "Not the owner", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}},
                            "404": {"description": "Unknown id", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}}
                        }
                    },
                    "delete": {
                        "summary": "Delete an owned book and best-effort its remote cover",
                        "tags": ["Books"],
                        "responses": {
                            "200": {"description": "Deletion confirmation"},
                            "400": {"description": "Malformed id", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}},
                            "403": {"description": "Not the owner", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}},
                            "404": {"description": "Unknown id", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}}
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": {"type": "string"},
                            "title": {"type": "string"},
                            "author": {"type": "string"},
                            "description": {"type": "string"},
                            "user": {"type": "string", "description": "Owner id"},
                            "publishedDate": {"type": "string", "format": "date"},
                            "pageCount": {"type": "integer", "minimum": 1},
                            "coverImage": {"type": "string", "format": "uri"},
                            "rating": {"type": "number", "minimum": 0, "maximum": 5},
                            "createdAt": {"type": "string", "format": "date-time"},
                            "updatedAt": {"type": "string", "format": "date-time"}
                        },
                        "required": ["id", "title", "author", "description", "user"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn validate_rating(rating: f32) -> Result<(), AppError> {
    if !(0.0..=5.0).contains(&rating) {
        return Err(AppError::validation(
            vec![json!({"field": "rating", "error": "out_of_range"})],
            "Rating must be between 0 and 5",
        ));
    }
    Ok(())
}

fn validate_page_count(page_count: u32) -> Result<(), AppError> {
    if page_count == 0 {
        return Err(AppError::validation(
            vec![json!({"field": "pageCount", "error": "not_positive"})],
            "Page count must be a positive integer",
        ));
    }
    Ok(())
}

fn parse_book_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| {
        AppError::validation(
            vec![json!({"field": "id", "error": "invalid"})],
            "Invalid book ID",
        )
    })
}

async fn create_book(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    let mut missing = Vec::new();
    let mut require = |field: &str, present: bool| {
        if !present {
            missing.push(json!({"field": field, "error": "required"}));
        }
    };
    require("title", req.title.as_deref().is_some_and(|s| !s.is_empty()));
    require("author", req.author.as_deref().is_some_and(|s| !s.is_empty()));
    require(
        "description",
        req.description.as_deref().is_some_and(|s| !s.is_empty()),
    );
    require("publishedDate", req.published_date.is_some());
    require("pageCount", req.page_count.is_some());
    require(
        "coverImage",
        req.cover_image.as_deref().is_some_and(|s| !s.is_empty()),
    );
    require("rating", req.rating.is_some());
    if !missing.is_empty() {
        return Err(AppError::validation(missing, "All fields are required"));
    }

    let rating = req.rating.unwrap_or_default();
    let page_count = req.page_count.unwrap_or_default();
    validate_rating(rating)?;
    validate_page_count(page_count)?;

    let now = OffsetDateTime::now_utc();
    let book = Book {
        id: Uuid::now_v7(),
        title: req.title.unwrap_or_default(),
        author: req.author.unwrap_or_default(),
        description: req.description.unwrap_or_default(),
        owner_id: user.id,
        published_date: req.published_date.unwrap_or(time::Date::MIN),
        page_count,
        cover_image: req.cover_image.unwrap_or_default(),
        rating,
        created_at: now,
        updated_at: now,
    };

    state
        .books
        .insert_book(book.clone())
        .await
        .map_err(AppError::Internal)?;

    tracing::info!(book_id = %book.id, owner = %user.id, "book created");

    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

async fn list_books(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ListResponse>, AppError> {
    if pagination.page == 0 || pagination.limit == 0 {
        return Err(AppError::validation(
            vec![json!({"field": "page/limit", "error": "not_positive"})],
            "page and limit must be positive integers",
        ));
    }

    // Hostile page/limit values must land in the validation branch, not
    // overflow the skip computation.
    let skip = pagination
        .page
        .checked_sub(1)
        .and_then(|prior_pages| prior_pages.checked_mul(pagination.limit))
        .ok_or_else(|| {
            AppError::validation(
                vec![json!({"field": "page/limit", "error": "out_of_range"})],
                "page and limit must be positive integers",
            )
        })?;
    let (books, total_books) = state
        .books
        .list_books(skip, pagination.limit)
        .await
        .map_err(AppError::Internal)?;

    // An empty computed page is reported as not-found, never as an empty 200.
    if books.is_empty() {
        return Err(AppError::not_found("No books found"));
    }

    let mut listed = Vec::with_capacity(books.len());
    for book in books {
        let owner = state
            .users
            .user_by_id(book.owner_id)
            .await
            .map_err(AppError::Internal)?;
        listed.push(ListedBook::new(
            book,
            owner.as_ref().map(OwnerProjection::from),
        ));
    }

    Ok(Json(ListResponse {
        books: listed,
        current_page: pagination.page,
        total_books,
        total_pages: total_books.div_ceil(pagination.limit),
    }))
}

async fn recommended_books(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<RecommendedQuery>,
) -> Result<Json<Vec<BookResponse>>, AppError> {
    let books = state
        .books
        .books_by_owner(user.id, query.limit)
        .await
        .map_err(AppError::Internal)?;

    if books.is_empty() {
        return Err(AppError::not_found("No recommended books found"));
    }

    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

async fn update_book(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateBookRequest>,
) -> Result<Json<BookResponse>, AppError> {
    let id = parse_book_id(&id)?;

    let mut book = state
        .books
        .book_by_id(id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::not_found("Book not found"))?;

    if !ownership::can_modify(book.owner_id, user.id) {
        return Err(AppError::forbidden(
            "You are not authorized to update this book",
        ));
    }

    if let Some(rating) = req.rating {
        validate_rating(rating)?;
        book.rating = rating;
    }
    if let Some(page_count) = req.page_count {
        validate_page_count(page_count)?;
        book.page_count = page_count;
    }
    if let Some(title) = req.title {
        book.title = title;
    }
    if let Some(author) = req.author {
        book.author = author;
    }
    if let Some(description) = req.description {
        book.description = description;
    }
    if let Some(published_date) = req.published_date {
        book.published_date = published_date;
    }

    if let Some(payload) = req.cover_image {
        // Upload first; the stored URL is only overwritten on success. The
        // previous remote asset is left in place (documented orphan policy).
        let (bytes, content_type) = decode_data_uri(&payload).map_err(map_upload_error)?;
        let url = state
            .media
            .upload(bytes, &content_type)
            .await
            .map_err(map_upload_error)?;
        book.cover_image = url;
    }

    book.updated_at = OffsetDateTime::now_utc();
    state
        .books
        .update_book(book.clone())
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(BookResponse::from(book)))
}

async fn delete_book(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = parse_book_id(&id)?;

    let book = state
        .books
        .book_by_id(id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::not_found("Book not found"))?;

    if !ownership::can_modify(book.owner_id, user.id) {
        return Err(AppError::forbidden(
            "You are not authorized to delete this book",
        ));
    }

    // Best-effort: a failed remote delete must never block the record delete.
    destroy_by_url(state.media.as_ref(), &book.cover_image).await;

    state
        .books
        .remove_book(id)
        .await
        .map_err(AppError::Internal)?;

    tracing::info!(book_id = %id, owner = %user.id, "book deleted");

    Ok(Json(json!({"message": "Book deleted successfully"})))
}

/// Create a new instance of the books module.
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule { state })
}
