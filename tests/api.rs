//! End-to-end tests over the full router with the in-memory store and a
//! recording media-storage double.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use serde_json::{json, Value};
use tower::ServiceExt;

use bookworm_app::{modules, AppState};
use bookworm_db::store::{BookStore, UserStore};
use bookworm_db::MemoryStore;
use bookworm_kernel::{settings::Settings, ModuleRegistry};
use bookworm_storage::{MediaStorage, UploadError};

#[derive(Default)]
struct MockMedia {
    uploads: Mutex<Vec<String>>,
    destroyed: Mutex<Vec<String>>,
    fail_destroy: AtomicBool,
}

#[async_trait]
impl MediaStorage for MockMedia {
    async fn upload(&self, bytes: Bytes, content_type: &str) -> Result<String, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::EmptyPayload);
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(content_type.to_string());
        Ok(format!(
            "https://res.example.com/demo/image/upload/v1700000000/books/cover-{}.png",
            uploads.len()
        ))
    }

    async fn destroy(&self, public_id: &str) -> Result<(), UploadError> {
        self.destroyed.lock().unwrap().push(public_id.to_string());
        if self.fail_destroy.load(Ordering::SeqCst) {
            Err(UploadError::Rejected("remote storage down".to_string()))
        } else {
            Ok(())
        }
    }
}

struct TestApp {
    router: Router,
    media: Arc<MockMedia>,
}

fn test_app() -> TestApp {
    let mut settings = Settings::default();
    // Minimum cost keeps the suite fast.
    settings.auth.bcrypt_cost = 4;

    let store = Arc::new(MemoryStore::new());
    let users: Arc<dyn UserStore> = store.clone();
    let books: Arc<dyn BookStore> = store;
    let media = Arc::new(MockMedia::default());

    let state = AppState::new(settings.clone(), users, books, media.clone());

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &state);

    TestApp {
        router: bookworm_http::build_router(&registry, &settings),
        media,
    }
}

fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn bare_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn register(app: &TestApp, email: &str, username: &str) -> (String, Value) {
    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/register",
            json!({"email": email, "username": username, "password": "hunter22"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"].clone(),
    )
}

fn book_payload(title: &str, cover: &str) -> Value {
    json!({
        "title": title,
        "author": "Ursula K. Le Guin",
        "description": "A voyage",
        "publishedDate": "1969-03-01",
        "pageCount": 304,
        "coverImage": cover,
        "rating": 4.5
    })
}

async fn create_book(app: &TestApp, token: &str, title: &str, cover: &str) -> Value {
    let (status, body) = send(
        &app.router,
        json_request("POST", "/api/books", book_payload(title, cover), Some(token)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body
}

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or("")
}

fn error_message(body: &Value) -> &str {
    body["error"]["message"].as_str().unwrap_or("")
}

// --- auth ---

#[tokio::test]
async fn register_issues_token_bound_to_the_created_user() {
    let app = test_app();
    let (token, user) = register(&app, "alice@example.com", "alice").await;

    // The token's subject claim is the created user's id.
    let issuer = bookworm_auth::TokenIssuer::new("insecure-local-secret", time::Duration::days(17));
    let claims = issuer.verify(&token).unwrap();
    assert_eq!(claims.sub, user["id"].as_str().unwrap());
    assert_eq!(claims.username, "alice");

    // The registration payload never leaks the password hash.
    assert!(user.get("password").is_none());
    assert!(user.get("passwordHash").is_none());

    // Running the gate on that token resolves the same user: a created book
    // is owned by it.
    let book = create_book(&app, &token, "Left Hand", "https://example.com/c.png").await;
    assert_eq!(book["user"], user["id"]);
}

#[tokio::test]
async fn register_validates_field_presence_and_lengths() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/register",
            json!({"email": "a@example.com"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "validation_error");

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/register",
            json!({"email": "a@example.com", "username": "alice", "password": "short"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(&body),
        "Password must be at least 6 characters long"
    );

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/register",
            json!({"email": "a@example.com", "username": "al", "password": "hunter22"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(&body),
        "Username must be at least 3 characters long"
    );
}

#[tokio::test]
async fn duplicate_email_and_username_both_conflict() {
    let app = test_app();
    register(&app, "alice@example.com", "alice").await;

    // Same email, different username.
    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/register",
            json!({"email": "alice@example.com", "username": "other", "password": "hunter22"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "conflict");
    assert_eq!(error_message(&body), "Email already exists");

    // Same username, different email.
    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/register",
            json!({"email": "other@example.com", "username": "alice", "password": "hunter22"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "conflict");
    assert_eq!(error_message(&body), "Username already exists");
}

#[tokio::test]
async fn login_failure_carries_no_enumeration_signal() {
    let app = test_app();
    register(&app, "alice@example.com", "alice").await;

    let (wrong_pw_status, wrong_pw) = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/login",
            json!({"email": "alice@example.com", "password": "wrong-password"}),
            None,
        ),
    )
    .await;
    let (unknown_status, unknown) = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/login",
            json!({"email": "nobody@example.com", "password": "hunter22"}),
            None,
        ),
    )
    .await;

    assert_eq!(wrong_pw_status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown_status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&wrong_pw), error_message(&unknown));
    assert_eq!(error_code(&wrong_pw), error_code(&unknown));
}

#[tokio::test]
async fn login_with_correct_credentials_issues_a_fresh_token() {
    let app = test_app();
    register(&app, "alice@example.com", "alice").await;

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/login",
            json!({"email": "alice@example.com", "password": "hunter22"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["username"], "alice");
}

// --- authorization gate ---

#[tokio::test]
async fn protected_routes_reject_missing_and_garbage_tokens() {
    let app = test_app();

    let (status, _) = send(&app.router, bare_request("GET", "/api/books", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app.router,
        bare_request("GET", "/api/books", Some("not.a.token")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app.router,
        json_request("POST", "/api/books", book_payload("t", "c"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// --- books ---

#[tokio::test]
async fn create_requires_every_field() {
    let app = test_app();
    let (token, _) = register(&app, "alice@example.com", "alice").await;

    let mut payload = book_payload("Left Hand", "https://example.com/c.png");
    payload.as_object_mut().unwrap().remove("author");

    let (status, body) = send(
        &app.router,
        json_request("POST", "/api/books", payload, Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "All fields are required");
}

#[tokio::test]
async fn create_bounds_rating_and_page_count() {
    let app = test_app();
    let (token, _) = register(&app, "alice@example.com", "alice").await;

    let mut payload = book_payload("Left Hand", "https://example.com/c.png");
    payload["rating"] = json!(5.5);
    let (status, _) = send(
        &app.router,
        json_request("POST", "/api/books", payload, Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut payload = book_payload("Left Hand", "https://example.com/c.png");
    payload["pageCount"] = json!(0);
    let (status, _) = send(
        &app.router,
        json_request("POST", "/api/books", payload, Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn published_date_travels_as_a_calendar_date_string() {
    let app = test_app();
    let (token, _) = register(&app, "alice@example.com", "alice").await;

    // The wire format for dates is `YYYY-MM-DD` in both directions.
    let book = create_book(&app, &token, "Left Hand", "https://example.com/c.png").await;
    assert_eq!(book["publishedDate"], "1969-03-01");

    let (status, body) = send(&app.router, bare_request("GET", "/api/books", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["books"][0]["publishedDate"], "1969-03-01");
}

#[tokio::test]
async fn pagination_rejects_values_that_cannot_be_computed() {
    let app = test_app();
    let (token, _) = register(&app, "alice@example.com", "alice").await;
    create_book(&app, &token, "Only", "https://example.com/c.png").await;

    let uri = format!("/api/books?page={}&limit=5", u64::MAX);
    let (status, body) = send(&app.router, bare_request("GET", &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "validation_error");
}

#[tokio::test]
async fn listing_paginates_newest_first_and_projects_owners() {
    let app = test_app();
    let (token, _) = register(&app, "alice@example.com", "alice").await;

    for i in 1..=12 {
        create_book(
            &app,
            &token,
            &format!("Book {i}"),
            "https://example.com/c.png",
        )
        .await;
    }

    let (status, body) = send(&app.router, bare_request("GET", "/api/books", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentPage"], 1);
    assert_eq!(body["totalBooks"], 12);
    assert_eq!(body["totalPages"], 3);

    let books = body["books"].as_array().unwrap();
    assert_eq!(books.len(), 5);
    assert_eq!(books[0]["title"], "Book 12");
    assert_eq!(books[4]["title"], "Book 8");

    // Owner projection: username and profile picture only.
    let owner = &books[0]["user"];
    assert_eq!(owner["username"], "alice");
    assert!(owner["profilePicture"].as_str().is_some());
    assert!(owner.get("email").is_none());
    assert!(owner.get("passwordHash").is_none());

    let (status, body) = send(
        &app.router,
        bare_request("GET", "/api/books?page=3&limit=5", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["books"].as_array().unwrap().len(), 2);

    // A computed page past the data is 404, not an empty 200.
    let (status, body) = send(
        &app.router,
        bare_request("GET", "/api/books?page=4&limit=5", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
    assert_eq!(error_message(&body), "No books found");
}

#[tokio::test]
async fn empty_catalog_lists_as_not_found() {
    let app = test_app();
    let (token, _) = register(&app, "alice@example.com", "alice").await;

    let (status, _) = send(&app.router, bare_request("GET", "/api/books", Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn recommended_returns_only_own_books() {
    let app = test_app();
    let (alice, _) = register(&app, "alice@example.com", "alice").await;
    let (bob, _) = register(&app, "bob@example.com", "bob").await;

    for i in 1..=7 {
        create_book(&app, &alice, &format!("A{i}"), "https://example.com/c.png").await;
    }
    create_book(&app, &bob, "B1", "https://example.com/c.png").await;

    let (status, body) = send(
        &app.router,
        bare_request("GET", "/api/books/user/recommended", Some(&alice)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let books = body.as_array().unwrap();
    assert_eq!(books.len(), 5);
    assert_eq!(books[0]["title"], "A7");
    assert!(books.iter().all(|b| b["title"] != "B1"));

    // A caller with no books hits the empty-result condition.
    let (carol, _) = register(&app, "carol@example.com", "carol").await;
    let (status, body) = send(
        &app.router,
        bare_request("GET", "/api/books/user/recommended", Some(&carol)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "No recommended books found");
}

#[tokio::test]
async fn update_applies_replace_if_provided_semantics() {
    let app = test_app();
    let (token, user) = register(&app, "alice@example.com", "alice").await;
    let book = create_book(&app, &token, "Draft", "https://example.com/c.png").await;
    let id = book["id"].as_str().unwrap();

    let (status, updated) = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/api/books/{id}"),
            json!({"title": "Final", "rating": 3.0}),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Final");
    assert_eq!(updated["rating"], 3.0);
    // Untouched fields keep their values; owner and id never change.
    assert_eq!(updated["author"], book["author"]);
    assert_eq!(updated["id"], book["id"]);
    assert_eq!(updated["user"], user["id"]);
}

#[tokio::test]
async fn update_with_inline_image_uploads_and_orphans_the_old_asset() {
    let app = test_app();
    let (token, _) = register(&app, "alice@example.com", "alice").await;
    let book = create_book(
        &app,
        &token,
        "Draft",
        "https://res.example.com/demo/image/upload/v1/books/old.png",
    )
    .await;
    let id = book["id"].as_str().unwrap();

    let (status, updated) = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/api/books/{id}"),
            json!({"coverImage": "data:image/png;base64,aGVsbG8="}),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_ne!(updated["coverImage"], book["coverImage"]);
    assert_eq!(*app.media.uploads.lock().unwrap(), vec!["image/png"]);
    // The replaced asset is never proactively destroyed.
    assert!(app.media.destroyed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cross_user_mutation_is_forbidden_and_side_effect_free() {
    let app = test_app();
    let (alice, _) = register(&app, "alice@example.com", "alice").await;
    let (bob, _) = register(&app, "bob@example.com", "bob").await;

    let book = create_book(
        &app,
        &alice,
        "Alice's",
        "https://res.example.com/demo/image/upload/v1/books/alice.png",
    )
    .await;
    let id = book["id"].as_str().unwrap();

    let (status, body) = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/api/books/{id}"),
            json!({"title": "Bob's now"}),
            Some(&bob),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "forbidden");

    let (status, _) = send(
        &app.router,
        bare_request("DELETE", &format!("/api/books/{id}"), Some(&bob)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Record untouched, asset untouched.
    let (_, mine) = send(
        &app.router,
        bare_request("GET", "/api/books/user/recommended", Some(&alice)),
    )
    .await;
    assert_eq!(mine[0]["title"], "Alice's");
    assert!(app.media.destroyed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn delete_validates_id_and_existence() {
    let app = test_app();
    let (token, _) = register(&app, "alice@example.com", "alice").await;

    let (status, body) = send(
        &app.router,
        bare_request("DELETE", "/api/books/not-a-uuid", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Invalid book ID");

    let (status, _) = send(
        &app.router,
        bare_request(
            "DELETE",
            &format!("/api/books/{}", uuid::Uuid::now_v7()),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_destroys_the_remote_asset_then_the_record() {
    let app = test_app();
    let (token, _) = register(&app, "alice@example.com", "alice").await;
    let book = create_book(
        &app,
        &token,
        "Doomed",
        "https://res.example.com/demo/image/upload/v1700000000/books/doomed.png",
    )
    .await;
    let id = book["id"].as_str().unwrap();

    let (status, body) = send(
        &app.router,
        bare_request("DELETE", &format!("/api/books/{id}"), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Book deleted successfully");
    assert_eq!(*app.media.destroyed.lock().unwrap(), vec!["books/doomed"]);

    let (status, _) = send(
        &app.router,
        bare_request("GET", "/api/books", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_succeeds_even_when_remote_destroy_fails() {
    let app = test_app();
    let (token, _) = register(&app, "alice@example.com", "alice").await;
    let book = create_book(
        &app,
        &token,
        "Doomed",
        "https://res.example.com/demo/image/upload/v1/books/doomed.png",
    )
    .await;
    let id = book["id"].as_str().unwrap();

    app.media.fail_destroy.store(true, Ordering::SeqCst);

    let (status, _) = send(
        &app.router,
        bare_request("DELETE", &format!("/api/books/{id}"), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The record is gone from subsequent listings regardless.
    let (status, _) = send(
        &app.router,
        bare_request("GET", "/api/books/user/recommended", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// --- uploads ---

#[tokio::test]
async fn multipart_upload_returns_the_public_url() {
    let app = test_app();
    let (token, _) = register(&app, "alice@example.com", "alice").await;

    let boundary = "bookworm-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"cover.png\"\r\n\
         Content-Type: image/png\r\n\r\n\
         fake-png-bytes\r\n\
         --{boundary}--\r\n"
    );

    let request = Request::builder()
        .method("POST")
        .uri("/api/uploads")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let url = body["imageUrl"].as_str().unwrap();
    assert!(url.contains("/upload/"));
    assert_eq!(*app.media.uploads.lock().unwrap(), vec!["image/png"]);
}

#[tokio::test]
async fn upload_without_a_file_field_is_rejected() {
    let app = test_app();
    let (token, _) = register(&app, "alice@example.com", "alice").await;

    let boundary = "bookworm-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"other\"\r\n\r\n\
         value\r\n\
         --{boundary}--\r\n"
    );

    let request = Request::builder()
        .method("POST")
        .uri("/api/uploads")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "No file uploaded");
}
