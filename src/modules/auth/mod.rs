pub mod models;

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use bookworm_auth::password::{hash_password, verify_password};
use bookworm_db::User;
use bookworm_http::AppError;
use bookworm_kernel::{InitCtx, Module};

use crate::state::AppState;
use self::models::{AuthResponse, LoginRequest, RegisterRequest, UserProjection};

/// Registration and login endpoints.
pub struct AuthModule {
    state: AppState,
}

#[async_trait]
impl Module for AuthModule {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "auth module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/register", post(register))
            .route("/login", post(login))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/register": {
                    "post": {
                        "summary": "Register a new user",
                        "tags": ["Auth"],
                        "responses": {
                            "201": {
                                "description": "User registered, token issued",
                                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/AuthResponse"}}}
                            },
                            "400": {
                                "description": "Missing/short fields or duplicate email/username",
                                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}
                            }
                        }
                    }
                },
                "/login": {
                    "post": {
                        "summary": "Authenticate with email and password",
                        "tags": ["Auth"],
                        "responses": {
                            "200": {
                                "description": "Login successful, token issued",
                                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/AuthResponse"}}}
                            },
                            "400": {
                                "description": "Missing fields or invalid credentials",
                                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "AuthResponse": {
                        "type": "object",
                        "properties": {
                            "message": {"type": "string"},
                            "user": {
                                "type": "object",
                                "properties": {
                                    "id": {"type": "string"},
                                    "username": {"type": "string"},
                                    "email": {"type": "string"},
                                    "profilePicture": {"type": "string"}
                                },
                                "required": ["id", "username", "email"]
                            },
                            "token": {"type": "string"}
                        },
                        "required": ["message", "user", "token"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "auth module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "auth module stopped");
        Ok(())
    }
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let mut missing = Vec::new();
    for (field, value) in [
        ("email", &req.email),
        ("username", &req.username),
        ("password", &req.password),
    ] {
        if value.as_deref().map_or(true, str::is_empty) {
            missing.push(json!({"field": field, "error": "required"}));
        }
    }
    if !missing.is_empty() {
        return Err(AppError::validation(
            missing,
            "Email, username, and password are required",
        ));
    }

    let email = req.email.unwrap_or_default();
    let username = req.username.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    if password.len() < 6 {
        return Err(AppError::validation(
            vec![json!({"field": "password", "error": "too_short"})],
            "Password must be at least 6 characters long",
        ));
    }
    if username.len() < 3 {
        return Err(AppError::validation(
            vec![json!({"field": "username", "error": "too_short"})],
            "Username must be at least 3 characters long",
        ));
    }

    // Uniqueness is a read-then-write pre-check: email first, then username.
    if state
        .users
        .user_by_email(&email)
        .await
        .map_err(AppError::Internal)?
        .is_some()
    {
        return Err(AppError::conflict("Email already exists"));
    }
    if state
        .users
        .user_by_username(&username)
        .await
        .map_err(AppError::Internal)?
        .is_some()
    {
        return Err(AppError::conflict("Username already exists"));
    }

    let password_hash =
        hash_password(&password, state.settings.auth.bcrypt_cost).map_err(AppError::Internal)?;

    let user = User {
        id: Uuid::now_v7(),
        email,
        username,
        password_hash,
        profile_picture: req
            .profile_picture
            .unwrap_or_else(|| state.settings.storage.default_profile_url.clone()),
        created_at: OffsetDateTime::now_utc(),
    };

    state
        .users
        .insert_user(user.clone())
        .await
        .map_err(AppError::Internal)?;

    let token = state
        .issuer
        .issue(user.id, &user.username, &user.email)
        .map_err(AppError::Internal)?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user: UserProjection::from(&user),
            token,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return Err(AppError::validation(
            vec![],
            "Email and password are required",
        ));
    };
    if email.is_empty() || password.is_empty() {
        return Err(AppError::validation(
            vec![],
            "Email and password are required",
        ));
    }

    // Unknown email and wrong password answer identically so a caller cannot
    // enumerate accounts.
    let user = state
        .users
        .user_by_email(&email)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::invalid_credentials("Invalid email or password"))?;

    if !verify_password(&password, &user.password_hash) {
        return Err(AppError::invalid_credentials("Invalid email or password"));
    }

    let token = state
        .issuer
        .issue(user.id, &user.username, &user.email)
        .map_err(AppError::Internal)?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user: UserProjection::from(&user),
        token,
    }))
}

/// Create a new instance of the auth module.
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(AuthModule { state })
}
