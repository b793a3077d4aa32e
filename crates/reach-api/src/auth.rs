use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, response::{IntoResponse, Redirect}};
use axum::http::StatusCode;
use uuid::Uuid;

use reach_db::Database;
use reach_media::Storage;
use reach_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use reach_types::models::{Role, UserProfile};

use crate::convert::parse_id;
use crate::error::{ApiError, blocking};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub media: Storage,
    pub jwt_secret: String,
    /// Base URL media links are minted against, e.g. `http://localhost:3000`.
    pub public_url: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::Validation(
            "username must be 3-32 characters".into(),
        ));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?
        .to_string();

    let user_id = Uuid::new_v4();
    let profile = serde_json::to_string(&UserProfile::default())
        .map_err(|e| ApiError::Internal(e.into()))?;

    // The UNIQUE constraint decides taken-ness, so two racing
    // registrations for the same name cannot both win.
    let db = state.clone();
    let username = req.username.clone();
    let role = req.role;
    let created = blocking(move || {
        db.db
            .create_user(&user_id.to_string(), &username, &password_hash, role.as_str(), &profile)
    })
    .await?;
    if !created {
        return Err(ApiError::Conflict("username already taken".into()));
    }

    let token = create_token(&state.jwt_secret, user_id, &req.username, req.role)?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let username = req.username.clone();
    let user = blocking(move || db.db.get_user_by_username(&username))
        .await?
        .ok_or(ApiError::Auth)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash unreadable: {e}")))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Auth)?;

    let user_id = parse_id(&user.id, "user");
    let role = Role::parse(&user.role)
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("corrupt role '{}' on user", user.role)))?;

    let token = create_token(&state.jwt_secret, user_id, &user.username, role)?;

    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        role,
        token,
    }))
}

/// Post-login landing: route the session to its side of the marketplace.
pub async fn callback(Extension(claims): Extension<Claims>) -> Redirect {
    match claims.role {
        Role::Business => Redirect::to("/business"),
        Role::Influencer => Redirect::to("/influencer"),
    }
}

fn create_token(
    secret: &str,
    user_id: Uuid,
    username: &str,
    role: Role,
) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        role,
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("token encoding failed: {e}")))?;

    Ok(token)
}
