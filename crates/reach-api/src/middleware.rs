use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use reach_types::api::Claims;
use reach_types::models::Role;

use crate::auth::AppState;
use crate::error::ApiError;

/// Extract and validate the JWT from the Authorization header, inserting
/// the claims as a request extension for downstream handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Auth)?;

    let token = auth_header.strip_prefix("Bearer ").ok_or(ApiError::Auth)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Auth)?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

/// Reject callers whose session carries the wrong role.
pub fn require_role(claims: &Claims, role: Role) -> Result<(), ApiError> {
    if claims.role == role {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "requires the {} role",
            role.as_str()
        )))
    }
}
