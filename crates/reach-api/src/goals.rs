use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use reach_types::api::{Claims, CreateGoalRequest, DataResponse, GoalResponse};
use reach_types::models::Role;

use crate::auth::AppState;
use crate::convert::goal_response;
use crate::error::{ApiError, blocking};
use crate::middleware::require_role;

pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGoalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::Business)?;

    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("goal name must not be empty".into()));
    }
    if !req.target_value.is_finite() || req.target_value <= 0.0 {
        return Err(ApiError::Validation("target value must be positive".into()));
    }

    let goal_id = Uuid::new_v4();
    let db = state.clone();
    let owner = claims.sub.to_string();
    let row = blocking(move || {
        db.db
            .insert_goal(&goal_id.to_string(), &owner, &req.name, req.target_value)?;
        db.db.get_goal(&goal_id.to_string())
    })
    .await?
    .ok_or(ApiError::NotFound("goal"))?;

    Ok((StatusCode::CREATED, Json(goal_response(row))))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();
    let rows = blocking(move || db.db.list_goals(&caller)).await?;
    let goals: Vec<GoalResponse> = rows.into_iter().map(goal_response).collect();
    Ok(Json(DataResponse::new(goals, "goals fetched")))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let row = blocking(move || db.db.get_goal(&id.to_string()))
        .await?
        .ok_or(ApiError::NotFound("goal"))?;
    if row.owner_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden("goal belongs to another business".into()));
    }
    Ok(Json(goal_response(row)))
}
