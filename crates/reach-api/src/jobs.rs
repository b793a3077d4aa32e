use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use reach_db::lifecycle::{CompleteJobError, CompletionOutcome};
use reach_types::api::{
    Claims, CompleteJobResponse, CreateJobRequest, DataResponse, JobResponse,
};
use reach_types::models::Role;

use crate::auth::AppState;
use crate::convert::job_response;
use crate::error::{ApiError, blocking};
use crate::middleware::require_role;

/// Open jobs the caller can still apply to: anything they are hired on or
/// have proposed to is filtered out server-side.
pub async fn list_new(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();
    let rows = blocking(move || db.db.list_new_jobs(&caller)).await?;

    let jobs: Vec<JobResponse> = rows.into_iter().map(|row| job_response(row, vec![])).collect();
    Ok(Json(DataResponse::new(jobs, "open jobs fetched")))
}

pub async fn list_saved(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();
    let rows = blocking(move || db.db.list_saved_jobs(&caller)).await?;

    let jobs: Vec<JobResponse> = rows.into_iter().map(|row| job_response(row, vec![])).collect();
    Ok(Json(DataResponse::new(jobs, "saved jobs fetched")))
}

pub async fn create_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::Business)?;

    if req.title.trim().is_empty() {
        return Err(ApiError::Validation("title must not be empty".into()));
    }
    if !req.price.is_finite() || req.price < 0.0 {
        return Err(ApiError::Validation("price must be non-negative".into()));
    }
    if let Some(pct) = req.goal_contribution_percent {
        if !(0.0..=100.0).contains(&pct) {
            return Err(ApiError::Validation(
                "goal contribution percent must be between 0 and 100".into(),
            ));
        }
    }

    // A goal link must resolve at creation time.
    if let Some(goal_id) = req.goal_id {
        let db = state.clone();
        let goal = blocking(move || db.db.get_goal(&goal_id.to_string()))
            .await?
            .ok_or(ApiError::NotFound("goal"))?;
        if goal.owner_id != claims.sub.to_string() {
            return Err(ApiError::Forbidden("goal belongs to another business".into()));
        }
    }

    let job_id = Uuid::new_v4();
    let db = state.clone();
    let owner = claims.sub.to_string();
    let row = blocking(move || {
        db.db.insert_job(
            &job_id.to_string(),
            &owner,
            &req.title,
            &req.description,
            req.price,
            req.goal_id.map(|g| g.to_string()).as_deref(),
            req.goal_contribution_percent,
        )?;
        db.db.get_job(&job_id.to_string())
    })
    .await?
    .ok_or(ApiError::NotFound("job"))?;

    Ok((StatusCode::CREATED, Json(job_response(row, vec![]))))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let (row, hired) = blocking(move || {
        let row = db.db.get_job(&id.to_string())?;
        let hired = match &row {
            Some(_) => db.db.hired_influencer_ids(&id.to_string())?,
            None => vec![],
        };
        Ok((row, hired))
    })
    .await?;

    let row = row.ok_or(ApiError::NotFound("job"))?;
    Ok(Json(job_response(row, hired)))
}

#[derive(Debug, Deserialize)]
pub struct DeleteJobQuery {
    #[serde(rename = "jobId")]
    pub job_id: Option<Uuid>,
}

/// Deletion requires the id twice: in the path and as the `jobId` query
/// parameter. A missing query parameter is a 400 and deletes nothing.
pub async fn delete_job(
    State(state): State<AppState>,
    Path(_id): Path<String>,
    Query(query): Query<DeleteJobQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let job_id = query
        .job_id
        .ok_or_else(|| ApiError::Validation("jobId query parameter is required".into()))?;

    let db = state.clone();
    let owner = blocking(move || db.db.get_job(&job_id.to_string()))
        .await?
        .ok_or(ApiError::NotFound("job"))?
        .owner_id;
    if owner != claims.sub.to_string() {
        return Err(ApiError::Forbidden("only the posting business may delete a job".into()));
    }

    let db = state.clone();
    let deleted = blocking(move || db.db.delete_job(&job_id.to_string()))
        .await?
        .ok_or(ApiError::NotFound("job"))?;

    Ok(Json(job_response(deleted, vec![])))
}

/// Complete a job and credit its linked goal. Owner only; idempotent.
pub async fn complete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let job = blocking(move || db.db.get_job(&id.to_string()))
        .await?
        .ok_or(ApiError::NotFound("job"))?;
    if job.owner_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden("only the posting business may complete a job".into()));
    }

    let db = state.clone();
    let outcome = tokio::task::spawn_blocking(move || db.db.complete_job(&id.to_string()))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {e}")))?
        .map_err(|e| match e {
            CompleteJobError::JobNotFound(_) => ApiError::NotFound("job"),
            CompleteJobError::MissingGoal { .. } => ApiError::NotFound("goal"),
            CompleteJobError::Store(inner) => ApiError::Internal(inner),
        })?;

    let (row, credited, already_completed) = match outcome {
        CompletionOutcome::Completed { job, credited } => (job, credited, false),
        CompletionOutcome::AlreadyCompleted { job } => (job, 0.0, true),
    };

    Ok(Json(CompleteJobResponse {
        job: job_response(row, vec![]),
        credited,
        already_completed,
    }))
}

pub async fn save_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();
    blocking(move || {
        if db.db.get_job(&id.to_string())?.is_none() {
            return Ok(false);
        }
        db.db.save_job(&caller, &id.to_string())?;
        Ok(true)
    })
    .await?
    .then_some(StatusCode::NO_CONTENT)
    .ok_or(ApiError::NotFound("job"))
}

pub async fn unsave_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();
    blocking(move || db.db.unsave_job(&caller, &id.to_string())).await?;
    Ok(StatusCode::NO_CONTENT)
}
