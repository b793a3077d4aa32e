use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use reach_db::queries::ProposalResolution;
use reach_types::api::{Claims, CreateProposalRequest, DataResponse, ProposalResponse};
use reach_types::models::Role;

use crate::auth::AppState;
use crate::convert::proposal_response;
use crate::error::{ApiError, blocking};
use crate::middleware::require_role;

/// An influencer bids on an open job. One proposal per job per influencer.
pub async fn create(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateProposalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::Influencer)?;

    if req.message.trim().is_empty() {
        return Err(ApiError::Validation("proposal message must not be empty".into()));
    }

    let db = state.clone();
    let job = blocking(move || db.db.get_job(&job_id.to_string()))
        .await?
        .ok_or(ApiError::NotFound("job"))?;
    if job.status != "open" {
        return Err(ApiError::Conflict("job is no longer open".into()));
    }

    let proposal_id = Uuid::new_v4();
    let db = state.clone();
    let influencer = claims.sub.to_string();
    let inserted = blocking(move || {
        db.db
            .insert_proposal(&proposal_id.to_string(), &job_id.to_string(), &influencer, &req.message)
    })
    .await?;
    if !inserted {
        return Err(ApiError::Conflict("proposal already submitted for this job".into()));
    }

    let db = state.clone();
    let row = blocking(move || db.db.get_proposal(&proposal_id.to_string()))
        .await?
        .ok_or(ApiError::NotFound("proposal"))?;

    Ok((StatusCode::CREATED, Json(proposal_response(row))))
}

/// The posting business reviews a job's proposals.
pub async fn list_for_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let job = blocking(move || db.db.get_job(&job_id.to_string()))
        .await?
        .ok_or(ApiError::NotFound("job"))?;
    if job.owner_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden("only the posting business may review proposals".into()));
    }

    let db = state.clone();
    let rows = blocking(move || db.db.list_proposals_for_job(&job_id.to_string())).await?;
    let proposals: Vec<ProposalResponse> = rows.into_iter().map(proposal_response).collect();
    Ok(Json(DataResponse::new(proposals, "proposals fetched")))
}

pub async fn accept(
    state: State<AppState>,
    id: Path<Uuid>,
    claims: Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    resolve(state, id, claims, true).await
}

pub async fn reject(
    state: State<AppState>,
    id: Path<Uuid>,
    claims: Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    resolve(state, id, claims, false).await
}

async fn resolve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    accept: bool,
) -> Result<Json<ProposalResponse>, ApiError> {
    let db = state.clone();
    let proposal = blocking(move || db.db.get_proposal(&id.to_string()))
        .await?
        .ok_or(ApiError::NotFound("proposal"))?;

    let db = state.clone();
    let job = blocking(move || db.db.get_job(&proposal.job_id))
        .await?
        .ok_or(ApiError::NotFound("job"))?;
    if job.owner_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden("only the posting business may resolve proposals".into()));
    }

    let db = state.clone();
    match blocking(move || db.db.resolve_proposal(&id.to_string(), accept)).await? {
        ProposalResolution::Resolved(row) => Ok(Json(proposal_response(row))),
        ProposalResolution::AlreadyResolved(row) => Err(ApiError::Conflict(format!(
            "proposal already {}",
            row.status
        ))),
        ProposalResolution::NotFound => Err(ApiError::NotFound("proposal")),
    }
}
