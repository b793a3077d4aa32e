use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use reach_db::queries::ContractResolution;
use reach_types::api::{Claims, ContractResponse, CreateContractRequest, DataResponse};
use reach_types::models::Role;

use crate::auth::AppState;
use crate::convert::contract_response;
use crate::error::{ApiError, blocking};
use crate::middleware::require_role;

/// A business offers a contract binding itself, a job, and an influencer.
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateContractRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::Business)?;

    if req.terms.trim().is_empty() {
        return Err(ApiError::Validation("terms must not be empty".into()));
    }

    let db = state.clone();
    let job = blocking(move || db.db.get_job(&req.job_id.to_string()))
        .await?
        .ok_or(ApiError::NotFound("job"))?;
    if job.owner_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden("job belongs to another business".into()));
    }

    let db = state.clone();
    let influencer = blocking(move || db.db.get_user_by_id(&req.influencer_id.to_string()))
        .await?
        .ok_or(ApiError::NotFound("influencer"))?;
    if influencer.role != Role::Influencer.as_str() {
        return Err(ApiError::Validation("contract counterparty must be an influencer".into()));
    }

    let contract_id = Uuid::new_v4();
    let db = state.clone();
    let client = claims.sub.to_string();
    let row = blocking(move || {
        db.db.insert_contract(
            &contract_id.to_string(),
            &req.job_id.to_string(),
            &req.influencer_id.to_string(),
            &client,
            &req.terms,
        )?;
        db.db.get_contract(&contract_id.to_string())
    })
    .await?
    .ok_or(ApiError::NotFound("contract"))?;

    Ok((StatusCode::CREATED, Json(contract_response(row))))
}

/// Contracts the caller is party to, either side.
pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();
    let rows = blocking(move || db.db.list_contracts_for_user(&caller)).await?;
    let contracts: Vec<ContractResponse> = rows.into_iter().map(contract_response).collect();
    Ok(Json(DataResponse::new(contracts, "contracts fetched")))
}

pub async fn accept(
    state: State<AppState>,
    id: Path<Uuid>,
    claims: Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    resolve(state, id, claims, true).await
}

pub async fn decline(
    state: State<AppState>,
    id: Path<Uuid>,
    claims: Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    resolve(state, id, claims, false).await
}

/// Only the influencer the contract names may accept or decline it.
/// Acceptance books an unpaid earning over the job's price.
async fn resolve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    accept: bool,
) -> Result<Json<ContractResponse>, ApiError> {
    let db = state.clone();
    let contract = blocking(move || db.db.get_contract(&id.to_string()))
        .await?
        .ok_or(ApiError::NotFound("contract"))?;
    if contract.influencer_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden("only the named influencer may resolve this contract".into()));
    }

    let earning_id = Uuid::new_v4();
    let db = state.clone();
    match blocking(move || db.db.resolve_contract(&id.to_string(), accept, &earning_id.to_string()))
        .await?
    {
        ContractResolution::Resolved(row) => Ok(Json(contract_response(row))),
        ContractResolution::AlreadyResolved(row) => Err(ApiError::Conflict(format!(
            "contract already {}",
            row.status
        ))),
        ContractResolution::NotFound => Err(ApiError::NotFound("contract")),
    }
}
