use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use reach_types::api::{Claims, DataResponse, TransactionResponse};
use reach_types::models::Role;

use crate::auth::AppState;
use crate::convert::transaction_response;
use crate::error::{ApiError, blocking};
use crate::middleware::require_role;

/// The caller's earnings ledger, newest first.
pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();
    let rows = blocking(move || db.db.list_transactions(&caller)).await?;
    let earnings: Vec<TransactionResponse> = rows.into_iter().map(transaction_response).collect();
    Ok(Json(DataResponse::new(earnings, "earnings fetched")))
}

/// A business settles an earning: status flips to paid and the payment
/// date is stamped. Idempotent; an already-paid earning keeps its date.
pub async fn pay(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, Role::Business)?;

    let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let db = state.clone();
    let row = blocking(move || db.db.mark_transaction_paid(&id.to_string(), &now))
        .await?
        .ok_or(ApiError::NotFound("transaction"))?;

    Ok(Json(transaction_response(row)))
}
