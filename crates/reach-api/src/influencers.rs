use axum::{Extension, Json, extract::State, response::IntoResponse};

use reach_types::api::{Claims, DataResponse, InfluencerResponse};

use crate::auth::AppState;
use crate::convert::influencer_response;
use crate::error::{ApiError, blocking};

/// Directory of influencer accounts, projected public fields only.
pub async fn list(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = blocking(move || db.db.list_influencers()).await?;
    let influencers: Vec<InfluencerResponse> = rows.into_iter().map(influencer_response).collect();
    Ok(Json(DataResponse::new(influencers, "influencers fetched")))
}
