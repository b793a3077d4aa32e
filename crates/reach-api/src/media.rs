use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use tokio_util::io::ReaderStream;
use tracing::warn;

use reach_types::api::UploadResponse;

use crate::auth::AppState;
use crate::error::ApiError;

/// POST /upload — multipart form with a `file` field. Returns the stable
/// URL and public id of the stored media.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().map(str::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("failed to read file field: {e}")))?;
        if data.is_empty() {
            return Err(ApiError::Validation("uploaded file is empty".into()));
        }

        let public_id = state
            .media
            .store(&data, original_name.as_deref())
            .await
            .map_err(ApiError::Internal)?;

        let url = format!("{}/media/{}", state.public_url, public_id);
        return Ok(Json(UploadResponse { url, public_id }));
    }

    Err(ApiError::Validation("multipart field 'file' is required".into()))
}

/// GET /media/{public_id} — stream a stored file from disk.
pub async fn download(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let path = state
        .media
        .checked_path(&public_id)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let file = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound("media"));
        }
        Err(e) => {
            warn!("Failed to open media {}: {}", public_id, e);
            return Err(ApiError::Internal(e.into()));
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        reach_media::content_type_for(&public_id)
            .parse()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("bad content type: {e}")))?,
    );

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((StatusCode::OK, headers, body))
}
