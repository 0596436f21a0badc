//! Signed reads for the local storage backend.
//!
//! S3 serves its own presigned URLs; objects of the local backend are streamed
//! from here once the URL's signature and expiry check out.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tubely_core::AppError;

#[derive(Debug, Deserialize)]
pub struct SignedMediaQuery {
    pub expires: u64,
    pub signature: String,
}

#[utoipa::path(
    get,
    path = "/media/{bucket}/{key}",
    tag = "media",
    params(
        ("bucket" = String, Path, description = "Storage bucket"),
        ("key" = String, Path, description = "Object key, may contain '/'"),
        ("expires" = u64, Query, description = "Unix expiry of the URL"),
        ("signature" = String, Query, description = "URL signature")
    ),
    responses(
        (status = 200, description = "Object bytes"),
        (status = 400, description = "Missing or malformed signature parameters", body = ErrorResponse),
        (status = 403, description = "Invalid or expired signature", body = ErrorResponse),
        (status = 404, description = "Object not found", body = ErrorResponse)
    )
)]
pub async fn serve_media(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
    query: Result<Query<SignedMediaQuery>, QueryRejection>,
) -> Result<Response, HttpAppError> {
    let Query(query) = query?;
    state
        .media
        .media_signer
        .verify(&bucket, &key, query.expires, &query.signature)
        .map_err(|e| {
            tracing::debug!(error = %e, bucket = %bucket, key = %key, "Rejected media URL");
            AppError::Forbidden("Invalid or expired media URL".to_string())
        })?;

    let stream = state.media.storage.download_stream(&bucket, &key).await?;

    Ok((
        [
            (CONTENT_TYPE, content_type_for_key(&key)),
            (CACHE_CONTROL, "private, no-transform"),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

fn content_type_for_key(key: &str) -> &'static str {
    match key.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "mp4" => "video/mp4",
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}
