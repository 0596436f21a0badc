//! Asset record handlers.
//!
//! Records are returned with a freshly presigned `video_url`; the stored
//! reference never leaves the server.

use crate::auth::AuthenticatedUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::services::load_owned_video;
use crate::services::signing::{sign_video, sign_videos};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tubely_core::models::{CreateVideoParams, Video};
use tubely_core::AppError;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[utoipa::path(
    post,
    path = "/api/videos",
    tag = "videos",
    request_body = CreateVideoRequest,
    responses(
        (status = 201, description = "Video record created", body = Video),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
pub async fn create_video(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateVideoRequest>,
) -> Result<(StatusCode, Json<Video>), HttpAppError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("Title must not be empty".to_string()).into());
    }

    let video = state
        .videos
        .create_video(CreateVideoParams {
            title: title.to_string(),
            description: request.description,
            user_id: user.user_id,
        })
        .await?;

    tracing::info!(video_id = %video.id, user_id = %user.user_id, "Video record created");

    Ok((StatusCode::CREATED, Json(video)))
}

#[utoipa::path(
    get,
    path = "/api/videos",
    tag = "videos",
    responses(
        (status = 200, description = "Videos owned by the caller", body = Vec<Video>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Video>>, HttpAppError> {
    let videos = state.videos.list_videos_for_user(user.user_id).await?;
    let signed = sign_videos(
        state.media.storage.as_ref(),
        videos,
        state.config.presigned_url_ttl(),
    )
    .await?;
    Ok(Json(signed))
}

#[utoipa::path(
    get,
    path = "/api/videos/{video_id}",
    tag = "videos",
    params(("video_id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video record", body = Video),
        (status = 400, description = "Invalid ID", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Video belongs to another user", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(video_id): Path<String>,
) -> Result<Json<Video>, HttpAppError> {
    let video_id = Uuid::parse_str(&video_id)?;
    let video = load_owned_video(state.videos.as_ref(), video_id, user.user_id).await?;
    let signed = sign_video(
        state.media.storage.as_ref(),
        video,
        state.config.presigned_url_ttl(),
    )
    .await?;
    Ok(Json(signed))
}
