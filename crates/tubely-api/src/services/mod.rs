//! Upload pipeline services
//!
//! [`upload::VideoUploadService`] drives stage -> classify -> remux -> store ->
//! persist for videos. [`thumbnail::ThumbnailUploadService`] shares its
//! ownership and media-type checks. [`signing`] turns stored references into
//! presigned URLs on every read.

pub mod signing;
pub mod thumbnail;
pub mod upload;

use tubely_core::models::Video;
use tubely_core::AppError;
use tubely_db::VideoRepository;
use uuid::Uuid;

/// Load a record and make sure `user_id` owns it.
pub async fn load_owned_video(
    videos: &dyn VideoRepository,
    video_id: Uuid,
    user_id: Uuid,
) -> Result<Video, AppError> {
    let video = videos
        .get_video(video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Couldn't find video".to_string()))?;

    if !video.is_owned_by(user_id) {
        tracing::warn!(
            video_id = %video_id,
            user_id = %user_id,
            "Rejected access to video owned by another user"
        );
        return Err(AppError::Forbidden(
            "Not authorized to modify this video".to_string(),
        ));
    }
    Ok(video)
}
