//! Thumbnail upload
//!
//! Thumbnails are written under `ASSETS_ROOT` and served as static files from
//! `/assets`; the record keeps the public URL.

use std::path::Path;
use std::sync::Arc;

use axum::extract::Multipart;
use tubely_core::models::Video;
use tubely_core::AppError;
use tubely_storage::random_object_name;
use uuid::Uuid;

use crate::constants::{ASSETS_ROUTE, THUMBNAIL_FIELD};
use crate::services::load_owned_video;
use crate::services::signing::sign_video;
use crate::state::AppState;
use crate::utils::upload::stage_file_part;

pub struct ThumbnailUploadService {
    state: Arc<AppState>,
}

impl ThumbnailUploadService {
    pub fn new(state: &Arc<AppState>) -> Self {
        Self {
            state: state.clone(),
        }
    }

    pub async fn upload(
        &self,
        user_id: Uuid,
        video_id: Uuid,
        multipart: Multipart,
    ) -> Result<Video, AppError> {
        let config = &self.state.config;
        let media = &self.state.media;

        let mut video = load_owned_video(self.state.videos.as_ref(), video_id, user_id).await?;

        let staged = stage_file_part(
            &media.stager,
            multipart,
            THUMBNAIL_FIELD,
            config.thumbnail_allowed_content_types(),
            config.max_thumbnail_size_bytes(),
        )
        .await?;

        let file_name = random_object_name(staged.extension);
        let destination = config.assets_root().join(&file_name);
        copy_into_assets(staged.file.path(), &destination).await?;

        video.thumbnail_url = Some(format!(
            "{}{}/{}",
            config.public_base_url(),
            ASSETS_ROUTE,
            file_name
        ));

        let updated = match self.state.videos.update_video(&video).await {
            Ok(updated) => updated,
            Err(e) => {
                remove_asset(&destination).await;
                return Err(e);
            }
        };

        tracing::info!(
            video_id = %video_id,
            user_id = %user_id,
            content_type = %staged.content_type,
            size_bytes = staged.file.len(),
            file = %file_name,
            "Thumbnail uploaded"
        );

        sign_video(media.storage.as_ref(), updated, config.presigned_url_ttl()).await
    }
}

async fn copy_into_assets(source: &Path, destination: &Path) -> Result<(), AppError> {
    if let Err(e) = tokio::fs::copy(source, destination).await {
        remove_asset(destination).await;
        return Err(AppError::Internal(format!(
            "Failed to write thumbnail to {}: {}",
            destination.display(),
            e
        )));
    }
    Ok(())
}

/// Remove a thumbnail that is not referenced by any record.
async fn remove_asset(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "Failed to remove orphaned thumbnail"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn failed_copy_leaves_no_asset() {
        let dir = tempdir().unwrap();
        let destination = dir.path().join("thumb.png");

        let result = copy_into_assets(&dir.path().join("missing.png"), &destination).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn removing_asset_tolerates_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("thumb.png");
        std::fs::write(&path, b"png").unwrap();

        remove_asset(&path).await;
        assert!(!path.exists());
        remove_asset(&path).await;
    }
}
