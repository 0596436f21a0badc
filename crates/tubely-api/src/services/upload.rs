//! Video upload pipeline
//!
//! authorize -> stage -> classify -> remux -> store -> persist -> sign
//!
//! Every intermediate file is owned by a guard living in this module's stack
//! frames, so the staging directory is left clean whichever step fails and
//! also when the request future is dropped mid-upload.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Multipart;
use tubely_core::models::{StorageReference, Video};
use tubely_core::AppError;
use tubely_processing::StagedFile;
use tubely_storage::generate_video_key;
use uuid::Uuid;

use crate::constants::{REMUXED_CONTENT_TYPE, REMUXED_EXTENSION, VIDEO_FIELD};
use crate::error::{app_error_from_processing, app_error_from_reference, app_error_from_storage};
use crate::services::load_owned_video;
use crate::services::signing::sign_video;
use crate::state::AppState;
use crate::utils::upload::stage_file_part;

pub struct VideoUploadService {
    state: Arc<AppState>,
}

impl VideoUploadService {
    pub fn new(state: &Arc<AppState>) -> Self {
        Self {
            state: state.clone(),
        }
    }

    /// Ingest the `video` part of `multipart` into the record `video_id`.
    ///
    /// Ownership is checked before the body is read, so a rejected caller
    /// never causes a staged file. Returns the updated record with a freshly
    /// signed URL in place of the stored reference.
    pub async fn upload(
        &self,
        user_id: Uuid,
        video_id: Uuid,
        multipart: Multipart,
    ) -> Result<Video, AppError> {
        let started = Instant::now();
        let config = &self.state.config;
        let media = &self.state.media;

        let mut video = load_owned_video(self.state.videos.as_ref(), video_id, user_id).await?;

        tracing::info!(video_id = %video_id, user_id = %user_id, "Uploading video");

        let staged = stage_file_part(
            &media.stager,
            multipart,
            VIDEO_FIELD,
            config.video_allowed_content_types(),
            config.max_video_size_bytes(),
        )
        .await?;

        let class = media
            .classifier
            .classify_file(staged.file.path())
            .await
            .map_err(app_error_from_processing)?;

        let remuxed = media
            .remuxer
            .remux(staged.file.path())
            .await
            .map_err(app_error_from_processing)?;
        let optimized = StagedFile::adopt(remuxed)
            .await
            .map_err(app_error_from_processing)?;
        // The raw upload is no longer needed once the remux exists.
        drop(staged);

        let bucket = media.storage.default_bucket().to_string();
        let key = generate_video_key(class, REMUXED_EXTENSION);
        let size_bytes = optimized.len();

        // `_optimized_path` unlinks the remuxed file when this frame exits.
        let (file, _optimized_path) = optimized.into_parts();
        media
            .storage
            .put_stream(
                &bucket,
                &key,
                REMUXED_CONTENT_TYPE,
                Some(size_bytes),
                Box::pin(file),
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, video_id = %video_id, key = %key, "Failed to store video");
                app_error_from_storage(e)
            })?;

        let reference = StorageReference::new(bucket.as_str(), key.as_str())
            .map_err(app_error_from_reference)?;
        video.video_url = Some(reference.encode());

        let updated = match self.state.videos.update_video(&video).await {
            Ok(updated) => updated,
            Err(e) => {
                self.discard_object(&bucket, &key).await;
                return Err(e);
            }
        };

        tracing::info!(
            video_id = %video_id,
            user_id = %user_id,
            class = %class,
            bucket = %bucket,
            key = %key,
            size_bytes,
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Video upload complete"
        );

        sign_video(media.storage.as_ref(), updated, config.presigned_url_ttl()).await
    }

    /// Remove an object whose reference could not be recorded.
    async fn discard_object(&self, bucket: &str, key: &str) {
        if let Err(e) = self.state.media.storage.delete(bucket, key).await {
            tracing::warn!(
                error = %e,
                bucket = %bucket,
                key = %key,
                "Failed to remove orphaned video object"
            );
        }
    }
}
