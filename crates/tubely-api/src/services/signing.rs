use std::time::Duration;

use tubely_core::models::Video;
use tubely_core::AppError;
use tubely_storage::Storage;

use crate::error::{app_error_from_reference, app_error_from_storage};

/// Replace the stored reference in `video_url` with a presigned URL.
///
/// Records without an uploaded video are returned unchanged. The URL is
/// computed fresh on every call and never written back.
pub async fn sign_video(
    storage: &dyn Storage,
    mut video: Video,
    expires_in: Duration,
) -> Result<Video, AppError> {
    let Some(reference) = video
        .storage_reference()
        .map_err(app_error_from_reference)?
    else {
        return Ok(video);
    };

    let url = storage
        .presigned_url(reference.bucket(), reference.key(), expires_in)
        .await
        .map_err(app_error_from_storage)?;
    video.video_url = Some(url);
    Ok(video)
}

/// Sign every record in a listing.
pub async fn sign_videos(
    storage: &dyn Storage,
    videos: Vec<Video>,
    expires_in: Duration,
) -> Result<Vec<Video>, AppError> {
    let mut signed = Vec::with_capacity(videos.len());
    for video in videos {
        signed.push(sign_video(storage, video, expires_in).await?);
    }
    Ok(signed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tubely_storage::{LocalStorage, MediaUrlSigner};
    use uuid::Uuid;

    const SECRET: &str = "signing-secret-signing-secret-1234";

    fn video(video_url: Option<&str>) -> Video {
        let now = Utc::now();
        Video {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            thumbnail_url: None,
            video_url: video_url.map(str::to_string),
            title: "title".into(),
            description: "description".into(),
            user_id: Uuid::new_v4(),
        }
    }

    async fn storage(dir: &std::path::Path) -> LocalStorage {
        let signer = MediaUrlSigner::new(SECRET, "http://localhost:8091");
        LocalStorage::new(dir, "bucket-a", signer).await.unwrap()
    }

    #[tokio::test]
    async fn leaves_records_without_video_alone() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let original = video(None);
        let signed = sign_video(&storage, original.clone(), Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(signed, original);
    }

    #[tokio::test]
    async fn replaces_reference_with_signed_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let signed = sign_video(
            &storage,
            video(Some("bucket-a,wide/abc.mp4")),
            Duration::from_secs(3600),
        )
        .await
        .unwrap();

        let url = signed.video_url.unwrap();
        assert!(url.starts_with("http://localhost:8091/media/bucket-a/wide/abc.mp4?"));
        assert!(url.contains("signature="));
    }

    #[tokio::test]
    async fn malformed_reference_is_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let err = sign_video(&storage, video(Some("no-delimiter")), Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
