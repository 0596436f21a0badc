use async_trait::async_trait;
use tubely_core::models::{CreateVideoParams, Video};
use tubely_core::AppError;
use uuid::Uuid;

/// Storage for asset records.
///
/// Implementations must be safe for concurrent use. Updates are
/// last-writer-wins; no cross-request serialization is provided.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn create_video(&self, params: CreateVideoParams) -> Result<Video, AppError>;

    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError>;

    /// Records owned by `user_id`, newest first
    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<Video>, AppError>;

    /// Overwrite the mutable fields of an existing record and bump `updated_at`.
    ///
    /// Fails with `NotFound` if the record no longer exists.
    async fn update_video(&self, video: &Video) -> Result<Video, AppError>;
}
