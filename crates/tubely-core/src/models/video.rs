use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::storage_reference::{StorageReference, StorageReferenceError};

/// Asset record for one uploaded video.
///
/// `video_url` holds an encoded [`StorageReference`] at rest and a presigned
/// URL once the record has been signed for a response. `thumbnail_url` is
/// always a directly servable URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Video {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub title: String,
    pub description: String,
    pub user_id: Uuid,
}

impl Video {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Decode the stored reference. `Ok(None)` when no video has been uploaded yet.
    pub fn storage_reference(&self) -> Result<Option<StorageReference>, StorageReferenceError> {
        match self.video_url.as_deref() {
            None | Some("") => Ok(None),
            Some(encoded) => StorageReference::decode(encoded).map(Some),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVideoParams {
    pub title: String,
    pub description: String,
    pub user_id: Uuid,
}
