//! OpenAPI documentation served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use tubely_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tubely API",
        version = "0.1.0",
        description = "Video ingestion API: uploads are staged, classified by aspect ratio, remuxed for fast start and stored in object storage. Reads return presigned URLs."
    ),
    paths(
        handlers::health::health_check,
        handlers::videos::create_video,
        handlers::videos::list_videos,
        handlers::videos::get_video,
        handlers::video_upload::upload_video,
        handlers::thumbnail_upload::upload_thumbnail,
        handlers::media::serve_media,
    ),
    components(
        schemas(
            models::Video,
            handlers::videos::CreateVideoRequest,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "videos", description = "Video records, video and thumbnail uploads"),
        (name = "media", description = "Signed reads of locally stored objects"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_upload_routes() {
        let spec = ApiDoc::openapi();
        assert!(spec.paths.paths.contains_key("/api/video_upload/{video_id}"));
        assert!(spec.paths.paths.contains_key("/api/thumbnail_upload/{video_id}"));
        assert!(spec.paths.paths.contains_key("/api/videos/{video_id}"));
    }
}
