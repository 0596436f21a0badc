//! Thumbnail upload integration tests.
//!
//! Run with: `cargo test -p tubely-api --test thumbnail_test`

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use helpers::auth::TestUser;
use helpers::{count_entries, setup_test_app, TEST_BASE_URL};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n tiny thumbnail";

fn thumbnail_form(content_type: &str) -> MultipartForm {
    let part = Part::bytes(PNG_BYTES.to_vec())
        .file_name("thumb.png")
        .mime_type(content_type);
    MultipartForm::new().add_part("thumbnail", part)
}

#[tokio::test]
async fn test_thumbnail_is_written_to_assets_and_served() {
    let app = setup_test_app().await;
    let user = TestUser::new();
    let video = app.create_video(user.user_id).await;

    let response = app
        .client()
        .post(&format!("/api/thumbnail_upload/{}", video.id))
        .add_header("Authorization", user.bearer())
        .multipart(thumbnail_form("image/png"))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    let url = body["thumbnail_url"].as_str().expect("thumbnail_url is set");
    let assets_prefix = format!("{}/assets/", TEST_BASE_URL);
    assert!(url.starts_with(&assets_prefix), "unexpected url {}", url);
    assert!(url.ends_with(".png"));

    let file_name = url.strip_prefix(&assets_prefix).unwrap();
    let on_disk = std::fs::read(app.assets_dir.path().join(file_name)).unwrap();
    assert_eq!(on_disk, PNG_BYTES);

    let stored = app.stored_video(video.id).await;
    assert_eq!(stored.thumbnail_url.as_deref(), Some(url));

    let served = app.client().get(&format!("/assets/{}", file_name)).await;
    assert_eq!(served.status_code(), 200);
    assert_eq!(served.as_bytes().as_ref(), PNG_BYTES);

    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn test_jpeg_thumbnail_gets_jpg_extension() {
    let app = setup_test_app().await;
    let user = TestUser::new();
    let video = app.create_video(user.user_id).await;

    let response = app
        .client()
        .post(&format!("/api/thumbnail_upload/{}", video.id))
        .add_header("Authorization", user.bearer())
        .multipart(thumbnail_form("image/jpeg"))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert!(body["thumbnail_url"].as_str().unwrap().ends_with(".jpg"));
}

#[tokio::test]
async fn test_unsupported_image_type_is_rejected() {
    let app = setup_test_app().await;
    let user = TestUser::new();
    let video = app.create_video(user.user_id).await;

    let response = app
        .client()
        .post(&format!("/api/thumbnail_upload/{}", video.id))
        .add_header("Authorization", user.bearer())
        .multipart(thumbnail_form("image/gif"))
        .await;

    assert_eq!(response.status_code(), 415);
    assert_eq!(count_entries(app.assets_dir.path()), 0);
    assert_eq!(app.staged_files(), 0);
    assert_eq!(app.stored_video(video.id).await, video);
}

#[tokio::test]
async fn test_thumbnail_for_other_users_video_is_forbidden() {
    let app = setup_test_app().await;
    let owner = TestUser::new();
    let intruder = TestUser::new();
    let video = app.create_video(owner.user_id).await;

    let response = app
        .client()
        .post(&format!("/api/thumbnail_upload/{}", video.id))
        .add_header("Authorization", intruder.bearer())
        .multipart(thumbnail_form("image/png"))
        .await;

    assert_eq!(response.status_code(), 403);
    assert_eq!(count_entries(app.assets_dir.path()), 0);
    assert_eq!(app.stored_video(video.id).await, video);
}

#[tokio::test]
async fn test_thumbnail_requires_token() {
    let app = setup_test_app().await;
    let user = TestUser::new();
    let video = app.create_video(user.user_id).await;

    let response = app
        .client()
        .post(&format!("/api/thumbnail_upload/{}", video.id))
        .multipart(thumbnail_form("image/png"))
        .await;

    assert_eq!(response.status_code(), 401);
}
