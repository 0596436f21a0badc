//! Test helpers: build AppState and router for integration tests.
//!
//! Every app gets its own temp dirs for staging, object storage and assets, an
//! in-memory repository and fake media tools, so no external binaries or
//! database are needed.

#![allow(dead_code)]

pub mod auth;
pub mod fakes;

use axum_test::TestServer;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tubely_api::setup::routes;
use tubely_api::state::{AppState, MediaState};
use tubely_core::models::Video;
use tubely_core::{Config, MediaConfig};
use tubely_db::{InMemoryVideoRepository, VideoRepository};
use tubely_processing::{MediaClassifier, Stager};
use tubely_storage::{LocalStorage, MediaUrlSigner, Storage};
use uuid::Uuid;

use fakes::{FailingStorage, FailingUpdateRepository, FakeProbe, FakeRemuxer};

pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const TEST_BASE_URL: &str = "http://localhost:8091";
pub const TEST_BUCKET: &str = "tubely-local";

#[derive(Debug, Clone, Copy, Default)]
pub struct TestOptions {
    pub max_video_mb: Option<usize>,
    pub fail_remux: bool,
    pub fail_store: bool,
    pub fail_persist: bool,
}

/// Test application: server plus the collaborators behind it.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub videos: Arc<InMemoryVideoRepository>,
    pub probe: Arc<FakeProbe>,
    pub staging_dir: TempDir,
    pub storage_dir: TempDir,
    pub assets_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Files currently present in the staging directory.
    pub fn staged_files(&self) -> usize {
        count_entries(self.staging_dir.path())
    }

    /// Files anywhere under the object store root.
    pub fn stored_objects(&self) -> usize {
        count_files(self.storage_dir.path())
    }

    pub fn stored_object(&self, key: &str) -> std::path::PathBuf {
        self.storage_dir.path().join(TEST_BUCKET).join(key)
    }

    /// Insert a record owned by `user_id` directly into the repository.
    pub async fn create_video(&self, user_id: Uuid) -> Video {
        let now = chrono::Utc::now();
        let video = Video {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            thumbnail_url: None,
            video_url: None,
            title: "boots".to_string(),
            description: "a video about boots".to_string(),
            user_id,
        };
        self.videos.insert(video.clone()).await;
        video
    }

    pub async fn stored_video(&self, id: Uuid) -> Video {
        self.videos
            .get_video(id)
            .await
            .unwrap()
            .expect("video should exist")
    }
}

pub fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

fn count_files(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}

pub fn test_config(
    staging_dir: &Path,
    storage_dir: &Path,
    assets_dir: &Path,
    options: &TestOptions,
) -> Config {
    let mut vars = HashMap::new();
    vars.insert("JWT_SECRET", TEST_JWT_SECRET.to_string());
    vars.insert("PUBLIC_BASE_URL", TEST_BASE_URL.to_string());
    vars.insert("STORAGE_BACKEND", "local".to_string());
    vars.insert("LOCAL_STORAGE_PATH", storage_dir.display().to_string());
    vars.insert("LOCAL_STORAGE_BUCKET", TEST_BUCKET.to_string());
    vars.insert("ASSETS_ROOT", assets_dir.display().to_string());
    vars.insert("STAGING_DIR", staging_dir.display().to_string());
    if let Some(mb) = options.max_video_mb {
        vars.insert("MAX_VIDEO_SIZE_MB", mb.to_string());
    }

    let media = MediaConfig::from_lookup(|key| vars.get(key).cloned()).expect("valid test config");
    let config = Config(Box::new(media));
    config.validate().expect("test config validates");
    config
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(TestOptions::default()).await
}

pub async fn setup_test_app_with(options: TestOptions) -> TestApp {
    let staging_dir = TempDir::new().unwrap();
    let storage_dir = TempDir::new().unwrap();
    let assets_dir = TempDir::new().unwrap();

    let config = test_config(
        staging_dir.path(),
        storage_dir.path(),
        assets_dir.path(),
        &options,
    );

    let signer = MediaUrlSigner::new(TEST_JWT_SECRET, TEST_BASE_URL);
    let local = LocalStorage::new(storage_dir.path(), TEST_BUCKET, signer.clone())
        .await
        .unwrap();
    let storage: Arc<dyn Storage> = if options.fail_store {
        Arc::new(FailingStorage::new(local))
    } else {
        Arc::new(local)
    };

    let videos = Arc::new(InMemoryVideoRepository::new());
    let repository: Arc<dyn VideoRepository> = if options.fail_persist {
        Arc::new(FailingUpdateRepository::new(videos.clone()))
    } else {
        videos.clone()
    };
    let probe = Arc::new(FakeProbe::new(1920, 1080));
    let remuxer = Arc::new(FakeRemuxer::new(options.fail_remux));

    let state = Arc::new(AppState {
        config: config.clone(),
        videos: repository,
        media: MediaState {
            storage,
            stager: Stager::new(staging_dir.path()),
            classifier: MediaClassifier::new(probe.clone()),
            remuxer,
            media_signer: signer,
        },
    });

    let router = routes::setup_routes(&config, state.clone()).expect("routes build");
    let server = TestServer::new(router).expect("test server starts");

    TestApp {
        server,
        state,
        videos,
        probe,
        staging_dir,
        storage_dir,
        assets_dir,
    }
}
