//! Deterministic stand-ins for ffprobe, ffmpeg, a failing object store and a
//! failing metadata store.

use async_trait::async_trait;
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempPath;
use tokio::io::AsyncRead;
use tubely_core::models::{CreateVideoParams, Video, VideoGeometry};
use tubely_core::AppError;
use tubely_db::{InMemoryVideoRepository, VideoRepository};
use tubely_processing::{faststart_output_path, MediaProbe, ProcessingError, Remuxer};
use tubely_storage::{
    ByteStream, LocalStorage, Storage, StorageBackend, StorageError, StorageResult,
};
use uuid::Uuid;

/// Prefix the fake remux writes in front of the input bytes.
pub const REMUX_MARKER: &[u8] = b"faststart:";

/// Reports a fixed geometry, or a probe failure when none is set.
pub struct FakeProbe {
    geometry: Mutex<Option<VideoGeometry>>,
    calls: AtomicUsize,
}

impl FakeProbe {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            geometry: Mutex::new(Some(VideoGeometry::new(width, height))),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_geometry(&self, width: u32, height: u32) {
        *self.geometry.lock().unwrap() = Some(VideoGeometry::new(width, height));
    }

    pub fn fail(&self) {
        *self.geometry.lock().unwrap() = None;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaProbe for FakeProbe {
    async fn probe(&self, path: &Path) -> Result<VideoGeometry, ProcessingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(path.exists(), "probe must run against a staged file");
        let geometry = *self.geometry.lock().unwrap();
        geometry.ok_or_else(|| ProcessingError::ProbeFailed("invalid data found".to_string()))
    }
}

/// Copies the input next to itself with [`REMUX_MARKER`] prepended.
pub struct FakeRemuxer {
    fail: bool,
}

impl FakeRemuxer {
    pub fn new(fail: bool) -> Self {
        Self { fail }
    }
}

#[async_trait]
impl Remuxer for FakeRemuxer {
    async fn remux(&self, input: &Path) -> Result<TempPath, ProcessingError> {
        if self.fail {
            return Err(ProcessingError::RemuxFailed("exit status 1".to_string()));
        }
        let output = faststart_output_path(input);
        let mut contents = REMUX_MARKER.to_vec();
        contents.extend(tokio::fs::read(input).await?);
        tokio::fs::write(&output, contents).await?;
        Ok(TempPath::from_path(output))
    }
}

/// Local storage whose uploads always fail.
pub struct FailingStorage {
    inner: LocalStorage,
}

impl FailingStorage {
    pub fn new(inner: LocalStorage) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Storage for FailingStorage {
    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }

    fn default_bucket(&self) -> &str {
        self.inner.default_bucket()
    }

    async fn put_stream(
        &self,
        _bucket: &str,
        _key: &str,
        _content_type: &str,
        _content_length: Option<u64>,
        _reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<u64> {
        Err(StorageError::UploadFailed("simulated outage".to_string()))
    }

    async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.inner.presigned_url(bucket, key, expires_in).await
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.inner.delete(bucket, key).await
    }

    async fn download_stream(&self, bucket: &str, key: &str) -> StorageResult<ByteStream> {
        self.inner.download_stream(bucket, key).await
    }
}

/// In-memory repository whose updates always fail.
pub struct FailingUpdateRepository {
    inner: Arc<InMemoryVideoRepository>,
}

impl FailingUpdateRepository {
    pub fn new(inner: Arc<InMemoryVideoRepository>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl VideoRepository for FailingUpdateRepository {
    async fn create_video(&self, params: CreateVideoParams) -> Result<Video, AppError> {
        self.inner.create_video(params).await
    }

    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        self.inner.get_video(id).await
    }

    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<Video>, AppError> {
        self.inner.list_videos_for_user(user_id).await
    }

    async fn update_video(&self, _video: &Video) -> Result<Video, AppError> {
        Err(AppError::Internal("simulated database outage".to_string()))
    }
}
