use crate::keys::{validate_bucket, validate_key};
use crate::traits::{ByteStream, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use futures::StreamExt;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ClientOptions, ObjectStore, ObjectStoreExt, PutMultipartOptions,
    Result as ObjectResult, WriteMultipart,
};
use std::pin::Pin;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read size for streaming uploads; each buffer becomes part of a multipart chunk.
const READ_CHUNK_SIZE: usize = 1024 * 1024;
/// Multipart parts allowed in flight before the reader is paused
const MAX_IN_FLIGHT_PARTS: usize = 4;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    builder: AmazonS3Builder,
    store: AmazonS3,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - Bucket new objects are written to
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        validate_bucket(&bucket).map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let client_options = ClientOptions::new()
            .with_content_type_for_suffix("mp4", "video/mp4")
            .with_content_type_for_suffix("png", "image/png")
            .with_content_type_for_suffix("jpg", "image/jpeg");

        // Credentials come from the standard AWS_* environment variables.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_client_options(client_options);

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = Self::build_store(&builder, &bucket)?;

        Ok(S3Storage {
            builder,
            store,
            bucket,
        })
    }

    fn build_store(builder: &AmazonS3Builder, bucket: &str) -> StorageResult<AmazonS3> {
        builder
            .clone()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))
    }

    /// Store for `bucket`; references written under another configuration
    /// may name a bucket other than the default one.
    fn store_for(&self, bucket: &str) -> StorageResult<AmazonS3> {
        validate_bucket(bucket)?;
        if bucket == self.bucket {
            Ok(self.store.clone())
        } else {
            Self::build_store(&self.builder, bucket)
        }
    }

    fn location(key: &str) -> StorageResult<Path> {
        validate_key(key)?;
        Ok(Path::from(key))
    }
}

/// Multipart options carrying the caller's content type. Takes precedence
/// over the suffix mapping in [`ClientOptions`].
fn upload_options(content_type: &str) -> PutMultipartOptions {
    let mut attributes = Attributes::new();
    attributes.insert(Attribute::ContentType, content_type.to_string().into());
    PutMultipartOptions::from(attributes)
}

#[async_trait]
impl Storage for S3Storage {
    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }

    fn default_bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_stream(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        content_length: Option<u64>,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<u64> {
        let store = self.store_for(bucket)?;
        let location = Self::location(key)?;
        let start = std::time::Instant::now();

        let upload = store
            .put_multipart_opts(&location, upload_options(content_type))
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    "S3 multipart upload could not be started"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        let mut writer = WriteMultipart::new(upload);
        let mut buffer = vec![0u8; READ_CHUNK_SIZE];
        let mut total: u64 = 0;

        let streamed: Result<(), StorageError> = async {
            loop {
                let bytes_read = reader.read(&mut buffer).await.map_err(|e| {
                    StorageError::UploadFailed(format!("Failed to read from stream: {}", e))
                })?;
                if bytes_read == 0 {
                    break;
                }
                writer
                    .wait_for_capacity(MAX_IN_FLIGHT_PARTS)
                    .await
                    .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
                writer.write(&buffer[..bytes_read]);
                total += bytes_read as u64;
            }
            Ok(())
        }
        .await;

        if let Err(e) = streamed {
            if let Err(abort_err) = writer.abort().await {
                tracing::warn!(
                    error = %abort_err,
                    bucket = %bucket,
                    key = %key,
                    "Failed to abort S3 multipart upload"
                );
            }
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                size_bytes = total,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 stream upload failed"
            );
            return Err(e);
        }

        let finished: ObjectResult<_> = writer.finish().await;
        finished.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                size_bytes = total,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 stream upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        if let Some(expected) = content_length {
            if expected != total {
                tracing::warn!(
                    bucket = %bucket,
                    key = %key,
                    expected_bytes = expected,
                    size_bytes = total,
                    "S3 stream upload size differs from declared length"
                );
            }
        }

        tracing::info!(
            bucket = %bucket,
            key = %key,
            content_type = %content_type,
            size_bytes = total,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 stream upload successful"
        );

        Ok(total)
    }

    async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let store = self.store_for(bucket)?;
        let location = Self::location(key)?;
        let url_result: ObjectResult<_> = store
            .signed_url(Method::GET, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?
            .to_string();

        Ok(url)
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let store = self.store_for(bucket)?;
        let location = Self::location(key)?;
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = store.delete(&location).await;

        match result {
            Ok(_) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn download_stream(&self, bucket: &str, key: &str) -> StorageResult<ByteStream> {
        let store = self.store_for(bucket)?;
        let location = Self::location(key)?;
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => {
                StorageError::NotFound(format!("{}/{}", bucket, key))
            }
            other => StorageError::DownloadFailed(other.to_string()),
        })?;

        let bucket = bucket.to_string();
        let key = key.to_string();

        let stream = result.into_stream().map(move |res| match res {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 stream download error"
                );
                Err(StorageError::DownloadFailed(e.to_string()))
            }
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> S3Storage {
        S3Storage::new(
            "tubely-videos".to_string(),
            "us-east-1".to_string(),
            Some("http://localhost:9000".to_string()),
        )
        .unwrap()
    }

    #[test]
    fn rejects_invalid_bucket_and_key() {
        let storage = storage();
        assert!(storage.store_for("a/b").is_err());
        assert!(S3Storage::location("../x.mp4").is_err());
        assert!(S3Storage::location("wide/a,b.mp4").is_err());
        assert!(storage.store_for("other-bucket").is_ok());
        assert_eq!(storage.default_bucket(), "tubely-videos");
    }

    #[test]
    fn upload_carries_declared_content_type() {
        let options = upload_options("video/quicktime");
        assert_eq!(
            options
                .attributes
                .get(&Attribute::ContentType)
                .map(|v| &**v),
            Some("video/quicktime")
        );
    }
}
