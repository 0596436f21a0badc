//! Configuration module
//!
//! One [`Config`] value is built at startup from the environment and passed
//! explicitly to everything that needs it. Tests construct it directly.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 8091;
const JWT_EXPIRY_HOURS: i64 = 24;
const MAX_VIDEO_SIZE_MB: usize = 1024;
const MAX_THUMBNAIL_SIZE_MB: usize = 10;
const MEDIA_TOOL_TIMEOUT_SECS: u64 = 300;
const PRESIGNED_URL_TTL_SECS: u64 = 3600;
const LOCAL_STORAGE_BUCKET: &str = "tubely-local";
const MIN_JWT_SECRET_LEN: usize = 32;

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub environment: String,
    /// Base URL under which `/assets` and `/media` are reachable
    pub public_base_url: String,
}

/// Storage, tooling and upload limits
#[derive(Clone, Debug)]
pub struct MediaConfig {
    pub base: BaseConfig,
    /// Unset selects the in-memory metadata store
    pub database_url: Option<String>,
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // S3-compatible providers (MinIO etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_bucket: String,
    pub assets_root: PathBuf,
    pub staging_dir: Option<PathBuf>,
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    pub media_tool_timeout_secs: u64,
    pub max_video_size_bytes: usize,
    pub max_thumbnail_size_bytes: usize,
    pub video_allowed_content_types: Vec<String>,
    pub thumbnail_allowed_content_types: Vec<String>,
    pub presigned_url_ttl_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<MediaConfig>);

impl Config {
    fn as_media(&self) -> &MediaConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = MediaConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_media().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_media().base.environment)
    }

    pub fn environment(&self) -> &str {
        &self.as_media().base.environment
    }

    pub fn server_port(&self) -> u16 {
        self.as_media().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_media().base.cors_origins
    }

    pub fn jwt_secret(&self) -> &str {
        &self.as_media().base.jwt_secret
    }

    pub fn jwt_expiry_hours(&self) -> i64 {
        self.as_media().base.jwt_expiry_hours
    }

    pub fn public_base_url(&self) -> &str {
        self.as_media().base.public_base_url.trim_end_matches('/')
    }

    pub fn database_url(&self) -> Option<&str> {
        self.as_media().database_url.as_deref()
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_media().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_media().s3_bucket.as_deref()
    }

    /// `S3_REGION` wins over `AWS_REGION`
    pub fn s3_region(&self) -> Option<&str> {
        self.as_media()
            .s3_region
            .as_deref()
            .or(self.as_media().aws_region.as_deref())
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_media().s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_media().local_storage_path.as_deref()
    }

    pub fn local_storage_bucket(&self) -> &str {
        &self.as_media().local_storage_bucket
    }

    pub fn assets_root(&self) -> &PathBuf {
        &self.as_media().assets_root
    }

    /// Staging directory, falling back to the OS temp dir
    pub fn staging_dir(&self) -> PathBuf {
        self.as_media()
            .staging_dir
            .clone()
            .unwrap_or_else(env::temp_dir)
    }

    pub fn ffprobe_path(&self) -> &str {
        &self.as_media().ffprobe_path
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.as_media().ffmpeg_path
    }

    pub fn media_tool_timeout(&self) -> Duration {
        Duration::from_secs(self.as_media().media_tool_timeout_secs)
    }

    pub fn max_video_size_bytes(&self) -> usize {
        self.as_media().max_video_size_bytes
    }

    pub fn max_thumbnail_size_bytes(&self) -> usize {
        self.as_media().max_thumbnail_size_bytes
    }

    pub fn video_allowed_content_types(&self) -> &[String] {
        &self.as_media().video_allowed_content_types
    }

    pub fn thumbnail_allowed_content_types(&self) -> &[String] {
        &self.as_media().thumbnail_allowed_content_types
    }

    pub fn presigned_url_ttl(&self) -> Duration {
        Duration::from_secs(self.as_media().presigned_url_ttl_secs)
    }
}

fn is_production_env(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

/// Comma list of media types, parameters stripped: `"Video/MP4; codecs=x"` -> `"video/mp4"`.
fn split_content_types(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.split(';').next().unwrap_or_default().trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn size_limit_bytes(
    name: &str,
    value: Option<String>,
    default_mb: usize,
) -> Result<usize, anyhow::Error> {
    let mb = match value {
        Some(value) => value
            .trim()
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("{} must be a whole number of megabytes", name))?,
        None => default_mb,
    };
    mb.checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow::anyhow!("{} is too large", name))
}

impl MediaConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = lookup("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let server_port: u16 = match lookup("PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            None => SERVER_PORT,
        };

        let public_base_url = lookup("PUBLIC_BASE_URL")
            .or_else(|| lookup("PLATFORM"))
            .unwrap_or_else(|| format!("http://localhost:{}", server_port));

        let base = BaseConfig {
            server_port,
            cors_origins,
            jwt_secret: lookup("JWT_SECRET")
                .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            jwt_expiry_hours: lookup("JWT_EXPIRY_HOURS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(JWT_EXPIRY_HOURS),
            environment,
            public_base_url,
        };

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value
                .parse::<StorageBackend>()
                .map_err(|e| anyhow::anyhow!("STORAGE_BACKEND: {}", e))?,
            None => StorageBackend::S3,
        };

        let max_video_size_bytes = size_limit_bytes(
            "MAX_VIDEO_SIZE_MB",
            lookup("MAX_VIDEO_SIZE_MB"),
            MAX_VIDEO_SIZE_MB,
        )?;
        let max_thumbnail_size_bytes = size_limit_bytes(
            "MAX_THUMBNAIL_SIZE_MB",
            lookup("MAX_THUMBNAIL_SIZE_MB"),
            MAX_THUMBNAIL_SIZE_MB,
        )?;

        Ok(MediaConfig {
            base,
            database_url: lookup("DATABASE_URL").filter(|s| !s.trim().is_empty()),
            storage_backend,
            s3_bucket: lookup("S3_BUCKET"),
            s3_region: lookup("S3_REGION"),
            s3_endpoint: lookup("S3_ENDPOINT"),
            aws_region: lookup("AWS_REGION"),
            local_storage_path: lookup("LOCAL_STORAGE_PATH"),
            local_storage_bucket: lookup("LOCAL_STORAGE_BUCKET")
                .unwrap_or_else(|| LOCAL_STORAGE_BUCKET.to_string()),
            assets_root: PathBuf::from(
                lookup("ASSETS_ROOT").unwrap_or_else(|| "./assets".to_string()),
            ),
            staging_dir: lookup("STAGING_DIR").map(PathBuf::from),
            ffprobe_path: lookup("FFPROBE_PATH").unwrap_or_else(|| "ffprobe".to_string()),
            ffmpeg_path: lookup("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()),
            media_tool_timeout_secs: lookup("MEDIA_TOOL_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MEDIA_TOOL_TIMEOUT_SECS),
            max_video_size_bytes,
            max_thumbnail_size_bytes,
            video_allowed_content_types: split_content_types(
                &lookup("VIDEO_ALLOWED_CONTENT_TYPES").unwrap_or_else(|| "video/mp4".to_string()),
            ),
            thumbnail_allowed_content_types: split_content_types(
                &lookup("THUMBNAIL_ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|| "image/jpeg,image/png".to_string()),
            ),
            presigned_url_ttl_secs: lookup("PRESIGNED_URL_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(PRESIGNED_URL_TTL_SECS),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LEN
            ));
        }

        if let Some(url) = &self.database_url {
            if !(url.starts_with("postgresql://") || url.starts_with("postgres://")) {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_bucket.trim().is_empty()
                    || self.local_storage_bucket.contains(',')
                {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BUCKET must be non-empty and must not contain ','"
                    ));
                }
            }
        }

        if self.presigned_url_ttl_secs == 0 {
            return Err(anyhow::anyhow!("PRESIGNED_URL_TTL_SECS must be greater than 0"));
        }
        if self.media_tool_timeout_secs == 0 {
            return Err(anyhow::anyhow!("MEDIA_TOOL_TIMEOUT_SECS must be greater than 0"));
        }
        if self.max_video_size_bytes == 0 || self.max_thumbnail_size_bytes == 0 {
            return Err(anyhow::anyhow!("Upload size limits must be greater than 0"));
        }
        if self.video_allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "VIDEO_ALLOWED_CONTENT_TYPES must list at least one type"
            ));
        }
        if self.thumbnail_allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "THUMBNAIL_ALLOWED_CONTENT_TYPES must list at least one type"
            ));
        }

        Ok(())
    }
}
