//! Build the application state from its collaborators.

use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;
use tubely_db::VideoRepository;
use tubely_processing::{FfmpegRemuxer, FfprobeProbe, MediaClassifier, Stager};
use tubely_storage::{MediaUrlSigner, Storage};

use crate::state::{AppState, MediaState};

/// Wire the external media tools, staging and signing around the given
/// repository and storage.
pub async fn initialize_services(
    config: Config,
    videos: Arc<dyn VideoRepository>,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let stager = Stager::new(config.staging_dir());
    stager
        .ensure_dir()
        .await
        .with_context(|| format!("Failed to create staging dir {}", stager.dir().display()))?;

    tokio::fs::create_dir_all(config.assets_root())
        .await
        .with_context(|| {
            format!(
                "Failed to create assets dir {}",
                config.assets_root().display()
            )
        })?;

    let timeout = config.media_tool_timeout();
    let probe = FfprobeProbe::new(config.ffprobe_path(), timeout);
    let remuxer = FfmpegRemuxer::new(config.ffmpeg_path(), timeout);
    let media_signer = MediaUrlSigner::new(config.jwt_secret(), config.public_base_url());

    tracing::info!(
        staging_dir = %stager.dir().display(),
        assets_root = %config.assets_root().display(),
        ffprobe_path = %config.ffprobe_path(),
        ffmpeg_path = %config.ffmpeg_path(),
        timeout_secs = timeout.as_secs(),
        "Media services initialized"
    );

    Ok(Arc::new(AppState {
        config,
        videos,
        media: MediaState {
            storage,
            stager,
            classifier: MediaClassifier::new(Arc::new(probe)),
            remuxer: Arc::new(remuxer),
            media_signer,
        },
    }))
}
