//! Application state shared by every handler.
//!
//! All collaborators sit behind traits so tests can assemble a state from an
//! in-memory repository, a local object store and fake media tools.

use std::sync::Arc;

use tubely_core::Config;
use tubely_db::VideoRepository;
use tubely_processing::{MediaClassifier, Remuxer, Stager};
use tubely_storage::{MediaUrlSigner, Storage};

/// Staging, media tools and the object store used by the upload pipeline.
#[derive(Clone)]
pub struct MediaState {
    pub storage: Arc<dyn Storage>,
    pub stager: Stager,
    pub classifier: MediaClassifier,
    pub remuxer: Arc<dyn Remuxer>,
    /// Verifies `/media` URLs minted by the local storage backend
    pub media_signer: MediaUrlSigner,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub videos: Arc<dyn VideoRepository>,
    pub media: MediaState,
}
