//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use crate::utils::upload::check_allowed_types;
use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;
    check_allowed_types(
        "VIDEO_ALLOWED_CONTENT_TYPES",
        config.video_allowed_content_types(),
    )?;
    check_allowed_types(
        "THUMBNAIL_ALLOWED_CONTENT_TYPES",
        config.thumbnail_allowed_content_types(),
    )?;

    crate::telemetry::init_telemetry(config.is_production())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let videos = database::setup_repository(&config).await?;
    let storage = storage::setup_storage(&config).await?;
    let state = services::initialize_services(config.clone(), videos, storage).await?;
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
