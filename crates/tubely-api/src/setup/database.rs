//! Metadata store setup

use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;
use tubely_db::{connect, InMemoryVideoRepository, PgVideoRepository, VideoRepository};

/// Postgres when `DATABASE_URL` is set, otherwise an in-process store.
pub async fn setup_repository(config: &Config) -> Result<Arc<dyn VideoRepository>> {
    match config.database_url() {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = connect(url).await.context("Failed to set up database")?;
            tracing::info!("Database connected and migrations applied");
            Ok(Arc::new(PgVideoRepository::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, video records are kept in memory only");
            Ok(Arc::new(InMemoryVideoRepository::new()))
        }
    }
}
