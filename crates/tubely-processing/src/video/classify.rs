//! Aspect ratio classification.

use std::path::Path;
use std::sync::Arc;

use tubely_core::models::{AspectClass, VideoGeometry};

use super::probe::MediaProbe;
use crate::error::ProcessingError;

const WIDE_RATIO: f64 = 16.0 / 9.0;
const TALL_RATIO: f64 = 9.0 / 16.0;
/// Relative tolerance around each target ratio, bounds inclusive
const RATIO_TOLERANCE: f64 = 0.05;

fn within_tolerance(ratio: f64, target: f64) -> bool {
    ratio >= target * (1.0 - RATIO_TOLERANCE) && ratio <= target * (1.0 + RATIO_TOLERANCE)
}

/// Classify a geometry as wide (~16:9), tall (~9:16) or other.
pub fn classify(geometry: VideoGeometry) -> Result<AspectClass, ProcessingError> {
    if geometry.height == 0 {
        return Err(ProcessingError::InvalidGeometry {
            width: geometry.width,
            height: geometry.height,
        });
    }

    let ratio = f64::from(geometry.width) / f64::from(geometry.height);
    let class = if within_tolerance(ratio, WIDE_RATIO) {
        AspectClass::Wide
    } else if within_tolerance(ratio, TALL_RATIO) {
        AspectClass::Tall
    } else {
        AspectClass::Other
    };
    Ok(class)
}

/// Probes a file and classifies its first video stream.
#[derive(Clone)]
pub struct MediaClassifier {
    probe: Arc<dyn MediaProbe>,
}

impl MediaClassifier {
    pub fn new(probe: Arc<dyn MediaProbe>) -> Self {
        Self { probe }
    }

    pub async fn classify_file(&self, path: &Path) -> Result<AspectClass, ProcessingError> {
        let geometry = self.probe.probe(path).await?;
        let class = classify(geometry)?;
        tracing::debug!(
            width = geometry.width,
            height = geometry.height,
            class = %class,
            "Video classified"
        );
        Ok(class)
    }
}
