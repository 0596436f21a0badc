use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Probe failed: {0}")]
    ProbeFailed(String),

    #[error("No video stream found")]
    NoStreams,

    #[error("Invalid video geometry {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },

    #[error("Remux failed: {0}")]
    RemuxFailed(String),

    #[error("{tool} could not be started: {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} timed out after {seconds}s")]
    ToolTimeout { tool: String, seconds: u64 },

    #[error("Upload exceeds the limit of {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ProcessingError {
    /// Failures that indicate an unreadable or malformed upload rather than
    /// an environment fault.
    pub fn is_classification_failure(&self) -> bool {
        matches!(
            self,
            ProcessingError::ProbeFailed(_)
                | ProcessingError::NoStreams
                | ProcessingError::InvalidGeometry { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_failures() {
        assert!(ProcessingError::ProbeFailed("exit 1".into()).is_classification_failure());
        assert!(ProcessingError::NoStreams.is_classification_failure());
        assert!(ProcessingError::InvalidGeometry {
            width: 1920,
            height: 0
        }
        .is_classification_failure());

        assert!(!ProcessingError::RemuxFailed("exit 1".into()).is_classification_failure());
        assert!(!ProcessingError::ToolTimeout {
            tool: "ffprobe".into(),
            seconds: 5
        }
        .is_classification_failure());
        assert!(!ProcessingError::Io(io::Error::other("disk")).is_classification_failure());
    }
}
