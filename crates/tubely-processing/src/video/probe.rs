//! Stream geometry via `ffprobe`.

use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tubely_core::models::VideoGeometry;

use super::tools::{run_tool, stderr_tail};
use crate::error::ProcessingError;

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    streams: Option<Vec<FFprobeStream>>,
}

#[derive(Debug, Deserialize)]
struct FFprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Reads the geometry of the first video stream of a file.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<VideoGeometry, ProcessingError>;
}

/// [`MediaProbe`] backed by the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    ffprobe_path: String,
    timeout: Duration,
}

impl FfprobeProbe {
    pub fn new(ffprobe_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    #[tracing::instrument(skip(self, path), fields(path = %path.display()))]
    async fn probe(&self, path: &Path) -> Result<VideoGeometry, ProcessingError> {
        let args: [&OsStr; 6] = [
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-print_format"),
            OsStr::new("json"),
            OsStr::new("-show_streams"),
            path.as_os_str(),
        ];
        let output = run_tool(&self.ffprobe_path, args, self.timeout).await?;

        if !output.status.success() {
            let stderr = stderr_tail(&output);
            tracing::warn!(status = %output.status, stderr = %stderr, "ffprobe failed");
            return Err(ProcessingError::ProbeFailed(format!(
                "ffprobe exited with {}",
                output.status
            )));
        }

        parse_ffprobe_output(&output.stdout)
    }
}

/// Extract the geometry of the first video stream from ffprobe JSON.
///
/// When no stream declares a `codec_type`, the first stream that carries
/// dimensions is used.
pub fn parse_ffprobe_output(stdout: &[u8]) -> Result<VideoGeometry, ProcessingError> {
    let parsed: FFprobeOutput = serde_json::from_slice(stdout).map_err(|e| {
        ProcessingError::ProbeFailed(format!("Failed to parse ffprobe output: {}", e))
    })?;

    let streams = parsed.streams.unwrap_or_default();
    if streams.is_empty() {
        return Err(ProcessingError::NoStreams);
    }

    let any_typed = streams.iter().any(|s| s.codec_type.is_some());
    let stream = if any_typed {
        streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
    } else {
        streams
            .iter()
            .find(|s| s.width.is_some() && s.height.is_some())
    }
    .ok_or(ProcessingError::NoStreams)?;

    Ok(VideoGeometry::new(
        stream.width.unwrap_or(0),
        stream.height.unwrap_or(0),
    ))
}
