//! Fast-start remux via `ffmpeg`.
//!
//! Streams are copied without re-encoding; only the container index moves to
//! the front of the file so playback can start before the download finishes.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempPath;

use super::tools::{run_tool, stderr_tail};
use crate::error::ProcessingError;

const OUTPUT_SUFFIX: &str = ".processing";

/// Rewrites a media file for progressive playback into a new sibling file.
///
/// The input is left untouched. The returned [`TempPath`] owns the output and
/// removes it on drop.
#[async_trait]
pub trait Remuxer: Send + Sync {
    async fn remux(&self, input: &Path) -> Result<TempPath, ProcessingError>;
}

/// Output path for a remux of `input`: the input path plus `.processing`.
pub fn faststart_output_path(input: &Path) -> PathBuf {
    let mut name: OsString = input.as_os_str().to_os_string();
    name.push(OUTPUT_SUFFIX);
    PathBuf::from(name)
}

/// [`Remuxer`] backed by the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegRemuxer {
    ffmpeg_path: String,
    timeout: Duration,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    #[tracing::instrument(skip(self, input), fields(path = %input.display()))]
    async fn remux(&self, input: &Path) -> Result<TempPath, ProcessingError> {
        // Guard the output before the tool runs so a partial file is removed on
        // every failure path, including cancellation.
        let output_path = TempPath::from_path(faststart_output_path(input));
        let start = std::time::Instant::now();

        let args: [&OsStr; 10] = [
            OsStr::new("-y"),
            OsStr::new("-i"),
            input.as_os_str(),
            OsStr::new("-c"),
            OsStr::new("copy"),
            OsStr::new("-movflags"),
            OsStr::new("faststart"),
            OsStr::new("-f"),
            OsStr::new("mp4"),
            output_path.as_os_str(),
        ];
        let output = run_tool(&self.ffmpeg_path, args, self.timeout)
            .await
            .map_err(|e| match e {
                ProcessingError::Io(err) => ProcessingError::RemuxFailed(err.to_string()),
                other => other,
            })?;

        if !output.status.success() {
            let stderr = stderr_tail(&output);
            tracing::error!(status = %output.status, stderr = %stderr, "ffmpeg remux failed");
            return Err(ProcessingError::RemuxFailed(format!(
                "ffmpeg exited with {}",
                output.status
            )));
        }

        if !tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
            return Err(ProcessingError::RemuxFailed(
                "ffmpeg produced no output file".to_string(),
            ));
        }

        tracing::debug!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Remux completed"
        );

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn output_path_is_sibling_with_suffix() {
        let out = faststart_output_path(Path::new("/staging/tubely-upload-abc.mp4"));
        assert_eq!(out, PathBuf::from("/staging/tubely-upload-abc.mp4.processing"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_remux_removes_partial_output() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"input").unwrap();

        // Stand-in tool: writes a partial output (10th argument) then fails
        let tool = dir.path().join("fake-ffmpeg.sh");
        std::fs::write(&tool, "#!/bin/sh\necho partial > \"${10}\"\nexit 1\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let remuxer = FfmpegRemuxer::new(tool.to_string_lossy(), Duration::from_secs(10));
        let result = remuxer.remux(&input).await;
        assert!(matches!(result, Err(ProcessingError::RemuxFailed(_))));
        assert!(!faststart_output_path(&input).exists());
        // Input is untouched
        assert_eq!(std::fs::read(&input).unwrap(), b"input");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_remux_returns_guarded_output() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"input").unwrap();

        let tool = dir.path().join("fake-ffmpeg.sh");
        std::fs::write(&tool, "#!/bin/sh\ncp \"$3\" \"${10}\"\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let remuxer = FfmpegRemuxer::new(tool.to_string_lossy(), Duration::from_secs(10));
        let output = remuxer.remux(&input).await.unwrap();
        let output_path = output.to_path_buf();
        assert_eq!(output_path, faststart_output_path(&input));
        assert_eq!(std::fs::read(&output_path).unwrap(), b"input");

        drop(output);
        assert!(!output_path.exists());
        assert!(input.exists());
    }
}
