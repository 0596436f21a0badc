//! Staging of inbound uploads on local disk.
//!
//! A [`StagedFile`] owns a [`TempPath`]; the file is unlinked when the handle
//! is dropped, which covers success, early return, panic and cancellation of
//! the request future.

use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::error::ProcessingError;

pub const STAGING_PREFIX: &str = "tubely-upload-";

/// Allocates staged files in one private scratch directory.
#[derive(Debug, Clone)]
pub struct Stager {
    dir: PathBuf,
}

/// Exclusively owned temporary file holding an upload.
#[derive(Debug)]
pub struct StagedFile {
    file: File,
    path: TempPath,
    bytes_written: u64,
}

impl Stager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the staging directory if it does not exist yet
    pub async fn ensure_dir(&self) -> Result<(), ProcessingError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Copy `source` into a new staged file.
    ///
    /// Reads at most `max_bytes`; a longer stream fails with `PayloadTooLarge`
    /// and the partial file is removed. The returned handle is positioned at
    /// the start of the file.
    pub async fn stage<R>(
        &self,
        source: R,
        extension: &str,
        max_bytes: u64,
    ) -> Result<StagedFile, ProcessingError>
    where
        R: AsyncRead + Unpin,
    {
        let suffix = format!(".{}", extension);
        let named = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(&suffix)
            .tempfile_in(&self.dir)?;
        let (std_file, path) = named.into_parts();
        let mut file = File::from_std(std_file);

        // One byte past the limit is enough to detect an oversized stream.
        let mut limited = source.take(max_bytes.saturating_add(1));
        let bytes_written = tokio::io::copy(&mut limited, &mut file).await?;
        if bytes_written > max_bytes {
            tracing::debug!(
                path = %path.display(),
                limit_bytes = max_bytes,
                "Staged upload exceeded size limit"
            );
            return Err(ProcessingError::PayloadTooLarge { limit: max_bytes });
        }

        file.flush().await?;
        file.rewind().await?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = bytes_written,
            "Upload staged"
        );

        Ok(StagedFile {
            file,
            path,
            bytes_written,
        })
    }
}

impl StagedFile {
    /// Take ownership of an existing file, e.g. a tool's output, so that it
    /// is removed on drop like any other staged file.
    pub async fn adopt(path: TempPath) -> Result<Self, ProcessingError> {
        let file = File::open(&path).await?;
        let bytes_written = file.metadata().await?.len();
        Ok(Self {
            file,
            path,
            bytes_written,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.bytes_written
    }

    pub fn is_empty(&self) -> bool {
        self.bytes_written == 0
    }

    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }

    /// Split into an open read handle and the guard that unlinks the file.
    ///
    /// The guard must outlive every reader of the handle.
    pub fn into_parts(self) -> (File, TempPath) {
        (self.file, self.path)
    }
}
