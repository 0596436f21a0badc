//! Tubely Processing Library
//!
//! Disk staging of inbound uploads and the external media tools run against
//! staged files: `ffprobe` for geometry and `ffmpeg` for the fast-start remux.

pub mod error;
pub mod staging;
pub mod video;

pub use error::ProcessingError;
pub use staging::{StagedFile, Stager};
pub use video::{
    classify, faststart_output_path, parse_ffprobe_output, FfmpegRemuxer, FfprobeProbe,
    MediaClassifier, MediaProbe, Remuxer,
};
