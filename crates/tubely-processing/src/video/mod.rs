//! Video tooling: probe, classify and fast-start remux

pub mod classify;
pub mod probe;
pub mod remux;
pub mod tools;

pub use classify::{classify, MediaClassifier};
pub use probe::{parse_ffprobe_output, FfprobeProbe, MediaProbe};
pub use remux::{faststart_output_path, FfmpegRemuxer, Remuxer};
