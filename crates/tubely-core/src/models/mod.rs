//! Domain models

pub mod aspect;
pub mod storage_reference;
pub mod video;

pub use aspect::{AspectClass, VideoGeometry};
pub use storage_reference::{StorageReference, StorageReferenceError, REFERENCE_DELIMITER};
pub use video::{CreateVideoParams, Video};
