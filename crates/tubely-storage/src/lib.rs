//! Tubely Storage Library
//!
//! Object store gateway: the [`Storage`] trait with S3 and local filesystem
//! implementations, key derivation and signed URL helpers.
//!
//! # Storage key format
//!
//! Video keys are `{class}/{random}.{ext}` where `class` is the aspect class
//! prefix (`wide`, `tall`, `other`) and `random` is 32 random bytes in
//! unpadded base64url. Keys must not contain `..`, a leading `/` or `,`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod signing;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{generate_video_key, random_object_name, validate_key};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use signing::MediaUrlSigner;
pub use traits::{ByteStream, Storage, StorageError, StorageResult};
pub use tubely_core::StorageBackend;
