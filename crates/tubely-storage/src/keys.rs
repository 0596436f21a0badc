//! Shared key generation and validation for storage backends.

use base64::Engine;
use tubely_core::models::{AspectClass, REFERENCE_DELIMITER};

use crate::traits::{StorageError, StorageResult};

const RANDOM_NAME_BYTES: usize = 32;

/// 32 random bytes in unpadded base64url followed by `.{extension}`.
///
/// The alphabet (`A-Z a-z 0-9 - _`) never produces `/` or `,`.
pub fn random_object_name(extension: &str) -> String {
    let bytes: [u8; RANDOM_NAME_BYTES] = rand::random();
    let name = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);
    format!("{}.{}", name, extension)
}

/// Generate a video key: `{class prefix}/{random}.{extension}`.
pub fn generate_video_key(class: AspectClass, extension: &str) -> String {
    format!("{}/{}", class.prefix(), random_object_name(extension))
}

/// Reject keys that could escape a backend root or break the reference encoding.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.contains("..") || key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    if key.contains(REFERENCE_DELIMITER) {
        return Err(StorageError::InvalidKey(format!(
            "Storage key must not contain '{}'",
            REFERENCE_DELIMITER
        )));
    }
    Ok(())
}

/// Buckets are single path segments.
pub(crate) fn validate_bucket(bucket: &str) -> StorageResult<()> {
    if bucket.is_empty()
        || bucket.contains('/')
        || bucket.contains('\\')
        || bucket.contains("..")
        || bucket.contains(REFERENCE_DELIMITER)
    {
        return Err(StorageError::InvalidKey(format!(
            "Invalid bucket name: {}",
            bucket
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn video_key_has_class_prefix_and_extension() {
        let key = generate_video_key(AspectClass::Wide, "mp4");
        assert!(key.starts_with("wide/"));
        assert!(key.ends_with(".mp4"));

        let name = key
            .strip_prefix("wide/")
            .and_then(|k| k.strip_suffix(".mp4"))
            .unwrap();
        // 32 bytes -> 43 unpadded base64 characters
        assert_eq!(name.len(), 43);
        assert!(name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

        assert!(generate_video_key(AspectClass::Tall, "mp4").starts_with("tall/"));
        assert!(generate_video_key(AspectClass::Other, "mp4").starts_with("other/"));
    }

    #[test]
    fn generated_keys_are_valid_and_unique() {
        let keys: HashSet<String> = (0..64)
            .map(|_| generate_video_key(AspectClass::Other, "mp4"))
            .collect();
        assert_eq!(keys.len(), 64);
        for key in &keys {
            validate_key(key).unwrap();
        }
    }

    #[test]
    fn rejects_traversal_and_delimiters() {
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/abs/path.mp4").is_err());
        assert!(validate_key("wide/a,b.mp4").is_err());
        assert!(validate_key("wide\\x.mp4").is_err());
        validate_key("tall/abc-_.mp4").unwrap();
    }

    #[test]
    fn bucket_must_be_single_segment() {
        validate_bucket("tubely-local").unwrap();
        assert!(validate_bucket("a/b").is_err());
        assert!(validate_bucket("..").is_err());
        assert!(validate_bucket("").is_err());
    }
}
