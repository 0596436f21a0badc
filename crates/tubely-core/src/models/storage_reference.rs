//! Storage reference persisted in the asset record.
//!
//! At rest a reference is the single string `"<bucket>,<key>"`. Keys may contain
//! `/` but neither component may contain the delimiter, which keeps the
//! encoding lossless.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

pub const REFERENCE_DELIMITER: char = ',';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageReferenceError {
    #[error("storage reference component is empty")]
    EmptyComponent,

    #[error("storage reference component contains a delimiter: {0}")]
    ContainsDelimiter(String),

    #[error("malformed storage reference: {0}")]
    Malformed(String),
}

/// A (bucket, key) pair identifying one object in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageReference {
    bucket: String,
    key: String,
}

impl StorageReference {
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Result<Self, StorageReferenceError> {
        let bucket = bucket.into();
        let key = key.into();
        for component in [&bucket, &key] {
            if component.is_empty() {
                return Err(StorageReferenceError::EmptyComponent);
            }
            if component.contains(REFERENCE_DELIMITER) {
                return Err(StorageReferenceError::ContainsDelimiter(component.clone()));
            }
        }
        Ok(Self { bucket, key })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Encoded form stored in `Video::video_url`.
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.bucket, REFERENCE_DELIMITER, self.key)
    }

    pub fn decode(encoded: &str) -> Result<Self, StorageReferenceError> {
        let (bucket, key) = encoded
            .split_once(REFERENCE_DELIMITER)
            .ok_or_else(|| StorageReferenceError::Malformed(encoded.to_string()))?;
        Self::new(bucket, key)
    }
}

impl Display for StorageReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.encode())
    }
}

impl FromStr for StorageReference {
    type Err = StorageReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
