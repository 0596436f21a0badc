//! Signed, expiring URLs for objects served by this process.
//!
//! URL: `{base}/media/{bucket}/{key}?expires={unix}&signature={sig}` where
//! `sig = base64url(HMAC-SHA256(secret, "{bucket}\n{key}\n{expires}"))`.
//! Verification needs only the secret, so signing stays stateless.

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::traits::{StorageError, StorageResult};

pub const MEDIA_ROUTE_PREFIX: &str = "/media";

#[derive(Clone)]
pub struct MediaUrlSigner {
    secret: Vec<u8>,
    base_url: String,
}

impl std::fmt::Debug for MediaUrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaUrlSigner")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl MediaUrlSigner {
    pub fn new(secret: impl AsRef<[u8]>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            secret: secret.as_ref().to_vec(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn mac(&self, bucket: &str, key: &str, expires_at: u64) -> Hmac<Sha256> {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(&self.secret).expect("HMAC accepts any key size");
        mac.update(bucket.as_bytes());
        mac.update(b"\n");
        mac.update(key.as_bytes());
        mac.update(b"\n");
        mac.update(expires_at.to_string().as_bytes());
        mac
    }

    /// Signature for an object at a fixed expiry timestamp.
    pub fn signature(&self, bucket: &str, key: &str, expires_at: u64) -> String {
        let tag = self.mac(bucket, key, expires_at).finalize().into_bytes();
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(tag)
    }

    /// Full URL valid for `expires_in` from now.
    pub fn sign_url(&self, bucket: &str, key: &str, expires_in: Duration) -> String {
        let expires_at = now_unix().saturating_add(expires_in.as_secs());
        self.sign_url_at(bucket, key, expires_at)
    }

    pub fn sign_url_at(&self, bucket: &str, key: &str, expires_at: u64) -> String {
        let encoded_key = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}{}/{}/{}?expires={}&signature={}",
            self.base_url,
            MEDIA_ROUTE_PREFIX,
            urlencoding::encode(bucket),
            encoded_key,
            expires_at,
            self.signature(bucket, key, expires_at)
        )
    }

    /// Verify a signature against the current time.
    pub fn verify(
        &self,
        bucket: &str,
        key: &str,
        expires_at: u64,
        signature: &str,
    ) -> StorageResult<()> {
        self.verify_at(bucket, key, expires_at, signature, now_unix())
    }

    pub fn verify_at(
        &self,
        bucket: &str,
        key: &str,
        expires_at: u64,
        signature: &str,
        now: u64,
    ) -> StorageResult<()> {
        let tag = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| StorageError::SigningFailed("Malformed signature".to_string()))?;
        self.mac(bucket, key, expires_at)
            .verify_slice(&tag)
            .map_err(|_| StorageError::SigningFailed("Invalid signature".to_string()))?;
        if now > expires_at {
            return Err(StorageError::SigningFailed("Signed URL has expired".to_string()));
        }
        Ok(())
    }
}
