//! Route prefixes and fixed protocol values.

/// Prefix of every JSON API route
pub const API_PREFIX: &str = "/api";

/// Route serving thumbnails written under `ASSETS_ROOT`
pub const ASSETS_ROUTE: &str = "/assets";

/// Multipart part carrying the video upload
pub const VIDEO_FIELD: &str = "video";

/// Multipart part carrying the thumbnail upload
pub const THUMBNAIL_FIELD: &str = "thumbnail";

/// Issuer of access tokens accepted by the API
pub const JWT_ISSUER: &str = "tubely-access";

/// Container produced by the fast-start remux
pub const REMUXED_CONTENT_TYPE: &str = "video/mp4";
pub const REMUXED_EXTENSION: &str = "mp4";

/// Headroom above the largest accepted file for multipart framing
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;
