//! Common utilities for file upload handlers

use std::io;

use axum::extract::multipart::{Field, Multipart};
use futures::TryStreamExt;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use tubely_core::AppError;
use tubely_processing::{StagedFile, Stager};

use crate::error::app_error_from_processing;

/// Strip parameters and normalise case: `"Video/MP4; codecs=avc1"` -> `"video/mp4"`.
pub fn normalize_mime_type(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Check a part's declared content type against an allow-list.
///
/// Returns the normalised type. A missing type is a malformed request; a type
/// outside the list is unsupported media.
pub fn validate_content_type(
    declared: Option<&str>,
    allowed: &[String],
) -> Result<String, AppError> {
    let declared = declared
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing Content-Type for file part".to_string()))?;

    let mime = normalize_mime_type(declared);
    if !allowed.iter().any(|a| a == &mime) {
        return Err(AppError::UnsupportedMediaType(format!(
            "Content type '{}' is not allowed. Allowed types: {}",
            mime,
            allowed.join(", ")
        )));
    }
    Ok(mime)
}

/// File extension used for a stored object of the given (normalised) type.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    match content_type {
        "video/mp4" => Some("mp4"),
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        _ => None,
    }
}

/// Reject configured allow-list entries that no upload could ever satisfy.
pub fn check_allowed_types(variable: &str, allowed: &[String]) -> Result<(), anyhow::Error> {
    if let Some(unmapped) = allowed
        .iter()
        .find(|t| extension_for_content_type(t).is_none())
    {
        return Err(anyhow::anyhow!(
            "{} lists '{}', which is not a supported upload type",
            variable,
            unmapped
        ));
    }
    Ok(())
}

/// A multipart file part copied to a staged file.
#[derive(Debug)]
pub struct StagedPart {
    pub file: StagedFile,
    pub content_type: String,
    pub extension: &'static str,
}

/// Find the part named `name`, gate its content type and stage it on disk.
///
/// Parts with other names are skipped. The content type is checked before a
/// single byte is written, so a rejected part never creates a staged file.
pub async fn stage_file_part(
    stager: &Stager,
    mut multipart: Multipart,
    name: &str,
    allowed: &[String],
    max_bytes: usize,
) -> Result<StagedPart, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some(name) {
            continue;
        }

        let content_type = validate_content_type(field.content_type(), allowed)?;
        let extension = extension_for_content_type(&content_type).ok_or_else(|| {
            AppError::UnsupportedMediaType(format!(
                "No file extension known for content type '{}'",
                content_type
            ))
        })?;

        let file = stager
            .stage(field_reader(field), extension, max_bytes as u64)
            .await
            .map_err(app_error_from_processing)?;

        return Ok(StagedPart {
            file,
            content_type,
            extension,
        });
    }

    Err(AppError::BadRequest(format!(
        "Unable to parse form file: missing '{}' part",
        name
    )))
}

fn field_reader(field: Field<'_>) -> impl AsyncRead + Unpin + '_ {
    StreamReader::new(Box::pin(field.map_err(io::Error::other)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalizes_parameters_and_case() {
        assert_eq!(normalize_mime_type("video/mp4"), "video/mp4");
        assert_eq!(normalize_mime_type("Video/MP4; codecs=\"avc1\""), "video/mp4");
        assert_eq!(normalize_mime_type("  image/png ;charset=x"), "image/png");
        assert_eq!(normalize_mime_type(""), "");
    }

    #[test]
    fn accepts_allowed_type_with_parameters() {
        let mime = validate_content_type(Some("video/mp4; codecs=avc1"), &allowed(&["video/mp4"]))
            .unwrap();
        assert_eq!(mime, "video/mp4");
    }

    #[test]
    fn rejects_other_containers() {
        let err = validate_content_type(Some("video/avi"), &allowed(&["video/mp4"])).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMediaType(_)));

        let err = validate_content_type(Some("image/gif"), &allowed(&["image/jpeg", "image/png"]))
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMediaType(_)));
    }

    #[test]
    fn missing_type_is_bad_request() {
        assert!(matches!(
            validate_content_type(None, &allowed(&["video/mp4"])),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_content_type(Some("  "), &allowed(&["video/mp4"])),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn maps_extensions() {
        assert_eq!(extension_for_content_type("video/mp4"), Some("mp4"));
        assert_eq!(extension_for_content_type("image/png"), Some("png"));
        assert_eq!(extension_for_content_type("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for_content_type("video/avi"), None);
    }

    #[test]
    fn allow_list_entries_need_an_extension() {
        check_allowed_types("VIDEO_ALLOWED_CONTENT_TYPES", &allowed(&["video/mp4"])).unwrap();
        check_allowed_types(
            "THUMBNAIL_ALLOWED_CONTENT_TYPES",
            &allowed(&["image/jpeg", "image/png"]),
        )
        .unwrap();

        let err = check_allowed_types(
            "VIDEO_ALLOWED_CONTENT_TYPES",
            &allowed(&["video/mp4", "video/webm"]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("video/webm"));
    }
}
