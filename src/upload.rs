use std::path::Path;
use uuid::Uuid;

use crate::error::AppError;

/// Extensions accepted for upload and the only MIME type each may be declared as.
pub const ALLOWED_UPLOADS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("pdf", "application/pdf"),
    ("csv", "text/csv"),
];

const UPLOAD_PREFIX: &str = "uploads";

/// A file the client is allowed to upload, with its normalised extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    pub extension: &'static str,
    pub content_type: &'static str,
}

/// validate_upload
///
/// Checks the filename's extension and the declared MIME type against the allow-list
/// and against each other. Extension matching ignores case; MIME parameters such as
/// `; charset=utf-8` are ignored.
pub fn validate_upload(filename: &str, file_type: &str) -> Result<ValidatedUpload, AppError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let mime = file_type
        .split(';')
        .next()
        .map(|m| m.trim().to_ascii_lowercase())
        .unwrap_or_default();

    let (extension, content_type) = extension
        .as_deref()
        .and_then(|ext| ALLOWED_UPLOADS.iter().find(|(allowed, _)| *allowed == ext))
        .copied()
        .ok_or_else(|| {
            tracing::debug!(filename, "upload rejected: extension not allowed");
            AppError::bad_request("Unsupported file type")
        })?;

    if content_type != mime {
        tracing::debug!(filename, file_type, "upload rejected: MIME type mismatch");
        return Err(AppError::bad_request("Unsupported file type"));
    }

    Ok(ValidatedUpload {
        extension,
        content_type,
    })
}

/// Random object key for a validated upload. The client's filename never reaches it.
pub fn generate_object_key(upload: &ValidatedUpload) -> String {
    format!(
        "{}/{}.{}",
        UPLOAD_PREFIX,
        Uuid::new_v4().simple(),
        upload.extension
    )
}
