//! Profile image uploads.
//!
//! Only JPEG and PNG are accepted, detected from the file's magic bytes
//! rather than its name or declared content type. Each upload is stored
//! under a fresh UUID and referenced as `/uploads/{file}`.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::error::ApiError;

/// URL prefix under which the upload directory is served.
pub const UPLOADS_PREFIX: &str = "/uploads";

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// PNG image.
    Png,
    /// JPEG image.
    Jpeg,
}

impl ImageKind {
    /// Detect the format from magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(b"\xFF\xD8\xFF") {
            Some(Self::Jpeg)
        } else {
            None
        }
    }

    /// File extension used on disk.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// An image written to the upload directory.
#[derive(Debug, Clone)]
pub struct StoredImage {
    /// Path on disk.
    pub path: PathBuf,
    /// Site-relative reference, e.g. `/uploads/3f2c....png`.
    pub reference: String,
}

impl StoredImage {
    /// Delete the file, e.g. after the card it belonged to was rejected.
    pub async fn discard(self) {
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove upload");
        }
    }
}

/// Check size and format of an uploaded image.
pub fn check_image(bytes: &[u8], max_bytes: usize) -> Result<ImageKind, ApiError> {
    if bytes.len() > max_bytes {
        tracing::warn!(size = bytes.len(), limit = max_bytes, "upload rejected: too large");
        return Err(ApiError::PayloadTooLarge { limit: max_bytes });
    }
    ImageKind::sniff(bytes).ok_or_else(|| {
        tracing::warn!(size = bytes.len(), "upload rejected: not a JPEG or PNG");
        ApiError::BadRequest("profile_image must be a JPEG or PNG image".to_string())
    })
}

/// Validate `bytes` and write them to `dir` under a fresh name.
pub async fn save_image(dir: &Path, bytes: &[u8], max_bytes: usize) -> Result<StoredImage, ApiError> {
    let kind = check_image(bytes, max_bytes)?;
    let file_name = format!("{}.{}", uuid::Uuid::new_v4(), kind.extension());
    let path = dir.join(&file_name);

    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("failed to write upload {}", path.display()))?;

    tracing::debug!(path = %path.display(), size = bytes.len(), "upload stored");

    Ok(StoredImage {
        path,
        reference: format!("{UPLOADS_PREFIX}/{file_name}"),
    })
}

/// Delete the stored file behind `reference` if it points into the upload
/// directory. References to anything else are left alone.
pub async fn release(dir: &Path, reference: &str) {
    let Some(file_name) = stored_file_name(reference) else {
        return;
    };
    let path = dir.join(file_name);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "upload released"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove upload"),
    }
}

/// Whether `reference` names a file in the upload directory.
pub fn is_upload_reference(reference: &str) -> bool {
    stored_file_name(reference).is_some()
}

/// File name part of an `/uploads/{file}` reference, if it is a plain name.
fn stored_file_name(reference: &str) -> Option<&str> {
    reference
        .strip_prefix(UPLOADS_PREFIX)?
        .strip_prefix('/')
        .filter(|name| {
            !name.is_empty() && !name.contains(['/', '\\']) && !name.starts_with('.')
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Smallest byte strings that pass format detection.
    pub(crate) const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    pub(crate) const JPEG_BYTES: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0";

    #[test]
    fn sniffs_png_and_jpeg() {
        assert_eq!(ImageKind::sniff(PNG_BYTES), Some(ImageKind::Png));
        assert_eq!(ImageKind::sniff(JPEG_BYTES), Some(ImageKind::Jpeg));
    }

    #[test]
    fn rejects_other_formats() {
        assert_eq!(ImageKind::sniff(b"GIF89a"), None);
        assert_eq!(ImageKind::sniff(b"<svg xmlns="), None);
        assert_eq!(ImageKind::sniff(b""), None);
        assert!(matches!(
            check_image(b"GIF89a", 1024),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn rejects_oversized_images() {
        let mut big = PNG_BYTES.to_vec();
        big.resize(2048, 0);
        assert!(matches!(
            check_image(&big, 1024),
            Err(ApiError::PayloadTooLarge { limit: 1024 })
        ));
        assert!(check_image(&big, 2048).is_ok());
    }

    #[tokio::test]
    async fn saves_under_uuid_name() {
        let dir = tempfile::tempdir().unwrap();
        let stored = save_image(dir.path(), JPEG_BYTES, 1024).await.unwrap();

        assert!(stored.reference.starts_with("/uploads/"));
        assert!(stored.reference.ends_with(".jpg"));
        assert_eq!(std::fs::read(&stored.path).unwrap(), JPEG_BYTES);

        let path = stored.path.clone();
        stored.discard().await;
        assert!(!path.exists());
    }

    #[test]
    fn only_plain_upload_names_are_released() {
        assert_eq!(stored_file_name("/uploads/a.png"), Some("a.png"));
        assert_eq!(stored_file_name("/uploads/../cards.db"), None);
        assert_eq!(stored_file_name("/uploads/sub/a.png"), None);
        assert_eq!(stored_file_name("/uploads/"), None);
        assert_eq!(stored_file_name("/static/default-avatar.svg"), None);
        assert_eq!(stored_file_name("https://cdn.example.com/uploads/a.png"), None);
    }

    #[tokio::test]
    async fn release_removes_stored_file() {
        let dir = tempfile::tempdir().unwrap();
        let stored = save_image(dir.path(), PNG_BYTES, 1024).await.unwrap();
        release(dir.path(), &stored.reference).await;
        assert!(!stored.path.exists());
        // Second release is a no-op.
        release(dir.path(), &stored.reference).await;
    }

    #[tokio::test]
    async fn rejected_upload_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(save_image(dir.path(), b"not an image", 1024).await.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
