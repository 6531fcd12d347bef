//! # Photo storage
//!
//! Uploaded book photos are written to the local upload directory and served
//! back under `upload.public_base_url`.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    config::UploadConfig,
    error::{AppError, Result},
};

/// Accepted image types and the extension stored files get.
const ALLOWED_TYPES: [(&str, &str); 4] = [
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPhoto {
    pub url: String,
    pub public_id: String,
}

#[async_trait]
pub trait PhotoStorage: Send + Sync {
    async fn store(&self, upload: PhotoUpload) -> Result<StoredPhoto>;

    /// Removing a file that is already gone is not an error.
    async fn remove(&self, public_id: &str) -> Result<()>;
}

/// File extension for an accepted content type.
#[must_use]
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    ALLOWED_TYPES
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(essence))
        .map(|(_, ext)| *ext)
}

/// # Errors
/// `BadRequest` for empty files or unsupported types, `PayloadTooLarge`
/// above `max_bytes`.
pub fn check_upload(upload: &PhotoUpload, max_bytes: usize) -> Result<&'static str> {
    if upload.bytes.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
    }
    if upload.bytes.len() > max_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "Photo exceeds {} bytes",
            max_bytes
        )));
    }
    extension_for(&upload.content_type).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Unsupported image type '{}'; use JPEG, PNG, WebP or GIF",
            upload.content_type
        ))
    })
}

// =====================================
// Local filesystem
// =====================================
#[derive(Debug, Clone)]
pub struct LocalPhotoStorage {
    dir: PathBuf,
    public_base_url: String,
    max_bytes: usize,
}

impl LocalPhotoStorage {
    /// Store under `config.dir`, served from `config.public_base_url`.
    #[must_use]
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            max_bytes: config.max_bytes,
        }
    }

    fn path_for(&self, public_id: &str) -> Result<PathBuf> {
        if public_id.is_empty()
            || public_id.contains(['/', '\\'])
            || public_id.starts_with('.')
        {
            return Err(AppError::BadRequest(format!("Invalid photo id '{}'", public_id)));
        }
        Ok(self.dir.join(public_id))
    }
}

#[async_trait]
impl PhotoStorage for LocalPhotoStorage {
    async fn store(&self, upload: PhotoUpload) -> Result<StoredPhoto> {
        let ext = check_upload(&upload, self.max_bytes)?;
        let public_id = format!("{}.{}", uuid::Uuid::new_v4().simple(), ext);
        let path = self.path_for(&public_id)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, &upload.bytes).await?;

        debug!(
            public_id = %public_id,
            original = ?upload.file_name,
            bytes = upload.bytes.len(),
            "Photo stored"
        );

        Ok(StoredPhoto {
            url: format!("{}/{}", self.public_base_url, public_id),
            public_id,
        })
    }

    async fn remove(&self, public_id: &str) -> Result<()> {
        let path = self.path_for(public_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(public_id = %public_id, "Photo file already missing");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: &std::path::Path, max_bytes: usize) -> LocalPhotoStorage {
        LocalPhotoStorage::new(&UploadConfig {
            dir: dir.to_string_lossy().into_owned(),
            public_base_url: "http://localhost:3000/uploads/".into(),
            max_bytes,
        })
    }

    fn png(bytes: usize) -> PhotoUpload {
        PhotoUpload {
            file_name: Some("cover.png".into()),
            content_type: "image/png".into(),
            bytes: vec![7; bytes],
        }
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("IMAGE/PNG; charset=binary"), Some("png"));
        assert_eq!(extension_for("application/pdf"), None);
    }

    #[tokio::test]
    async fn test_store_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path(), 1024);

        let stored = storage.store(png(16)).await.unwrap();
        assert!(stored.public_id.ends_with(".png"));
        assert_eq!(
            stored.url,
            format!("http://localhost:3000/uploads/{}", stored.public_id)
        );
        assert!(dir.path().join(&stored.public_id).exists());

        storage.remove(&stored.public_id).await.unwrap();
        assert!(!dir.path().join(&stored.public_id).exists());
        // second removal is a no-op
        storage.remove(&stored.public_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_large_and_unsupported_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path(), 8);

        let err = storage.store(png(9)).await.unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));

        let mut upload = png(4);
        upload.content_type = "text/plain".into();
        let err = storage.store(upload).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_remove_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let err = storage(dir.path(), 8).remove("../secret").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
