//! # Media Storage
//!
//! Uploaded category and product images, stored flat in the media
//! directory under a fresh UUID name and served back by `GET media/{file}`.
//!
//! Records keep the relative path `media/<uuid>.<ext>`, which resolves
//! against the API base URL.

use std::path::{Path, PathBuf};

use axum::extract::{Path as UrlPath, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::IntoResponse;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::UploadedFile;
use crate::AppState;

/// Supported image formats
const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        MediaStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes an uploaded image and returns the path to store on the record.
    pub async fn save_image(&self, upload: &UploadedFile) -> ApiResult<String> {
        let extension = image_extension(&upload.file_name)?;
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(ApiError::internal)?;
        tokio::fs::write(self.root.join(&file_name), &upload.bytes)
            .await
            .map_err(ApiError::internal)?;

        info!(file = %file_name, bytes = upload.bytes.len(), "Stored upload");
        Ok(format!("media/{}", file_name))
    }

    /// Saves the image if one was uploaded.
    pub async fn save_optional(&self, upload: Option<&UploadedFile>) -> ApiResult<Option<String>> {
        match upload {
            Some(upload) => Ok(Some(self.save_image(upload).await?)),
            None => Ok(None),
        }
    }

    async fn read(&self, file_name: &str) -> ApiResult<Vec<u8>> {
        if !is_plain_file_name(file_name) {
            return Err(ApiError::not_found("File", file_name));
        }
        match tokio::fs::read(self.root.join(file_name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ApiError::not_found("File", file_name))
            }
            Err(e) => Err(ApiError::internal(e)),
        }
    }
}

/// `GET media/{file}`
pub async fn serve(
    State(state): State<Arc<AppState>>,
    UrlPath(file_name): UrlPath<String>,
) -> ApiResult<impl IntoResponse> {
    debug!(file = %file_name, "Serving media");
    let bytes = state.media.read(&file_name).await?;
    Ok((
        [
            (CONTENT_TYPE, content_type(&file_name)),
            (CACHE_CONTROL, "public, max-age=86400"),
        ],
        bytes,
    ))
}

fn image_extension(file_name: &str) -> ApiResult<String> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if SUPPORTED_FORMATS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(ApiError::validation(format!(
            "Unsupported image format '{}', expected one of: {}",
            extension,
            SUPPORTED_FORMATS.join(", ")
        )))
    }
}

fn content_type(file_name: &str) -> &'static str {
    match file_name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Rejects anything that could leave the media directory.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_images_are_accepted() {
        assert_eq!(image_extension("Logo.PNG").unwrap(), "png");
        assert!(image_extension("invoice.pdf").is_err());
        assert!(image_extension("noext").is_err());
    }

    #[test]
    fn test_path_traversal_is_refused() {
        assert!(is_plain_file_name("0b7f.png"));
        assert!(!is_plain_file_name("../nanotrade.db"));
        assert!(!is_plain_file_name("sub/dir.png"));
        assert!(!is_plain_file_name(".env"));
    }

    #[tokio::test]
    async fn test_save_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path().join("media"));

        let path = store
            .save_image(&UploadedFile {
                file_name: "rice.jpg".to_string(),
                bytes: vec![0xFF, 0xD8, 0xFF],
            })
            .await
            .unwrap();

        let file_name = path.strip_prefix("media/").unwrap();
        assert!(file_name.ends_with(".jpg"));
        assert_eq!(store.read(file_name).await.unwrap(), vec![0xFF, 0xD8, 0xFF]);
        assert!(store.read("missing.jpg").await.is_err());
    }
}
