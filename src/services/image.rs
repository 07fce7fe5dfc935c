// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recipe image decoding and storage.
//!
//! Images arrive as base64 data URIs (`data:image/png;base64,...`) and are
//! written to `<media_root>/recipes/<sha256>.<ext>`. Content addressing makes
//! re-uploading the same picture a no-op.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

const IMAGE_SUBDIR: &str = "recipes";
const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// A decoded image ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

/// Errors from image decoding and storage.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Image must be a base64 data URI")]
    NotDataUri,

    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("Image is not valid base64")]
    InvalidBase64,

    #[error("Image is empty")]
    Empty,

    #[error("Image exceeds {} bytes", MAX_IMAGE_BYTES)]
    TooLarge,

    #[error("Failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

/// Decode a `data:image/<type>;base64,<payload>` URI.
pub fn decode_data_uri(uri: &str) -> Result<DecodedImage, ImageError> {
    let rest = uri.trim().strip_prefix("data:").ok_or(ImageError::NotDataUri)?;
    let (header, payload) = rest.split_once(',').ok_or(ImageError::NotDataUri)?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or(ImageError::NotDataUri)?;

    let extension = match mime.to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        other => return Err(ImageError::UnsupportedType(other.to_string())),
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| ImageError::InvalidBase64)?;
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ImageError::TooLarge);
    }

    Ok(DecodedImage { bytes, extension })
}

/// Writes images below the media root.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Relative path (from the media root) an image will be stored under.
    pub fn relative_path(image: &DecodedImage) -> String {
        let digest = Sha256::digest(&image.bytes);
        format!("{}/{}.{}", IMAGE_SUBDIR, hex::encode(digest), image.extension)
    }

    /// Store an image and return its path relative to the media root.
    pub async fn save(&self, image: &DecodedImage) -> Result<String, ImageError> {
        let relative = Self::relative_path(image);
        let full = self.root.join(&relative);

        if tokio::fs::try_exists(&full).await? {
            tracing::debug!(path = %relative, "Image already stored");
            return Ok(relative);
        }

        tokio::fs::create_dir_all(self.root.join(IMAGE_SUBDIR)).await?;
        tokio::fs::write(&full, &image.bytes).await?;
        tracing::info!(path = %relative, bytes = image.bytes.len(), "Stored recipe image");
        Ok(relative)
    }
}

/// Absolute URL for a stored image.
pub fn image_url(media_url: &str, relative: &str) -> String {
    format!("{}{}", media_url, relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn test_decode_png() {
        let image = decode_data_uri(PNG_URI).unwrap();
        assert_eq!(image.extension, "png");
        assert_eq!(&image.bytes[1..4], b"PNG");
    }

    #[test]
    fn test_rejects_non_data_uri() {
        assert!(matches!(
            decode_data_uri("https://example.com/a.png"),
            Err(ImageError::NotDataUri)
        ));
        assert!(matches!(
            decode_data_uri("data:image/png,plain"),
            Err(ImageError::NotDataUri)
        ));
    }

    #[test]
    fn test_rejects_unsupported_type() {
        assert!(matches!(
            decode_data_uri("data:text/plain;base64,aGVsbG8="),
            Err(ImageError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_rejects_bad_base64() {
        assert!(matches!(
            decode_data_uri("data:image/jpeg;base64,@@@"),
            Err(ImageError::InvalidBase64)
        ));
    }

    #[test]
    fn test_relative_path_is_content_addressed() {
        let image = decode_data_uri(PNG_URI).unwrap();
        let a = ImageStore::relative_path(&image);
        let b = ImageStore::relative_path(&image.clone());
        assert_eq!(a, b);
        assert!(a.starts_with("recipes/"));
        assert!(a.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_save_writes_file_once() {
        let root = std::env::temp_dir().join(format!("foodgram-image-test-{}", std::process::id()));
        let store = ImageStore::new(&root);
        let image = decode_data_uri(PNG_URI).unwrap();

        let first = store.save(&image).await.unwrap();
        let second = store.save(&image).await.unwrap();
        assert_eq!(first, second);

        let written = tokio::fs::read(root.join(&first)).await.unwrap();
        assert_eq!(written, image.bytes);

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[test]
    fn test_image_url() {
        assert_eq!(
            image_url("http://localhost:8080/media/", "recipes/a.png"),
            "http://localhost:8080/media/recipes/a.png"
        );
    }
}
