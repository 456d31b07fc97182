//! Local filesystem implementation of `MediaStorage`.
//! Content-addressable: the file name is the SHA-256 of the bytes, sharded
//! two levels deep so no directory grows unbounded.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use domains::{DomainError, MediaStorage, Result};
use image::{ImageFormat, ImageReader};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, error};

/// Subdirectory (and URL segment) holding post images.
const POSTS_DIR: &str = "posts";

pub struct LocalMediaStorage {
    /// Root directory for all uploads (e.g., "./media")
    root: PathBuf,
    /// Public URL prefix (e.g., "/media")
    url_prefix: String,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// "posts/ab/cd/abcd...hash.ext"
    fn relative_path(hash: &str, extension: &str) -> String {
        format!(
            "{POSTS_DIR}/{}/{}/{hash}.{extension}",
            &hash[0..2],
            &hash[2..4]
        )
    }
}

/// Sniffs the format from magic bytes, then makes sure the header decodes.
fn sniff(bytes: &[u8]) -> Option<ImageFormat> {
    let format = image::guess_format(bytes).ok()?;
    ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .ok()?;
    Some(format)
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    fn probe(&self, bytes: &[u8]) -> Option<String> {
        sniff(bytes).map(|format| format.to_mime_type().to_string())
    }

    async fn save_image(&self, bytes: Bytes) -> Result<String> {
        let format = sniff(&bytes).ok_or_else(|| DomainError::invalid("image", "not an image"))?;
        let extension = format.extensions_str().first().copied().unwrap_or("img");

        let hash = hex::encode(Sha256::digest(&bytes));
        let relative = Self::relative_path(&hash, extension);
        let target = self.root.join(&relative);

        if fs::try_exists(&target).await.unwrap_or(false) {
            debug!(path = %relative, "image already stored");
            return Ok(relative);
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(|err| {
                error!(error = %err, dir = %parent.display(), "cannot create media directory");
                DomainError::internal(err)
            })?;
        }
        fs::write(&target, &bytes).await.map_err(|err| {
            error!(error = %err, path = %target.display(), "cannot write image");
            DomainError::internal(err)
        })?;

        debug!(path = %relative, size = bytes.len(), "image stored");
        Ok(relative)
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.url_prefix.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_GIF: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
        0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
        0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
    ];

    #[test]
    fn probe_recognises_gif_and_rejects_text() {
        let storage = LocalMediaStorage::new("/unused", "/media");
        assert_eq!(storage.probe(SMALL_GIF).as_deref(), Some("image/gif"));
        assert_eq!(storage.probe(b"just some text"), None);
    }

    #[tokio::test]
    async fn saves_under_sharded_hash_path() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalMediaStorage::new(dir.path(), "/media/");

        let path = storage.save_image(Bytes::from_static(SMALL_GIF)).await.unwrap();
        assert!(path.starts_with("posts/"));
        assert!(path.ends_with(".gif"));
        assert!(dir.path().join(&path).exists());

        let again = storage.save_image(Bytes::from_static(SMALL_GIF)).await.unwrap();
        assert_eq!(path, again);
        assert_eq!(storage.url(&path), format!("/media/{path}"));
    }

    #[tokio::test]
    async fn refuses_non_image_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalMediaStorage::new(dir.path(), "/media");

        let err = storage
            .save_image(Bytes::from_static(b"not an image"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
