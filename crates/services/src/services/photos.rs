//! Content-addressed storage for uploaded photos.
//!
//! Clients compress before uploading; the server only checks type and size
//! and files the bytes under their SHA-256.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tracing::debug;
use ts_rs::TS;

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("photo is empty")]
    Empty,
    #[error("photo exceeds {max} bytes")]
    TooLarge { max: usize },
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),
    #[error("invalid photo name")]
    InvalidName,
    #[error("photo not found")]
    NotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct StoredPhoto {
    /// File name to reference the photo by, e.g. in return checks.
    pub name: String,
    pub content_type: String,
    pub size: u64,
}

const ACCEPTED: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

/// Image type from the leading magic bytes.
fn sniff(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else {
        None
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    ACCEPTED
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, ext)| *ext)
}

/// `<64 hex chars>.<accepted extension>`, nothing else.
pub fn is_valid_name(name: &str) -> bool {
    let Some((stem, ext)) = name.split_once('.') else {
        return false;
    };
    stem.len() == 64
        && stem.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        && ACCEPTED.iter().any(|(_, accepted)| *accepted == ext)
}

#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl PhotoStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Stores `bytes` and returns its name. The declared content type, when
    /// present, must agree with what the bytes actually are.
    pub async fn save(
        &self,
        bytes: &[u8],
        declared_type: Option<&str>,
    ) -> Result<StoredPhoto, PhotoError> {
        if bytes.is_empty() {
            return Err(PhotoError::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(PhotoError::TooLarge {
                max: self.max_bytes,
            });
        }

        let declared = declared_type
            .map(|t| t.split(';').next().unwrap_or(t).trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty() && t != "application/octet-stream");
        let content_type = match (sniff(bytes), declared) {
            (Some(actual), Some(declared)) if declared != actual => {
                return Err(PhotoError::UnsupportedType(declared));
            }
            (Some(actual), _) => actual,
            (None, declared) => {
                return Err(PhotoError::UnsupportedType(
                    declared.unwrap_or_else(|| "unknown".to_string()),
                ));
            }
        };
        let ext = extension_for(content_type)
            .ok_or_else(|| PhotoError::UnsupportedType(content_type.to_string()))?;

        let digest = Sha256::digest(bytes);
        let stem: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        let name = format!("{stem}.{ext}");

        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(&name);
        if fs::try_exists(&path).await? {
            debug!(photo = %name, "Photo already stored");
        } else {
            // Write under a temporary name first so readers never see half a file.
            let partial = self.dir.join(format!("{name}.part"));
            fs::write(&partial, bytes).await?;
            fs::rename(&partial, &path).await?;
            debug!(photo = %name, size = bytes.len(), "Photo stored");
        }

        Ok(StoredPhoto {
            name,
            content_type: content_type.to_string(),
            size: bytes.len() as u64,
        })
    }

    /// Bytes and MIME type of a stored photo.
    pub async fn read(&self, name: &str) -> Result<(Vec<u8>, String), PhotoError> {
        if !is_valid_name(name) {
            return Err(PhotoError::InvalidName);
        }
        let bytes = match fs::read(self.dir.join(name)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(PhotoError::NotFound),
            Err(e) => return Err(e.into()),
        };
        let mime = mime_guess::from_path(name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok((bytes, mime))
    }

    pub async fn exists(&self, name: &str) -> bool {
        is_valid_name(name) && fs::try_exists(self.dir.join(name)).await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[tokio::test]
    async fn saves_content_addressed_and_reads_back() {
        let dir = TempDir::new().unwrap();
        let store = PhotoStore::new(dir.path().join("photos"), 1024);

        let first = store.save(PNG, Some("image/png")).await.unwrap();
        let second = store.save(PNG, None).await.unwrap();
        assert_eq!(first.name, second.name);
        assert!(first.name.ends_with(".png"));
        assert!(is_valid_name(&first.name));
        assert!(store.exists(&first.name).await);

        let (bytes, mime) = store.read(&first.name).await.unwrap();
        assert_eq!(bytes, PNG);
        assert_eq!(mime, "image/png");
    }

    #[tokio::test]
    async fn rejects_bad_uploads() {
        let dir = TempDir::new().unwrap();
        let store = PhotoStore::new(dir.path(), 8);

        assert!(matches!(store.save(b"", None).await, Err(PhotoError::Empty)));
        assert!(matches!(
            store.save(PNG, None).await,
            Err(PhotoError::TooLarge { max: 8 })
        ));

        let store = PhotoStore::new(dir.path(), 1024);
        assert!(matches!(
            store.save(b"%PDF-1.7 hello", Some("application/pdf")).await,
            Err(PhotoError::UnsupportedType(_))
        ));
        assert!(matches!(
            store.save(PNG, Some("image/jpeg")).await,
            Err(PhotoError::UnsupportedType(_))
        ));
    }

    #[tokio::test]
    async fn refuses_traversal_and_unknown_names() {
        let dir = TempDir::new().unwrap();
        let store = PhotoStore::new(dir.path(), 1024);

        assert!(matches!(
            store.read("../db.sqlite").await,
            Err(PhotoError::InvalidName)
        ));
        let missing = format!("{}.jpg", "a".repeat(64));
        assert!(matches!(store.read(&missing).await, Err(PhotoError::NotFound)));
        assert!(!is_valid_name(&format!("{}.exe", "a".repeat(64))));
        assert!(!is_valid_name(&format!("{}.png", "A".repeat(64))));
    }
}
