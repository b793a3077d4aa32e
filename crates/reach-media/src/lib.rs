//! On-disk media storage.
//!
//! Uploads are stored content-addressed: the public id is derived from the
//! SHA-256 of the bytes, so re-uploading the same file is a no-op and ids
//! are not guessable from upload order. Each file lives flat at
//! `{media_dir}/{public_id}`.

use anyhow::{Result, bail};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, warn};

pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Media storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    /// Persist an upload, returning its public id. The id keeps the
    /// original file's extension so content types survive the round trip.
    pub async fn store(&self, data: &[u8], original_name: Option<&str>) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let digest = hex::encode(hasher.finalize());

        let public_id = match original_name.and_then(extension_of) {
            Some(ext) => format!("{}.{}", &digest[..32], ext),
            None => digest[..32].to_string(),
        };

        let path = self.file_path(&public_id);
        if fs::try_exists(&path).await? {
            // Content-addressed: same bytes, same id.
            return Ok(public_id);
        }
        fs::write(&path, data).await?;

        info!("Stored media {} ({} bytes)", public_id, data.len());
        Ok(public_id)
    }

    /// Path to a stored file. Rejects ids that could escape the media
    /// directory; ids we mint only ever contain hex digits, dots, and
    /// lowercase letters.
    pub fn checked_path(&self, public_id: &str) -> Result<PathBuf> {
        if public_id.is_empty()
            || !public_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.')
            || public_id.contains("..")
        {
            bail!("invalid media id: {public_id}");
        }
        Ok(self.file_path(public_id))
    }

    fn file_path(&self, public_id: &str) -> PathBuf {
        self.dir.join(public_id)
    }

    pub async fn delete(&self, public_id: &str) -> Result<()> {
        let path = self.checked_path(public_id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted media {}", public_id);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Media {} already gone", public_id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn extension_of(name: &str) -> Option<String> {
    let ext = name.rsplit('.').next()?;
    if ext == name || ext.is_empty() || ext.len() > 8 {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Content type for a stored media id, derived from its extension.
pub fn content_type_for(public_id: &str) -> &'static str {
    match public_id.rsplit('.').next() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_storage() -> Storage {
        let dir = std::env::temp_dir().join(format!("reach-media-test-{}", std::process::id()));
        Storage::new(dir).await.unwrap()
    }

    #[tokio::test]
    async fn store_is_content_addressed() {
        let storage = temp_storage().await;
        let a = storage.store(b"hello", Some("pic.PNG")).await.unwrap();
        let b = storage.store(b"hello", Some("other.png")).await.unwrap();
        assert_eq!(a, b);
        assert!(a.ends_with(".png"));

        let c = storage.store(b"different", Some("pic.png")).await.unwrap();
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn checked_path_rejects_traversal() {
        let storage = temp_storage().await;
        assert!(storage.checked_path("../etc/passwd").is_err());
        assert!(storage.checked_path("").is_err());
        assert!(storage.checked_path("abc123.png").is_ok());
    }

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for("abc.png"), "image/png");
        assert_eq!(content_type_for("abc.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("abc"), "application/octet-stream");
    }
}
