use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Content-addressed store for the original uploaded files.
///
/// Files are keyed by their SHA-256 digest and fanned out over a two-level
/// directory layout (`<root>/<first 2 hex chars>/<digest>.<ext>`), so the
/// same bytes uploaded twice land on the same path and the digest doubles
/// as the duplicate-detection key.
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Persist `data`, returning its hex digest and the path it was stored at.
    pub async fn save(&self, data: &[u8], ext: &str) -> io::Result<(String, PathBuf)> {
        let digest = sha256_hex(data);
        let dest = self.path_for(&digest, ext);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&dest, data).await?;
        Ok((digest, dest))
    }

    fn path_for(&self, digest: &str, ext: &str) -> PathBuf {
        self.root.join(&digest[..2]).join(format!("{digest}.{ext}"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// SHA-256 of a byte slice as a lowercase hex string (64 chars).
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_hex_is_deterministic() {
        assert_eq!(sha256_hex(b"receipt"), sha256_hex(b"receipt"));
        assert_ne!(sha256_hex(b"receipt"), sha256_hex(b"other"));
    }

    #[tokio::test]
    async fn save_writes_under_fanout_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        let (digest, path) = store.save(b"fake image bytes", "png").await.unwrap();

        assert_eq!(digest.len(), 64);
        assert!(path.exists());
        assert_eq!(path, dir.path().join(&digest[..2]).join(format!("{digest}.png")));
    }

    #[tokio::test]
    async fn same_bytes_land_on_same_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        let (d1, p1) = store.save(b"same", "jpg").await.unwrap();
        let (d2, p2) = store.save(b"same", "jpg").await.unwrap();

        assert_eq!(d1, d2);
        assert_eq!(p1, p2);
    }
}
