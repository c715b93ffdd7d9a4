//! Filesystem-backed storage.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{CacheError, CacheResult};
use crate::key::CacheKey;

use super::Backend;

/// Platform storage roots, resolved through the `dirs` crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDir {
    /// The user's cache directory (purgeable by the OS).
    Caches,
    /// The user's documents directory (durable).
    Documents,
}

impl UserDir {
    /// The absolute path of this directory on the current platform, or
    /// `None` if it cannot be determined.
    pub fn path(self) -> Option<PathBuf> {
        match self {
            Self::Caches => dirs::cache_dir(),
            Self::Documents => dirs::document_dir(),
        }
    }
}

impl fmt::Display for UserDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Caches => write!(f, "caches"),
            Self::Documents => write!(f, "documents"),
        }
    }
}

/// Stores each entry as a file named after the key under `root/namespace/`.
///
/// Entries written to a crashed process may be truncated: `write` is a
/// single call with no temp-and-rename step, an accepted trade for keys
/// whose content can always be re-downloaded.
#[derive(Debug)]
pub struct FsBackend {
    dir: PathBuf,
}

impl FsBackend {
    /// Create a backend rooted at `root/namespace`, creating the directory
    /// (and intermediates) if absent.
    ///
    /// An empty namespace is a configuration error. Directory creation
    /// failure is logged but not fatal; subsequent operations will fail and
    /// degrade to absent results at the cache boundary.
    pub fn new(root: impl Into<PathBuf>, namespace: &str) -> CacheResult<Self> {
        if namespace.is_empty() {
            return Err(CacheError::Config {
                message: "namespace name must not be empty".to_string(),
            });
        }

        let dir = root.into().join(namespace);
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), error = %e, "failed to create cache directory");
        } else {
            debug!(dir = %dir.display(), "filesystem backend ready");
        }

        Ok(Self { dir })
    }

    /// Create a backend under a platform user directory.
    pub fn in_user_dir(root: UserDir, namespace: &str) -> CacheResult<Self> {
        let base = root.path().ok_or_else(|| CacheError::Config {
            message: format!("could not resolve the {} directory", root),
        })?;

        Self::new(base, namespace)
    }

    /// The directory entries are stored in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.name())
    }
}

#[async_trait]
impl Backend for FsBackend {
    async fn read(&mut self, key: &CacheKey) -> CacheResult<Option<Vec<u8>>> {
        let path = self.entry_path(key);

        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Backend {
                message: format!("failed to read {}: {}", path.display(), e),
            }),
        }
    }

    async fn write(&mut self, key: &CacheKey, bytes: Vec<u8>) -> CacheResult<()> {
        let path = self.entry_path(key);

        fs::write(&path, bytes)
            .await
            .map_err(|e| CacheError::Backend {
                message: format!("failed to write {}: {}", path.display(), e),
            })
    }

    async fn remove(&mut self, key: &CacheKey) -> CacheResult<()> {
        let path = self.entry_path(key);

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Backend {
                message: format!("failed to remove {}: {}", path.display(), e),
            }),
        }
    }

    async fn clear(&mut self) -> CacheResult<()> {
        if !self.dir.exists() {
            return Ok(());
        }

        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| CacheError::Backend {
                message: format!("failed to list {}: {}", self.dir.display(), e),
            })?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| CacheError::Backend {
            message: format!("failed to read directory entry: {}", e),
        })? {
            // Hidden files are not cache entries.
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }

            let path = entry.path();
            let result = if path.is_dir() {
                fs::remove_dir_all(&path).await
            } else {
                fs::remove_file(&path).await
            };

            result.map_err(|e| CacheError::Backend {
                message: format!("failed to remove {}: {}", path.display(), e),
            })?;
        }

        debug!(dir = %self.dir.display(), "cleared filesystem backend");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn backend(temp: &TempDir) -> FsBackend {
        FsBackend::new(temp.path(), "items").unwrap()
    }

    fn key(url: &str) -> CacheKey {
        CacheKey::parse(url).unwrap()
    }

    #[test]
    fn empty_namespace_is_rejected() {
        let temp = TempDir::new().unwrap();
        let err = FsBackend::new(temp.path(), "").unwrap_err();
        assert!(matches!(err, CacheError::Config { .. }));
    }

    #[test]
    fn construction_creates_directory() {
        let temp = TempDir::new().unwrap();
        let backend = backend(&temp);
        assert!(backend.dir().is_dir());
        assert_eq!(backend.dir(), temp.path().join("items"));
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let temp = TempDir::new().unwrap();
        let mut backend = backend(&temp);
        let key = key("https://example.com/user/1");

        backend.write(&key, b"payload".to_vec()).await.unwrap();
        let bytes = backend.read(&key).await.unwrap().unwrap();
        assert_eq!(bytes, b"payload");
    }

    #[tokio::test]
    async fn write_replaces_existing_entry() {
        let temp = TempDir::new().unwrap();
        let mut backend = backend(&temp);
        let key = key("https://example.com/user/1");

        backend.write(&key, b"first".to_vec()).await.unwrap();
        backend.write(&key, b"second".to_vec()).await.unwrap();

        let bytes = backend.read(&key).await.unwrap().unwrap();
        assert_eq!(bytes, b"second");
    }

    #[tokio::test]
    async fn read_missing_entry_is_none() {
        let temp = TempDir::new().unwrap();
        let mut backend = backend(&temp);

        let result = backend.read(&key("https://example.com/user/404")).await;
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let mut backend = backend(&temp);
        let key = key("https://example.com/user/1");

        backend.write(&key, b"payload".to_vec()).await.unwrap();
        backend.remove(&key).await.unwrap();
        assert!(backend.read(&key).await.unwrap().is_none());

        // Absent key is not an error.
        backend.remove(&key).await.unwrap();
    }

    #[tokio::test]
    async fn clear_preserves_directory_and_hidden_files() {
        let temp = TempDir::new().unwrap();
        let mut backend = backend(&temp);

        backend
            .write(&key("https://example.com/user/1"), b"one".to_vec())
            .await
            .unwrap();
        backend
            .write(&key("https://example.com/user/2"), b"two".to_vec())
            .await
            .unwrap();
        std::fs::write(backend.dir().join(".marker"), b"keep").unwrap();

        backend.clear().await.unwrap();

        assert!(backend.dir().is_dir());
        assert!(backend.dir().join(".marker").exists());
        assert!(backend
            .read(&key("https://example.com/user/1"))
            .await
            .unwrap()
            .is_none());
        assert!(backend
            .read(&key("https://example.com/user/2"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn clear_on_missing_directory_is_ok() {
        let temp = TempDir::new().unwrap();
        let mut backend = backend(&temp);

        std::fs::remove_dir_all(backend.dir()).unwrap();
        backend.clear().await.unwrap();
    }

    #[tokio::test]
    async fn aliased_keys_share_one_entry() {
        let temp = TempDir::new().unwrap();
        let mut backend = backend(&temp);

        backend
            .write(&key("https://a.example/users/1"), b"from a".to_vec())
            .await
            .unwrap();
        let bytes = backend
            .read(&key("https://b.example/posts/1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bytes, b"from a");
    }
}
