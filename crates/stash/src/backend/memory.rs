//! Process-local in-memory storage.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::CacheResult;
use crate::key::CacheKey;

use super::Backend;

/// Keeps entries in a process-local table. Nothing persists across runs.
///
/// There is no capacity bound or eviction policy; the table grows until
/// cleared or dropped.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn read(&mut self, key: &CacheKey) -> CacheResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key.name()).cloned())
    }

    async fn write(&mut self, key: &CacheKey, bytes: Vec<u8>) -> CacheResult<()> {
        self.entries.insert(key.name().to_string(), bytes);
        Ok(())
    }

    async fn remove(&mut self, key: &CacheKey) -> CacheResult<()> {
        self.entries.remove(key.name());
        Ok(())
    }

    async fn clear(&mut self) -> CacheResult<()> {
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(url: &str) -> CacheKey {
        CacheKey::parse(url).unwrap()
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let mut backend = MemoryBackend::new();
        let key = key("https://example.com/user/1");

        backend.write(&key, b"payload".to_vec()).await.unwrap();
        assert_eq!(backend.read(&key).await.unwrap().unwrap(), b"payload");
    }

    #[tokio::test]
    async fn write_replaces_existing_entry() {
        let mut backend = MemoryBackend::new();
        let key = key("https://example.com/user/1");

        backend.write(&key, b"first".to_vec()).await.unwrap();
        backend.write(&key, b"second".to_vec()).await.unwrap();
        assert_eq!(backend.read(&key).await.unwrap().unwrap(), b"second");
    }

    #[tokio::test]
    async fn missing_entry_is_none_and_remove_is_idempotent() {
        let mut backend = MemoryBackend::new();
        let key = key("https://example.com/user/404");

        assert!(backend.read(&key).await.unwrap().is_none());
        backend.remove(&key).await.unwrap();
    }

    #[tokio::test]
    async fn clear_empties_the_table() {
        let mut backend = MemoryBackend::new();
        let one = key("https://example.com/user/1");
        let two = key("https://example.com/user/2");

        backend.write(&one, b"one".to_vec()).await.unwrap();
        backend.write(&two, b"two".to_vec()).await.unwrap();
        backend.clear().await.unwrap();

        assert!(backend.read(&one).await.unwrap().is_none());
        assert!(backend.read(&two).await.unwrap().is_none());
    }
}
