//! Storage backends behind the cache's ordering contract.

use async_trait::async_trait;

use crate::error::CacheResult;
use crate::key::CacheKey;

mod fs;
mod memory;

pub use fs::{FsBackend, UserDir};
pub use memory::MemoryBackend;

/// A key-addressed byte store.
///
/// A backend instance is exclusively owned by one cache worker, which
/// serializes every call through its command queue; implementations take
/// `&mut self` and need no locking of their own.
///
/// Errors returned here stop at the cache boundary: the worker logs them
/// and degrades the operation to a no-op or an absent result.
#[async_trait]
pub trait Backend: Send + 'static {
    /// Read the bytes stored for a key, or `None` if there is no entry.
    async fn read(&mut self, key: &CacheKey) -> CacheResult<Option<Vec<u8>>>;

    /// Create or fully replace the entry for a key.
    async fn write(&mut self, key: &CacheKey, bytes: Vec<u8>) -> CacheResult<()>;

    /// Delete the entry for a key. An absent key is not an error.
    async fn remove(&mut self, key: &CacheKey) -> CacheResult<()>;

    /// Delete every entry.
    async fn clear(&mut self) -> CacheResult<()>;
}
