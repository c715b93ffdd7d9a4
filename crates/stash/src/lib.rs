//! Asynchronous key-addressed caching for serializable items.
//!
//! `stash` avoids redundant network fetches of structured records, images,
//! and other binary blobs. It provides:
//!
//! - An async [`Cache`] contract with per-instance FIFO ordering
//! - Pluggable storage [`Backend`]s: filesystem and in-memory
//! - A byte [`Codec`] with array framing for sequences of items
//! - A cache-aside [`fetch_or_download`](Cache::fetch_or_download) path
//!
//! # Quick start
//!
//! ```no_run
//! use reqwest::header::HeaderMap;
//! use serde::{Deserialize, Serialize};
//! use stash::{Cache, CacheKey, FsBackend, HttpFetcher, UserDir};
//!
//! #[derive(Serialize, Deserialize)]
//! struct User {
//!     name: String,
//! }
//!
//! stash::json_codec!(User);
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = FsBackend::in_user_dir(UserDir::Caches, "users")?;
//! let cache: Cache<User> = Cache::new(backend);
//! let fetcher = HttpFetcher::new()?;
//!
//! let key = CacheKey::parse("https://api.example.com/user/42")?;
//! let user = cache
//!     .fetch_or_download(&key, &fetcher, &HeaderMap::new())
//!     .await?;
//! println!("hello, {}", user.name);
//! # Ok(())
//! # }
//! ```
//!
//! # Ordering
//!
//! Operations submitted against one cache instance (including its clones)
//! are applied in submission order on a single worker task, so a store
//! followed by a fetch of the same key always observes the stored value.
//! Results are delivered wherever the caller awaits the returned future;
//! dropping that future discards the result without cancelling the
//! operation.
//!
//! # Failure policy
//!
//! Backend and decode failures never surface from plain cache operations:
//! they are logged via `tracing` and degrade to absent results or no-ops.
//! Only the download path returns errors, because there the caller has no
//! other way to learn the cache was not populated.

pub mod backend;
pub mod cache;
pub mod codec;
pub mod download;
pub mod error;
pub mod key;

// Used by the `json_codec!` macro expansion.
#[doc(hidden)]
pub use serde_json;

pub use backend::{Backend, FsBackend, MemoryBackend, UserDir};
pub use cache::{Cache, Completion, Lookup, LookupAll};
pub use codec::Codec;
pub use download::{Fetcher, HttpFetcher};
pub use error::{CacheError, CacheResult, DownloadError};
pub use key::CacheKey;
