//! The cache-aside download path.
//!
//! This is the only place failures reach the caller (see
//! [`DownloadError`]): a remote fetch that fails, or a payload that does not
//! decode, must not be mistaken for an empty cache.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::debug;
use url::Url;

use crate::cache::Cache;
use crate::codec::{self, Codec};
use crate::error::DownloadError;
use crate::key::CacheKey;

const USER_AGENT_VALUE: &str = concat!("stash/", env!("CARGO_PKG_VERSION"));

/// Loads raw bytes for a source address.
///
/// The orchestrator passes every fetcher error straight through to its
/// caller; implementations classify failures with [`DownloadError`].
/// Dropping the future returned by `fetch` cancels the request.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Load the bytes at `url`, sending `headers` with the request.
    async fn fetch(&self, url: &Url, headers: &HeaderMap) -> Result<Vec<u8>, DownloadError>;
}

/// HTTP GET fetcher backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with a fresh client and the crate user agent.
    pub fn new() -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT_VALUE)
            .build()
            .map_err(|e| DownloadError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }

    /// Create a fetcher reusing an existing client (connection pools,
    /// timeouts, and proxies included).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, headers: &HeaderMap) -> Result<Vec<u8>, DownloadError> {
        let response = self
            .client
            .get(url.clone())
            .headers(headers.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                code: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DownloadError::InvalidResponse {
                message: format!("failed to read response body: {}", e),
            })?;

        if bytes.is_empty() {
            return Err(DownloadError::EmptyBody);
        }

        Ok(bytes.to_vec())
    }
}

impl<T: Codec> Cache<T> {
    /// Get the item for `key` from the cache, downloading it from the key's
    /// source URL on a miss.
    ///
    /// On a miss the downloaded payload is decoded (failure is an explicit
    /// [`DownloadError::DecodeFailed`], never a silent absent), the cache is
    /// populated fire-and-forget, and the item is returned. The populate is
    /// enqueued before returning, so a subsequent [`fetch`](Cache::fetch) on
    /// this instance observes it.
    ///
    /// Two concurrent calls that both miss will download and store
    /// independently, last write wins; there is no single-flight
    /// deduplication.
    pub async fn fetch_or_download(
        &self,
        key: &CacheKey,
        fetcher: &dyn Fetcher,
        headers: &HeaderMap,
    ) -> Result<T, DownloadError> {
        if let Some(item) = self.fetch(key).await {
            debug!(key = key.name(), "cache hit");
            return Ok(item);
        }

        debug!(key = key.name(), url = %key.url(), "cache miss; downloading");
        let bytes = fetcher.fetch(key.url(), headers).await?;
        let item = T::decode(&bytes).ok_or(DownloadError::DecodeFailed)?;

        // Fire-and-forget: the write is already enqueued. If the worker is
        // gone the item is still delivered, just not stored.
        self.store(&item, key).detach();

        Ok(item)
    }

    /// The sequence-valued twin of [`fetch_or_download`]: the payload is
    /// decoded with the array framing and stored as one entry.
    ///
    /// [`fetch_or_download`]: Cache::fetch_or_download
    pub async fn fetch_or_download_all(
        &self,
        key: &CacheKey,
        fetcher: &dyn Fetcher,
        headers: &HeaderMap,
    ) -> Result<Vec<T>, DownloadError> {
        if let Some(items) = self.fetch_all(key).await {
            debug!(key = key.name(), "cache hit");
            return Ok(items);
        }

        debug!(key = key.name(), url = %key.url(), "cache miss; downloading");
        let bytes = fetcher.fetch(key.url(), headers).await?;
        let items = codec::decode_many(&bytes).ok_or(DownloadError::DecodeFailed)?;

        self.store_all(&items, key).detach();

        Ok(items)
    }
}
