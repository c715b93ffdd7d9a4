//! Error types for the cache and the download path.

/// Errors raised by cache construction and storage backends.
///
/// Backend failures never cross the async boundary of [`Cache`]: the worker
/// logs them and degrades the operation to a no-op or an absent result. They
/// only appear directly when constructing a backend.
///
/// [`Cache`]: crate::Cache
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Invalid configuration, rejected before any operation runs.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Storage backend I/O failure.
    #[error("backend error: {message}")]
    Backend { message: String },
}

/// Result type for cache and backend operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors surfaced by the fetch-or-download path.
///
/// This is the one place where failures reach the caller: a plain `fetch`
/// degrades everything to "absent", but a download that fails or produces
/// undecodable bytes must not masquerade as an empty cache.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Transport-level failure (DNS, connect, TLS, timeout).
    #[error("network error: {message}")]
    Network { message: String },

    /// The server answered with a non-success status code.
    #[error("unexpected HTTP status {code}")]
    Status { code: u16 },

    /// The response arrived but its body could not be read.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// The response body was empty.
    #[error("response body was empty")]
    EmptyBody,

    /// The downloaded payload could not be decoded into the expected type.
    #[error("downloaded payload could not be decoded")]
    DecodeFailed,
}

impl From<reqwest::Error> for DownloadError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}
