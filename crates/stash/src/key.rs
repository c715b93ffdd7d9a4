//! URL-derived cache keys.

use url::Url;

/// Addresses one cache entry, derived from the URL the item came from.
///
/// The key's [`name`](CacheKey::name) — the last non-empty path segment of
/// the URL — is what backends actually index by. Two URLs whose paths end in
/// the same segment therefore alias to the same entry
/// (`https://a.example/users/1` and `https://b.example/posts/1` collide).
/// This matches the historical file-name-based layout and is kept for
/// compatibility; callers who need collision-free keys should make the final
/// segment unique.
#[derive(Debug, Clone)]
pub struct CacheKey {
    url: Url,
}

impl CacheKey {
    /// Create a key for the given source URL.
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// Parse a URL string into a key.
    pub fn parse(input: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(input)?))
    }

    /// The source URL this key was derived from, used by the download path.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The entry name backends index by: the last non-empty path segment,
    /// falling back to the host when the URL has a bare path.
    pub fn name(&self) -> &str {
        self.url
            .path_segments()
            .and_then(|segments| segments.rev().find(|segment| !segment.is_empty()))
            .or_else(|| self.url.host_str())
            .unwrap_or("entry")
    }
}

impl From<Url> for CacheKey {
    fn from(url: Url) -> Self {
        Self::new(url)
    }
}
