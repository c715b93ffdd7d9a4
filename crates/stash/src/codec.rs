//! Conversion between typed items and the raw bytes backends store.
//!
//! Failure is deliberately quiet on the read side: `decode` yields `None`
//! instead of an error, and the cache treats "could not be reconstructed"
//! exactly like "not found". Only the download path upgrades a decode
//! failure to a real error.

/// Converts an item to and from a byte sequence.
///
/// `encode` may refuse (`None` means nothing gets stored); `decode` may fail
/// (`None` means the entry is treated as absent). Neither ever panics or
/// raises.
pub trait Codec: Sized + Send + 'static {
    /// Encode the item to bytes, or `None` if it cannot be represented.
    fn encode(&self) -> Option<Vec<u8>>;

    /// Reconstruct an item from bytes, or `None` if the bytes are malformed.
    fn decode(bytes: &[u8]) -> Option<Self>;
}

/// Implements [`Codec`] for serde types via JSON.
///
/// ```
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct User {
///     name: String,
/// }
///
/// stash::json_codec!(User);
/// ```
#[macro_export]
macro_rules! json_codec {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Codec for $ty {
                fn encode(&self) -> ::std::option::Option<::std::vec::Vec<u8>> {
                    $crate::serde_json::to_vec(self).ok()
                }

                fn decode(bytes: &[u8]) -> ::std::option::Option<Self> {
                    $crate::serde_json::from_slice(bytes).ok()
                }
            }
        )+
    };
}

/// Raw byte blobs (images, opaque payloads) pass through unchanged.
impl Codec for Vec<u8> {
    fn encode(&self) -> Option<Vec<u8>> {
        Some(self.clone())
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        Some(bytes.to_vec())
    }
}

/// Strings store as UTF-8; invalid UTF-8 decodes as absent.
impl Codec for String {
    fn encode(&self) -> Option<Vec<u8>> {
        Some(self.as_bytes().to_vec())
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        String::from_utf8(bytes.to_vec()).ok()
    }
}

/// Encode an ordered sequence of items into one blob.
///
/// Each encoded item is preceded by its length as a big-endian `u32`. A
/// length prefix (rather than a sentinel between chunks) means an item's own
/// bytes can never corrupt the framing. An empty slice encodes to an empty
/// blob, which decodes back to an empty sequence.
pub(crate) fn encode_many<T: Codec>(items: &[T]) -> Option<Vec<u8>> {
    let mut blob = Vec::new();
    for item in items {
        let bytes = item.encode()?;
        let len = u32::try_from(bytes.len()).ok()?;
        blob.extend_from_slice(&len.to_be_bytes());
        blob.extend_from_slice(&bytes);
    }
    Some(blob)
}

/// Invert [`encode_many`]. Any truncated or undecodable chunk makes the
/// whole sequence absent.
pub(crate) fn decode_many<T: Codec>(blob: &[u8]) -> Option<Vec<T>> {
    let mut items = Vec::new();
    let mut rest = blob;
    while !rest.is_empty() {
        if rest.len() < 4 {
            return None;
        }
        let (prefix, tail) = rest.split_at(4);
        let len = u32::from_be_bytes(prefix.try_into().ok()?) as usize;
        if tail.len() < len {
            return None;
        }
        let (chunk, tail) = tail.split_at(len);
        items.push(T::decode(chunk)?);
        rest = tail;
    }
    Some(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        name: String,
        email: String,
        is_admin: bool,
    }

    crate::json_codec!(User);

    fn homer() -> User {
        User {
            name: "Homer J. Simpson".to_string(),
            email: "homer@snpp.com".to_string(),
            is_admin: false,
        }
    }

    fn burns() -> User {
        User {
            name: "C. Montgomery Burns".to_string(),
            email: "mrburns@snpp.com".to_string(),
            is_admin: false,
        }
    }

    #[test]
    fn json_round_trip() {
        let user = homer();
        let bytes = user.encode().unwrap();
        let decoded = User::decode(&bytes).unwrap();
        assert_eq!(decoded, user);
    }

    #[test]
    fn json_decode_failure_is_none() {
        assert!(User::decode(b"this is not json{{{").is_none());
    }

    #[test]
    fn raw_bytes_pass_through() {
        let blob = vec![0u8, 159, 146, 150];
        let bytes = blob.encode().unwrap();
        assert_eq!(Vec::<u8>::decode(&bytes).unwrap(), blob);
    }

    #[test]
    fn string_rejects_invalid_utf8() {
        assert!(String::decode(&[0xff, 0xfe]).is_none());
        assert_eq!(String::decode(b"hello").unwrap(), "hello");
    }

    #[test]
    fn framing_preserves_count_and_order() {
        let users = vec![homer(), burns()];
        let blob = encode_many(&users).unwrap();
        let decoded: Vec<User> = decode_many(&blob).unwrap();
        assert_eq!(decoded, users);
    }

    #[test]
    fn framing_empty_sequence_round_trips() {
        let blob = encode_many::<User>(&[]).unwrap();
        assert!(blob.is_empty());
        let decoded: Vec<User> = decode_many(&blob).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn framing_survives_prefix_bytes_in_payload() {
        // Payloads containing arbitrary bytes (including ones that look
        // like length prefixes) must not split incorrectly.
        let blobs = vec![vec![0u8, 0, 0, 2], vec![b'|', b'|', 0, 0, 0, 9]];
        let framed = encode_many(&blobs).unwrap();
        let decoded: Vec<Vec<u8>> = decode_many(&framed).unwrap();
        assert_eq!(decoded, blobs);
    }

    #[test]
    fn framing_truncated_blob_is_absent() {
        let users = vec![homer()];
        let mut blob = encode_many(&users).unwrap();
        blob.truncate(blob.len() - 3);
        assert!(decode_many::<User>(&blob).is_none());
    }

    #[test]
    fn framing_undecodable_chunk_is_absent() {
        let chunks = vec!["ok".to_string()];
        let mut blob = encode_many(&chunks).unwrap();
        blob.extend_from_slice(&2u32.to_be_bytes());
        blob.extend_from_slice(&[0xff, 0xfe]);
        assert!(decode_many::<String>(&blob).is_none());
    }
}
