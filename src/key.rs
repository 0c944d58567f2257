//! Content-addressed cache key derivation and on-disk filename encoding.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// An opaque, non-empty cache key derived from a resource's URL.
///
/// Deterministic across processes and platforms: built from the URL's last
/// path segment plus a fixed-length hex digest, never from anything
/// locale-sensitive or time-varying.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives a key from `url`: `"<stem>-<digest>[.<ext>]"`, where `<stem>`
    /// and `<ext>` come from the last path segment split on its final `.`,
    /// and `<digest>` is the first 8 bytes of the URL's blake3 hash, hex
    /// encoded. If the URL has no (non-empty) path segment, the key is the
    /// digest alone.
    pub fn derive(url: &Url) -> Self {
        let digest = blake3::hash(url.as_str().as_bytes());
        let hex = to_hex(&digest.as_bytes()[..8]);

        let last_segment = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty());

        let key = match last_segment {
            Some(segment) => match segment.rsplit_once('.') {
                Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{hex}.{ext}"),
                _ => format!("{segment}-{hex}"),
            },
            None => hex,
        };

        CacheKey(key)
    }

    /// Wraps an already-derived, caller-supplied key. Panics if `raw` is
    /// empty — an empty key violates the non-empty invariant and indicates a
    /// caller bug, not a runtime condition to recover from.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        assert!(!raw.is_empty(), "CacheKey must not be empty");
        CacheKey(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The on-disk filename for this key's content file: percent-encodes
    /// every byte outside the RFC 3986 "unreserved" set so the result is a
    /// safe filename component on every common filesystem.
    pub fn encoded_filename(&self) -> String {
        let mut out = String::with_capacity(self.0.len() + 8);
        out.push_str("file_");
        for byte in self.0.as_bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                    out.push(*byte as char);
                }
                _ => {
                    out.push('%');
                    out.push(HEX_DIGITS[(byte >> 4) as usize] as char);
                    out.push(HEX_DIGITS[(byte & 0x0f) as usize] as char);
                }
            }
        }
        out
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX_DIGITS[(byte >> 4) as usize] as char);
        out.push(HEX_DIGITS[(byte & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let url = Url::parse("https://example.com/assets/logo.png").unwrap();
        let a = CacheKey::derive(&url);
        let b = CacheKey::derive(&url);
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("logo-"));
        assert!(a.as_str().ends_with(".png"));
    }

    #[test]
    fn different_urls_yield_different_keys() {
        let a = CacheKey::derive(&Url::parse("https://example.com/a.png").unwrap());
        let b = CacheKey::derive(&Url::parse("https://example.com/b.png").unwrap());
        assert_ne!(a, b);
    }

    #[test]
    fn no_path_segment_falls_back_to_digest() {
        let url = Url::parse("https://example.com").unwrap();
        let key = CacheKey::derive(&url);
        assert_eq!(key.as_str().len(), 16);
    }

    #[test]
    fn encoded_filename_is_path_safe() {
        let key = CacheKey::from_raw("weird key/name?.png");
        let encoded = key.encoded_filename();
        assert!(!encoded.contains('/'));
        assert!(!encoded.contains('?'));
        assert!(encoded.starts_with("file_"));
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn empty_key_panics() {
        CacheKey::from_raw("");
    }
}
