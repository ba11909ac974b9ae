//! Content hashing (blake3) for change detection and cache keys.

use std::fmt;

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash a byte slice.
    #[inline]
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    /// Combine several hashes (plus a context tag) into one cache key.
    ///
    /// The tag keeps e.g. a minified and an unminified bundle of the same
    /// inputs from colliding.
    pub fn combine(tag: &str, parts: &[ContentHash]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(tag.as_bytes());
        for part in parts {
            hasher.update(&part.0);
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Convert to hex string (for debugging/display).
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display first 16 chars of hex for brevity
        write!(f, "{}", &self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_content_same_hash() {
        assert_eq!(ContentHash::of(b"hello"), ContentHash::of(b"hello"));
        assert_ne!(ContentHash::of(b"hello"), ContentHash::of(b"hello!"));
    }

    #[test]
    fn test_combine_is_order_sensitive() {
        let a = ContentHash::of(b"a");
        let b = ContentHash::of(b"b");
        assert_ne!(
            ContentHash::combine("t", &[a, b]),
            ContentHash::combine("t", &[b, a])
        );
    }

    #[test]
    fn test_combine_tag_separates_keys() {
        let a = ContentHash::of(b"a");
        assert_ne!(
            ContentHash::combine("minified", &[a]),
            ContentHash::combine("plain", &[a])
        );
    }

    #[test]
    fn test_display_is_short_hex() {
        let hash = ContentHash::of(b"x");
        assert_eq!(format!("{hash}").len(), 16);
    }
}
