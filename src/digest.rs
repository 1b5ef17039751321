//! Content digest of image bytes
//!
//! Image identity is the SHA-256 of the raw bytes, rendered as lowercase hex.
//! The digest doubles as the on-disk filename stem, so the filesystem itself
//! is the persistent record of which images have been stored.
//!
//! Collision resistance of SHA-256 is an accepted assumption: two distinct
//! byte sequences are treated as always producing distinct digests.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;

/// SHA-256 content digest encoded as a lowercase hex string
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageDigest(String);

impl ImageDigest {
    /// Length of the hex encoding (SHA-256 produces 32 bytes = 64 hex chars)
    pub const HEX_LEN: usize = 64;

    /// Compute the digest of a byte sequence
    #[must_use]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Parse a string that is already a syntactically valid digest
    ///
    /// Accepts exactly [`Self::HEX_LEN`] hex digits in either case and
    /// normalizes to lowercase. Returns `None` for anything else, which is
    /// how the reconciler decides whether an existing filename can be
    /// trusted as a digest or the file must be rehashed.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() == Self::HEX_LEN && s.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(Self(s.to_ascii_lowercase()))
        } else {
            None
        }
    }

    /// The hex string form of the digest
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_bytes_known_vector() {
        let digest = ImageDigest::of_bytes(b"hello");
        assert_eq!(
            digest.as_str(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_of_bytes_is_deterministic() {
        let a = ImageDigest::of_bytes(b"image bytes");
        let b = ImageDigest::of_bytes(b"image bytes");
        assert_eq!(a, b);

        let c = ImageDigest::of_bytes(b"other bytes");
        assert_ne!(a, c);
    }

    #[test]
    fn test_parse_valid_lowercase() {
        let hex = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
        let digest = ImageDigest::parse(hex).unwrap();
        assert_eq!(digest.as_str(), hex);
    }

    #[test]
    fn test_parse_normalizes_case() {
        let upper = "2CF24DBA5FB0A30E26E83B2AC5B9E29E1B161E5C1FA7425E73043362938B9824";
        let digest = ImageDigest::parse(upper).unwrap();
        assert_eq!(
            digest.as_str(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(ImageDigest::parse("abc123").is_none());
        assert!(ImageDigest::parse("").is_none());
        // 63 chars
        assert!(ImageDigest::parse(&"a".repeat(63)).is_none());
        // 65 chars
        assert!(ImageDigest::parse(&"a".repeat(65)).is_none());
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        assert!(ImageDigest::parse(&"g".repeat(64)).is_none());
        assert!(ImageDigest::parse(&"-".repeat(64)).is_none());
    }
}
