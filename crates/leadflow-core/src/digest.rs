//! # Content Digests
//!
//! SHA-256 over [`CanonicalBytes`]. The activity log chains these: every
//! entry stores the digest of the entry before it, so editing or removing
//! a past entry breaks every later link.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;

/// A 32-byte SHA-256 digest, serialized as lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// The all-zero digest that starts every chain.
    pub const GENESIS: ContentDigest = ContentDigest([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 64 || !s.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

impl From<ContentDigest> for String {
    fn from(d: ContentDigest) -> String {
        d.to_hex()
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s).ok_or_else(|| format!("invalid sha256 hex digest: {s:?}"))
    }
}

/// SHA-256 of canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let hash = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_digest_is_known() {
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        // sha256("{}")
        assert_eq!(
            sha256_digest(&cb).to_hex(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn hex_roundtrip_and_rejects_garbage() {
        let cb = CanonicalBytes::new(&serde_json::json!({"a": 1})).unwrap();
        let d = sha256_digest(&cb);
        assert_eq!(ContentDigest::from_hex(&d.to_hex()), Some(d));
        assert_eq!(ContentDigest::from_hex("abc"), None);
        assert_eq!(ContentDigest::from_hex(&"zz".repeat(32)), None);
    }

    #[test]
    fn serde_uses_hex() {
        let json = serde_json::to_string(&ContentDigest::GENESIS).unwrap();
        assert_eq!(json, format!("\"{}\"", "0".repeat(64)));
        let back: ContentDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ContentDigest::GENESIS);
    }

    #[test]
    fn different_input_different_digest() {
        let a = CanonicalBytes::new(&serde_json::json!({"status": "new"})).unwrap();
        let b = CanonicalBytes::new(&serde_json::json!({"status": "assigned"})).unwrap();
        assert_ne!(sha256_digest(&a), sha256_digest(&b));
    }
}
