//! Keyed domain indexing
//!
//! A domain name never reaches the dump; its HMAC-SHA-256 under the index
//! key is the only identifier that does. The same domain and key always map
//! to the same tag, so lookups work, while the tag is not reversible to the
//! domain without the key.

use crate::error::{ErrorCategory, ErrorKind, PassboxError, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Length of a domain tag in bytes (HMAC-SHA-256 output)
pub const TAG_LEN: usize = 32;

type HmacSha256 = Hmac<Sha256>;

/// Keyed, deterministic digest of a domain name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomainTag([u8; TAG_LEN]);

impl DomainTag {
    /// Compute the tag for a domain under the given index key.
    pub fn compute(index_key: &[u8; 32], domain: &str) -> Self {
        let mut mac =
            HmacSha256::new_from_slice(index_key).expect("HMAC accepts keys of any length");
        mac.update(domain.as_bytes());
        Self(mac.finalize().into_bytes().into())
    }

    /// Raw tag bytes. Used as associated data when sealing entries.
    pub fn as_bytes(&self) -> &[u8; TAG_LEN] {
        &self.0
    }

    /// The tag rendered as a dump map key.
    pub fn encode(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Parse a tag from a dump map key.
    pub fn decode(encoded: &str) -> Result<Self> {
        let bytes = STANDARD.decode(encoded).map_err(|e| {
            PassboxError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::DumpDecode,
                "base64 decoding of domain tag failed",
                e,
            )
        })?;
        let bytes: [u8; TAG_LEN] = bytes.try_into().map_err(|_| {
            PassboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::DumpDecode,
                "domain tag has wrong length",
            )
        })?;
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [0x11; 32];

    #[test]
    fn test_same_domain_same_tag() {
        let a = DomainTag::compute(&KEY, "www.stanford.edu");
        let b = DomainTag::compute(&KEY, "www.stanford.edu");
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_domains_different_tags() {
        let a = DomainTag::compute(&KEY, "example.com");
        let b = DomainTag::compute(&KEY, "example.org");
        assert_ne!(a, b);
    }

    #[test]
    fn test_different_keys_different_tags() {
        let other_key = [0x22; 32];
        let a = DomainTag::compute(&KEY, "example.com");
        let b = DomainTag::compute(&other_key, "example.com");
        assert_ne!(a, b);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let tag = DomainTag::compute(&KEY, "example.com");
        let decoded = DomainTag::decode(&tag.encode()).unwrap();
        assert_eq!(tag, decoded);
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        let err = DomainTag::decode("not valid base64!!").expect_err("expected decode error");
        assert_eq!(err.kind, Some(ErrorKind::DumpDecode));
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let short = STANDARD.encode([0u8; 16]);
        let err = DomainTag::decode(&short).expect_err("expected length error");
        assert_eq!(err.kind, Some(ErrorKind::DumpDecode));
    }

    #[test]
    fn test_tag_does_not_contain_domain() {
        let tag = DomainTag::compute(&KEY, "example.com").encode();
        assert!(!tag.contains("example"));
    }
}
