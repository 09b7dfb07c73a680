//! Whole-dump integrity checking
//!
//! An unkeyed SHA-256 checksum over the exact bytes of the serialized dump
//! text. It detects any modification of the file as a whole - flipped bytes,
//! truncation, a swapped salt - before any per-entry decryption is
//! attempted. The checksum travels out-of-band: it is returned next to the
//! dump and never embedded in it, so forging a checksum field inside the
//! file is not possible.

use crate::error::{ErrorCategory, ErrorKind, PassboxError, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};

/// Compute the checksum of serialized dump text.
///
/// Rendered as standard base64 with padding (44 characters).
pub fn checksum(dump_text: &str) -> String {
    STANDARD.encode(Sha256::digest(dump_text.as_bytes()))
}

/// Verify dump text against an expected checksum.
///
/// Any difference fails, including an expected value that is not a
/// well-formed checksum at all.
pub fn verify(dump_text: &str, expected: &str) -> Result<()> {
    if checksum(dump_text) == expected {
        Ok(())
    } else {
        Err(PassboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::ChecksumMismatch,
            "dump checksum does not match the expected value",
        ))
    }
}
