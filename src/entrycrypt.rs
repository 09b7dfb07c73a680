//! Per-entry authenticated encryption
//!
//! Each password is sealed with AES-256-GCM under the cipher key, with the
//! owning domain tag as associated data. Opening under any other tag fails
//! the GCM check, so a ciphertext relocated to a different domain is
//! rejected rather than decrypted.
//!
//! A sealed entry is `{ nonce (12 bytes), ciphertext }` where the ciphertext
//! includes the 16-byte GCM authentication tag.

use crate::domain::DomainTag;
use crate::error::{ErrorCategory, ErrorKind, PassboxError, Result};
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

/// Length of the AES-GCM nonce in bytes
pub const NONCE_LEN: usize = 12;

/// Authenticated ciphertext for one password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedEntry {
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
}

/// Seal a password under the cipher key, bound to its domain tag.
///
/// A fresh random nonce is generated on every call; nonces are never reused
/// under a given key.
pub fn seal(cipher_key: &[u8; 32], tag: &DomainTag, plaintext: &[u8]) -> Result<SealedEntry> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    seal_with_nonce(cipher_key, tag, plaintext, &nonce)
}

/// Seal with a caller-provided nonce.
///
/// This function is ONLY for testing purposes to generate deterministic
/// output. NEVER use this in production - always use `seal()` which
/// generates a random nonce.
pub fn seal_with_nonce(
    cipher_key: &[u8; 32],
    tag: &DomainTag,
    plaintext: &[u8],
    nonce: &[u8; NONCE_LEN],
) -> Result<SealedEntry> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(cipher_key));

    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad: tag.as_bytes(),
            },
        )
        .map_err(|_| {
            PassboxError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::CipherFailure,
                "AES-GCM sealing failed",
            )
        })?;

    Ok(SealedEntry {
        nonce: *nonce,
        ciphertext,
    })
}

/// Open a sealed entry, authenticating it against its domain tag.
///
/// A wrong key, a tag other than the sealing tag, and a modified ciphertext
/// all fail identically: the ciphertext alone cannot tell a bad passphrase
/// apart from tampering.
pub fn open(
    cipher_key: &[u8; 32],
    tag: &DomainTag,
    entry: &SealedEntry,
) -> Result<Zeroizing<Vec<u8>>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(cipher_key));

    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(&entry.nonce),
            Payload {
                msg: entry.ciphertext.as_slice(),
                aad: tag.as_bytes(),
            },
        )
        .map_err(|_| {
            PassboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::AuthenticationFailed,
                "corrupt entry, tampered-with data, or bad passphrase",
            )
        })?;

    Ok(Zeroizing::new(plaintext))
}
