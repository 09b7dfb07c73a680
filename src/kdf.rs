//! Key derivation from the master passphrase
//!
//! A single scrypt invocation stretches (passphrase, salt) into 64 bytes of
//! output, split into two independent 32-byte subkeys: one for sealing
//! entries and one for domain indexing. Knowing either subkey reveals
//! nothing about the other.

use crate::error::{ErrorCategory, ErrorKind, PassboxError, Result};
use rand::RngCore;
use rand::rngs::OsRng;
use scrypt::{Params, scrypt};
use zeroize::Zeroizing;

/// Length of salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of each derived subkey in bytes
pub const KEY_LEN: usize = 32;

/// scrypt cost parameters.
///
/// The work factor is a first-class input to key derivation: raising it
/// makes every offline passphrase guess against a stolen dump proportionally
/// more expensive. The same parameters that created a store must be supplied
/// when loading it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// log2 of the scrypt N parameter (CPU/memory cost)
    pub log_n: u8,
    /// scrypt r parameter (block size)
    pub r: u32,
    /// scrypt p parameter (parallelization)
    pub p: u32,
}

impl Default for KdfParams {
    /// N = 32768, r = 8, p = 1. Noticeable per-derivation cost on desktop
    /// hardware without making interactive use painful.
    fn default() -> Self {
        Self {
            log_n: 15,
            r: 8,
            p: 1,
        }
    }
}

/// The two subkeys derived from (passphrase, salt).
///
/// Exists only in memory for the lifetime of the owning store; key material
/// is wiped on drop and is never serialized.
pub struct MasterSecret {
    cipher_key: Zeroizing<[u8; KEY_LEN]>,
    index_key: Zeroizing<[u8; KEY_LEN]>,
}

impl MasterSecret {
    /// Derive both subkeys from a passphrase and salt.
    ///
    /// Deterministic: the same (passphrase, salt, params) always produces
    /// the same keys, which is what lets `load` reconstruct a session.
    pub fn derive(passphrase: &[u8], salt: &[u8; SALT_LEN], params: &KdfParams) -> Result<Self> {
        let scrypt_params = Params::new(params.log_n, params.r, params.p, 2 * KEY_LEN).map_err(
            |e| {
                PassboxError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::KeyDerivation,
                    "invalid scrypt parameters",
                    e,
                )
            },
        )?;

        let mut okm = Zeroizing::new([0u8; 2 * KEY_LEN]);
        scrypt(passphrase, salt, &scrypt_params, &mut *okm).map_err(|e| {
            PassboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::KeyDerivation,
                "scrypt key derivation failed",
                e,
            )
        })?;

        let mut cipher_key = Zeroizing::new([0u8; KEY_LEN]);
        let mut index_key = Zeroizing::new([0u8; KEY_LEN]);
        cipher_key.copy_from_slice(&okm[..KEY_LEN]);
        index_key.copy_from_slice(&okm[KEY_LEN..]);

        Ok(Self {
            cipher_key,
            index_key,
        })
    }

    /// Subkey used for sealing and opening entries.
    pub fn cipher_key(&self) -> &[u8; KEY_LEN] {
        &self.cipher_key
    }

    /// Subkey used for computing domain tags.
    pub fn index_key(&self) -> &[u8; KEY_LEN] {
        &self.index_key
    }
}

/// Generate a fresh random salt.
///
/// The salt is not secret but must be unique per store so precomputed
/// passphrase tables are useless against a stolen dump.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}
