//! The keychain store
//!
//! Owns the salt and the mapping from domain tag to sealed entry, and wires
//! key derivation, domain indexing, entry sealing, and dump integrity into
//! the public create/load/set/get/remove/dump surface.
//!
//! The dump is JSON with a fixed schema:
//!
//! ```json
//! {
//!   "salt": "<base64>",
//!   "kvs": {
//!     "<domain tag, base64>": { "iv": "<base64>", "ct": "<base64>" }
//!   }
//! }
//! ```
//!
//! The checksum over that text is returned separately by `dump` and must be
//! supplied again to `load`; it never appears inside the text.

use std::collections::{BTreeMap, HashMap};

use crate::domain::DomainTag;
use crate::entrycrypt::{self, NONCE_LEN, SealedEntry};
use crate::error::{ErrorCategory, ErrorKind, PassboxError, Result};
use crate::integrity;
use crate::kdf::{self, KdfParams, MasterSecret, SALT_LEN};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DumpPayload {
    salt: String,
    kvs: BTreeMap<String, DumpEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DumpEntry {
    iv: String,
    ct: String,
}

/// A passphrase-keyed password store.
///
/// An owned value with no global state; independent stores in one process
/// do not interfere with each other.
pub struct Keychain {
    salt: [u8; SALT_LEN],
    params: KdfParams,
    secret: MasterSecret,
    kvs: HashMap<DomainTag, SealedEntry>,
}

impl std::fmt::Debug for Keychain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keychain")
            .field("params", &self.params)
            .field("entries", &self.kvs.len())
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Keychain {
    /// Create an empty store with a fresh random salt.
    pub fn new(passphrase: &str) -> Result<Self> {
        Self::with_params(passphrase, KdfParams::default())
    }

    /// Create an empty store with an explicit key derivation work factor.
    pub fn with_params(passphrase: &str, params: KdfParams) -> Result<Self> {
        let salt = kdf::generate_salt();
        let secret = MasterSecret::derive(passphrase.as_bytes(), &salt, &params)?;

        Ok(Self {
            salt,
            params,
            secret,
            kvs: HashMap::new(),
        })
    }

    /// Restore a store from dump text and its out-of-band checksum.
    ///
    /// The checksum is verified before anything is parsed. Every entry in
    /// the dump is then test-decrypted under the supplied passphrase, so a
    /// wrong passphrase or a tampered entry fails here rather than on a
    /// later `get`. An empty dump cannot contradict the passphrase and loads
    /// trivially.
    pub fn load(passphrase: &str, dump_text: &str, checksum: &str) -> Result<Self> {
        Self::load_with_params(passphrase, dump_text, checksum, KdfParams::default())
    }

    /// `load` with an explicit key derivation work factor.
    ///
    /// Must match the parameters the store was created with; the dump does
    /// not record them.
    pub fn load_with_params(
        passphrase: &str,
        dump_text: &str,
        checksum: &str,
        params: KdfParams,
    ) -> Result<Self> {
        integrity::verify(dump_text, checksum)?;

        let payload: DumpPayload = serde_json::from_str(dump_text).map_err(|e| {
            PassboxError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::DumpInvalid,
                "dump is not a well-formed keychain document",
                e,
            )
        })?;

        let salt = STANDARD.decode(&payload.salt).map_err(|e| {
            PassboxError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::DumpDecode,
                "base64 decoding of salt failed",
                e,
            )
        })?;
        let salt: [u8; SALT_LEN] = salt.try_into().map_err(|_| {
            PassboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::DumpDecode,
                "salt has wrong length",
            )
        })?;

        let secret = MasterSecret::derive(passphrase.as_bytes(), &salt, &params)?;

        let mut kvs = HashMap::with_capacity(payload.kvs.len());
        for (tag_text, dump_entry) in &payload.kvs {
            let tag = DomainTag::decode(tag_text)?;
            let sealed = decode_entry(dump_entry)?;
            // Rejects a wrong passphrase or a relocated/corrupted entry now
            // instead of on a later get. The plaintext is discarded.
            entrycrypt::open(secret.cipher_key(), &tag, &sealed)?;
            kvs.insert(tag, sealed);
        }

        Ok(Self {
            salt,
            params,
            secret,
            kvs,
        })
    }

    /// Store a password for a domain, replacing any existing entry.
    pub fn set(&mut self, domain: &str, password: &str) -> Result<()> {
        let tag = DomainTag::compute(self.secret.index_key(), domain);
        let sealed = entrycrypt::seal(self.secret.cipher_key(), &tag, password.as_bytes())?;
        self.kvs.insert(tag, sealed);
        Ok(())
    }

    /// Retrieve the password stored for a domain.
    ///
    /// An unknown domain is a normal outcome (`Ok(None)`), not an error.
    /// Decryption failure of an entry this store itself wrote does error.
    pub fn get(&self, domain: &str) -> Result<Option<Zeroizing<String>>> {
        let tag = DomainTag::compute(self.secret.index_key(), domain);
        let Some(sealed) = self.kvs.get(&tag) else {
            return Ok(None);
        };

        let plaintext = entrycrypt::open(self.secret.cipher_key(), &tag, sealed)?;
        let password = std::str::from_utf8(&plaintext)
            .map_err(|_| {
                PassboxError::with_kind(
                    ErrorCategory::Internal,
                    ErrorKind::InternalInvariant,
                    "decrypted password is not valid UTF-8",
                )
            })?
            .to_string();

        Ok(Some(Zeroizing::new(password)))
    }

    /// Remove the entry for a domain. Returns whether an entry existed.
    pub fn remove(&mut self, domain: &str) -> bool {
        let tag = DomainTag::compute(self.secret.index_key(), domain);
        self.kvs.remove(&tag).is_some()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.kvs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kvs.is_empty()
    }

    /// The work factor this store derives its keys with.
    pub fn params(&self) -> KdfParams {
        self.params
    }

    /// Serialize the store, returning `(dump text, checksum)`.
    ///
    /// Entries are written in lexicographic tag order, so an unchanged store
    /// always produces identical text and therefore an identical checksum.
    /// Does not mutate the store.
    pub fn dump(&self) -> Result<(String, String)> {
        let mut kvs = BTreeMap::new();
        for (tag, sealed) in &self.kvs {
            kvs.insert(
                tag.encode(),
                DumpEntry {
                    iv: STANDARD.encode(sealed.nonce),
                    ct: STANDARD.encode(&sealed.ciphertext),
                },
            );
        }

        let payload = DumpPayload {
            salt: STANDARD.encode(self.salt),
            kvs,
        };
        let text = serde_json::to_string(&payload).map_err(|e| {
            PassboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::InternalInvariant,
                "dump serialization failed",
                e,
            )
        })?;
        let sum = integrity::checksum(&text);

        Ok((text, sum))
    }
}

fn decode_entry(entry: &DumpEntry) -> Result<SealedEntry> {
    let nonce = STANDARD.decode(&entry.iv).map_err(|e| {
        PassboxError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::DumpDecode,
            "base64 decoding of entry nonce failed",
            e,
        )
    })?;
    let nonce: [u8; NONCE_LEN] = nonce.try_into().map_err(|_| {
        PassboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::DumpDecode,
            "entry nonce has wrong length",
        )
    })?;

    let ciphertext = STANDARD.decode(&entry.ct).map_err(|e| {
        PassboxError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::DumpDecode,
            "base64 decoding of entry ciphertext failed",
            e,
        )
    })?;

    Ok(SealedEntry { nonce, ciphertext })
}
