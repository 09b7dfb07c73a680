//! Passbox - Passphrase-protected password keychain
//!
//! A local password store keyed by a single master passphrase. Domains and
//! passwords never reach disk in the clear: domains are indexed by a keyed
//! digest, passwords are sealed with authenticated encryption bound to their
//! domain, and the serialized dump is covered by an out-of-band checksum.

#![forbid(unsafe_code)]

pub mod domain;
pub mod entrycrypt;
pub mod error;
pub mod file_ops;
pub mod integrity;
pub mod kdf;
pub mod keychain;
pub mod passphrase;
