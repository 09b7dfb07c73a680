//! Vault file operations
//!
//! This module provides high-level operations for creating, opening, and
//! saving a keychain vault on disk. The dump text lives in the vault file;
//! its checksum lives out-of-band in a `<vault>.sum` sidecar next to it, so
//! the checksum check cannot be defeated by editing the vault file alone.
//!
//! Files are created with mode 0o600 (read/write for owner only) on Unix
//! systems and replaced atomically (tempfile + fsync + rename), so an
//! interrupted save leaves the previous vault intact.

use crate::error::{ErrorCategory, ErrorKind, PassboxError, Result};
use crate::keychain::Keychain;
use crate::passphrase::SecretReader;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Path of the checksum sidecar for a vault file: `<vault>.sum`.
pub fn checksum_path(vault_path: &Path) -> PathBuf {
    let mut path = vault_path.as_os_str().to_os_string();
    path.push(".sum");
    PathBuf::from(path)
}

/// Create a new empty vault at `vault_path`.
///
/// Reads the master passphrase from `secret_reader`, writes the vault file
/// and its checksum sidecar, and returns the open keychain. Refuses to
/// overwrite an existing vault.
pub fn create_vault(vault_path: &Path, secret_reader: &mut dyn SecretReader) -> Result<Keychain> {
    if vault_path.exists() {
        return Err(PassboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::VaultExists,
            format!("vault already exists at {}", vault_path.display()),
        ));
    }

    let passphrase = secret_reader.read_secret("Passphrase")?;
    let keychain = Keychain::new(&passphrase)?;
    save_vault(vault_path, &keychain)
        .map_err(|e| e.with_context(format!("failed to write new vault {}", vault_path.display())))?;

    Ok(keychain)
}

/// Open an existing vault.
///
/// Reads the dump from `vault_path` and its checksum from the sidecar,
/// reads the master passphrase from `secret_reader`, and restores the
/// keychain. Checksum and passphrase failures propagate from the load.
pub fn open_vault(vault_path: &Path, secret_reader: &mut dyn SecretReader) -> Result<Keychain> {
    let dump_bytes = fs::read(vault_path).map_err(|e| read_error(vault_path, e))?;
    let dump_text = String::from_utf8(dump_bytes).map_err(|e| {
        PassboxError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            "vault file is not valid UTF-8",
            e,
        )
    })?;

    let sum_path = checksum_path(vault_path);
    let sum_bytes = fs::read(&sum_path).map_err(|e| read_error(&sum_path, e))?;
    let sum_text = String::from_utf8(sum_bytes).map_err(|e| {
        PassboxError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            "checksum sidecar is not valid UTF-8",
            e,
        )
    })?;
    let checksum = sum_text.trim_end_matches(['\n', '\r']);

    let passphrase = secret_reader.read_secret("Passphrase")?;
    Keychain::load(&passphrase, &dump_text, checksum)
        .map_err(|e| e.with_context(format!("failed to open vault {}", vault_path.display())))
}

/// Save a keychain to its vault file and checksum sidecar.
///
/// The two writes are individually atomic; a crash between them leaves a
/// vault/sidecar pair that fails the checksum check at the next open.
pub fn save_vault(vault_path: &Path, keychain: &Keychain) -> Result<()> {
    let (dump_text, checksum) = keychain.dump()?;

    write_atomic(vault_path, dump_text.as_bytes())?;

    let mut sum_line = checksum;
    sum_line.push('\n');
    write_atomic(&checksum_path(vault_path), sum_line.as_bytes())?;

    Ok(())
}

/// Atomically replace `path` with `contents` (tempfile + fsync + rename),
/// with secure permissions (0o600 on Unix).
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path.parent().ok_or_else(|| {
        PassboxError::with_kind(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("{} has no parent directory", path.display()),
        )
    })?;
    // An empty parent means a bare filename; resolve against the cwd.
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };

    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        PassboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to create tempfile",
            e,
        )
    })?;

    temp_file.write_all(contents).map_err(|e| {
        PassboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to write to tempfile",
            e,
        )
    })?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file.flush().map_err(|e| {
        PassboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to flush tempfile",
            e,
        )
    })?;
    temp_file.as_file().sync_all().map_err(|e| {
        PassboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = temp_file
            .as_file()
            .metadata()
            .map_err(|e| {
                PassboxError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to get tempfile metadata",
                    e,
                )
            })?
            .permissions();
        perms.set_mode(0o600);
        temp_file.as_file().set_permissions(perms).map_err(|e| {
            PassboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to set tempfile permissions",
                e,
            )
        })?;
    }

    temp_file.persist(path).map_err(|e| {
        PassboxError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;

    Ok(())
}

fn read_error(path: &Path, err: io::Error) -> PassboxError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    PassboxError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
