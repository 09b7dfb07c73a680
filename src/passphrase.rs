//! Passphrase and password reading functionality

use crate::error::{ErrorCategory, ErrorKind, PassboxError, Result};
use std::io::{self, BufRead, IsTerminal, Write};
use zeroize::Zeroizing;

/// Trait for reading secrets (the master passphrase, or a password being
/// stored) from various sources.
pub trait SecretReader {
    /// Read one secret. `label` names the secret in any prompt shown to the
    /// user.
    ///
    /// Returns the secret wrapped in `Zeroizing` to ensure it is securely
    /// wiped from memory when dropped.
    fn read_secret(&mut self, label: &str) -> Result<Zeroizing<String>>;
}

/// Returns a fixed sequence of secrets (for testing)
pub struct ConstantSecretReader {
    secrets: std::collections::VecDeque<Zeroizing<String>>,
}

impl ConstantSecretReader {
    pub fn new<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            secrets: secrets
                .into_iter()
                .map(|s| Zeroizing::new(s.into()))
                .collect(),
        }
    }
}

impl SecretReader for ConstantSecretReader {
    fn read_secret(&mut self, label: &str) -> Result<Zeroizing<String>> {
        self.secrets.pop_front().ok_or_else(|| {
            PassboxError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("no prepared secret left for {label}"),
            )
        })
    }
}

/// Reads one secret per line from any BufRead source
pub struct LineSecretReader {
    reader: Box<dyn BufRead>,
}

impl LineSecretReader {
    pub fn new(reader: Box<dyn BufRead>) -> Self {
        Self { reader }
    }
}

impl SecretReader for LineSecretReader {
    fn read_secret(&mut self, label: &str) -> Result<Zeroizing<String>> {
        let mut line = Zeroizing::new(String::new());
        let n = self.reader.read_line(&mut line).map_err(|e| {
            PassboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("error reading {label}"),
                e,
            )
        })?;
        if n == 0 {
            return Err(PassboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                format!("input ended before {label} could be read"),
            ));
        }

        // Strip the line terminator, nothing else: leading or interior
        // whitespace is part of the secret.
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }
}

/// Reads secrets from the terminal with no echo
pub struct TerminalSecretReader;

impl TerminalSecretReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerminalSecretReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretReader for TerminalSecretReader {
    /// Read a secret from the terminal.
    ///
    /// Note: Terminal input is limited to UTF-8 due to rpassword library
    /// constraints. For non-interactive use, pass secrets on stdin instead.
    fn read_secret(&mut self, label: &str) -> Result<Zeroizing<String>> {
        if !io::stdin().is_terminal() {
            return Err(PassboxError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                format!("cannot read {label} from terminal - stdin is not a terminal"),
            ));
        }

        io::stderr()
            .write_all(format!("{label} (passbox): ").as_bytes())
            .map_err(|e| {
                PassboxError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to write prompt: {}", e),
                    e,
                )
            })?;
        io::stderr().flush().map_err(|e| {
            PassboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to flush prompt: {}", e),
                e,
            )
        })?;

        // Read *without echo*
        let secret = rpassword::read_password().map_err(|e| {
            PassboxError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("failure reading {label}: {}", e),
                e,
            )
        })?;

        Ok(Zeroizing::new(secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_reader_sequence() {
        let mut reader = ConstantSecretReader::new(["first", "second"]);
        assert_eq!(&*reader.read_secret("passphrase").unwrap(), "first");
        assert_eq!(&*reader.read_secret("password").unwrap(), "second");
    }

    #[test]
    fn test_constant_reader_exhausted() {
        let mut reader = ConstantSecretReader::new(["only"]);
        reader.read_secret("passphrase").unwrap();

        let err = reader
            .read_secret("password")
            .expect_err("expected exhaustion error");
        assert_eq!(err.kind, Some(ErrorKind::PassphraseUnavailable));
    }

    #[test]
    fn test_line_reader_reads_lines() {
        let data = b"passphrase line\npassword line\n";
        let mut reader = LineSecretReader::new(Box::new(&data[..]));

        assert_eq!(&*reader.read_secret("passphrase").unwrap(), "passphrase line");
        assert_eq!(&*reader.read_secret("password").unwrap(), "password line");
    }

    #[test]
    fn test_line_reader_strips_crlf() {
        let data = b"secret\r\n";
        let mut reader = LineSecretReader::new(Box::new(&data[..]));
        assert_eq!(&*reader.read_secret("passphrase").unwrap(), "secret");
    }

    #[test]
    fn test_line_reader_keeps_interior_whitespace() {
        let data = b"  spaced  secret  \n";
        let mut reader = LineSecretReader::new(Box::new(&data[..]));
        assert_eq!(&*reader.read_secret("passphrase").unwrap(), "  spaced  secret  ");
    }

    #[test]
    fn test_line_reader_last_line_without_newline() {
        let data = b"secret";
        let mut reader = LineSecretReader::new(Box::new(&data[..]));
        assert_eq!(&*reader.read_secret("passphrase").unwrap(), "secret");
    }

    #[test]
    fn test_line_reader_eof() {
        let data = b"";
        let mut reader = LineSecretReader::new(Box::new(&data[..]));

        let err = reader
            .read_secret("passphrase")
            .expect_err("expected eof error");
        assert_eq!(err.kind, Some(ErrorKind::PassphraseUnavailable));
    }
}
