//! CLI integration tests
//!
//! Tests the command-line interface end-to-end against a vault file in a
//! temporary directory, driving secrets through stdin.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Get path to the passbox binary
fn passbox_bin() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove deps/
    path.push("passbox");
    path
}

/// Run passbox with secrets piped on stdin, one per line
fn run_passbox_with_secrets(
    args: &[&str],
    secrets: &[&str],
) -> Result<std::process::Output, std::io::Error> {
    let mut child = Command::new(passbox_bin())
        .arg("--stdin-secrets")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    {
        let stdin = child.stdin.as_mut().expect("failed to open stdin");
        // Ignore BrokenPipe errors - the command may exit before reading stdin
        // if it encounters an error (e.g., file not found)
        let _ = stdin.write_all(format!("{}\n", secrets.join("\n")).as_bytes());
    }

    child.wait_with_output()
}

struct Vault {
    _temp_dir: TempDir,
    path: PathBuf,
}

/// Create a fresh vault in a temp dir with the given passphrase
fn init_vault(passphrase: &str) -> Vault {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.vault");

    let result = run_passbox_with_secrets(
        &["init", "-v", path.to_str().unwrap()],
        &[passphrase],
    )
    .unwrap();
    assert!(
        result.status.success(),
        "init failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );

    Vault {
        _temp_dir: temp_dir,
        path,
    }
}

#[test]
fn test_init_set_get_roundtrip() {
    let vault = init_vault("master passphrase");
    let vault_path = vault.path.to_str().unwrap();

    let result = run_passbox_with_secrets(
        &["set", "-v", vault_path, "example.com"],
        &["master passphrase", "hunter2"],
    )
    .unwrap();
    assert!(
        result.status.success(),
        "set failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );

    let result = run_passbox_with_secrets(
        &["get", "-v", vault_path, "example.com"],
        &["master passphrase"],
    )
    .unwrap();
    assert!(
        result.status.success(),
        "get failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    assert_eq!(String::from_utf8_lossy(&result.stdout), "hunter2\n");
}

#[test]
fn test_get_unknown_domain_fails() {
    let vault = init_vault("master passphrase");

    let result = run_passbox_with_secrets(
        &["get", "-v", vault.path.to_str().unwrap(), "never-set.example"],
        &["master passphrase"],
    )
    .unwrap();

    assert!(!result.status.success());
    assert!(result.stdout.is_empty());
    assert!(
        String::from_utf8_lossy(&result.stderr).contains("No password stored"),
        "unexpected stderr: {}",
        String::from_utf8_lossy(&result.stderr)
    );
}

#[test]
fn test_wrong_passphrase_fails() {
    let vault = init_vault("master passphrase");
    let vault_path = vault.path.to_str().unwrap();

    let result = run_passbox_with_secrets(
        &["set", "-v", vault_path, "example.com"],
        &["master passphrase", "hunter2"],
    )
    .unwrap();
    assert!(result.status.success());

    let result = run_passbox_with_secrets(
        &["get", "-v", vault_path, "example.com"],
        &["wrong passphrase"],
    )
    .unwrap();

    assert!(!result.status.success());
    assert!(result.stdout.is_empty());
}

#[test]
fn test_remove_then_get() {
    let vault = init_vault("master passphrase");
    let vault_path = vault.path.to_str().unwrap();

    let result = run_passbox_with_secrets(
        &["set", "-v", vault_path, "example.com"],
        &["master passphrase", "hunter2"],
    )
    .unwrap();
    assert!(result.status.success());

    let result = run_passbox_with_secrets(
        &["remove", "-v", vault_path, "example.com"],
        &["master passphrase"],
    )
    .unwrap();
    assert!(result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("Removed entry"));

    let result = run_passbox_with_secrets(
        &["get", "-v", vault_path, "example.com"],
        &["master passphrase"],
    )
    .unwrap();
    assert!(!result.status.success());
}

#[test]
fn test_remove_absent_domain_succeeds() {
    let vault = init_vault("master passphrase");

    let result = run_passbox_with_secrets(
        &["remove", "-v", vault.path.to_str().unwrap(), "never-set.example"],
        &["master passphrase"],
    )
    .unwrap();

    assert!(result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("No password stored"));
}

#[test]
fn test_init_refuses_existing_vault() {
    let vault = init_vault("master passphrase");

    let result = run_passbox_with_secrets(
        &["init", "-v", vault.path.to_str().unwrap()],
        &["master passphrase"],
    )
    .unwrap();

    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("already exists"));
}

#[test]
fn test_corrupted_sidecar_is_rejected() {
    let vault = init_vault("master passphrase");
    let vault_path = vault.path.to_str().unwrap();

    let result = run_passbox_with_secrets(
        &["set", "-v", vault_path, "example.com"],
        &["master passphrase", "hunter2"],
    )
    .unwrap();
    assert!(result.status.success());

    let sum_path = format!("{vault_path}.sum");
    let sum = fs::read_to_string(&sum_path).unwrap();
    let corrupted = if sum.starts_with('A') {
        sum.replacen('A', "B", 1)
    } else {
        let mut s = sum.clone();
        s.replace_range(0..1, "A");
        s
    };
    fs::write(&sum_path, corrupted).unwrap();

    let result = run_passbox_with_secrets(
        &["get", "-v", vault_path, "example.com"],
        &["master passphrase"],
    )
    .unwrap();
    assert!(!result.status.success());
    assert!(result.stdout.is_empty());
}

#[test]
fn test_vault_file_contains_no_plaintext() {
    let vault = init_vault("master passphrase");
    let vault_path = vault.path.to_str().unwrap();

    let result = run_passbox_with_secrets(
        &["set", "-v", vault_path, "www.stanford.edu"],
        &["master passphrase", "sunetpassword"],
    )
    .unwrap();
    assert!(result.status.success());

    let contents = fs::read_to_string(&vault.path).unwrap();
    assert!(!contents.contains("www.stanford.edu"));
    assert!(!contents.contains("sunetpassword"));
    assert!(!contents.contains("master passphrase"));
}
