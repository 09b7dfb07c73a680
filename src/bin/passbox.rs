//! Passbox CLI - Passphrase-protected password keychain
//!
//! Command-line interface over a vault file holding the encrypted keychain
//! dump, with its checksum kept in a `<vault>.sum` sidecar.

use clap::{Parser, Subcommand};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process;

use passbox::error::Result;
use passbox::file_ops;
use passbox::passphrase::{LineSecretReader, SecretReader, TerminalSecretReader};

#[derive(Parser)]
#[command(name = "passbox")]
#[command(version)]
#[command(about = "Passphrase-protected password keychain.", long_about = None)]
struct Cli {
    /// Read secrets line-by-line from stdin instead of prompting on the
    /// terminal (passphrase first; for 'set', the password on the next line)
    #[arg(long, global = true)]
    stdin_secrets: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty vault
    Init {
        /// Path to the vault file to create
        #[arg(short, long, value_name = "FILE")]
        vault: PathBuf,
    },

    /// Store a password for a domain
    Set {
        /// Path to the vault file
        #[arg(short, long, value_name = "FILE")]
        vault: PathBuf,

        /// Domain to store the password under
        domain: String,
    },

    /// Print the password stored for a domain
    Get {
        /// Path to the vault file
        #[arg(short, long, value_name = "FILE")]
        vault: PathBuf,

        /// Domain to look up
        domain: String,
    },

    /// Remove the entry for a domain
    #[command(alias = "rm")]
    Remove {
        /// Path to the vault file
        #[arg(short, long, value_name = "FILE")]
        vault: PathBuf,

        /// Domain whose entry is to be removed
        domain: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let mut reader = get_secret_reader(cli.stdin_secrets);

    let result = match cli.command {
        Commands::Init { vault } => cmd_init(&vault, &mut *reader),
        Commands::Set { vault, domain } => cmd_set(&vault, &domain, &mut *reader),
        Commands::Get { vault, domain } => cmd_get(&vault, &domain, &mut *reader),
        Commands::Remove { vault, domain } => cmd_remove(&vault, &domain, &mut *reader),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn cmd_init(vault: &Path, reader: &mut dyn SecretReader) -> Result<()> {
    file_ops::create_vault(vault, reader)?;
    eprintln!("Created empty vault at {}", vault.display());
    Ok(())
}

fn cmd_set(vault: &Path, domain: &str, reader: &mut dyn SecretReader) -> Result<()> {
    let mut keychain = file_ops::open_vault(vault, reader)?;
    let password = reader.read_secret(&format!("Password for {domain}"))?;
    keychain.set(domain, &password)?;
    file_ops::save_vault(vault, &keychain)?;
    eprintln!("Stored password for {domain}");
    Ok(())
}

fn cmd_get(vault: &Path, domain: &str, reader: &mut dyn SecretReader) -> Result<()> {
    let keychain = file_ops::open_vault(vault, reader)?;
    match keychain.get(domain)? {
        Some(password) => {
            println!("{}", *password);
            Ok(())
        }
        None => {
            eprintln!("No password stored for {domain}");
            process::exit(1);
        }
    }
}

fn cmd_remove(vault: &Path, domain: &str, reader: &mut dyn SecretReader) -> Result<()> {
    let mut keychain = file_ops::open_vault(vault, reader)?;
    if keychain.remove(domain) {
        file_ops::save_vault(vault, &keychain)?;
        eprintln!("Removed entry for {domain}");
    } else {
        eprintln!("No password stored for {domain}");
    }
    Ok(())
}

fn get_secret_reader(use_stdin: bool) -> Box<dyn SecretReader> {
    if use_stdin {
        Box::new(LineSecretReader::new(Box::new(BufReader::new(
            std::io::stdin(),
        ))))
    } else {
        Box::new(TerminalSecretReader)
    }
}
