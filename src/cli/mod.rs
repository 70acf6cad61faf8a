//! Command-line interface.

pub mod completions;
pub mod credential;
pub mod file;
pub mod init;
pub mod output;
pub mod value;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use crate::core::cipher::{Protector, Provider};
use crate::core::config::{Protection, Settings};
use crate::core::store::{self, Store};
use crate::error::Result;

/// Strongbox - encrypted secrets inside plain JSON configuration files.
#[derive(Parser)]
#[command(
    name = "strongbox",
    about = "Encrypted secrets inside plain JSON configuration files",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (default: ./strongbox.toml)
    #[arg(long, global = true, env = "STRONGBOX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Master key directory
    #[arg(long, global = true, env = "STRONGBOX_KEY_DIR")]
    pub key_dir: Option<PathBuf>,

    /// Print responses as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Create the master key
    Init {
        /// How the master key is protected at rest
        #[arg(long, value_enum)]
        protection: Option<ProtectionArg>,
        /// age identity file (generated if missing)
        #[arg(long)]
        identity: Option<PathBuf>,
        /// Replace an existing master key
        #[arg(short, long)]
        force: bool,
    },

    /// Encrypt a single value (reads stdin or prompts if omitted)
    Encrypt {
        /// Value to encrypt
        value: Option<String>,
        /// Label for logs
        #[arg(long, default_value = "value")]
        key: String,
    },

    /// Decrypt a single ENCRYPTED: value
    Decrypt {
        /// Value to decrypt
        value: Option<String>,
        /// Label for logs
        #[arg(long, default_value = "value")]
        key: String,
    },

    /// Encrypt every plain secret in a configuration file
    EncryptFile {
        /// Configuration file (default from settings)
        path: Option<PathBuf>,
    },

    /// Decrypt every encrypted secret in a configuration file
    DecryptFile {
        /// Configuration file (default from settings)
        path: Option<PathBuf>,
        /// Confirm writing plaintext to disk
        #[arg(short, long)]
        yes: bool,
    },

    /// List secret fields and whether they are encrypted
    List {
        /// Configuration file (default from settings)
        path: Option<PathBuf>,
    },

    /// Print one secret, decrypted
    Get {
        /// Configuration key (e.g. Database:ConnectionString)
        key: String,
        /// Configuration file (default from settings)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Check the master key and that every encrypted value opens
    Check {
        /// Configuration file (default from settings)
        path: Option<PathBuf>,
    },

    /// Report where a signing credential resolves from
    Credential {
        /// private-key, certificate, passphrase or all
        #[arg(default_value = "all")]
        kind: String,
    },

    /// Encrypt or decrypt key files
    KeyFile {
        #[command(subcommand)]
        command: KeyFileCommand,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Key file subcommands.
#[derive(Subcommand)]
pub enum KeyFileCommand {
    /// Encrypt a PEM file
    Encrypt {
        /// Plain key file
        input: PathBuf,
        /// Encrypted output
        output: PathBuf,
    },
    /// Decrypt an encrypted key file
    Decrypt {
        /// Encrypted key file
        input: PathBuf,
        /// Plain output
        output: PathBuf,
    },
}

/// Master key protection as accepted on the command line.
#[derive(Clone, Copy, ValueEnum)]
pub enum ProtectionArg {
    None,
    Passphrase,
    Identity,
    Keychain,
}

impl From<ProtectionArg> for Protection {
    fn from(arg: ProtectionArg) -> Self {
        match arg {
            ProtectionArg::None => Protection::None,
            ProtectionArg::Passphrase => Protection::Passphrase,
            ProtectionArg::Identity => Protection::Identity,
            ProtectionArg::Keychain => Protection::Keychain,
        }
    }
}

/// Supported shells for completion generation.
#[derive(Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}

/// Settings and flags shared by every command.
pub struct Context {
    pub settings: Settings,
    pub json: bool,
}

impl Context {
    /// Load settings and apply global flags.
    pub fn load(config: Option<&Path>, key_dir: Option<PathBuf>, json: bool) -> Result<Self> {
        let settings = Settings::load(config)?.with_key_dir(key_dir);
        Ok(Self { settings, json })
    }

    pub fn store(&self) -> Result<Box<dyn Store>> {
        store::from_settings(&self.settings.keys)
    }

    /// Provider over an existing master key.
    pub fn provider(&self) -> Result<Provider> {
        Provider::open(self.store()?.as_ref(), &self.settings.keys.application)
    }

    /// Protector for a purpose, creating the master key if `create` is set.
    pub fn protector(&self, purpose: &str, create: bool) -> Result<Protector> {
        let provider = if create {
            Provider::open_or_create(self.store()?.as_ref(), &self.settings.keys.application)?
        } else {
            self.provider()?
        };
        provider.protector(purpose)
    }

    /// Document path, falling back to settings.
    pub fn document(&self, path: Option<PathBuf>) -> PathBuf {
        path.unwrap_or_else(|| self.settings.document.path.clone())
    }
}

/// Execute a command.
pub fn execute(cli: Cli) -> Result<()> {
    use Command::*;

    // Completions never need settings
    if let Completions { shell } = &cli.command {
        return completions::execute(*shell);
    }

    let ctx = Context::load(cli.config.as_deref(), cli.key_dir, cli.json)?;

    match cli.command {
        Init {
            protection,
            identity,
            force,
        } => init::execute(ctx, protection.map(Into::into), identity, force),
        Encrypt { value, key } => value::encrypt(&ctx, value, &key),
        Decrypt { value, key } => value::decrypt(&ctx, value, &key),
        EncryptFile { path } => file::encrypt(&ctx, path),
        DecryptFile { path, yes } => file::decrypt(&ctx, path, yes),
        List { path } => file::list(&ctx, path),
        Get { key, file } => file::get(&ctx, &key, file),
        Check { path } => file::check(&ctx, path),
        Credential { kind } => credential::execute(&ctx, &kind),
        KeyFile { command } => match command {
            KeyFileCommand::Encrypt { input, output } => {
                credential::encrypt_key_file(&ctx, &input, &output)
            }
            KeyFileCommand::Decrypt { input, output } => {
                credential::decrypt_key_file(&ctx, &input, &output)
            }
        },
        Completions { shell } => completions::execute(shell),
    }
}
