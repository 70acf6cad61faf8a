//! Strongbox - encrypted secrets inside plain JSON configuration files.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use strongbox::cli::output;
use strongbox::cli::{execute, Cli};
use strongbox::error::{Error, RewriteError, StoreError};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env("STRONGBOX_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("strongbox=debug")
        } else {
            EnvFilter::new("strongbox=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).without_time())
        .init();

    if let Err(e) = execute(cli) {
        let suggestion = match &e {
            Error::Store(StoreError::NoMasterKey(_)) => Some("run: strongbox init".to_string()),
            Error::Store(StoreError::MissingPassphrase(var)) => {
                Some(format!("export {} before running strongbox", var))
            }
            Error::Store(StoreError::WrapMismatch { found, .. }) => Some(format!(
                "set keys.protection = \"{}\" in strongbox.toml",
                found
            )),
            Error::Rewrite(RewriteError::NotConfirmed(_)) => {
                Some("re-run with --yes to confirm".to_string())
            }
            Error::Store(StoreError::Unsupported(_)) => {
                Some("use --protection passphrase or --protection identity".to_string())
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(&hint);
        }
        std::process::exit(1);
    }
}
