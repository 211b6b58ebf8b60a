#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod command;
mod config;

use std::process;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "cumulus_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "cumulus_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "cumulus_cli::config";
pub const TRACING_TARGET_COMMAND: &str = "cumulus_cli::command";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::debug!(
            target: TRACING_TARGET_SHUTDOWN,
            "command completed successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %error,
            "command failed"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    cli.log();

    let mut stdout = std::io::stdout();
    if !cli.command.needs_store() {
        return cli.command.execute_local(&mut stdout);
    }

    let store = cli.connect().await?;
    cli.command.execute(&store, &mut stdout).await
}
