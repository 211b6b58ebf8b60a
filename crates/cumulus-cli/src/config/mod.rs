//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── backend: BackendKind     # s3 or memory
//! ├── storage: StorageConfig   # Bucket, region, endpoint, presign, search
//! └── command: Command         # What to do
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.

use std::process;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use cumulus_storage::{ObjectStore, StorageConfig};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::command::Command;
use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "warn,cumulus_cli=info,cumulus_storage=info,cumulus_support=info";

/// Storage backend the CLI talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Amazon S3 or an S3-compatible service.
    S3,
    /// Empty in-process store, discarded on exit.
    Memory,
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "cumulus")]
#[command(about = "Region-aware object storage from the command line")]
#[command(version)]
pub struct Cli {
    /// Storage backend.
    #[arg(long, env = "STORAGE_BACKEND", value_enum, default_value_t = BackendKind::S3)]
    pub backend: BackendKind,

    /// Object store configuration.
    #[clap(flatten)]
    pub storage: StorageConfig,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parses the command line, after `.env` has had a chance to provide
    /// `STORAGE_*` and `AWS_*` variables.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Reads `.env` from the working directory into the process environment.
    ///
    /// A missing file is normal. Any other failure is reported on stderr
    /// since tracing is not set up yet.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        match dotenvy::dotenv() {
            Err(err) if !err.not_found() => eprintln!("cumulus: ignoring unreadable .env: {err}"),
            _ => {}
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Installs the stderr log subscriber.
    ///
    /// `RUST_LOG` wins when set. Otherwise this CLI and the storage crate log
    /// at `info` and everything else, the AWS SDK included, at `warn`. Stdout
    /// is reserved for command output such as object bodies and URLs.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    /// Opens the object store selected by the configuration.
    pub async fn connect(&self) -> anyhow::Result<ObjectStore> {
        self.storage
            .validate()
            .context("invalid storage configuration")?;

        match self.backend {
            BackendKind::Memory => Ok(ObjectStore::in_memory(
                self.storage.bucket(),
                self.storage.region(),
            )
            .with_search_filter(self.storage.search_filter())
            .with_default_expiry(self.storage.presign_expiry())),
            #[cfg(feature = "s3")]
            BackendKind::S3 => ObjectStore::from_config(&self.storage)
                .await
                .context("failed to create s3 object store"),
            #[cfg(not(feature = "s3"))]
            BackendKind::S3 => {
                anyhow::bail!("the s3 backend is not available, rebuild with the `s3` feature")
            }
        }
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            backend = ?self.backend,
            bucket = %self.storage.bucket,
            region = %self.storage.region,
            endpoint = ?self.storage.endpoint,
            presign_expiry_secs = self.storage.presign_expiry_secs,
            search_marker = %self.storage.search_marker,
            "Storage configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [
            cfg!(feature = "s3").then_some("s3"),
            cfg!(feature = "dotenv").then_some("dotenv"),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
