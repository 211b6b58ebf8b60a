//! Subcommands and their execution.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Subcommand;
use cumulus_storage::ObjectStore;
use cumulus_storage::types::KeyFilter;
use cumulus_support::Bsn;

use crate::TRACING_TARGET_COMMAND;

/// Operation to run.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Upload a file, encrypted at rest.
    Put {
        /// Destination key in the home bucket.
        key: String,
        /// File to upload.
        file: PathBuf,
    },

    /// Download an object.
    Get {
        /// Key in the home bucket.
        key: String,
        /// Write the object here instead of to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Download several objects concurrently and list the ones retrieved.
    BatchGet {
        /// Keys in the home bucket.
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Copy an object from any bucket and region into the home bucket.
    Copy {
        source_bucket: String,
        source_key: String,
        source_region: String,
        destination_key: String,
    },

    /// List keys under a prefix that contain the search marker.
    Search {
        /// Key prefix to list.
        prefix: String,
        /// Marker overriding the configured one; empty matches every key.
        #[arg(long)]
        marker: Option<String>,
    },

    /// Sign a temporary download URL.
    Presign {
        /// Key in the home bucket.
        key: String,
        /// Lifetime in seconds; defaults to the configured expiry.
        #[arg(long)]
        expires_in: Option<u64>,
    },

    /// Check a Dutch citizen service number.
    Bsn {
        /// Number to check.
        value: String,
    },
}

impl Command {
    /// Whether the command talks to the object store.
    pub fn needs_store(&self) -> bool {
        !matches!(self, Self::Bsn { .. })
    }

    /// Runs a command that does not need the object store.
    pub fn execute_local(&self, out: &mut impl Write) -> anyhow::Result<()> {
        match self {
            Self::Bsn { value } => {
                Bsn::validate(value).with_context(|| format!("'{value}' is not a valid BSN"))?;
                writeln!(out, "{value} is a valid BSN")?;
                Ok(())
            }
            _ => bail!("command requires an object store"),
        }
    }

    /// Runs the command against `store`, writing results to `out`.
    pub async fn execute(&self, store: &ObjectStore, out: &mut impl Write) -> anyhow::Result<()> {
        match self {
            Self::Put { key, file } => {
                let contents = tokio::fs::read(file)
                    .await
                    .with_context(|| format!("failed to read {}", file.display()))?;
                let size = contents.len();
                if !store.store(key, contents).await {
                    bail!("failed to store '{key}'");
                }
                tracing::info!(target: TRACING_TARGET_COMMAND, key = %key, size, "stored object");
            }
            Self::Get { key, output } => {
                let Some(object) = store.get(key).await else {
                    bail!("object '{key}' could not be retrieved");
                };
                match output {
                    Some(path) => tokio::fs::write(path, &object.data)
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?,
                    None => out.write_all(&object.data)?,
                }
            }
            Self::BatchGet { keys } => {
                let objects = store.get_batch(keys).await;
                for object in &objects {
                    writeln!(out, "{}\t{}", object.key, object.data.len())?;
                }
                tracing::info!(
                    target: TRACING_TARGET_COMMAND,
                    requested = keys.len(),
                    retrieved = objects.len(),
                    "batch get finished"
                );
            }
            Self::Copy {
                source_bucket,
                source_key,
                source_region,
                destination_key,
            } => {
                let strategy = store
                    .copy(source_bucket, source_key, source_region, destination_key)
                    .await
                    .with_context(|| {
                        format!("failed to copy {source_bucket}/{source_key} to {destination_key}")
                    })?;
                writeln!(out, "copied using {strategy} copy")?;
            }
            Self::Search { prefix, marker } => {
                let keys = match marker.as_deref() {
                    None => store.search_all_objects_by_short_key(prefix).await,
                    Some("") => store.search_objects(prefix, &KeyFilter::Any).await,
                    Some(marker) => {
                        store
                            .search_objects(prefix, &KeyFilter::contains(marker))
                            .await
                    }
                }
                .with_context(|| format!("failed to search '{prefix}'"))?;

                for key in keys {
                    writeln!(out, "{key}")?;
                }
            }
            Self::Presign { key, expires_in } => {
                let url = store
                    .presigned_url(key, expires_in.map(Duration::from_secs))
                    .await
                    .with_context(|| format!("failed to presign '{key}'"))?;
                writeln!(out, "{url}")?;
            }
            Self::Bsn { .. } => self.execute_local(out)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use cumulus_storage::providers::{Backend, Connector, MemoryCluster, MemoryConnector};
    use cumulus_storage::types::{PutOptions, Region};

    use super::*;

    fn store() -> ObjectStore {
        ObjectStore::in_memory("documents", "eu-central-1")
    }

    async fn run(store: &ObjectStore, command: Command) -> anyhow::Result<String> {
        let mut out = Vec::new();
        command.execute(store, &mut out).await?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn put_then_get() {
        let store = store();
        let file = std::env::temp_dir().join(format!("cumulus-cli-put-{}.json", std::process::id()));
        tokio::fs::write(&file, b"{\"ok\":true}").await.unwrap();

        let put = Command::Put {
            key: "case/1/submission.json".into(),
            file: file.clone(),
        };
        run(&store, put).await.unwrap();
        let _ = tokio::fs::remove_file(&file).await;

        let get = Command::Get {
            key: "case/1/submission.json".into(),
            output: None,
        };
        assert_eq!(run(&store, get).await.unwrap(), "{\"ok\":true}");
    }

    #[tokio::test]
    async fn get_missing_fails() {
        let get = Command::Get {
            key: "missing".into(),
            output: None,
        };
        assert!(run(&store(), get).await.is_err());
    }

    #[tokio::test]
    async fn batch_get_lists_retrieved_objects() {
        let store = store();
        assert!(store.store("a", "1").await);

        let batch = Command::BatchGet {
            keys: vec!["a".into(), "missing".into()],
        };
        assert_eq!(run(&store, batch).await.unwrap(), "a\t1\n");
    }

    #[tokio::test]
    async fn search_honours_marker_override() {
        let store = store();
        for key in ["case/1/submission.json", "case/1/note.txt"] {
            assert!(store.store(key, "x").await);
        }

        let default = Command::Search {
            prefix: "case/".into(),
            marker: None,
        };
        assert_eq!(run(&store, default).await.unwrap(), "case/1/submission.json\n");

        let everything = Command::Search {
            prefix: "case/".into(),
            marker: Some(String::new()),
        };
        let output = run(&store, everything).await.unwrap();
        assert_eq!(output.lines().count(), 2);
    }

    #[tokio::test]
    async fn copy_reports_strategy() {
        let connector = MemoryConnector::new(MemoryCluster::new());
        connector
            .connect(&Region::new("eu-west-1"))
            .put("source", "in.pdf", "pdf".into(), PutOptions::default())
            .await
            .unwrap();
        let store = ObjectStore::with_memory_connector("documents", "eu-central-1", connector);

        let copy = Command::Copy {
            source_bucket: "source".into(),
            source_key: "in.pdf".into(),
            source_region: "eu-west-1".into(),
            destination_key: "out.pdf".into(),
        };
        assert_eq!(
            run(&store, copy).await.unwrap(),
            "copied using read-then-write copy\n"
        );
        assert!(store.get("out.pdf").await.is_some());
    }

    #[tokio::test]
    async fn presign_prints_url() {
        let presign = Command::Presign {
            key: "a.pdf".into(),
            expires_in: Some(60),
        };
        let output = run(&store(), presign).await.unwrap();
        assert!(output.trim_end().ends_with("X-Amz-Expires=60"));
    }

    #[test]
    fn bsn_check() {
        let mut out = Vec::new();
        Command::Bsn {
            value: "999996708".into(),
        }
        .execute_local(&mut out)
        .unwrap();
        assert_eq!(out, b"999996708 is a valid BSN\n");

        let invalid = Command::Bsn {
            value: "999998620".into(),
        };
        assert!(!invalid.needs_store());
        assert!(invalid.execute_local(&mut Vec::new()).is_err());
    }
}
