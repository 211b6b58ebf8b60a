//! Two-strategy copy into the home bucket.

use std::fmt;

use super::ClientRegistry;
use crate::types::{Bucket, ObjectLocation, PutOptions, Region};
use crate::{Result, TRACING_TARGET_COPY};

/// Strategy that completed a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStrategy {
    /// Server-side copy within the home region.
    ServerSide,
    /// Source read through a regional client, then written by the home client.
    ReadThenWrite,
}

impl fmt::Display for CopyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServerSide => f.write_str("server-side"),
            Self::ReadThenWrite => f.write_str("read-then-write"),
        }
    }
}

/// Copies an object from any bucket and region into the home bucket.
///
/// The server-side copy is only attempted when the source lives in the home
/// region. It needs `s3:GetObjectTagging` on the source object, so when the
/// store rejects it the coordinator falls back to reading the object through
/// a client for the source region and writing it with the home client.
/// Errors from the fallback are returned as is; there is no third attempt.
pub struct CopyCoordinator<'a> {
    registry: &'a ClientRegistry,
    bucket: &'a Bucket,
}

impl<'a> CopyCoordinator<'a> {
    /// Creates a coordinator writing into `bucket` through `registry`.
    pub fn new(registry: &'a ClientRegistry, bucket: &'a Bucket) -> Self {
        Self { registry, bucket }
    }

    /// Copies `source` (stored in `source_region`) to `destination_key`.
    #[tracing::instrument(
        name = "storage.copy",
        skip_all,
        fields(
            source = %source,
            source_region = %source_region,
            destination = %destination_key,
            strategy = tracing::field::Empty
        )
    )]
    pub async fn copy(
        &self,
        source: &ObjectLocation,
        source_region: &Region,
        destination_key: &str,
    ) -> Result<CopyStrategy> {
        if source_region == self.registry.home_region() {
            tracing::debug!(
                target: TRACING_TARGET_COPY,
                "source in home region, attempting server-side copy"
            );

            match self.copy_in_region(source, destination_key).await {
                Ok(()) => return Ok(self.finish(CopyStrategy::ServerSide, source, destination_key)),
                Err(error) => {
                    tracing::warn!(
                        target: TRACING_TARGET_COPY,
                        error = %error,
                        "server-side copy failed, is s3:GetObjectTagging granted on the source bucket? \
                         falling back to read-then-write"
                    );
                }
            }
        }

        self.copy_by_get_and_put(source, source_region, destination_key)
            .await?;
        Ok(self.finish(CopyStrategy::ReadThenWrite, source, destination_key))
    }

    async fn copy_in_region(&self, source: &ObjectLocation, destination_key: &str) -> Result<()> {
        self.registry
            .home()
            .copy(self.bucket, destination_key, source)
            .await
    }

    async fn copy_by_get_and_put(
        &self,
        source: &ObjectLocation,
        source_region: &Region,
        destination_key: &str,
    ) -> Result<()> {
        let source_client = self.registry.client_for_region(source_region).await;
        let object = source_client.get(&source.bucket, &source.key).await?;

        tracing::debug!(
            target: TRACING_TARGET_COPY,
            size = object.data.len(),
            content_length = ?object.content_length,
            "read source object, writing to home bucket"
        );

        let options = PutOptions::relay(&object);
        self.registry
            .home()
            .put(self.bucket, destination_key, object.data, options)
            .await
    }

    fn finish(
        &self,
        strategy: CopyStrategy,
        source: &ObjectLocation,
        destination_key: &str,
    ) -> CopyStrategy {
        tracing::Span::current().record("strategy", tracing::field::display(strategy));
        tracing::debug!(
            target: TRACING_TARGET_COPY,
            source = %source,
            destination = %destination_key,
            bucket = %self.bucket,
            %strategy,
            "copied object"
        );
        strategy
    }
}
