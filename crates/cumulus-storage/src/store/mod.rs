//! Region-aware object store bound to a single home bucket.
//!
//! [`ObjectStore`] is the public surface of this crate. Calls made from
//! request-serving code ([`store`](ObjectStore::store),
//! [`get`](ObjectStore::get), [`get_batch`](ObjectStore::get_batch)) never
//! fail: errors are logged and degrade to `false`, `None` or a shorter batch.
//! Administrative calls ([`copy`](ObjectStore::copy) and the prefix searches)
//! return the underlying error once every strategy is exhausted, since a
//! silently empty result there would be mistaken for success.

mod copy;
mod registry;
mod walker;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::FuturesUnordered;

pub use copy::{CopyCoordinator, CopyStrategy};
pub use registry::ClientRegistry;
pub use walker::PageWalker;

use crate::providers::{Backend, Connector, MemoryBackend, MemoryCluster, MemoryConnector};
use crate::types::{Bucket, KeyFilter, ObjectLocation, PresignedUrl, PutOptions, Region, StoredObject};
use crate::{Result, TRACING_TARGET_STORE};

/// Lifetime of presigned URLs when none is requested.
pub const DEFAULT_PRESIGN_EXPIRY: Duration = Duration::from_secs(5);

/// Object storage bound to one home bucket and region.
#[derive(Debug)]
pub struct ObjectStore {
    bucket: Bucket,
    registry: ClientRegistry,
    search_filter: KeyFilter,
    presign_expiry: Duration,
}

impl ObjectStore {
    /// Creates a store writing to `bucket` through `home`, with regional
    /// clients created by `connector` on demand.
    pub fn new(
        bucket: impl Into<Bucket>,
        home: Arc<dyn Backend>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            registry: ClientRegistry::new(home, connector),
            search_filter: KeyFilter::default(),
            presign_expiry: DEFAULT_PRESIGN_EXPIRY,
        }
    }

    /// Creates a store over a fresh in-process [`MemoryCluster`].
    pub fn in_memory(bucket: impl Into<Bucket>, region: impl Into<Region>) -> Self {
        Self::with_memory_connector(bucket, region, MemoryConnector::new(MemoryCluster::new()))
    }

    /// Creates a store whose home and regional clients all come from
    /// `connector`, so callers can seed other buckets through it.
    pub fn with_memory_connector(
        bucket: impl Into<Bucket>,
        region: impl Into<Region>,
        connector: MemoryConnector,
    ) -> Self {
        let home: Arc<dyn Backend> = Arc::new(MemoryBackend::new(
            connector.cluster().clone(),
            region.into(),
        ));
        Self::new(bucket, home, Arc::new(connector))
    }

    /// Creates an S3-backed store from configuration, loading credentials
    /// from the environment.
    #[cfg(feature = "s3")]
    #[cfg_attr(docsrs, doc(cfg(feature = "s3")))]
    pub async fn from_config(config: &crate::StorageConfig) -> Result<Self> {
        config.validate()?;

        let mut connector = crate::providers::S3Connector::from_env(&config.region()).await;
        if let Some(endpoint) = &config.endpoint {
            connector = connector.with_endpoint(endpoint.clone());
        }
        let region = connector.default_region().unwrap_or_else(|| config.region());

        let home = connector.connect(&region);
        tracing::info!(
            target: TRACING_TARGET_STORE,
            bucket = %config.bucket,
            region = %region,
            endpoint = ?config.endpoint,
            "s3 object store initialized"
        );

        Ok(Self::new(config.bucket(), home, Arc::new(connector))
            .with_search_filter(config.search_filter())
            .with_default_expiry(config.presign_expiry()))
    }

    /// Sets the filter applied by
    /// [`search_all_objects_by_short_key`](Self::search_all_objects_by_short_key).
    #[must_use]
    pub fn with_search_filter(mut self, filter: KeyFilter) -> Self {
        self.search_filter = filter;
        self
    }

    /// Sets the lifetime of presigned URLs when the caller gives none.
    #[must_use]
    pub fn with_default_expiry(mut self, expires_in: Duration) -> Self {
        self.presign_expiry = expires_in;
        self
    }

    /// Home bucket.
    #[inline]
    pub fn bucket(&self) -> &Bucket {
        &self.bucket
    }

    /// Region of the home client.
    #[inline]
    pub fn home_region(&self) -> &Region {
        self.registry.home_region()
    }

    /// Client registry backing this store.
    #[inline]
    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    /// Uploads `contents` under `key` with server-side encryption.
    ///
    /// Returns `false` if the upload failed; the failure is logged.
    #[tracing::instrument(name = "storage.store", skip(self, contents), fields(bucket = %self.bucket))]
    pub async fn store(&self, key: &str, contents: impl Into<Bytes>) -> bool {
        let contents = contents.into();
        tracing::debug!(
            target: TRACING_TARGET_STORE,
            size = contents.len(),
            "storing object"
        );

        match self
            .registry
            .home()
            .put(&self.bucket, key, contents, PutOptions::encrypted())
            .await
        {
            Ok(()) => {
                tracing::debug!(target: TRACING_TARGET_STORE, "stored object");
                true
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET_STORE,
                    error = %error,
                    "failed to store object"
                );
                false
            }
        }
    }

    /// Retrieves the object at `key`.
    ///
    /// Returns `None` both when the key does not exist and when retrieval
    /// failed; the reason is logged.
    #[tracing::instrument(name = "storage.get", skip(self), fields(bucket = %self.bucket))]
    pub async fn get(&self, key: &str) -> Option<StoredObject> {
        match self.registry.home().get(&self.bucket, key).await {
            Ok(object) => Some(object),
            Err(error) if error.is_not_found() => {
                tracing::warn!(target: TRACING_TARGET_STORE, error = %error, "object not found");
                None
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET_STORE,
                    error = %error,
                    "failed to get object"
                );
                None
            }
        }
    }

    /// Retrieves every key concurrently, returning the objects that could be
    /// read in the order they arrived.
    ///
    /// Keys that are missing or fail are left out of the result. The batch
    /// itself never fails; an empty result is valid.
    #[tracing::instrument(
        name = "storage.get_batch",
        skip_all,
        fields(
            bucket = %self.bucket,
            requested = tracing::field::Empty,
            returned = tracing::field::Empty
        )
    )]
    pub async fn get_batch<I, K>(&self, keys: I) -> Vec<StoredObject>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut pending: FuturesUnordered<_> = keys
            .into_iter()
            .map(|key| async move {
                let key = key.as_ref();
                (key.to_owned(), self.get(key).await)
            })
            .collect();

        let requested = pending.len();
        let mut objects = Vec::with_capacity(requested);
        while let Some((key, object)) = pending.next().await {
            match object {
                Some(object) => objects.push(object),
                None => tracing::warn!(
                    target: TRACING_TARGET_STORE,
                    key = %key,
                    "object in batch failed, leaving it out"
                ),
            }
        }

        let span = tracing::Span::current();
        span.record("requested", requested);
        span.record("returned", objects.len());
        objects
    }

    /// Copies `source_bucket/source_key`, stored in `source_region`, to
    /// `destination_key` in the home bucket.
    ///
    /// Returns the strategy that succeeded; see [`CopyCoordinator`]. An error
    /// means both applicable strategies failed and carries the fallback's
    /// failure unmodified.
    pub async fn copy(
        &self,
        source_bucket: &str,
        source_key: &str,
        source_region: &str,
        destination_key: &str,
    ) -> Result<CopyStrategy> {
        let source = ObjectLocation::new(source_bucket, source_key);
        let region = Region::new(source_region);

        CopyCoordinator::new(&self.registry, &self.bucket)
            .copy(&source, &region, destination_key)
            .await
    }

    /// Lists every key under `prefix` that matches the configured search
    /// filter, traversing all pages.
    #[tracing::instrument(name = "storage.search", skip(self), fields(bucket = %self.bucket))]
    pub async fn search_all_objects_by_short_key(&self, prefix: &str) -> Result<Vec<String>> {
        tracing::info!(
            target: TRACING_TARGET_STORE,
            filter = ?self.search_filter,
            "searching objects by prefix"
        );
        self.search_objects(prefix, &self.search_filter).await
    }

    /// Lists every key under `prefix` that matches `filter`, traversing all
    /// pages.
    pub async fn search_objects(&self, prefix: &str, filter: &KeyFilter) -> Result<Vec<String>> {
        PageWalker::new(self.registry.home(), &self.bucket, filter)
            .walk(prefix)
            .await
    }

    /// Signs a download URL for `key` with the home client.
    ///
    /// Uses the store's default lifetime (five seconds unless configured
    /// otherwise) when `expires_in` is `None`. The key is not checked for
    /// existence.
    #[tracing::instrument(name = "storage.presign", skip(self), fields(bucket = %self.bucket))]
    pub async fn presigned_url(
        &self,
        key: &str,
        expires_in: Option<Duration>,
    ) -> Result<PresignedUrl> {
        let expires_in = expires_in.unwrap_or(self.presign_expiry);
        self.registry
            .home()
            .presign(&self.bucket, key, expires_in)
            .await
    }
}
