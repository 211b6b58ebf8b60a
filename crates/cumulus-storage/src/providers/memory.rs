//! In-process backend built on [`object_store::memory::InMemory`].
//!
//! A [`MemoryCluster`] holds one `InMemory` store per bucket. Every
//! [`MemoryBackend`] created from the same cluster sees the same buckets
//! regardless of the region it is bound to, the way bucket names are global
//! in S3. Listings are served in pages of a configurable size so that the
//! continuation-token protocol is exercised just like against a real store.
//!
//! Keys are opaque. Each one is stored as a single percent-encoded path
//! segment and decoded again when listed, so leading, doubled and reserved
//! characters survive the round trip unchanged.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::memory::InMemory;
use object_store::path::{Path, PathPart};
use object_store::{Attribute, ObjectStore, PutPayload};
use tokio::sync::RwLock;

use super::{Backend, Connector};
use crate::types::{ListingPage, ObjectLocation, PresignedUrl, PutOptions, Region, StoredObject};
use crate::{Error, Result, TRACING_TARGET_BACKEND};

/// Maximum number of keys returned per listing page, matching S3.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Longest lifetime a presigned URL may be signed with (seven days).
const MAX_PRESIGN_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Set of in-memory buckets shared by every backend created from it.
#[derive(Debug, Clone, Default)]
pub struct MemoryCluster {
    buckets: Arc<RwLock<HashMap<String, Arc<InMemory>>>>,
}

impl MemoryCluster {
    /// Creates an empty cluster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the store backing `bucket`, creating it on first use.
    async fn bucket(&self, bucket: &str) -> Arc<InMemory> {
        if let Some(store) = self.buckets.read().await.get(bucket) {
            return store.clone();
        }

        self.buckets
            .write()
            .await
            .entry(bucket.to_owned())
            .or_insert_with(|| Arc::new(InMemory::new()))
            .clone()
    }
}

/// Region-bound handle onto a [`MemoryCluster`].
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    cluster: MemoryCluster,
    region: Region,
    page_size: usize,
}

impl MemoryBackend {
    /// Creates a backend bound to `region`.
    pub fn new(cluster: MemoryCluster, region: impl Into<Region>) -> Self {
        Self {
            cluster,
            region: region.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the maximum number of keys per listing page.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Returns the cluster this backend reads from and writes to.
    pub fn cluster(&self) -> &MemoryCluster {
        &self.cluster
    }
}

#[async_trait::async_trait]
impl Backend for MemoryBackend {
    fn region(&self) -> &Region {
        &self.region
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        payload: Bytes,
        options: PutOptions,
    ) -> Result<()> {
        if let Some(declared) = options.content_length
            && declared != payload.len() as u64
        {
            return Err(Error::backend(
                "put",
                format!(
                    "declared length {declared} does not match payload length {}",
                    payload.len()
                ),
            ));
        }

        let mut opts = object_store::PutOptions::default();
        if let Some(content_type) = options.content_type {
            opts.attributes
                .insert(Attribute::ContentType, content_type.into());
        }

        let store = self.cluster.bucket(bucket).await;
        store
            .put_opts(&object_path(key), PutPayload::from(payload), opts)
            .await
            .map_err(|e| from_object_store("put", bucket, key, e))?;
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<StoredObject> {
        let store = self.cluster.bucket(bucket).await;
        let result = store
            .get(&object_path(key))
            .await
            .map_err(|e| from_object_store("get", bucket, key, e))?;

        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| v.to_string());
        let content_length = result.meta.size;
        let data = result
            .bytes()
            .await
            .map_err(|e| from_object_store("get", bucket, key, e))?;

        Ok(StoredObject {
            key: key.to_owned(),
            data,
            content_length: Some(content_length),
            content_type,
        })
    }

    async fn copy(&self, bucket: &str, key: &str, source: &ObjectLocation) -> Result<()> {
        let to = object_path(key);
        let from = object_path(&source.key);

        if source.bucket.as_str() == bucket {
            let store = self.cluster.bucket(bucket).await;
            return store
                .copy(&from, &to)
                .await
                .map_err(|e| from_object_store("copy", &source.bucket, &source.key, e));
        }

        let source_store = self.cluster.bucket(&source.bucket).await;
        let object = source_store
            .get(&from)
            .await
            .map_err(|e| from_object_store("copy", &source.bucket, &source.key, e))?;
        let attributes = object.attributes.clone();
        let data = object
            .bytes()
            .await
            .map_err(|e| from_object_store("copy", &source.bucket, &source.key, e))?;

        let opts = object_store::PutOptions {
            attributes,
            ..Default::default()
        };
        let target_store = self.cluster.bucket(bucket).await;
        target_store
            .put_opts(&to, PutPayload::from(data), opts)
            .await
            .map_err(|e| from_object_store("copy", bucket, key, e))?;
        Ok(())
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> Result<ListingPage> {
        let store = self.cluster.bucket(bucket).await;
        let metas: Vec<_> = store
            .list(None)
            .try_collect()
            .await
            .map_err(|e| from_object_store("list", bucket, prefix, e))?;

        let mut keys = Vec::with_capacity(metas.len());
        for meta in &metas {
            let key = object_key(&meta.location)?;
            let after_token = continuation_token.is_none_or(|token| key.as_str() > token);
            if after_token && key.starts_with(prefix) {
                keys.push(key);
            }
        }
        keys.sort_unstable();

        let is_truncated = keys.len() > self.page_size;
        keys.truncate(self.page_size);

        tracing::trace!(
            target: TRACING_TARGET_BACKEND,
            bucket,
            prefix,
            keys = keys.len(),
            is_truncated,
            "served listing page"
        );

        match keys.last() {
            Some(last) if is_truncated => {
                let token = last.clone();
                Ok(ListingPage::truncated(keys, token))
            }
            _ => Ok(ListingPage::last(keys)),
        }
    }

    async fn presign(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<PresignedUrl> {
        if expires_in.is_zero() || expires_in > MAX_PRESIGN_EXPIRY {
            return Err(Error::presign(format!(
                "expiry of {}s is outside the accepted range",
                expires_in.as_secs()
            )));
        }

        let url = format!(
            "memory://{bucket}/{}?X-Amz-Region={}&X-Amz-Expires={}",
            urlencoding::encode(key).replace("%2F", "/"),
            self.region,
            expires_in.as_secs()
        );
        Ok(PresignedUrl::new(url, expires_in))
    }
}

/// Creates [`MemoryBackend`] handles over a shared [`MemoryCluster`].
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    cluster: MemoryCluster,
    page_size: usize,
}

impl MemoryConnector {
    /// Creates a connector over `cluster`.
    pub fn new(cluster: MemoryCluster) -> Self {
        Self {
            cluster,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the page size of every backend this connector creates.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Returns the shared cluster.
    pub fn cluster(&self) -> &MemoryCluster {
        &self.cluster
    }
}

impl Connector for MemoryConnector {
    fn connect(&self, region: &Region) -> Arc<dyn Backend> {
        Arc::new(
            MemoryBackend::new(self.cluster.clone(), region.clone()).with_page_size(self.page_size),
        )
    }
}

/// Maps `key` onto a single-segment path, escaping `/` and `%`.
fn object_path(key: &str) -> Path {
    Path::from_iter([PathPart::from(key)])
}

/// Recovers the key [`object_path`] encoded into `location`.
fn object_key(location: &Path) -> Result<String> {
    urlencoding::decode(location.as_ref())
        .map(|key| key.into_owned())
        .map_err(|e| Error::backend_with_source("list", e))
}

/// Converts an [`object_store::Error`] into a crate [`Error`].
fn from_object_store(
    operation: &'static str,
    bucket: &str,
    key: &str,
    err: object_store::Error,
) -> Error {
    match err {
        object_store::Error::NotFound { .. } => Error::not_found(bucket, key),
        err => Error::backend_with_source(operation, err),
    }
}
