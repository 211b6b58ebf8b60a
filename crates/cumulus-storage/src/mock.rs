//! Fault-injecting backend wrapper for tests.
//!
//! [`MockBackend`] forwards every call to an inner [`Backend`], counting the
//! calls per operation and failing the ones its [`MockBehavior`] selects.
//!
//! # Feature Flag
//!
//! Outside this crate's own tests the module is only available when the
//! `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! cumulus-storage = { version = "...", features = ["test-utils"] }
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;

use crate::providers::Backend;
use crate::types::{ListingPage, ObjectLocation, PresignedUrl, PutOptions, Region, StoredObject};
use crate::{Error, Result};

/// Failures a [`MockBackend`] injects.
#[derive(Debug, Clone, Default)]
pub struct MockBehavior {
    /// Keys whose `get` fails with a backend error.
    pub failing_gets: HashSet<String>,
    /// Reject every server-side copy as the store does without
    /// `s3:GetObjectTagging` on the source.
    pub deny_copy: bool,
    /// Fail every `put`.
    pub fail_puts: bool,
    /// Fail every `list_page`.
    pub fail_listing: bool,
    /// Report truncated pages without a continuation token.
    pub drop_continuation_tokens: bool,
}

impl MockBehavior {
    /// Fails `get` for the given key.
    #[must_use]
    pub fn fail_get(mut self, key: impl Into<String>) -> Self {
        self.failing_gets.insert(key.into());
        self
    }

    /// Rejects server-side copies.
    #[must_use]
    pub fn deny_copy(mut self) -> Self {
        self.deny_copy = true;
        self
    }

    /// Fails uploads.
    #[must_use]
    pub fn fail_puts(mut self) -> Self {
        self.fail_puts = true;
        self
    }

    /// Fails listings.
    #[must_use]
    pub fn fail_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Strips continuation tokens from truncated pages.
    #[must_use]
    pub fn drop_continuation_tokens(mut self) -> Self {
        self.drop_continuation_tokens = true;
        self
    }
}

/// Number of calls a [`MockBackend`] received, per operation.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub put: AtomicUsize,
    pub get: AtomicUsize,
    pub copy: AtomicUsize,
    pub list: AtomicUsize,
    pub presign: AtomicUsize,
}

impl CallCounts {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Calls to `put`.
    pub fn puts(&self) -> usize {
        self.put.load(Ordering::SeqCst)
    }

    /// Calls to `get`.
    pub fn gets(&self) -> usize {
        self.get.load(Ordering::SeqCst)
    }

    /// Calls to `copy`.
    pub fn copies(&self) -> usize {
        self.copy.load(Ordering::SeqCst)
    }

    /// Calls to `list_page`.
    pub fn lists(&self) -> usize {
        self.list.load(Ordering::SeqCst)
    }

    /// Calls to `presign`.
    pub fn presigns(&self) -> usize {
        self.presign.load(Ordering::SeqCst)
    }
}

/// Counting, fault-injecting wrapper around another [`Backend`].
#[derive(Debug)]
pub struct MockBackend {
    inner: Arc<dyn Backend>,
    behavior: MockBehavior,
    calls: Arc<CallCounts>,
}

impl MockBackend {
    /// Wraps `inner`, injecting the failures described by `behavior`.
    pub fn new(inner: Arc<dyn Backend>, behavior: MockBehavior) -> Self {
        Self {
            inner,
            behavior,
            calls: Arc::new(CallCounts::default()),
        }
    }

    /// Shared call counters, readable after the mock is moved into a store.
    pub fn calls(&self) -> Arc<CallCounts> {
        self.calls.clone()
    }
}

#[async_trait::async_trait]
impl Backend for MockBackend {
    fn region(&self) -> &Region {
        self.inner.region()
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        payload: Bytes,
        options: PutOptions,
    ) -> Result<()> {
        CallCounts::bump(&self.calls.put);
        if self.behavior.fail_puts {
            return Err(Error::backend("put", "ServiceUnavailable: injected failure"));
        }
        self.inner.put(bucket, key, payload, options).await
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<StoredObject> {
        CallCounts::bump(&self.calls.get);
        if self.behavior.failing_gets.contains(key) {
            return Err(Error::backend("get", "SlowDown: injected failure"));
        }
        self.inner.get(bucket, key).await
    }

    async fn copy(&self, bucket: &str, key: &str, source: &ObjectLocation) -> Result<()> {
        CallCounts::bump(&self.calls.copy);
        if self.behavior.deny_copy {
            return Err(Error::backend("copy", "AccessDenied: Access Denied"));
        }
        self.inner.copy(bucket, key, source).await
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> Result<ListingPage> {
        CallCounts::bump(&self.calls.list);
        if self.behavior.fail_listing {
            return Err(Error::backend("list", "InternalError: injected failure"));
        }

        let mut page = self
            .inner
            .list_page(bucket, prefix, continuation_token)
            .await?;
        if self.behavior.drop_continuation_tokens {
            page.continuation_token = None;
        }
        Ok(page)
    }

    async fn presign(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<PresignedUrl> {
        CallCounts::bump(&self.calls.presign);
        self.inner.presign(bucket, key, expires_in).await
    }
}
