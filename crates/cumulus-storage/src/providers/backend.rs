//! Traits describing what a blob store must offer.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::Result;
use crate::types::{ListingPage, ObjectLocation, PresignedUrl, PutOptions, Region, StoredObject};

/// A client handle bound to one region of a blob store.
///
/// Every method maps onto a single request against the store. Handles are
/// shared behind `Arc` and must be safe to use from concurrent tasks.
#[async_trait::async_trait]
pub trait Backend: fmt::Debug + Send + Sync + 'static {
    /// Region this handle is bound to.
    fn region(&self) -> &Region;

    /// Uploads `payload` under `key`, creating or overwriting the object.
    async fn put(&self, bucket: &str, key: &str, payload: Bytes, options: PutOptions)
    -> Result<()>;

    /// Retrieves the object at `key`.
    ///
    /// Fails with [`Error::NotFound`](crate::Error::NotFound) if the key does
    /// not exist.
    async fn get(&self, bucket: &str, key: &str) -> Result<StoredObject>;

    /// Copies `source` to `key` in `bucket` without moving the payload
    /// through the caller.
    async fn copy(&self, bucket: &str, key: &str, source: &ObjectLocation) -> Result<()>;

    /// Lists one page of keys starting with `prefix`.
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> Result<ListingPage>;

    /// Produces a signed download URL. Local computation, no request.
    async fn presign(&self, bucket: &str, key: &str, expires_in: Duration)
    -> Result<PresignedUrl>;
}

/// Factory for region-bound [`Backend`] handles.
pub trait Connector: fmt::Debug + Send + Sync + 'static {
    /// Creates a new handle bound to `region`.
    fn connect(&self, region: &Region) -> Arc<dyn Backend>;
}
