#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for backend operations.
///
/// Use this target for logging requests served by a storage backend.
pub const TRACING_TARGET_BACKEND: &str = "cumulus_storage::backend";

/// Tracing target for the per-region client registry.
///
/// Use this target for logging regional client creation and caching.
pub const TRACING_TARGET_REGISTRY: &str = "cumulus_storage::registry";

/// Tracing target for copy operations.
///
/// Use this target for logging strategy selection and fallback.
pub const TRACING_TARGET_COPY: &str = "cumulus_storage::copy";

/// Tracing target for prefix search.
pub const TRACING_TARGET_SEARCH: &str = "cumulus_storage::search";

/// Tracing target for object store operations.
///
/// Use this target for logging store, get and presign calls and their failures.
pub const TRACING_TARGET_STORE: &str = "cumulus_storage::store";

mod config;
mod error;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;
/// Storage capability interface and backends.
pub mod providers;
/// Object store, client registry, copy coordinator and page walker.
pub mod store;
/// Value types (Region, Bucket, StoredObject, ListingPage, ...).
pub mod types;

#[doc(hidden)]
pub mod prelude;

pub use config::StorageConfig;
pub use error::{BoxedError, Error, Result};
pub use store::{CopyStrategy, DEFAULT_PRESIGN_EXPIRY, ObjectStore};
