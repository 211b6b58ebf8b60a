//! Convenience re-exports.

pub use crate::providers::{Backend, Connector, MemoryCluster, MemoryConnector};
#[cfg(feature = "s3")]
pub use crate::providers::{S3Backend, S3Connector};
pub use crate::store::{CopyStrategy, ObjectStore};
pub use crate::types::{Bucket, KeyFilter, PresignedUrl, Region, StoredObject};
pub use crate::{Error, Result, StorageConfig};
