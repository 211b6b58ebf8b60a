//! Storage capability interface and its backends.

mod backend;
mod memory;
#[cfg(feature = "s3")]
#[cfg_attr(docsrs, doc(cfg(feature = "s3")))]
mod s3;

pub use backend::{Backend, Connector};
pub use memory::{DEFAULT_PAGE_SIZE, MemoryBackend, MemoryCluster, MemoryConnector};
#[cfg(feature = "s3")]
#[cfg_attr(docsrs, doc(cfg(feature = "s3")))]
pub use s3::{S3Backend, S3Connector};
