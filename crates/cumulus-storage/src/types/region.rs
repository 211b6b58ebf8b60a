//! Region and bucket identifiers.

use derive_more::{Deref, Display, From};
use serde::{Deserialize, Serialize};

/// Identifier of a storage region (e.g. `eu-central-1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize, Deref, Display, From)]
#[serde(transparent)]
pub struct Region(String);

impl Region {
    /// Creates a region identifier.
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    /// Returns the region as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Region {
    fn from(region: &str) -> Self {
        Self(region.to_owned())
    }
}

impl AsRef<str> for Region {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Name of a storage container. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, Deref, Display, From)]
#[serde(transparent)]
pub struct Bucket(String);

impl Bucket {
    /// Creates a bucket name.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self(bucket.into())
    }

    /// Returns the bucket name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Bucket {
    fn from(bucket: &str) -> Self {
        Self(bucket.to_owned())
    }
}

impl AsRef<str> for Bucket {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
