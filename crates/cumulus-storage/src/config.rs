//! Storage configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::types::{Bucket, KeyFilter, Region, SUBMISSION_MARKER};
use crate::{Error, Result};

// Default values
const DEFAULT_REGION: &str = "eu-central-1";
const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 5;

/// Configuration of an [`ObjectStore`](crate::ObjectStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct StorageConfig {
    /// Home bucket all writes go to.
    #[cfg_attr(
        feature = "config",
        arg(long = "bucket", env = "STORAGE_BUCKET", default_value = "", hide_default_value = true)
    )]
    pub bucket: String,

    /// Home region; the AWS region chain takes precedence when it resolves one.
    #[cfg_attr(
        feature = "config",
        arg(long = "region", env = "AWS_REGION", default_value = DEFAULT_REGION)
    )]
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom endpoint for S3-compatible services (path-style addressing).
    #[cfg_attr(feature = "config", arg(long = "endpoint", env = "STORAGE_ENDPOINT"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Lifetime of presigned URLs when the caller gives none, in seconds.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "presign-expiry-secs",
            env = "STORAGE_PRESIGN_EXPIRY_SECS",
            default_value_t = DEFAULT_PRESIGN_EXPIRY_SECS
        )
    )]
    #[serde(default = "default_presign_expiry_secs")]
    pub presign_expiry_secs: u64,

    /// Marker a key must contain to be returned by prefix search.
    #[cfg_attr(
        feature = "config",
        arg(long = "search-marker", env = "STORAGE_SEARCH_MARKER", default_value = SUBMISSION_MARKER)
    )]
    #[serde(default = "default_search_marker")]
    pub search_marker: String,
}

fn default_region() -> String {
    DEFAULT_REGION.to_owned()
}

fn default_presign_expiry_secs() -> u64 {
    DEFAULT_PRESIGN_EXPIRY_SECS
}

fn default_search_marker() -> String {
    SUBMISSION_MARKER.to_owned()
}

impl StorageConfig {
    /// Creates a configuration for `bucket` in `region` with defaults.
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            endpoint: None,
            presign_expiry_secs: DEFAULT_PRESIGN_EXPIRY_SECS,
            search_marker: SUBMISSION_MARKER.to_owned(),
        }
    }

    /// Sets a custom endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the default presigned URL lifetime in seconds.
    #[must_use]
    pub fn with_presign_expiry_secs(mut self, secs: u64) -> Self {
        self.presign_expiry_secs = secs;
        self
    }

    /// Sets the prefix search marker.
    #[must_use]
    pub fn with_search_marker(mut self, marker: impl Into<String>) -> Self {
        self.search_marker = marker.into();
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(Error::invalid_config("bucket must not be empty"));
        }
        if self.region.trim().is_empty() {
            return Err(Error::invalid_config("region must not be empty"));
        }
        if self.presign_expiry_secs == 0 {
            return Err(Error::invalid_config(
                "presign expiry must be at least one second",
            ));
        }
        Ok(())
    }

    /// Home bucket.
    #[inline]
    pub fn bucket(&self) -> Bucket {
        Bucket::new(self.bucket.clone())
    }

    /// Home region.
    #[inline]
    pub fn region(&self) -> Region {
        Region::new(self.region.clone())
    }

    /// Default presigned URL lifetime.
    #[inline]
    pub fn presign_expiry(&self) -> Duration {
        Duration::from_secs(self.presign_expiry_secs)
    }

    /// Filter applied by prefix search.
    pub fn search_filter(&self) -> KeyFilter {
        if self.search_marker.is_empty() {
            KeyFilter::Any
        } else {
            KeyFilter::contains(self.search_marker.clone())
        }
    }
}
