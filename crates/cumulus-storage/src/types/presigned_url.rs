//! Signed download URLs.

use std::time::Duration;

use derive_more::{Deref, Display};

/// A time-limited, signed download URL.
#[derive(Debug, Clone, PartialEq, Eq, Deref, Display)]
#[display("{url}")]
pub struct PresignedUrl {
    /// The signed URL.
    #[deref]
    url: String,
    /// Lifetime the URL was signed with.
    expires_in: Duration,
}

impl PresignedUrl {
    /// Creates a presigned URL.
    pub fn new(url: impl Into<String>, expires_in: Duration) -> Self {
        Self {
            url: url.into(),
            expires_in,
        }
    }

    /// Returns the URL as a string slice.
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Returns the lifetime the URL was signed with.
    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    /// Consumes the value, returning the URL.
    pub fn into_string(self) -> String {
        self.url
    }
}

impl AsRef<str> for PresignedUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}
