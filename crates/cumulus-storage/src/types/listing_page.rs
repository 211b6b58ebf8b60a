//! One page of a paginated listing.

use crate::{Error, Result};

/// Keys returned by a single listing request.
///
/// A truncated page must carry a non-empty continuation token; feed it into
/// the next request until a page reports it is not truncated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Keys on this page, in backend order.
    pub keys: Vec<String>,
    /// Whether more keys follow this page.
    pub is_truncated: bool,
    /// Cursor for the next page.
    pub continuation_token: Option<String>,
}

impl ListingPage {
    /// Creates the final page of a listing.
    pub fn last(keys: Vec<String>) -> Self {
        Self {
            keys,
            is_truncated: false,
            continuation_token: None,
        }
    }

    /// Creates a page followed by more keys.
    pub fn truncated(keys: Vec<String>, continuation_token: impl Into<String>) -> Self {
        Self {
            keys,
            is_truncated: true,
            continuation_token: Some(continuation_token.into()),
        }
    }

    /// Returns the token for the next request, `None` once the listing is
    /// complete.
    ///
    /// A truncated page without a usable token is a protocol violation.
    pub fn next_token(&self) -> Result<Option<&str>> {
        if !self.is_truncated {
            return Ok(None);
        }

        match self.continuation_token.as_deref() {
            Some(token) if !token.is_empty() => Ok(Some(token)),
            _ => Err(Error::protocol_violation(
                "page reported truncation without a continuation token",
            )),
        }
    }
}
