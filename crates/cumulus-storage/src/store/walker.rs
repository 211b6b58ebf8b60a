//! Continuation-token listing traversal.

use std::sync::Arc;

use crate::providers::Backend;
use crate::types::{Bucket, KeyFilter};
use crate::{Result, TRACING_TARGET_SEARCH};

/// Drives a paginated listing to completion, collecting the keys a
/// [`KeyFilter`] accepts.
///
/// The walk ends when the backend reports a page that is not truncated. A
/// backend that keeps reporting truncation keeps the walk going; callers
/// that need a bound must impose their own deadline.
pub struct PageWalker<'a> {
    backend: &'a Arc<dyn Backend>,
    bucket: &'a Bucket,
    filter: &'a KeyFilter,
}

impl<'a> PageWalker<'a> {
    /// Creates a walker listing `bucket` through `backend`.
    pub fn new(backend: &'a Arc<dyn Backend>, bucket: &'a Bucket, filter: &'a KeyFilter) -> Self {
        Self {
            backend,
            bucket,
            filter,
        }
    }

    /// Returns every key under `prefix` accepted by the filter, in listing
    /// order.
    pub async fn walk(&self, prefix: &str) -> Result<Vec<String>> {
        let mut matches = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .backend
                .list_page(self.bucket, prefix, token.as_deref())
                .await?;
            pages += 1;

            let before = matches.len();
            matches.extend(
                page.keys
                    .iter()
                    .filter(|key| self.filter.matches(key))
                    .cloned(),
            );

            tracing::debug!(
                target: TRACING_TARGET_SEARCH,
                page = pages,
                listed = page.keys.len(),
                matched = matches.len() - before,
                is_truncated = page.is_truncated,
                "walked listing page"
            );

            match page.next_token()? {
                Some(next) => token = Some(next.to_owned()),
                None => break,
            }
        }

        tracing::info!(
            target: TRACING_TARGET_SEARCH,
            bucket = %self.bucket,
            prefix,
            pages,
            found = matches.len(),
            "finished prefix search"
        );

        Ok(matches)
    }
}
