//! Memoizing wrapper around a search provider.
//!
//! Responses are keyed by exact query string plus tier. The cache is
//! advisory: a broken or cold cache degrades to a live call, and a failed
//! store never fails the search.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use prospector_cache::Cache;
use prospector_shared::{Result, SearchHit};

use crate::{SearchProvider, SearchTier};

/// Cache category for memoized search responses.
const CATEGORY: &str = "search";

/// Search provider decorator that memoizes responses with a TTL.
pub struct CachedSearch {
    inner: Arc<dyn SearchProvider>,
    cache: Cache,
    ttl: Duration,
}

impl CachedSearch {
    pub fn new(inner: Arc<dyn SearchProvider>, cache: Cache, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    fn key(query: &str, tier: SearchTier) -> String {
        format!("{}:{query}", tier.as_str())
    }
}

#[async_trait::async_trait]
impl SearchProvider for CachedSearch {
    async fn search(&self, query: &str, tier: SearchTier) -> Result<Vec<SearchHit>> {
        let key = Self::key(query, tier);

        if let Some(hits) = self.cache.get::<Vec<SearchHit>>(CATEGORY, &key).await {
            debug!(%tier, "serving search results from cache");
            return Ok(hits);
        }

        let hits = self.inner.search(query, tier).await?;

        if let Err(e) = self.cache.set(CATEGORY, &key, &hits, self.ttl).await {
            warn!(error = %e, "failed to store search results in cache");
        }

        Ok(hits)
    }
}
