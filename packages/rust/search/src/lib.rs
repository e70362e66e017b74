//! Tiered web-search collaborator.
//!
//! The funnel and orchestrator issue queries at one of three cost/quality
//! tiers. An empty result list is a valid, non-error response meaning
//! "no results" — callers must not treat it as a failure.

mod cached;
mod provider;

use async_trait::async_trait;
use prospector_shared::{Result, SearchHit};

pub use cached::CachedSearch;
pub use provider::HttpSearch;

/// Cost/quality tier for a search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchTier {
    /// Cheap, fast tier for the first screening gate.
    Basic,
    /// Higher-quality tier for the second screening gate.
    Advanced,
    /// Deep-research tier (minutes of latency, rarely used).
    Research,
}

impl SearchTier {
    /// Stable name used in cache keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
            Self::Research => "research",
        }
    }
}

impl std::fmt::Display for SearchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ranked web-search collaborator.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run `query` at the given tier. `Ok(vec![])` means "no results".
    async fn search(&self, query: &str, tier: SearchTier) -> Result<Vec<SearchHit>>;
}
