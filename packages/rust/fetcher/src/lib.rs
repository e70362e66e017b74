//! Document fetching and site probing.
//!
//! Two collaborator seams live here:
//! - [`DocumentFetcher`] retrieves a URL's textual content (HTML reduced to
//!   plain text), tolerant of failure — the orchestrator decides what a
//!   failed fetch means.
//! - [`SiteProber`] answers the screening funnel's technical questions:
//!   where does this URL really land after redirects, and does its domain
//!   resolve at all.

mod domain;
mod fetch;
mod probe;

use async_trait::async_trait;
use url::Url;

use prospector_shared::{FetchedDocument, Result};

pub use domain::{parse_candidate_url, registrable_domain};
pub use fetch::HttpFetcher;
pub use probe::HttpSiteProber;

/// Retrieves a URL's textual content.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch `url` and return its text content. Errors are per-URL; callers
    /// own retry and skip policy.
    async fn fetch(&self, url: &Url) -> Result<FetchedDocument>;
}

/// Technical-validation collaborator for the screening funnel.
#[async_trait]
pub trait SiteProber: Send + Sync {
    /// Follow redirects to the final destination URL. Fails when the site
    /// is unreachable within the bounded timeout.
    async fn resolve_final_url(&self, url: &Url) -> Result<Url>;

    /// Whether DNS resolution of `domain` succeeds. A resolution timeout
    /// counts as failure, never as success.
    async fn domain_resolves(&self, domain: &str) -> bool;
}
