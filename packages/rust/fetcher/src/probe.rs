//! Redirect resolution and DNS reachability for the screening funnel.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use prospector_shared::{ProspectorError, Result};

use crate::SiteProber;

/// User-Agent string for probe requests.
const USER_AGENT: &str = concat!("Prospector/", env!("CARGO_PKG_VERSION"));

/// Redirect chains longer than this are treated as unresolvable.
const MAX_REDIRECTS: usize = 10;

/// Reqwest-backed site prober.
///
/// `resolve_final_url` issues a HEAD request with redirects enabled and
/// reports the URL the chain lands on — link shorteners and aggregator
/// links must not let a denylisted destination hide behind an alias.
pub struct HttpSiteProber {
    client: Client,
    timeout: Duration,
}

impl HttpSiteProber {
    /// Create a prober with the given per-probe timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|e| ProspectorError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, timeout })
    }
}

#[async_trait::async_trait]
impl SiteProber for HttpSiteProber {
    async fn resolve_final_url(&self, url: &Url) -> Result<Url> {
        let response = self
            .client
            .head(url.as_str())
            .send()
            .await
            .map_err(|e| ProspectorError::Network(format!("{url}: {e}")))?;

        let resolved = response.url().clone();
        debug!(original = %url, %resolved, "resolved final URL");
        Ok(resolved)
    }

    async fn domain_resolves(&self, domain: &str) -> bool {
        // Port is irrelevant for name resolution; 443 keeps lookup_host happy.
        let lookup = tokio::net::lookup_host((domain, 443));
        match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(mut addrs)) => addrs.next().is_some(),
            Ok(Err(e)) => {
                warn!(domain, error = %e, "DNS resolution failed");
                false
            }
            Err(_) => {
                warn!(domain, "DNS resolution timed out");
                false
            }
        }
    }
}
