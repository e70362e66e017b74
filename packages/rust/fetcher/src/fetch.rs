//! HTTP document fetcher with HTML-to-text reduction.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use scraper::Html;
use tracing::debug;
use url::Url;

use prospector_shared::{FetchedDocument, ProspectorError, Result};

use crate::DocumentFetcher;

/// User-Agent string for fetch requests.
const USER_AGENT: &str = concat!("Prospector/", env!("CARGO_PKG_VERSION"));

/// Maximum redirects to follow when fetching a document.
const MAX_REDIRECTS: usize = 5;

/// Reqwest-backed document fetcher.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|e| ProspectorError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedDocument> {
        debug!(%url, "fetching document");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| ProspectorError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProspectorError::Network(format!("{url}: HTTP {status}")));
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("text/html"));

        let body = response
            .text()
            .await
            .map_err(|e| ProspectorError::Network(format!("{url}: failed to read body: {e}")))?;

        let content = if is_html { html_to_text(&body) } else { body };

        Ok(FetchedDocument {
            url: url.clone(),
            content,
            retrieved_at: Utc::now(),
        })
    }
}

/// Reduce an HTML document to whitespace-normalized text, skipping script,
/// style, and noscript subtrees.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();

    for node in document.tree.nodes() {
        let scraper::Node::Text(text) = node.value() else {
            continue;
        };
        let skipped = node.ancestors().any(|a| {
            matches!(a.value(), scraper::Node::Element(e)
                if matches!(e.name(), "script" | "style" | "noscript"))
        });
        if skipped {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(trimmed);
        }
    }

    out
}
