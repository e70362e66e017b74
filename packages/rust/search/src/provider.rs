//! HTTP search backend speaking a Perplexity-style (OpenAI-compatible)
//! chat-completions API that returns an answer plus source citations.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use prospector_shared::{ProspectorError, Result, SearchConfig, SearchHit, validate_api_key};

use crate::{SearchProvider, SearchTier};

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("Prospector/", env!("CARGO_PKG_VERSION"));

/// Per-tier request timeouts. The research tier runs a long-lived deep
/// search on the provider side, hence the generous budget.
const BASIC_TIMEOUT: Duration = Duration::from_secs(60);
const ADVANCED_TIMEOUT: Duration = Duration::from_secs(120);
const RESEARCH_TIMEOUT: Duration = Duration::from_secs(900);

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    model: &'a str,
    messages: Vec<SearchMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct SearchMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    choices: Vec<SearchChoice>,
}

#[derive(Debug, Deserialize)]
struct SearchChoice {
    message: SearchChoiceMessage,
    #[serde(default)]
    citations: Vec<Citation>,
}

#[derive(Debug, Deserialize)]
struct SearchChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct Citation {
    #[serde(default)]
    text: String,
    #[serde(default)]
    url: String,
}

// ---------------------------------------------------------------------------
// HttpSearch
// ---------------------------------------------------------------------------

/// Tiered search client.
pub struct HttpSearch {
    client: Client,
    api_key: String,
    base_url: String,
    config: SearchConfig,
}

impl HttpSearch {
    /// Build a search client from config. Fails fast on a missing API key.
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let api_key = validate_api_key(&config.api_key_env, "search")?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProspectorError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config: config.clone(),
        })
    }

    fn model_for(&self, tier: SearchTier) -> &str {
        match tier {
            SearchTier::Basic => &self.config.basic_model,
            SearchTier::Advanced => &self.config.advanced_model,
            SearchTier::Research => &self.config.research_model,
        }
    }

    fn timeout_for(&self, tier: SearchTier) -> Duration {
        match tier {
            SearchTier::Basic => BASIC_TIMEOUT,
            SearchTier::Advanced => ADVANCED_TIMEOUT,
            SearchTier::Research => RESEARCH_TIMEOUT,
        }
    }
}

/// Shape a provider response into search hits: one hit per citation, or a
/// single provider-attributed hit when the answer carries no citations.
fn shape_hits(response: SearchResponse) -> Vec<SearchHit> {
    let Some(choice) = response.choices.into_iter().next() else {
        return Vec::new();
    };

    if choice.citations.is_empty() {
        if choice.message.content.is_empty() {
            return Vec::new();
        }
        return vec![SearchHit {
            content: choice.message.content,
            source: "search provider".into(),
        }];
    }

    choice
        .citations
        .into_iter()
        .map(|c| SearchHit {
            content: c.text,
            source: c.url,
        })
        .collect()
}

#[async_trait::async_trait]
impl SearchProvider for HttpSearch {
    #[instrument(skip(self), fields(model = self.model_for(tier), %tier))]
    async fn search(&self, query: &str, tier: SearchTier) -> Result<Vec<SearchHit>> {
        let request = SearchRequest {
            model: self.model_for(tier),
            messages: vec![SearchMessage {
                role: "user",
                content: query,
            }],
            temperature: 0.0,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout_for(tier))
            .json(&request)
            .send()
            .await
            .map_err(|e| ProspectorError::Search(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProspectorError::Search(format!("{url}: HTTP {status}")));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProspectorError::Search(format!("malformed response: {e}")))?;

        let hits = shape_hits(parsed);
        debug!(hits = hits.len(), "search completed");
        Ok(hits)
    }
}
