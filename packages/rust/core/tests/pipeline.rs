//! End-to-end pipeline: screen a company, then research the ones that pass.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use url::Url;

use prospector_cache::Cache;
use prospector_core::{ResearchOrchestrator, ScreeningFunnel};
use prospector_fetcher::{DocumentFetcher, SiteProber};
use prospector_oracle::{ClassificationOracle, OracleTier};
use prospector_search::{SearchProvider, SearchTier};
use prospector_shared::{
    Company, FetchedDocument, ProspectorError, ResearchConfig, Result, ScreeningStage, SearchHit,
};

/// Oracle that always judges FIT / YES and synthesizes a fixed profile.
struct AgreeableOracle;

#[async_trait]
impl ClassificationOracle for AgreeableOracle {
    async fn classify(&self, prompt: &str, _tier: OracleTier) -> Result<String> {
        if prompt.contains("ideal customer profile") {
            Ok("FIT".into())
        } else {
            Ok("YES".into())
        }
    }

    async fn generate(&self, _system: &str, _prompt: &str, tier: OracleTier) -> Result<String> {
        Ok(match tier {
            OracleTier::Reasoning => "Acme business details:\n- Seed stage (verified: acme.io)".into(),
            OracleTier::Basic => "Acme builds developer tooling.".into(),
        })
    }
}

/// Search provider serving a small fixed corpus for any query.
struct CorpusSearch;

#[async_trait]
impl SearchProvider for CorpusSearch {
    async fn search(&self, _query: &str, _tier: SearchTier) -> Result<Vec<SearchHit>> {
        Ok(vec![
            SearchHit {
                content: "Acme raised a seed round.".into(),
                source: "https://news.example/acme-seed".into(),
            },
            SearchHit {
                content: "Acme product review.".into(),
                source: "https://blog.example/acme-review".into(),
            },
        ])
    }
}

/// In-memory site map; anything listed fetches, anything else errors.
struct MapFetcher {
    pages: Mutex<HashMap<Url, String>>,
}

impl MapFetcher {
    fn with_pages(pages: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            pages: Mutex::new(
                pages
                    .iter()
                    .map(|(u, body)| (Url::parse(u).unwrap(), body.to_string()))
                    .collect(),
            ),
        })
    }
}

#[async_trait]
impl DocumentFetcher for MapFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedDocument> {
        let pages = self.pages.lock().unwrap();
        let content = pages
            .get(url)
            .cloned()
            .ok_or_else(|| ProspectorError::Network(format!("no route to {url}")))?;
        Ok(FetchedDocument {
            url: url.clone(),
            content,
            retrieved_at: Utc::now(),
        })
    }
}

/// Prober where every URL resolves to itself and all DNS succeeds.
struct IdentityProber;

#[async_trait]
impl SiteProber for IdentityProber {
    async fn resolve_final_url(&self, url: &Url) -> Result<Url> {
        Ok(url.clone())
    }

    async fn domain_resolves(&self, _domain: &str) -> bool {
        true
    }
}

fn research_config() -> ResearchConfig {
    ResearchConfig {
        retry_backoff_secs: 0,
        ..ResearchConfig::default()
    }
}

#[tokio::test]
async fn screened_company_flows_through_to_a_full_bundle() {
    let oracle: Arc<dyn ClassificationOracle> = Arc::new(AgreeableOracle);
    let search: Arc<dyn SearchProvider> = Arc::new(CorpusSearch);

    let funnel = ScreeningFunnel::new(
        Arc::clone(&oracle),
        Arc::clone(&search),
        Arc::new(IdentityProber),
        vec!["toptal.com".to_string()],
    );

    let company = Company::new("Acme", Some(Url::parse("https://acme.io").unwrap()));
    let decision = funnel.screen(&company).await;
    assert!(decision.proceed);
    assert_eq!(decision.stage_reached, ScreeningStage::Passed);

    let fetcher = MapFetcher::with_pages(&[
        ("https://acme.io/", "Acme makes tooling for developers. See acme.io for docs."),
        ("https://news.example/acme-seed", "Acme (acme.io) raised a seed round."),
        ("https://blog.example/acme-review", "A review of Acme, found at acme.io."),
    ]);

    let orchestrator = ResearchOrchestrator::new(
        oracle,
        search,
        fetcher,
        Cache::disabled(),
        research_config(),
    );

    let bundle = orchestrator.research(&company).await.expect("research run");
    assert_eq!(bundle.home_page, "Acme builds developer tooling.");
    assert!(bundle.icp_profile.starts_with("Acme business details:"));
    assert!(!bundle.comprehensive.is_empty());
}

#[tokio::test]
async fn denylisted_company_never_reaches_research() {
    let funnel = ScreeningFunnel::new(
        Arc::new(AgreeableOracle),
        Arc::new(CorpusSearch),
        Arc::new(IdentityProber),
        vec!["toptal.com".to_string()],
    );

    let company = Company::new(
        "Toptal Clone",
        Some(Url::parse("https://www.toptal.com/jobs").unwrap()),
    );
    let decision = funnel.screen(&company).await;
    assert!(!decision.proceed);
    assert_eq!(decision.stage_reached, ScreeningStage::Technical);
}
