//! Concurrent research orchestration for companies that pass screening.
//!
//! One run: anchor on the company's own home page, fan out four targeted
//! search queries, fetch the candidate sources under a bounded worker pool,
//! filter them for relevance against the home-page anchor, summarize each
//! survivor, then layer the summaries into a source-attributed ICP profile.
//!
//! The home-page fetch and the final synthesis are mandatory — the run
//! fails without them. Everything in between degrades per-source.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use url::Url;

use prospector_cache::{Cache, fingerprint};
use prospector_fetcher::{DocumentFetcher, parse_candidate_url, registrable_domain};
use prospector_oracle::{ClassificationOracle, OracleTier, find_label};
use prospector_search::{SearchProvider, SearchTier};
use prospector_shared::{
    Company, FetchedDocument, ProspectorError, ResearchBundle, ResearchConfig, Result,
    normalize_company_name,
};

use crate::prompts;

/// Cache category for completed research bundles.
const BUNDLE_CATEGORY: &str = "bundle";

/// Query angles fanned out after the home-page anchor is in hand.
const QUERY_ANGLES: [&str; 4] = ["startup", "product", "team", "about"];

/// Upper bound on the document excerpt shown to the relevance oracle.
const RELEVANCE_EXCERPT_CHARS: usize = 2000;

/// Runs one research pass over a screened company.
pub struct ResearchOrchestrator {
    oracle: Arc<dyn ClassificationOracle>,
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn DocumentFetcher>,
    cache: Cache,
    config: ResearchConfig,
}

impl ResearchOrchestrator {
    pub fn new(
        oracle: Arc<dyn ClassificationOracle>,
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn DocumentFetcher>,
        cache: Cache,
        config: ResearchConfig,
    ) -> Self {
        Self {
            oracle,
            search,
            fetcher,
            cache,
            config,
        }
    }

    /// Research one company end to end.
    ///
    /// Returns a cached bundle when a fresh one exists for the same
    /// normalized name and website. Fails only when a mandatory step
    /// (home-page anchor, final synthesis) cannot complete.
    #[instrument(skip_all, fields(company = %company.name))]
    pub async fn research(&self, company: &Company) -> Result<ResearchBundle> {
        let Some(website) = &company.website else {
            return Err(ProspectorError::mandatory(
                "home_page",
                "company has no website to anchor research on",
            ));
        };

        let bundle_key = fingerprint(&[&normalize_company_name(&company.name), website.as_str()]);
        if let Some(bundle) = self
            .cache
            .get::<ResearchBundle>(BUNDLE_CATEGORY, &bundle_key)
            .await
        {
            info!("returning cached research bundle");
            return Ok(bundle);
        }

        // Mandatory anchor: the home page grounds every later relevance
        // judgment, so its failure fails the whole run.
        let home = self
            .fetcher
            .fetch(website)
            .await
            .map_err(|e| ProspectorError::mandatory("home_page", e.to_string()))?;
        let home_summary = self
            .distill(company, &home.content)
            .await
            .map_err(|e| ProspectorError::mandatory("home_page", e.to_string()))?;
        info!(url = %home.url, "home page anchored");

        let candidates = self.gather_candidates(company, website, &home.url).await;
        info!(count = candidates.len(), "candidate sources gathered");

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let documents = self.fetch_all(candidates, &semaphore).await;
        let doc_summaries = self
            .filter_and_summarize(company, website, &home_summary, documents, &semaphore)
            .await;

        let mut summaries = vec![home_summary.clone()];
        summaries.extend(doc_summaries);
        let combined = summaries.join("\n\n");

        let (comprehensive, company_focus, funding, team) = tokio::join!(
            self.layer(company, "comprehensive", prompts::comprehensive_summary(company, &combined)),
            self.layer(company, "company", prompts::company_summary(company, &combined)),
            self.layer(company, "funding", prompts::funding_summary(company, &combined)),
            self.layer(company, "team", prompts::team_summary(company, &combined)),
        );

        // Mandatory synthesis: no profile, no usable result.
        let icp_profile = self
            .oracle
            .generate(
                &prompts::icp_profile_system(),
                &prompts::icp_profile(company, &comprehensive, &company_focus, &funding, &team),
                OracleTier::Reasoning,
            )
            .await
            .map_err(|e| ProspectorError::mandatory("icp_synthesis", e.to_string()))?;

        let bundle = ResearchBundle {
            home_page: home_summary,
            comprehensive,
            company: company_focus,
            funding,
            team,
            icp_profile,
        };

        if let Err(e) = self
            .cache
            .set(
                BUNDLE_CATEGORY,
                &bundle_key,
                &bundle,
                Duration::from_secs(self.config.bundle_ttl_secs),
            )
            .await
        {
            warn!(error = %e, "failed to store research bundle in cache");
        }

        Ok(bundle)
    }

    /// Fan out the query angles and reduce the hits to deduplicated,
    /// fetchable URLs. A failed query contributes nothing; it never aborts
    /// the run.
    async fn gather_candidates(
        &self,
        company: &Company,
        website: &Url,
        home_url: &Url,
    ) -> Vec<Url> {
        let mut handles = Vec::with_capacity(QUERY_ANGLES.len());
        for angle in QUERY_ANGLES {
            let search = Arc::clone(&self.search);
            let query = format!("{} {angle}", company.name);
            handles.push(tokio::spawn(async move {
                match search.search(&query, SearchTier::Basic).await {
                    Ok(hits) => hits,
                    Err(e) => {
                        warn!(%query, error = %e, "research query failed, skipping");
                        Vec::new()
                    }
                }
            }));
        }

        let mut seen: HashSet<Url> = HashSet::new();
        let mut candidates = Vec::new();
        for handle in handles {
            let hits = match handle.await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!(error = %e, "search task panicked, skipping query");
                    continue;
                }
            };
            for hit in hits.into_iter().take(self.config.num_urls) {
                let Some(url) = parse_candidate_url(&hit.source) else {
                    continue;
                };
                // The home page is already anchored; refetching it adds
                // nothing.
                if url == *website || url == *home_url {
                    continue;
                }
                if seen.insert(url.clone()) {
                    candidates.push(url);
                }
            }
        }
        candidates
    }

    /// Fetch every candidate under the shared worker pool. Each URL gets its
    /// own retry budget; exhaustion drops the URL, never the batch.
    async fn fetch_all(&self, candidates: Vec<Url>, semaphore: &Arc<Semaphore>) -> Vec<FetchedDocument> {
        let mut handles = Vec::with_capacity(candidates.len());
        for url in candidates {
            let fetcher = Arc::clone(&self.fetcher);
            let semaphore = Arc::clone(semaphore);
            let max_retries = self.config.max_retries;
            let backoff = Duration::from_secs(self.config.retry_backoff_secs);
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                fetch_with_retries(fetcher.as_ref(), &url, max_retries, backoff).await
            }));
        }

        let mut documents = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(Some(doc)) => documents.push(doc),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "fetch task panicked, skipping document"),
            }
        }
        documents
    }

    /// Judge each document's relevance against the home-page anchor and
    /// summarize the survivors, concurrently under the shared pool.
    ///
    /// Relevance fails closed: only an explicit YES (or a deterministic
    /// domain match) keeps a document. Oracle errors and ambiguous replies
    /// drop it.
    async fn filter_and_summarize(
        &self,
        company: &Company,
        website: &Url,
        home_summary: &str,
        documents: Vec<FetchedDocument>,
        semaphore: &Arc<Semaphore>,
    ) -> Vec<String> {
        let company_domain = registrable_domain(website);
        let home_summary: Arc<str> = Arc::from(home_summary);

        let mut handles = Vec::with_capacity(documents.len());
        for doc in documents {
            let oracle = Arc::clone(&self.oracle);
            let semaphore = Arc::clone(semaphore);
            let company = company.clone();
            let company_domain = company_domain.clone();
            let home_summary = Arc::clone(&home_summary);
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                if !is_relevant(oracle.as_ref(), &company, &company_domain, &home_summary, &doc).await {
                    debug!(url = %doc.url, "document judged irrelevant");
                    return None;
                }
                match distill(oracle.as_ref(), &company, &doc.content).await {
                    Ok(summary) => Some(summary),
                    Err(e) => {
                        warn!(url = %doc.url, error = %e, "summarization failed, skipping document");
                        None
                    }
                }
            }));
        }

        let mut summaries = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(Some(summary)) => summaries.push(summary),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "summarize task panicked, skipping document"),
            }
        }
        summaries
    }

    /// One focused summary over the combined material. Degrades to an empty
    /// section rather than failing the run.
    async fn layer(&self, company: &Company, focus: &'static str, prompt: String) -> String {
        match self
            .oracle
            .generate(&prompts::summarize_system(company), &prompt, OracleTier::Basic)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(focus, error = %e, "layered summary failed, leaving section empty");
                String::new()
            }
        }
    }

    async fn distill(&self, company: &Company, raw: &str) -> Result<String> {
        distill(self.oracle.as_ref(), company, raw).await
    }
}

/// Extract the salient facts from raw page text, then compress them.
async fn distill(
    oracle: &dyn ClassificationOracle,
    company: &Company,
    raw: &str,
) -> Result<String> {
    let extracted = oracle
        .generate(
            &prompts::extract_system(company),
            &prompts::extract(company, raw),
            OracleTier::Basic,
        )
        .await?;
    oracle
        .generate(
            &prompts::summarize_system(company),
            &prompts::summarize(company, &extracted),
            OracleTier::Basic,
        )
        .await
}

/// Three-criteria relevance test, cheapest first. Any deterministic match
/// accepts; otherwise the oracle's explicit YES is required.
async fn is_relevant(
    oracle: &dyn ClassificationOracle,
    company: &Company,
    company_domain: &Option<String>,
    home_summary: &str,
    doc: &FetchedDocument,
) -> bool {
    if let Some(domain) = company_domain {
        if registrable_domain(&doc.url).as_deref() == Some(domain.as_str()) {
            return true;
        }
        if doc.content.to_lowercase().contains(domain.as_str()) {
            return true;
        }
    }

    let excerpt: String = doc.content.chars().take(RELEVANCE_EXCERPT_CHARS).collect();
    match oracle
        .classify(
            &prompts::document_relevance(company, home_summary, &excerpt),
            OracleTier::Basic,
        )
        .await
    {
        Ok(verdict) => matches!(find_label(&verdict, &prompts::RELEVANCE_LABELS), Some("YES")),
        Err(e) => {
            warn!(url = %doc.url, error = %e, "relevance check failed, dropping document");
            false
        }
    }
}

/// Fetch one URL with a bounded retry budget. `None` when every attempt
/// failed.
async fn fetch_with_retries(
    fetcher: &dyn DocumentFetcher,
    url: &Url,
    max_retries: usize,
    backoff: Duration,
) -> Option<FetchedDocument> {
    for attempt in 0..max_retries.max(1) {
        match fetcher.fetch(url).await {
            Ok(doc) => return Some(doc),
            Err(e) => {
                warn!(%url, attempt, error = %e, "fetch attempt failed");
                if attempt + 1 < max_retries.max(1) {
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use prospector_shared::SearchHit;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // -- fakes ------------------------------------------------------------

    /// Oracle with a fixed relevance verdict and echo-style generation.
    struct ScriptedOracle {
        relevance: String,
        fail_reasoning: bool,
        classify_calls: AtomicUsize,
        generate_calls: AtomicUsize,
    }

    impl ScriptedOracle {
        fn new(relevance: &str) -> Arc<Self> {
            Arc::new(Self {
                relevance: relevance.into(),
                fail_reasoning: false,
                classify_calls: AtomicUsize::new(0),
                generate_calls: AtomicUsize::new(0),
            })
        }

        fn failing_reasoning() -> Arc<Self> {
            Arc::new(Self {
                relevance: "YES".into(),
                fail_reasoning: true,
                classify_calls: AtomicUsize::new(0),
                generate_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ClassificationOracle for ScriptedOracle {
        async fn classify(&self, _prompt: &str, _tier: OracleTier) -> Result<String> {
            self.classify_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.relevance.clone())
        }

        async fn generate(&self, _system: &str, prompt: &str, tier: OracleTier) -> Result<String> {
            self.generate_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_reasoning && tier == OracleTier::Reasoning {
                return Err(ProspectorError::Oracle("reasoning model unavailable".into()));
            }
            let head: String = prompt.chars().take(40).collect();
            Ok(format!("distilled: {head}"))
        }
    }

    struct FixedSearch {
        hits: Vec<SearchHit>,
    }

    #[async_trait]
    impl SearchProvider for FixedSearch {
        async fn search(&self, _query: &str, _tier: SearchTier) -> Result<Vec<SearchHit>> {
            Ok(self.hits.clone())
        }
    }

    /// Fetcher that counts attempts per URL and fails the configured set.
    struct CountingFetcher {
        attempts: Mutex<HashMap<Url, usize>>,
        failing: HashSet<Url>,
    }

    impl CountingFetcher {
        fn new(failing: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                attempts: Mutex::new(HashMap::new()),
                failing: failing.iter().map(|u| Url::parse(u).unwrap()).collect(),
            })
        }

        fn attempts_for(&self, url: &str) -> usize {
            let url = Url::parse(url).unwrap();
            *self.attempts.lock().unwrap().get(&url).unwrap_or(&0)
        }

        fn total_attempts(&self) -> usize {
            self.attempts.lock().unwrap().values().sum()
        }
    }

    #[async_trait]
    impl DocumentFetcher for CountingFetcher {
        async fn fetch(&self, url: &Url) -> Result<FetchedDocument> {
            *self.attempts.lock().unwrap().entry(url.clone()).or_insert(0) += 1;
            if self.failing.contains(url) {
                return Err(ProspectorError::Network("503 from upstream".into()));
            }
            Ok(FetchedDocument {
                url: url.clone(),
                content: format!("Content served from {url}"),
                retrieved_at: Utc::now(),
            })
        }
    }

    // -- helpers ----------------------------------------------------------

    fn acme() -> Company {
        Company::new("Acme", Some(Url::parse("https://acme.io").unwrap()))
    }

    fn hit(source: &str) -> SearchHit {
        SearchHit {
            content: "result text".into(),
            source: source.into(),
        }
    }

    fn config() -> ResearchConfig {
        ResearchConfig {
            retry_backoff_secs: 0,
            ..ResearchConfig::default()
        }
    }

    fn orchestrator(
        oracle: Arc<ScriptedOracle>,
        hits: Vec<SearchHit>,
        fetcher: Arc<CountingFetcher>,
        cache: Cache,
    ) -> ResearchOrchestrator {
        ResearchOrchestrator::new(
            oracle,
            Arc::new(FixedSearch { hits }),
            fetcher,
            cache,
            config(),
        )
    }

    // -- tests ------------------------------------------------------------

    #[tokio::test]
    async fn failed_home_fetch_fails_the_run() {
        let fetcher = CountingFetcher::new(&["https://acme.io/"]);
        let orch = orchestrator(
            ScriptedOracle::new("YES"),
            vec![hit("https://news.example/acme")],
            fetcher,
            Cache::disabled(),
        );

        let err = orch.research(&acme()).await.unwrap_err();
        match err {
            ProspectorError::MandatoryStep { step, .. } => assert_eq!(step, "home_page"),
            other => panic!("expected mandatory-step error, got {other}"),
        }
    }

    #[tokio::test]
    async fn one_failing_source_does_not_abort_the_batch() {
        let fetcher = CountingFetcher::new(&["https://dead.example/post"]);
        let orch = orchestrator(
            ScriptedOracle::new("YES"),
            vec![hit("https://dead.example/post"), hit("https://alive.example/acme")],
            fetcher.clone(),
            Cache::disabled(),
        );

        let bundle = orch.research(&acme()).await.expect("run should survive");
        assert!(!bundle.icp_profile.is_empty());
        // The failing URL consumed its full retry budget before being dropped.
        assert_eq!(fetcher.attempts_for("https://dead.example/post"), config().max_retries);
        assert_eq!(fetcher.attempts_for("https://alive.example/acme"), 1);
    }

    #[tokio::test]
    async fn duplicate_candidates_are_fetched_once() {
        let fetcher = CountingFetcher::new(&[]);
        // Every query angle returns the same two sources, one of which is the
        // home page itself.
        let orch = orchestrator(
            ScriptedOracle::new("YES"),
            vec![hit("https://blog.example/acme-review"), hit("https://acme.io/")],
            fetcher.clone(),
            Cache::disabled(),
        );

        orch.research(&acme()).await.expect("run should succeed");
        assert_eq!(fetcher.attempts_for("https://blog.example/acme-review"), 1);
        // The home page is fetched only as the anchor, never as a candidate.
        assert_eq!(fetcher.attempts_for("https://acme.io/"), 1);
    }

    #[tokio::test]
    async fn ambiguous_relevance_verdict_drops_the_document() {
        let oracle = ScriptedOracle::new("It could plausibly be related, hard to say.");
        let fetcher = CountingFetcher::new(&[]);
        // Unrelated domain and content, so only the oracle could accept it.
        let orch = orchestrator(
            oracle.clone(),
            vec![hit("https://unrelated.example/story")],
            fetcher,
            Cache::disabled(),
        );

        orch.research(&acme()).await.expect("run should succeed");
        assert_eq!(oracle.classify_calls.load(Ordering::SeqCst), 1);
        // Generation: home extract + summarize, four layers, one synthesis.
        // A kept document would have added two more calls.
        assert_eq!(oracle.generate_calls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn company_domain_match_skips_the_oracle() {
        let oracle = ScriptedOracle::new("NO");
        let fetcher = CountingFetcher::new(&[]);
        let orch = orchestrator(
            oracle.clone(),
            vec![hit("https://acme.io/about")],
            fetcher,
            Cache::disabled(),
        );

        orch.research(&acme()).await.expect("run should succeed");
        // Same registrable domain as the company: accepted deterministically.
        assert_eq!(oracle.classify_calls.load(Ordering::SeqCst), 0);
        assert_eq!(oracle.generate_calls.load(Ordering::SeqCst), 9);
    }

    #[tokio::test]
    async fn failed_synthesis_fails_the_run() {
        let fetcher = CountingFetcher::new(&[]);
        let orch = orchestrator(
            ScriptedOracle::failing_reasoning(),
            Vec::new(),
            fetcher,
            Cache::disabled(),
        );

        let err = orch.research(&acme()).await.unwrap_err();
        match err {
            ProspectorError::MandatoryStep { step, .. } => assert_eq!(step, "icp_synthesis"),
            other => panic!("expected mandatory-step error, got {other}"),
        }
    }

    #[tokio::test]
    async fn fresh_bundle_is_served_from_cache() {
        let dir = tempfile::tempdir().expect("tempdir");
        let fetcher = CountingFetcher::new(&[]);
        let orch = orchestrator(
            ScriptedOracle::new("YES"),
            vec![hit("https://blog.example/acme")],
            fetcher.clone(),
            Cache::new(dir.path()),
        );

        let first = orch.research(&acme()).await.expect("first run");
        let fetches_after_first = fetcher.total_attempts();

        let second = orch.research(&acme()).await.expect("second run");
        assert_eq!(first.icp_profile, second.icp_profile);
        assert_eq!(fetcher.total_attempts(), fetches_after_first);
    }
}
