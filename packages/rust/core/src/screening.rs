//! The screening funnel: cheap, staged qualification with early exit.
//!
//! Three stages, escalating in cost: deterministic technical validation,
//! then a basic-search gate, then an advanced-search gate. The policy is
//! asymmetric on purpose — losing a good company costs more than spending
//! extra research budget on a bad one — so the technical stage fails
//! closed while the search gates and the funnel's top level fail open.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use prospector_fetcher::{SiteProber, registrable_domain};
use prospector_oracle::{ClassificationOracle, OracleTier, find_label};
use prospector_search::{SearchProvider, SearchTier};
use prospector_shared::{Company, Result, ScreeningDecision, ScreeningStage};

use crate::prompts;

/// Query template for the basic-search gate.
const BASIC_QUERY: &str = "company type funding stage acquired";

/// Query template for the advanced-search gate.
const ADVANCED_QUERY: &str = "business model product offering team size revenue marketplace SaaS";

/// Staged screening gate deciding whether a company is worth researching.
pub struct ScreeningFunnel {
    oracle: Arc<dyn ClassificationOracle>,
    search: Arc<dyn SearchProvider>,
    prober: Arc<dyn SiteProber>,
    denylist: HashSet<String>,
}

impl ScreeningFunnel {
    /// Build a funnel. The denylist is injected configuration — domains that
    /// disqualify outright, matched against the *resolved* website domain.
    pub fn new(
        oracle: Arc<dyn ClassificationOracle>,
        search: Arc<dyn SearchProvider>,
        prober: Arc<dyn SiteProber>,
        denylist: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            oracle,
            search,
            prober,
            denylist: denylist.into_iter().map(|d| d.to_lowercase()).collect(),
        }
    }

    /// Screen one company. Never fails: an unexpected internal error maps to
    /// a pass so that a bug in screening never silently discards candidates.
    #[instrument(skip_all, fields(company = %company.name))]
    pub async fn screen(&self, company: &Company) -> ScreeningDecision {
        match self.run_stages(company).await {
            Ok(decision) => {
                info!(
                    proceed = decision.proceed,
                    stage = %decision.stage_reached,
                    reason = %decision.reason,
                    "screening complete"
                );
                decision
            }
            Err(e) => {
                error!(error = %e, "unexpected screening error, proceeding anyway");
                ScreeningDecision::pass(format!("unexpected screening error ({e}), proceeding"))
            }
        }
    }

    async fn run_stages(&self, company: &Company) -> Result<ScreeningDecision> {
        if let Some(rejection) = self.technical_stage(company).await {
            return Ok(rejection);
        }

        if let Some(rejection) = self
            .search_gate(company, ScreeningStage::BasicSearch, SearchTier::Basic, BASIC_QUERY)
            .await
        {
            return Ok(rejection);
        }

        if let Some(rejection) = self
            .search_gate(
                company,
                ScreeningStage::AdvancedSearch,
                SearchTier::Advanced,
                ADVANCED_QUERY,
            )
            .await
        {
            return Ok(rejection);
        }

        Ok(ScreeningDecision::pass("passed all screening stages"))
    }

    /// Stage 1: deterministic technical validation. Every error path in here
    /// rejects — this is the cheap gate and must never proceed on error.
    async fn technical_stage(&self, company: &Company) -> Option<ScreeningDecision> {
        let reject = |reason: String| Some(ScreeningDecision::reject(ScreeningStage::Technical, reason));

        if company.name.trim().is_empty() {
            return reject("company name is empty".into());
        }
        let Some(website) = &company.website else {
            return reject("company has no website".into());
        };

        // Resolve through redirects first: the denylist check must see the
        // real destination, not a link shortener or aggregator alias.
        let resolved = match self.prober.resolve_final_url(website).await {
            Ok(resolved) => resolved,
            Err(e) => {
                return reject(format!("website did not resolve: {e}"));
            }
        };

        let Some(domain) = registrable_domain(&resolved) else {
            return reject(format!("resolved URL has no usable domain: {resolved}"));
        };

        if self.denylist.contains(&domain) {
            return reject(format!("resolved domain {domain} is denylisted"));
        }

        if !self.prober.domain_resolves(&domain).await {
            return reject(format!("DNS resolution failed for {domain}"));
        }

        info!(%domain, "technical validation passed");
        None
    }

    /// Stages 2 and 3 share one shape: search at a tier, then ask the oracle
    /// for an ICP verdict over the results. Reject only on an explicit
    /// NOT_FIT; no results, search errors, oracle errors, and unrecognized
    /// labels all proceed — this gate reduces leakage, it is not ground
    /// truth.
    async fn search_gate(
        &self,
        company: &Company,
        stage: ScreeningStage,
        tier: SearchTier,
        query_tail: &str,
    ) -> Option<ScreeningDecision> {
        let query = format!("{} {query_tail}", company.name);

        let hits = match self.search.search(&query, tier).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(%stage, error = %e, "search failed, proceeding");
                return None;
            }
        };

        if hits.is_empty() {
            info!(%stage, "no search results, proceeding");
            return None;
        }

        let context = prompts::research_context(&hits);
        let verdict = match self
            .oracle
            .classify(&prompts::icp_fit(company, &context), OracleTier::Basic)
            .await
        {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(%stage, error = %e, "ICP validation failed, proceeding");
                return None;
            }
        };

        match find_label(&verdict, &prompts::FIT_LABELS) {
            Some("NOT_FIT") => Some(ScreeningDecision::reject(
                stage,
                format!("oracle judged NOT_FIT at {stage} gate"),
            )),
            Some(_) => None,
            None => {
                warn!(%stage, response = %verdict, "unrecognized ICP verdict, proceeding");
                None
            }
        }
    }
}
