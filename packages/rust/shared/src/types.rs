//! Core domain types for company screening and research.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

// ---------------------------------------------------------------------------
// Company
// ---------------------------------------------------------------------------

/// A candidate company discovered upstream (typically from a job posting).
///
/// Immutable once screening starts; downstream extraction enriches a separate
/// record, never this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Company name as discovered.
    pub name: String,
    /// Company website, when known.
    pub website: Option<Url>,
}

impl Company {
    /// Create a company from a name and an already-parsed website URL.
    pub fn new(name: impl Into<String>, website: Option<Url>) -> Self {
        Self {
            name: name.into(),
            website,
        }
    }
}

// ---------------------------------------------------------------------------
// Screening
// ---------------------------------------------------------------------------

/// The funnel stage a screening run reached before terminating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningStage {
    /// Deterministic technical validation (URL resolution, denylist, DNS).
    Technical,
    /// Basic-search gate with first oracle judgment.
    BasicSearch,
    /// Advanced-search gate with second oracle judgment.
    AdvancedSearch,
    /// All stages cleared.
    Passed,
}

impl std::fmt::Display for ScreeningStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Technical => "technical",
            Self::BasicSearch => "basic_search",
            Self::AdvancedSearch => "advanced_search",
            Self::Passed => "passed",
        };
        write!(f, "{name}")
    }
}

/// Result of one screening run. Created once per company, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningDecision {
    /// Whether the company should proceed to full research.
    pub proceed: bool,
    /// Human-readable reason for the decision.
    pub reason: String,
    /// The stage at which the funnel terminated.
    pub stage_reached: ScreeningStage,
}

impl ScreeningDecision {
    /// A rejection at the given stage.
    pub fn reject(stage: ScreeningStage, reason: impl Into<String>) -> Self {
        Self {
            proceed: false,
            reason: reason.into(),
            stage_reached: stage,
        }
    }

    /// A pass-through decision.
    pub fn pass(reason: impl Into<String>) -> Self {
        Self {
            proceed: true,
            reason: reason.into(),
            stage_reached: ScreeningStage::Passed,
        }
    }
}

// ---------------------------------------------------------------------------
// Search & fetch
// ---------------------------------------------------------------------------

/// A single ranked result from the search provider. Ephemeral — never
/// persisted beyond the run (the caching layer stores raw responses, not
/// these).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Result text.
    pub content: String,
    /// Source attribution (URL or provider name).
    pub source: String,
}

/// A document retrieved by the fetcher, reduced to text. Owned exclusively by
/// the orchestrator during one research run.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// The URL the document was fetched from.
    pub url: Url,
    /// Extracted textual content.
    pub content: String,
    /// When the fetch completed.
    pub retrieved_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ResearchBundle
// ---------------------------------------------------------------------------

/// Aggregate output of one research run: layered summaries plus the raw
/// home-page summary. Immutable once returned; consumed by the downstream
/// extractor and cached keyed by company fingerprint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchBundle {
    /// Summary of the company's own home page — the ground-truth anchor.
    pub home_page: String,
    /// Comprehensive overview synthesized across all sources.
    pub comprehensive: String,
    /// Company/product-focused summary.
    pub company: String,
    /// Funding-focused summary.
    pub funding: String,
    /// Team/leadership-focused summary.
    pub team: String,
    /// ICP-focused, source-attributed business profile for the downstream
    /// classifier.
    pub icp_profile: String,
}
