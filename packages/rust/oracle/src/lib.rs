//! The classification oracle — a natural-language judgment collaborator.
//!
//! The funnel and orchestrator never encode business rules themselves; they
//! hand a prompt to an opaque oracle and defensively scan the free-text
//! answer for a small set of expected labels. Any backend satisfying
//! [`ClassificationOracle`] works: the shipped [`HttpOracle`] speaks an
//! OpenAI-compatible chat-completions API, tests substitute deterministic
//! fakes.

mod provider;

use async_trait::async_trait;
use prospector_shared::Result;

pub use provider::HttpOracle;

/// Cost/latency tier for an oracle call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OracleTier {
    /// Cheap, fast model for classification and summarization.
    Basic,
    /// Expensive reasoning model for the final synthesis pass.
    Reasoning,
}

/// Natural-language classification and generation collaborator.
///
/// Calls are non-deterministic, latent (seconds to minutes), and fallible.
/// Callers define their own fallback per call site; the asymmetric
/// fail-open/fail-closed policies live with the callers, not here.
#[async_trait]
pub trait ClassificationOracle: Send + Sync {
    /// Ask for a categorical judgment. The returned string is expected to
    /// contain one of a small fixed label set, possibly surrounded by
    /// free-text reasoning — use [`find_label`] to check.
    async fn classify(&self, prompt: &str, tier: OracleTier) -> Result<String>;

    /// Generate text under a system instruction (extraction, summarization,
    /// synthesis).
    async fn generate(&self, system: &str, prompt: &str, tier: OracleTier) -> Result<String>;
}

/// Scan an oracle response for one of the expected labels.
///
/// An exact match of the trimmed, uppercased response wins; otherwise the
/// first expected label appearing as a standalone token wins. Returns `None`
/// when the response contains none of the labels — callers decide whether
/// that means pass or reject.
pub fn find_label<'a>(response: &str, labels: &[&'a str]) -> Option<&'a str> {
    let upper = response.trim().to_uppercase();

    for label in labels {
        if upper == *label {
            return Some(label);
        }
    }

    // Token scan: split on anything that can't be part of a label so that
    // NOT_FIT never matches inside SOMETHING_NOT_FITTING.
    let mut best: Option<(usize, &'a str)> = None;
    for label in labels {
        let mut start = 0;
        while let Some(pos) = upper[start..].find(*label) {
            let at = start + pos;
            let before_ok = at == 0
                || !upper[..at]
                    .chars()
                    .next_back()
                    .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
            let after = at + label.len();
            let after_ok = after >= upper.len()
                || !upper[after..]
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
            if before_ok && after_ok {
                match best {
                    Some((best_at, _)) if best_at <= at => {}
                    _ => best = Some((at, label)),
                }
                break;
            }
            start = after;
        }
    }
    best.map(|(_, label)| label)
}
