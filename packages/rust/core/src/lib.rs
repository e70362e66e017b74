//! Screening and research pipeline for company ICP qualification.
//!
//! Two entry points:
//! - [`ScreeningFunnel`] decides cheaply whether a company is worth
//!   researching at all.
//! - [`ResearchOrchestrator`] turns a screened company into a
//!   [`prospector_shared::ResearchBundle`] of layered, source-attributed
//!   summaries.
//!
//! Both are built from trait-object collaborators (oracle, search provider,
//! fetcher, prober) so tests and alternative providers can be swapped in
//! without touching the pipeline logic.

pub mod prompts;
mod research;
mod screening;

pub use research::ResearchOrchestrator;
pub use screening::ScreeningFunnel;
