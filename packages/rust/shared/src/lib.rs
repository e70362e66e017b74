//! Shared types, error model, and configuration for Prospector.
//!
//! This crate is the foundation depended on by all other Prospector crates.
//! It provides:
//! - [`ProspectorError`] — the unified error type
//! - Domain types ([`Company`], [`ScreeningDecision`], [`ResearchBundle`])
//! - Configuration ([`AppConfig`], config loading)
//! - Company-name normalization for cache fingerprints

pub mod config;
pub mod error;
pub mod names;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CacheConfig, OracleConfig, ResearchConfig, ScreeningConfig, SearchConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{ProspectorError, Result};
pub use names::normalize_company_name;
pub use types::{
    Company, FetchedDocument, ResearchBundle, ScreeningDecision, ScreeningStage, SearchHit,
};
