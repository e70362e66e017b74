//! Error types for Prospector.
//!
//! Library crates use [`ProspectorError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Prospector operations.
#[derive(Debug, thiserror::Error)]
pub enum ProspectorError {
    /// Configuration loading or validation error (missing key, bad file).
    /// Surfaced at construction time, never mid-run.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error during fetch, search, or oracle calls.
    #[error("network error: {0}")]
    Network(String),

    /// Classification oracle error (API failure or unusable response).
    #[error("oracle error: {0}")]
    Oracle(String),

    /// Search provider error.
    #[error("search error: {0}")]
    Search(String),

    /// Cache read/write error. Call sites treat this as a miss.
    #[error("cache error: {0}")]
    Cache(String),

    /// A mandatory research step failed (home-page fetch, final synthesis).
    /// Propagates to the caller as a run failure; auxiliary steps never
    /// produce this variant.
    #[error("mandatory step failed: {step}: {message}")]
    MandatoryStep { step: String, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (malformed URL, empty input, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ProspectorError>;

impl ProspectorError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a mandatory-step failure with the step name for diagnostics.
    pub fn mandatory(step: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::MandatoryStep {
            step: step.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
