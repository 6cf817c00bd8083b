//! Error types for Gloss operations.
//!
//! This module defines the main error type [`GlossError`]. Per-article
//! failures are captured into reports by the orchestrator; only request-level
//! failures escape [`crate::BatchRunner::run`].
//!
//! # Example
//!
//! ```rust
//! use gloss_core::{GlossError, Result};
//!
//! fn require_id(id: Option<&str>) -> Result<&str> {
//!     id.ok_or_else(|| GlossError::InvalidRequest("articleId is required".to_string()))
//! }
//! # assert!(require_id(None).is_err());
//! ```

use thiserror::Error;

/// Main error type for enrichment operations.
#[derive(Error, Debug)]
pub enum GlossError {
    /// HTTP request errors from reqwest.
    ///
    /// Wraps transport failures when calling the content generation service.
    #[cfg(feature = "generate")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timeout.
    ///
    /// Only produced when a generator timeout has been configured.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided for an outbound service.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The inbound request was malformed or incomplete.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A single-article run named an article the store does not have.
    #[error("Article not found: {0}")]
    ArticleNotFound(String),

    /// Article store read or write failure.
    ///
    /// Fatal for a single article when raised by a content write, and fatal
    /// for the whole invocation when raised while loading the working set.
    #[error("Article store error: {0}")]
    Store(String),

    /// The content generation service answered, but not usefully.
    #[error("Content generation failed: {0}")]
    Generation(String),

    /// Configuration errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON encoding or decoding errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for GlossError.
pub type Result<T> = std::result::Result<T, GlossError>;
