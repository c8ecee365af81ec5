//! Typed error handling for the marketplace engine
//!
//! Nothing in the engine is fatal: every error here has a degraded but
//! functional behaviour, and callers mostly turn them into a toast.
//!
//! # Error Categories
//!
//! - [`SourceError`]: a remote collaborator failed (page fetch, liked set, view counter)
//! - [`ConfigError`]: configuration could not be loaded or is inconsistent
//!
//! Interpreter failures never appear here; they degrade to plain-text
//! search silently.
//!
//! # Example
//!
//! ```rust,ignore
//! match engine.load_more().await {
//!     Ok(outcome) => render(engine.snapshot()),
//!     Err(err) if err.is_transient() => toast(err.to_report()),
//!     Err(err) => tracing::error!(code = err.error_code(), "{}", err),
//! }
//! ```

use crate::core::listing::ListingId;
use serde::Serialize;
use thiserror::Error;

/// The main error type of the crate
#[derive(Debug, Error)]
pub enum MarketError {
    /// A remote collaborator failed
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Internal errors (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Serializable form of an error for user-visible notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Whether retrying the same action may succeed
    pub retryable: bool,
}

impl MarketError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            MarketError::Source(e) => e.error_code(),
            MarketError::Config(_) => "CONFIG_ERROR",
            MarketError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Remote failures are transient: retrying the same filter may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, MarketError::Source(_))
    }

    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            code: self.error_code().to_string(),
            message: self.to_string(),
            retryable: self.is_transient(),
        }
    }
}

// =============================================================================
// Source Errors
// =============================================================================

/// Errors reported by remote collaborators
#[derive(Debug, Error)]
pub enum SourceError {
    /// Fetching a page of listings failed
    #[error("Failed to fetch listings page {page}: {message}")]
    PageFetch { page: usize, message: String },

    /// Fetching the viewer's liked set failed
    #[error("Failed to fetch liked listings: {message}")]
    LikedSet { message: String },

    /// Incrementing a view counter failed
    #[error("Failed to record view for listing '{listing_id}': {message}")]
    ViewCount {
        listing_id: ListingId,
        message: String,
    },
}

impl SourceError {
    pub fn error_code(&self) -> &'static str {
        match self {
            SourceError::PageFetch { .. } => "PAGE_FETCH_FAILED",
            SourceError::LikedSet { .. } => "LIKED_SET_FAILED",
            SourceError::ViewCount { .. } => "VIEW_COUNT_FAILED",
        }
    }

    /// Wrap a collaborator error raised while fetching `page`
    pub fn page_fetch(page: usize, err: &anyhow::Error) -> Self {
        SourceError::PageFetch {
            page,
            message: format!("{:#}", err),
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error(
        "Failed to parse config{}: {message}",
        file.as_ref().map(|f| format!(" file '{}'", f)).unwrap_or_default()
    )]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    #[error("Invalid value '{value}' for field '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// IO error while reading configuration
    #[error("IO error: {message}")]
    IoError { message: String },

    /// A required collaborator was not provided to a builder
    #[error("Missing required collaborator: {name}")]
    MissingCollaborator { name: &'static str },
}
