//! Error types for route optimization.

use thiserror::Error;

/// Errors surfaced to callers of the optimizer.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("optimization cancelled")]
    Cancelled,
}

/// A single pairwise lookup against the routing backend failed.
///
/// Never leaves the cost provider: it is recovered with a haversine estimate.
#[derive(Debug, Error)]
pub enum RouteLookupError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("no route found")]
    NoRoute,

    #[error("routing request timed out")]
    Timeout,
}

#[derive(Debug, Error)]
pub enum CampsiteSearchError {
    #[error("campsite search unavailable: {0}")]
    Unavailable(String),
}
