use thiserror::Error;

use super::document::ParseError;
use crate::podcast::Podcast;

/// Outcome of a single fetch-and-convert operation.
pub type LoadResult = Result<Podcast, LoadingError>;

/// Why a podcast feed could not be loaded.
///
/// Every variant is terminal; nothing in the pipeline retries.
#[derive(Debug, Error)]
pub enum LoadingError {
    /// Transport failure before or while receiving the response (DNS, TLS, timeout, etc.)
    #[error("Network error: {0}")]
    Networking(#[from] reqwest::Error),
    /// HTTP 404
    #[error("Feed not found")]
    NotFound,
    /// HTTP 5xx
    #[error("Server error: status {0}")]
    ServerError(u16),
    /// Any other non-200 status
    #[error("Request failed: status {0}")]
    RequestFailed(u16),
    /// HTTP 200 with nothing in the body
    #[error("Feed response was empty")]
    EmptyResponseBody,
    /// Body exceeded the configured size limit
    #[error("Feed response too large (limit {limit} bytes)")]
    ResponseTooLarge { limit: usize },
    /// The body is not a feed document at all
    #[error("Could not parse feed: {0}")]
    FeedParsing(#[from] ParseError),
    /// The feed parsed but lacks a field its dialect requires
    #[error("Podcast missing required field: {0}")]
    MissingAttribute(&'static str),
    /// The feed is in a dialect other than Atom or RSS
    #[error("Unsupported feed format: {0}")]
    UnsupportedFormat(String),
}
