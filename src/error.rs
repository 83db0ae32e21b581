//! Error types for search, pagination and transport.

use thiserror::Error;

/// Failures while fetching a URL from the search server.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level error during HTTP communication.
    #[error("Network error: {0}")]
    Network(String),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

/// Errors surfaced by the pagination controller and search session.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response body could not be read as a Solr query response.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("No next page")]
    NoNextPage,

    #[error("No previous page")]
    NoPreviousPage,

    /// A navigation was attempted while a request is still outstanding.
    #[error("A request is already in flight")]
    RequestAlreadyInFlight,

    /// A completion arrived while no request was outstanding.
    #[error("No request is in flight")]
    NoRequestInFlight,

    #[error("No search has been submitted")]
    NoActiveSearch,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl SearchError {
    /// Navigation boundary errors are benign no-ops, not failures.
    pub fn is_boundary(&self) -> bool {
        matches!(self, SearchError::NoNextPage | SearchError::NoPreviousPage)
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
