//! Engine traits and types

use crate::network::{ProviderRequest, ProviderResponse};
use crate::results::SearchResult;
use thiserror::Error;

/// Why a search engine produced no usable answer
#[derive(Debug, Error)]
pub enum SearchError {
    /// The provider answered with a non-success status
    #[error("HTTP error: {status}")]
    Http { status: u16 },
    /// The request never got a response
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The payload could not be decoded
    #[error("malformed payload: {0}")]
    Parse(String),
    /// The request could not be built (missing credentials, bad endpoint)
    #[error("invalid request: {0}")]
    Request(String),
    /// The engine did not answer in time
    #[error("timed out")]
    Timeout,
}

/// Parameters for building a search request
#[derive(Debug, Clone)]
pub struct RequestParams {
    /// Search query string
    pub query: String,
    /// Maximum number of results wanted
    pub max_results: u32,
}

impl RequestParams {
    /// Create new request parameters
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: 10,
        }
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }
}

/// A web search provider.
///
/// Engines only translate: `request` builds the outbound call and `response`
/// decodes it. Transport, timeouts and logging live in
/// [`Search`](crate::search::Search).
pub trait Engine: Send + Sync {
    /// Engine name
    fn name(&self) -> &str;

    /// Most results a single request can return
    fn results_per_page(&self) -> u32 {
        10
    }

    /// Build the HTTP request for a search
    fn request(&self, params: &RequestParams) -> Result<ProviderRequest, SearchError>;

    /// Parse the HTTP response into results
    fn response(&self, response: ProviderResponse) -> Result<Vec<SearchResult>, SearchError>;
}
