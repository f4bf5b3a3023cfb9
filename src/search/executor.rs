//! Search execution

use crate::engines::{Engine, RequestParams, SearchError};
use crate::network::HttpClient;
use crate::results::SearchResult;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Runs one query against the configured search engine
pub struct Search {
    /// HTTP client for making requests
    client: HttpClient,
    /// Engine to query
    engine: Arc<dyn Engine>,
    /// Upper bound for the whole call
    timeout: Duration,
    /// Maximum number of results kept
    max_results: u32,
}

impl Search {
    /// Create a new search executor
    pub fn new(client: HttpClient, engine: Arc<dyn Engine>) -> Self {
        Self {
            client,
            engine,
            timeout: Duration::from_secs(30),
            max_results: 10,
        }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of results
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Name of the engine behind this executor
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Execute a search.
    ///
    /// Exactly one outbound call is made. An empty `Ok` means the provider
    /// had no hits; callers treat it the same as an error when deciding
    /// whether search results are available.
    pub async fn execute(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let engine_name = self.engine.name();
        let start = Instant::now();

        let params = RequestParams::new(query).with_max_results(self.max_results);
        let request = self.engine.request(&params).map_err(|e| {
            warn!("Failed to build request for {}: {}", engine_name, e);
            e
        })?;

        debug!("Searching engine {} with timeout {:?}", engine_name, self.timeout);

        let response = match timeout(self.timeout, self.client.execute(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!("Request failed for {}: {}", engine_name, e);
                return Err(SearchError::Network(e));
            }
            Err(_) => {
                warn!("Timeout for engine {}", engine_name);
                return Err(SearchError::Timeout);
            }
        };

        if !response.is_success() {
            warn!(
                "Engine {} returned HTTP {}: {}",
                engine_name, response.status, response.text
            );
        }

        let mut results = self.engine.response(response).map_err(|e| {
            warn!("Failed to parse response from {}: {}", engine_name, e);
            e
        })?;
        results.truncate(self.max_results as usize);

        info!(
            "Engine {} returned {} results in {:?}",
            engine_name,
            results.len(),
            start.elapsed()
        );

        Ok(results)
    }
}
