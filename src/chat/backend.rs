//! Backends the orchestrator can drive

use crate::config::LlmSettings;
use crate::engines::SearchError;
use crate::llm::prompts::{knowledge_messages, synthesis_messages};
use crate::llm::{CompletionRequest, LlmClient, LlmError};
use crate::network::{HttpClient, ProviderRequest};
use crate::results::SearchResult;
use crate::search::Search;
use crate::web::models::{SearchResponse, SummaryResponse};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Content bytes of a synthesized answer
pub type ContentStream = BoxStream<'static, Result<Bytes, BackendError>>;

/// Failure of one backend call
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("search failed: {0}")]
    Search(#[from] SearchError),
    #[error("model call failed: {0}")]
    Llm(#[from] LlmError),
    #[error("HTTP {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("stream aborted: {0}")]
    Stream(String),
}

/// The three calls a chat turn is made of
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Web search for the query
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, BackendError>;

    /// Context-free initial answer
    async fn knowledge(&self, query: &str) -> Result<String, BackendError>;

    /// Start the streamed final answer
    async fn synthesize(&self, request: &CompletionRequest) -> Result<ContentStream, BackendError>;
}

#[async_trait]
impl<B: ChatBackend + ?Sized> ChatBackend for Arc<B> {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, BackendError> {
        (**self).search(query).await
    }

    async fn knowledge(&self, query: &str) -> Result<String, BackendError> {
        (**self).knowledge(query).await
    }

    async fn synthesize(&self, request: &CompletionRequest) -> Result<ContentStream, BackendError> {
        (**self).synthesize(request).await
    }
}

/// Calls the providers directly from this process
pub struct LocalBackend {
    search: Arc<Search>,
    llm: LlmClient,
}

impl LocalBackend {
    pub fn new(search: Arc<Search>, llm: LlmClient) -> Self {
        Self { search, llm }
    }
}

#[async_trait]
impl ChatBackend for LocalBackend {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, BackendError> {
        Ok(self.search.execute(query).await?)
    }

    async fn knowledge(&self, query: &str) -> Result<String, BackendError> {
        Ok(self.llm.complete(&knowledge_messages(query)).await?)
    }

    async fn synthesize(&self, request: &CompletionRequest) -> Result<ContentStream, BackendError> {
        let stream = self.llm.stream(&synthesis_messages(request)).await?;
        Ok(stream
            .map_err(|e| BackendError::Stream(e.to_string()))
            .boxed())
    }
}

/// Talks to the `/api` endpoints of a running server, like the browser page
pub struct HttpBackend {
    client: HttpClient,
    base_url: String,
    knowledge_timeout: Duration,
}

impl HttpBackend {
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            knowledge_timeout: Duration::from_secs_f64(LlmSettings::default().request_timeout),
        }
    }

    /// Bound for the initial-answer call, which waits for a whole completion
    pub fn with_knowledge_timeout(mut self, timeout: Duration) -> Self {
        self.knowledge_timeout = timeout;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, BackendError> {
        let endpoint = self.endpoint("/api/search");
        let response = self
            .client
            .execute(ProviderRequest::get(&endpoint).param("q", query))
            .await?;
        if !response.is_success() {
            return Err(BackendError::Status {
                endpoint,
                status: response.status,
            });
        }

        let data: SearchResponse = response
            .json()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(data.results)
    }

    async fn knowledge(&self, query: &str) -> Result<String, BackendError> {
        let endpoint = self.endpoint("/api/knowledge");
        let body = serde_json::to_value(CompletionRequest::initial(query))
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let response = self
            .client
            .execute_with_timeout(
                ProviderRequest::post(&endpoint).json(body),
                self.knowledge_timeout,
            )
            .await?;
        if !response.is_success() {
            return Err(BackendError::Status {
                endpoint,
                status: response.status,
            });
        }

        let data: SummaryResponse = response
            .json()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(data.summary)
    }

    async fn synthesize(&self, request: &CompletionRequest) -> Result<ContentStream, BackendError> {
        let endpoint = self.endpoint("/api/knowledge");
        let body =
            serde_json::to_value(request).map_err(|e| BackendError::Decode(e.to_string()))?;
        let response = self
            .client
            .execute_streaming(ProviderRequest::post(&endpoint).json(body))
            .await?;
        if !response.status().is_success() {
            return Err(BackendError::Status {
                endpoint,
                status: response.status().as_u16(),
            });
        }

        Ok(response
            .bytes_stream()
            .map_err(|e| BackendError::Stream(e.to_string()))
            .boxed())
    }
}
