//! HTTP client for making requests to upstream providers

use super::request::{HttpMethod, ProviderRequest, ProviderResponse};
use crate::config::OutgoingSettings;
use anyhow::Result;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

/// HTTP client wrapper with search-synth specific configuration
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
    user_agent: String,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings.
    ///
    /// No client-wide timeout is set: a total timeout would also cut off
    /// long-running response streams. Buffered calls get a per-request
    /// timeout instead.
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs_f64(settings.connect_timeout))
            .pool_max_idle_per_host(settings.pool_maxsize)
            .gzip(true)
            .brotli(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            default_timeout: Duration::from_secs_f64(settings.request_timeout),
            user_agent: format!("search-synth/{}", crate::VERSION),
        })
    }

    /// Execute a request and read the whole body
    pub async fn execute(&self, request: ProviderRequest) -> reqwest::Result<ProviderResponse> {
        let timeout = self.default_timeout;
        self.execute_with_timeout(request, timeout).await
    }

    /// Execute a request with a custom timeout and read the whole body
    pub async fn execute_with_timeout(
        &self,
        request: ProviderRequest,
        timeout: Duration,
    ) -> reqwest::Result<ProviderResponse> {
        let response = self.build(request).timeout(timeout).send().await?;
        Self::parse_response(response).await
    }

    /// Execute a request and hand back the unread response so the caller can
    /// consume the body as a byte stream. Only the connect timeout applies.
    pub async fn execute_streaming(&self, request: ProviderRequest) -> reqwest::Result<Response> {
        self.build(request).send().await
    }

    fn build(&self, request: ProviderRequest) -> RequestBuilder {
        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        req_builder = req_builder.header("User-Agent", &self.user_agent);

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        if !request.params.is_empty() {
            req_builder = req_builder.query(&request.params);
        }

        if let Some(ref token) = request.bearer {
            req_builder = req_builder.bearer_auth(token);
        }

        if let Some(ref json) = request.json {
            req_builder = req_builder.json(json);
        }

        req_builder
    }

    /// Parse response into ProviderResponse
    async fn parse_response(response: Response) -> reqwest::Result<ProviderResponse> {
        let status = response.status().as_u16();
        let text = response.text().await?;

        Ok(ProviderResponse { status, text })
    }
}
