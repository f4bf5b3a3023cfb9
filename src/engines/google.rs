//! Google Programmable Search (Custom Search JSON API) engine

use super::traits::*;
use crate::config::SearchSettings;
use crate::network::{ProviderRequest, ProviderResponse};
use crate::results::SearchResult;
use serde::Deserialize;

/// Google Custom Search JSON API
pub struct GoogleCustomSearch {
    base_url: String,
    api_key: Option<String>,
    engine_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomSearchResponse {
    #[serde(default)]
    items: Option<Vec<CustomSearchItem>>,
}

#[derive(Debug, Deserialize)]
struct CustomSearchItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

impl GoogleCustomSearch {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        engine_id: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            engine_id,
        }
    }

    pub fn from_settings(settings: &SearchSettings) -> Self {
        Self::new(
            settings.endpoint.clone(),
            settings.api_key.clone(),
            settings.engine_id.clone(),
        )
    }
}

impl Engine for GoogleCustomSearch {
    fn name(&self) -> &str {
        "google"
    }

    fn request(&self, params: &RequestParams) -> Result<ProviderRequest, SearchError> {
        url::Url::parse(&self.base_url)
            .map_err(|e| SearchError::Request(format!("bad endpoint {}: {}", self.base_url, e)))?;

        // Missing credentials are sent as-is; the provider rejects the call
        let num = params.max_results.clamp(1, self.results_per_page());

        Ok(ProviderRequest::get(&self.base_url)
            .param("key", self.api_key.clone().unwrap_or_default())
            .param("cx", self.engine_id.clone().unwrap_or_default())
            .param("q", params.query.clone())
            .param("num", num.to_string()))
    }

    fn response(&self, response: ProviderResponse) -> Result<Vec<SearchResult>, SearchError> {
        if !response.is_success() {
            return Err(SearchError::Http {
                status: response.status,
            });
        }

        let data: CustomSearchResponse = response
            .json()
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        let results = data
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|item| SearchResult {
                title: item.title.unwrap_or_default(),
                link: item.link.unwrap_or_default(),
                snippet: item.snippet.unwrap_or_default(),
            })
            .collect();

        Ok(results)
    }
}
