//! Application state shared across handlers

use crate::chat::LocalBackend;
use crate::config::Settings;
use crate::engines::GoogleCustomSearch;
use crate::llm::LlmClient;
use crate::network::HttpClient;
use crate::search::Search;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Search executor
    pub search: Arc<Search>,
    /// Model provider client
    pub llm: LlmClient,
    /// Template renderer
    pub templates: Arc<super::Templates>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, client: HttpClient) -> anyhow::Result<Self> {
        let engine = GoogleCustomSearch::from_settings(&settings.search);
        let search = Search::new(client.clone(), Arc::new(engine))
            .with_timeout(Duration::from_secs_f64(settings.outgoing.request_timeout))
            .with_max_results(settings.search.max_results);
        let llm = LlmClient::new(client, settings.llm.clone());
        let templates = Arc::new(super::Templates::new()?);

        Ok(Self {
            settings: Arc::new(settings),
            search: Arc::new(search),
            llm,
            templates,
        })
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }

    /// Backend calling the providers in-process
    pub fn local_backend(&self) -> LocalBackend {
        LocalBackend::new(self.search.clone(), self.llm.clone())
    }
}
